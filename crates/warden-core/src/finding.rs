// SPDX-License-Identifier: Apache-2.0

//! Findings produced by skills.

use std::cmp::Ordering;
use std::fmt;

use bon::Builder;
use serde::{Deserialize, Serialize};

/// Severity level of a finding.
///
/// Variants are declared most severe first, so the derived ordering sorts
/// critical findings ahead of informational ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Critical vulnerability requiring immediate attention.
    Critical,
    /// High severity issue that should be addressed soon.
    High,
    /// Medium severity issue.
    Medium,
    /// Low severity issue.
    Low,
    /// Informational finding, no score impact by default.
    Info,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a finding was detected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Path relative to the scan root, `/`-separated.
    pub path: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column (1-indexed), when the skill can tell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Location {
    /// Creates a location without a column.
    #[must_use]
    pub fn new(path: impl Into<String>, line: usize) -> Self {
        Self {
            path: path.into(),
            line,
            column: None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.line)?;
        if let Some(column) = self.column {
            write!(f, ":{column}")?;
        }
        Ok(())
    }
}

/// One discovered issue at one location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Issue category (e.g. `xss`, `cors`).
    #[builder(into)]
    pub category: String,
    /// Severity level.
    pub severity: Severity,
    /// Detection location.
    pub location: Location,
    /// The matched source text.
    #[builder(into)]
    pub snippet: String,
    /// Human-readable description of the issue.
    #[builder(into)]
    pub description: String,
    /// How to fix it.
    #[builder(into)]
    pub recommendation: String,
    /// Standard identifier such as `CWE-79`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub standard_identifier: Option<String>,
    /// Whether an automated fix is available.
    #[serde(default)]
    #[builder(default)]
    pub auto_fixable: bool,
}

impl Finding {
    /// Total order used to make merged output deterministic.
    ///
    /// Path and line come first; the remaining fields only break ties so that
    /// two findings on the same line always land in the same order.
    #[must_use]
    pub fn sort_key_cmp(&self, other: &Self) -> Ordering {
        self.location
            .path
            .cmp(&other.location.path)
            .then(self.location.line.cmp(&other.location.line))
            .then(self.location.column.cmp(&other.location.column))
            .then_with(|| self.category.cmp(&other.category))
            .then(self.severity.cmp(&other.severity))
            .then_with(|| self.description.cmp(&other.description))
            .then_with(|| self.snippet.cmp(&other.snippet))
    }
}

/// Fixed remediation advice for a category.
///
/// Depends only on the category, so envelopes stay stable across re-runs.
#[must_use]
pub fn category_recommendation(category: &str) -> &'static str {
    match category {
        "xss" => {
            "Sanitize user input and use safe DOM manipulation methods. Consider using DOMPurify or similar libraries."
        }
        "insecureStorage" => {
            "Use secure storage mechanisms. For sensitive data, use server-side sessions or encrypted storage."
        }
        "sensitiveDataExposure" => {
            "Never hardcode credentials. Use environment variables and secure secret management."
        }
        "cors" => "Restrict CORS to specific trusted origins. Avoid using wildcard (*).",
        "csp" => {
            "Implement Content Security Policy to restrict resource loading and prevent XSS."
        }
        "csrf" => "Implement CSRF tokens for state-changing operations.",
        "injection" => {
            "Pass arguments as lists and use parameterized queries instead of building commands or SQL from strings."
        }
        "mobileSpecific" => {
            "Follow mobile web best practices for accessibility and user experience."
        }
        "standards" => {
            "Follow the project's TypeScript and React conventions: function components, typed props, PascalCase component files."
        }
        _ => "Review and fix security issue.",
    }
}

/// Sorts findings in place by [`Finding::sort_key_cmp`].
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(Finding::sort_key_cmp);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(path: &str, line: usize, category: &str) -> Finding {
        Finding::builder()
            .category(category)
            .severity(Severity::High)
            .location(Location::new(path, line))
            .snippet("x")
            .description("d")
            .recommendation("r")
            .build()
    }

    #[test]
    fn test_finding_serializes_camel_case() {
        let f = Finding::builder()
            .category("xss")
            .severity(Severity::Critical)
            .location(Location::new("src/App.jsx", 10))
            .snippet("dangerouslySetInnerHTML")
            .description("React dangerouslySetInnerHTML usage")
            .recommendation("Sanitize")
            .standard_identifier("CWE-79")
            .build();

        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["severity"], "critical");
        assert_eq!(json["standardIdentifier"], "CWE-79");
        assert_eq!(json["autoFixable"], false);
        assert_eq!(json["location"]["line"], 10);
        assert!(json["location"].get("column").is_none());
    }

    #[test]
    fn test_location_display() {
        let mut location = Location::new("src/App.jsx", 10);
        assert_eq!(location.to_string(), "src/App.jsx:10");
        location.column = Some(4);
        assert_eq!(location.to_string(), "src/App.jsx:10:4");
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Critical < Severity::High);
        assert!(Severity::Low < Severity::Info);
        assert_eq!(Severity::ALL.len(), 5);
        assert_eq!(Severity::Medium.to_string(), "medium");
    }

    #[test]
    fn test_category_recommendation_fallback() {
        assert!(category_recommendation("xss").contains("DOMPurify"));
        assert_eq!(
            category_recommendation("somethingNew"),
            "Review and fix security issue."
        );
    }

    #[test]
    fn test_sort_by_path_then_line() {
        let mut findings = vec![
            finding("b.js", 1, "xss"),
            finding("a.js", 9, "xss"),
            finding("a.js", 2, "cors"),
            finding("a.js", 2, "csp"),
        ];
        sort_findings(&mut findings);

        let keys: Vec<_> = findings
            .iter()
            .map(|f| (f.location.path.as_str(), f.location.line, f.category.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("a.js", 2, "cors"),
                ("a.js", 2, "csp"),
                ("a.js", 9, "xss"),
                ("b.js", 1, "xss"),
            ]
        );
    }
}
