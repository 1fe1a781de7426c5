// SPDX-License-Identifier: Apache-2.0

//! Regex signature engine shared by the pattern-based skills.
//!
//! Signatures are data: they live in the embedded `patterns.json` and each one
//! names the skill that owns it.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::files::SourceFile;
use crate::finding::{Finding, Location, Severity, category_recommendation};

/// Embedded signature database JSON.
const PATTERNS_JSON: &str = include_str!("patterns.json");

/// Compiled engine (initialized once on first use).
static PATTERN_ENGINE: LazyLock<PatternEngine> = LazyLock::new(|| {
    PatternEngine::from_json(PATTERNS_JSON)
        .expect("Failed to load embedded signatures - patterns.json is malformed")
});

/// One signature as stored in `patterns.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternDefinition {
    /// Unique identifier for this signature.
    pub id: String,
    /// Skill that reports matches of this signature.
    pub skill: String,
    /// Finding category.
    pub category: String,
    /// Human-readable description.
    pub description: String,
    /// Regex to match, one line at a time.
    pub pattern: String,
    /// Suppresses a match when this regex also matches the line.
    #[serde(default)]
    pub unless: Option<String>,
    /// Severity level for matches.
    pub severity: Severity,
    /// Optional CWE identifier.
    #[serde(default)]
    pub cwe: Option<String>,
    /// File extensions to scan (empty = all files).
    #[serde(default)]
    pub file_extensions: Vec<String>,
    /// Whether matches can be fixed automatically.
    #[serde(default)]
    pub auto_fixable: bool,
}

#[derive(Debug)]
struct CompiledPattern {
    definition: PatternDefinition,
    regex: Regex,
    unless: Option<Regex>,
}

impl CompiledPattern {
    fn applies_to(&self, ext: Option<&str>) -> bool {
        let exts = &self.definition.file_extensions;
        exts.is_empty() || ext.is_some_and(|e| exts.iter().any(|x| x == e))
    }
}

/// Signature engine.
#[derive(Debug)]
pub struct PatternEngine {
    patterns: Vec<CompiledPattern>,
}

impl PatternEngine {
    /// Parses and compiles a signature list.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or regex compilation fails.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let definitions: Vec<PatternDefinition> = serde_json::from_str(json)?;
        let mut patterns = Vec::with_capacity(definitions.len());

        for def in definitions {
            let regex = Regex::new(&def.pattern)?;
            let unless = def.unless.as_deref().map(Regex::new).transpose()?;
            patterns.push(CompiledPattern {
                definition: def,
                regex,
                unless,
            });
        }

        Ok(Self { patterns })
    }

    /// Gets the global engine instance.
    #[must_use]
    pub fn global() -> &'static Self {
        &PATTERN_ENGINE
    }

    /// Scans one file with the signatures owned by `skill`.
    ///
    /// At most one finding is reported per signature and line.
    #[must_use]
    pub fn scan(&self, skill: &str, file: &SourceFile) -> Vec<Finding> {
        let ext = file.extension();
        let active: Vec<&CompiledPattern> = self
            .patterns
            .iter()
            .filter(|p| p.definition.skill == skill && p.applies_to(ext.as_deref()))
            .collect();
        if active.is_empty() {
            return Vec::new();
        }

        let mut findings = Vec::new();
        for (line_num, line) in file.content.lines().enumerate() {
            for compiled in &active {
                let Some(mat) = compiled.regex.find(line) else {
                    continue;
                };
                if compiled.unless.as_ref().is_some_and(|u| u.is_match(line)) {
                    continue;
                }

                tracing::debug!(
                    pattern_id = %compiled.definition.id,
                    file = %file.path,
                    line = line_num + 1,
                    "Signature matched"
                );

                let def = &compiled.definition;
                findings.push(
                    Finding::builder()
                        .category(def.category.clone())
                        .severity(def.severity)
                        .location(Location {
                            path: file.path.clone(),
                            line: line_num + 1,
                            column: Some(line[..mat.start()].chars().count() + 1),
                        })
                        .snippet(line.trim())
                        .description(def.description.clone())
                        .recommendation(category_recommendation(&def.category))
                        .maybe_standard_identifier(def.cwe.clone())
                        .auto_fixable(def.auto_fixable)
                        .build(),
                );
            }
        }

        findings
    }

    /// Number of signatures owned by `skill`.
    #[must_use]
    pub fn pattern_count(&self, skill: &str) -> usize {
        self.patterns
            .iter()
            .filter(|p| p.definition.skill == skill)
            .count()
    }

    /// Distinct skill names that own at least one signature, sorted.
    #[must_use]
    pub fn skills(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .patterns
            .iter()
            .map(|p| p.definition.skill.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::FileSet;

    fn scan(skill: &str, path: &str, content: &str) -> Vec<Finding> {
        let set = FileSet::from_sources([(path, content)]);
        PatternEngine::global().scan(skill, &set.files()[0])
    }

    #[test]
    fn test_embedded_patterns_load() {
        let engine = PatternEngine::from_json(PATTERNS_JSON).unwrap();
        assert!(engine.pattern_count("xssScanner") >= 6);
        assert_eq!(
            engine.skills(),
            vec![
                "corsChecker",
                "injectionScanner",
                "mobileScanner",
                "reactStandards",
                "secretScanner",
                "storageScanner",
                "xssScanner",
            ]
        );
    }

    #[test]
    fn test_dangerously_set_inner_html_is_single_critical() {
        let findings = scan(
            "xssScanner",
            "src/Card.jsx",
            "const a = 1;\n<div dangerouslySetInnerHTML={{__html: x}} />\n",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].category, "xss");
        assert_eq!(findings[0].location.line, 2);
        assert_eq!(findings[0].location.column, Some(6));
        assert_eq!(findings[0].standard_identifier.as_deref(), Some("CWE-79"));
    }

    #[test]
    fn test_file_extension_filtering() {
        let code = "element.innerHTML = userInput + '<div>';";
        assert_eq!(scan("xssScanner", "app.js", code).len(), 1);
        assert!(scan("xssScanner", "app.py", code).is_empty());
    }

    #[test]
    fn test_unless_suppresses_match() {
        let unsafe_link = r#"window.open(url, "_blank");"#;
        let safe_link = r#"window.open(url, "_blank", "noopener");"#;
        assert_eq!(scan("mobileScanner", "nav.ts", unsafe_link).len(), 1);
        assert!(scan("mobileScanner", "nav.ts", safe_link).is_empty());

        assert!(scan("reactStandards", "A.jsx", "import PropTypes from 'prop-types';").is_empty());
        assert_eq!(
            scan("reactStandards", "A.jsx", "Card.propTypes = { a: PropTypes.string };").len(),
            1
        );
    }

    #[test]
    fn test_secrets_in_any_file() {
        let findings = scan(
            "secretScanner",
            "settings.py",
            "API_KEY = \"sk-1234567890abcdef\"\npassword = 'hunter22'\n",
        );
        let ids: Vec<_> = findings.iter().map(|f| f.location.line).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(findings.iter().all(|f| f.category == "sensitiveDataExposure"));
    }

    #[test]
    fn test_cors_wildcard_header() {
        let findings = scan(
            "corsChecker",
            "server.js",
            "res.setHeader('Access-Control-Allow-Origin', '*');",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].standard_identifier.as_deref(), Some("CWE-942"));
    }

    #[test]
    fn test_python_injection() {
        let code = "subprocess.run(cmd, shell=True)\nos.system('rm ' + path)\ncursor.execute(f\"SELECT * FROM t WHERE id = {uid}\")\n";
        let findings = scan("injectionScanner", "tool.py", code);
        assert_eq!(findings.len(), 3);
    }

    #[test]
    fn test_no_false_positives_on_safe_code() {
        let safe = "const el = document.createElement('div');\nel.textContent = userInput;\nif (a == b) {}\n";
        assert!(scan("xssScanner", "safe.js", safe).is_empty());
    }
}
