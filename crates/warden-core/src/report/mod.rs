// SPDX-License-Identifier: Apache-2.0

//! Report artifacts.
//!
//! Renders an [`AgentOutput`] envelope into one or more files. Each format is
//! written independently through a temporary file that is persisted into
//! place, so a reader never sees a partial report and one failing format never
//! stops the others.

mod html;
mod markdown;
pub mod sarif;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::AgentOutput;
use crate::error::WardenError;
use crate::files::write_atomic;

pub use sarif::SarifReport;

/// Artifact file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// The envelope verbatim.
    Json,
    /// Human-readable Markdown.
    Markdown,
    /// Standalone HTML page.
    Html,
    /// SARIF 2.1.0 for code-scanning tools.
    Sarif,
}

impl ReportFormat {
    /// All formats.
    pub const ALL: [ReportFormat; 4] = [Self::Json, Self::Markdown, Self::Html, Self::Sarif];

    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Sarif => "sarif",
        }
    }

    /// File extension, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Sarif => "sarif",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s) || f.extension().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown report format: {s}"))
    }
}

/// A file produced from an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Artifact kind, always `report` for generated reports.
    #[serde(rename = "type")]
    pub artifact_type: String,
    /// File format.
    pub format: ReportFormat,
    /// Where the file is written.
    pub path: String,
}

/// One format that could not be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFailure {
    /// Format that failed.
    pub format: ReportFormat,
    /// Target path.
    pub path: String,
    /// What went wrong.
    pub message: String,
}

impl fmt::Display for ReportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} report {}: {}", self.format, self.path, self.message)
    }
}

/// Result of writing every requested format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOutcome {
    /// Files written.
    pub artifacts: Vec<Artifact>,
    /// Formats that failed.
    pub failures: Vec<ReportFailure>,
}

impl ReportOutcome {
    /// Returns true when every format was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes report files into one output directory.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    /// Creates a generator writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Computes the artifacts for `formats` without writing anything.
    ///
    /// Names are `<workflow>-<YYYYmmdd_HHMMSS>.<ext>` from the envelope's
    /// start time. Repeated formats are planned once.
    #[must_use]
    pub fn plan(&self, output: &AgentOutput, formats: &[ReportFormat]) -> Vec<Artifact> {
        let started = DateTime::parse_from_rfc3339(&output.execution.timestamp)
            .map_or_else(|_| Utc::now(), |t| t.with_timezone(&Utc));
        let stem = format!(
            "{}-{}",
            file_stem(&output.execution.workflow_name),
            started.format("%Y%m%d_%H%M%S")
        );

        let mut artifacts: Vec<Artifact> = Vec::with_capacity(formats.len());
        for &format in formats {
            if artifacts.iter().any(|a| a.format == format) {
                continue;
            }
            let path = self
                .output_dir
                .join(format!("{stem}.{}", format.extension()));
            artifacts.push(Artifact {
                artifact_type: "report".to_string(),
                format,
                path: path.display().to_string(),
            });
        }
        artifacts
    }

    /// Writes every artifact recorded in `output.results.artifacts`.
    ///
    /// Each format is attempted; failures are collected, not raised.
    pub fn write(&self, output: &AgentOutput) -> ReportOutcome {
        let mut outcome = ReportOutcome::default();
        let planned = &output.results.artifacts;
        if planned.is_empty() {
            return outcome;
        }

        if let Err(e) = std::fs::create_dir_all(&self.output_dir) {
            warn!(dir = %self.output_dir.display(), error = %e, "Cannot create report directory");
            outcome.failures = planned
                .iter()
                .map(|a| ReportFailure {
                    format: a.format,
                    path: a.path.clone(),
                    message: e.to_string(),
                })
                .collect();
            return outcome;
        }

        for artifact in planned {
            match render(artifact.format, output)
                .and_then(|body| write_atomic(Path::new(&artifact.path), body.as_bytes()))
            {
                Ok(()) => {
                    debug!(format = %artifact.format, path = %artifact.path, "Report written");
                    outcome.artifacts.push(artifact.clone());
                }
                Err(e) => {
                    warn!(format = %artifact.format, path = %artifact.path, error = %e, "Report failed");
                    outcome.failures.push(ReportFailure {
                        format: artifact.format,
                        path: artifact.path.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        outcome
    }
}

/// Renders one format to a string.
///
/// # Errors
///
/// Returns `WardenError::Json` if serialization fails.
pub fn render(format: ReportFormat, output: &AgentOutput) -> Result<String, WardenError> {
    Ok(match format {
        ReportFormat::Json => serde_json::to_string_pretty(output)?,
        ReportFormat::Markdown => markdown::render(output),
        ReportFormat::Html => html::render(output),
        ReportFormat::Sarif => serde_json::to_string_pretty(&SarifReport::from(output))?,
    })
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::aggregate::{
        AgentInfo, EnvelopeContext, ExecutionInfo, ExecutionStatus, FindingGroups, NextActions,
        Results,
    };
    use crate::finding::{Finding, Location, Severity};
    use serde_json::json;
    use std::collections::BTreeMap;

    pub(crate) fn sample_output() -> AgentOutput {
        let finding = Finding::builder()
            .category("xss")
            .severity(Severity::Critical)
            .location(Location::new("src/App.jsx", 10))
            .snippet("<div dangerouslySetInnerHTML={{__html: x}} />")
            .description("Unsanitized HTML injected via dangerouslySetInnerHTML")
            .recommendation("Sanitize user input and avoid raw HTML injection.")
            .standard_identifier("CWE-79")
            .build();
        AgentOutput {
            schema_version: "1.0.0".to_string(),
            agent: AgentInfo {
                name: "security-agent".to_string(),
                version: "0.3.0".to_string(),
                category: "security".to_string(),
            },
            execution: ExecutionInfo {
                timestamp: "2026-03-04T05:06:07+00:00".to_string(),
                duration_ms: 42,
                status: ExecutionStatus::Success,
                workflow_name: "security-audit".to_string(),
            },
            context: EnvelopeContext::default(),
            results: Results {
                data: json!({"score": 90}),
                artifacts: Vec::new(),
                metrics: BTreeMap::new(),
            },
            findings: FindingGroups {
                issues: vec![finding],
                ..FindingGroups::default()
            },
            recommendations: vec!["Sanitize user input and avoid raw HTML injection.".to_string()],
            next_actions: NextActions::default(),
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("md".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert_eq!("SARIF".parse::<ReportFormat>().unwrap(), ReportFormat::Sarif);
        assert!("pdf".parse::<ReportFormat>().is_err());
        assert_eq!(
            serde_json::to_string(&ReportFormat::Html).unwrap(),
            "\"html\""
        );
    }

    #[test]
    fn test_plan_names_and_dedupe() {
        let generator = ReportGenerator::new("out");
        let artifacts = generator.plan(
            &sample_output(),
            &[ReportFormat::Json, ReportFormat::Markdown, ReportFormat::Json],
        );
        assert_eq!(artifacts.len(), 2);
        assert!(artifacts[0].path.ends_with("security-audit-20260304_050607.json"));
        assert!(artifacts[1].path.ends_with("security-audit-20260304_050607.md"));
        assert_eq!(artifacts[0].artifact_type, "report");
    }

    #[test]
    fn test_write_every_format() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path().join("reports"));
        let output = sample_output();
        let planned = generator.plan(&output, &ReportFormat::ALL);
        let output = output.with_artifacts(planned);

        let outcome = generator.write(&output);
        assert!(outcome.is_complete(), "{:?}", outcome.failures);
        assert_eq!(outcome.artifacts.len(), 4);

        let json_path = &outcome.artifacts[0].path;
        let written: AgentOutput =
            serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(written, output);
    }

    #[test]
    fn test_failures_are_collected() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path());
        let mut artifacts = generator.plan(&sample_output(), &[ReportFormat::Json, ReportFormat::Html]);
        artifacts[0].path = dir
            .path()
            .join("missing")
            .join("x.json")
            .display()
            .to_string();
        let output = sample_output().with_artifacts(artifacts);

        let outcome = generator.write(&output);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].format, ReportFormat::Json);
        assert_eq!(outcome.artifacts.len(), 1);
        assert_eq!(outcome.artifacts[0].format, ReportFormat::Html);
    }
}
