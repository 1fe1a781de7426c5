// SPDX-License-Identifier: Apache-2.0

//! SARIF (Static Analysis Results Interchange Format) output support.
//!
//! Converts an envelope's findings to SARIF 2.1.0 for GitHub Code Scanning
//! and other tools. Categories become rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::aggregate::AgentOutput;
use crate::finding::{Finding, Severity, category_recommendation};

const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";

/// SARIF report structure (SARIF 2.1.0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifReport {
    /// SARIF version.
    pub version: String,
    /// SARIF schema URI.
    #[serde(rename = "$schema")]
    pub schema: String,
    /// One run per envelope.
    pub runs: Vec<SarifRun>,
}

/// A single run of the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifRun {
    /// Tool information.
    pub tool: SarifTool,
    /// Findings.
    pub results: Vec<SarifResult>,
}

/// Tool information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifTool {
    /// The agent itself.
    pub driver: SarifDriver,
}

/// Tool driver information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifDriver {
    /// Agent name.
    pub name: String,
    /// Agent version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Information URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub information_uri: Option<String>,
    /// One rule per category present.
    #[serde(default)]
    pub rules: Vec<SarifRule>,
}

/// A rule, keyed by finding category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRule {
    /// Category name.
    pub id: String,
    /// Category recommendation.
    pub help: SarifMessage,
}

/// A single result (finding).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    /// Category that produced this result.
    pub rule_id: String,
    /// Result level (note, warning, error).
    pub level: String,
    /// Human-readable message.
    pub message: SarifMessage,
    /// Where the issue was found.
    pub locations: Vec<SarifLocation>,
    /// Stable fingerprint for deduplication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprints: Option<SarifFingerprints>,
    /// Extra finding fields such as the CWE identifier.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// Message structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifMessage {
    /// Message text.
    pub text: String,
}

/// Location information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    /// Physical location in source code.
    pub physical_location: SarifPhysicalLocation,
}

/// Physical location in source code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifPhysicalLocation {
    /// File location.
    pub artifact_location: SarifArtifactLocation,
    /// Line and column.
    pub region: SarifRegion,
}

/// Artifact location (file path).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifArtifactLocation {
    /// Path relative to the scan root.
    pub uri: String,
}

/// Region information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRegion {
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_column: Option<usize>,
    /// Matched source text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<SarifMessage>,
}

/// Fingerprints for deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifFingerprints {
    /// SHA-256 of `path:line:category`.
    #[serde(rename = "primaryLocationLineHash")]
    pub primary_location_line_hash: String,
}

impl From<&AgentOutput> for SarifReport {
    fn from(output: &AgentOutput) -> Self {
        let findings: Vec<&Finding> = output.findings.iter().collect();

        let mut rules: BTreeMap<&str, SarifRule> = BTreeMap::new();
        for finding in &findings {
            rules
                .entry(finding.category.as_str())
                .or_insert_with(|| SarifRule {
                    id: finding.category.clone(),
                    help: SarifMessage {
                        text: category_recommendation(&finding.category).to_string(),
                    },
                });
        }

        SarifReport {
            version: "2.1.0".to_string(),
            schema: SARIF_SCHEMA.to_string(),
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: output.agent.name.clone(),
                        version: Some(output.agent.version.clone()),
                        information_uri: Some(
                            "https://github.com/clouatre-labs/warden".to_string(),
                        ),
                        rules: rules.into_values().collect(),
                    },
                },
                results: findings.into_iter().map(SarifResult::from).collect(),
            }],
        }
    }
}

impl From<&Finding> for SarifResult {
    fn from(finding: &Finding) -> Self {
        let level = match finding.severity {
            Severity::Critical | Severity::High => "error",
            Severity::Medium => "warning",
            Severity::Low | Severity::Info => "note",
        };

        let mut properties = BTreeMap::new();
        properties.insert("severity".to_string(), finding.severity.to_string());
        if let Some(id) = &finding.standard_identifier {
            properties.insert("standardIdentifier".to_string(), id.clone());
        }

        SarifResult {
            rule_id: finding.category.clone(),
            level: level.to_string(),
            message: SarifMessage {
                text: finding.description.clone(),
            },
            locations: vec![SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifactLocation {
                        uri: finding.location.path.clone(),
                    },
                    region: SarifRegion {
                        start_line: finding.location.line,
                        start_column: finding.location.column,
                        snippet: (!finding.snippet.is_empty()).then(|| SarifMessage {
                            text: finding.snippet.clone(),
                        }),
                    },
                },
            }],
            fingerprints: Some(SarifFingerprints {
                primary_location_line_hash: fingerprint(finding),
            }),
            properties,
        }
    }
}

fn fingerprint(finding: &Finding) -> String {
    let input = format!(
        "{}:{}:{}",
        finding.location.path, finding.location.line, finding.category
    );
    hex::encode(Sha256::digest(input.as_bytes()))
}
