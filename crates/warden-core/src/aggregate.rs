// SPDX-License-Identifier: Apache-2.0

//! Output aggregation and scoring.
//!
//! Turns a [`WorkflowRun`] into the standardized [`AgentOutput`] envelope that
//! is validated, written as reports and exchanged between agents.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::{AgentConfig, NextActionsConfig, ScoringConfig};
use crate::error::WardenError;
use crate::finding::{Finding, Severity, category_recommendation};
use crate::report::Artifact;
use crate::workflow::{SkillError, SkillReport, WorkflowRun};

/// Envelope schema version written by this crate.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Every skill succeeded.
    Success,
    /// Some skills failed or the run was cancelled.
    Partial,
    /// Every skill failed.
    Failed,
}

impl ExecutionStatus {
    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Agent identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Agent name.
    pub name: String,
    /// Agent version.
    pub version: String,
    /// Agent category.
    pub category: String,
}

/// Execution metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionInfo {
    /// RFC 3339 start time.
    pub timestamp: String,
    /// Wall-clock duration.
    pub duration_ms: u64,
    /// Overall outcome.
    pub status: ExecutionStatus,
    /// Executed workflow.
    pub workflow_name: String,
}

/// What the run was asked to do.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeContext {
    /// Caller-supplied input (scan root, globs).
    pub input: Value,
    /// Run metadata.
    pub metadata: Value,
}

/// Category-specific results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Results {
    /// Category payload; shape given by the category extension schema.
    pub data: Value,
    /// Written report files.
    pub artifacts: Vec<Artifact>,
    /// Numeric run metrics.
    pub metrics: BTreeMap<String, Value>,
}

/// Findings grouped by urgency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingGroups {
    /// Critical and high findings.
    pub issues: Vec<Finding>,
    /// Medium and low findings.
    pub warnings: Vec<Finding>,
    /// Informational findings.
    pub info: Vec<Finding>,
}

impl FindingGroups {
    /// Splits sorted findings by severity, keeping their order.
    #[must_use]
    pub fn split(findings: &[Finding]) -> Self {
        let mut groups = Self::default();
        for finding in findings {
            let bucket = match finding.severity {
                Severity::Critical | Severity::High => &mut groups.issues,
                Severity::Medium | Severity::Low => &mut groups.warnings,
                Severity::Info => &mut groups.info,
            };
            bucket.push(finding.clone());
        }
        groups
    }

    /// Every finding, issues first.
    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.issues
            .iter()
            .chain(&self.warnings)
            .chain(&self.info)
    }
}

/// Follow-up suggestions for orchestrators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextActions {
    /// Agents worth running next.
    pub suggested_agents: Vec<String>,
    /// Skills required to act on the findings.
    pub required_skills: Vec<String>,
}

/// The standardized output envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentOutput {
    /// Envelope schema version.
    pub schema_version: String,
    /// Producing agent.
    pub agent: AgentInfo,
    /// Execution metadata.
    pub execution: ExecutionInfo,
    /// Run input and metadata.
    pub context: EnvelopeContext,
    /// Category payload, artifacts and metrics.
    pub results: Results,
    /// Findings grouped by urgency.
    pub findings: FindingGroups,
    /// One fixed recommendation per category present.
    pub recommendations: Vec<String>,
    /// Follow-up suggestions.
    pub next_actions: NextActions,
}

impl AgentOutput {
    /// Records the artifacts that will be written for this envelope.
    ///
    /// Call before validation; the envelope is not modified afterwards.
    #[must_use]
    pub fn with_artifacts(mut self, artifacts: Vec<Artifact>) -> Self {
        self.results.artifacts = artifacts;
        self
    }

    /// Severity counts over all grouped findings.
    #[must_use]
    pub fn severity_counts(&self) -> SeverityCounts {
        SeverityCounts::tally(self.findings.iter())
    }

    /// Returns true if any critical finding exists.
    #[must_use]
    pub fn has_critical(&self) -> bool {
        self.findings
            .issues
            .iter()
            .any(|f| f.severity == Severity::Critical)
    }

    /// The score recorded in `results.data`, if any.
    #[must_use]
    pub fn score(&self) -> Option<u64> {
        self.results.data.get("score").and_then(Value::as_u64)
    }
}

/// Number of findings per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Critical findings.
    pub critical: usize,
    /// High findings.
    pub high: usize,
    /// Medium findings.
    pub medium: usize,
    /// Low findings.
    pub low: usize,
    /// Informational findings.
    pub info: usize,
    /// All findings.
    pub total: usize,
}

impl SeverityCounts {
    /// Counts in a single pass.
    pub fn tally<'a>(findings: impl IntoIterator<Item = &'a Finding>) -> Self {
        let mut counts = Self::default();
        for finding in findings {
            match finding.severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
                Severity::Info => counts.info += 1,
            }
            counts.total += 1;
        }
        counts
    }

    /// Count for one severity.
    #[must_use]
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Info => self.info,
        }
    }
}

/// Severity-weighted score policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoringPolicy {
    weights: ScoringConfig,
}

impl ScoringPolicy {
    /// Creates a policy with the given weights.
    #[must_use]
    pub fn new(weights: ScoringConfig) -> Self {
        Self { weights }
    }

    /// `max(0, 100 - sum of weights)` over every finding, uncapped per category.
    #[must_use]
    pub fn score(&self, findings: &[Finding]) -> u8 {
        let deduction: u64 = findings
            .iter()
            .map(|f| u64::from(self.weights.weight(f.severity)))
            .sum();
        u8::try_from(100_u64.saturating_sub(deduction)).unwrap_or(0)
    }
}

/// Builds envelopes.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    agent: AgentConfig,
    scoring: ScoringPolicy,
    next_actions: NextActionsConfig,
}

impl Aggregator {
    /// Creates an aggregator.
    #[must_use]
    pub fn new(agent: AgentConfig, scoring: ScoringConfig, next_actions: NextActionsConfig) -> Self {
        Self {
            agent,
            scoring: ScoringPolicy::new(scoring),
            next_actions,
        }
    }

    /// Merges a run into an envelope.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::Json` if the category payload cannot be encoded.
    pub fn aggregate(&self, run: &WorkflowRun, input: Value) -> Result<AgentOutput, WardenError> {
        let counts = SeverityCounts::tally(&run.findings);
        let score = self.scoring.score(&run.findings);
        let status = execution_status(run);

        let mut categories: BTreeMap<&str, usize> = BTreeMap::new();
        for finding in &run.findings {
            *categories.entry(finding.category.as_str()).or_default() += 1;
        }

        let data = serde_json::to_value(SecurityData {
            score,
            severity_counts: counts,
            categories: &categories,
            skills: &run.skill_reports,
            skill_errors: &run.skill_errors,
            files_scanned: run.files_scanned,
        })?;

        let skills_failed = run.skill_errors.len();
        let metrics = BTreeMap::from([
            ("durationMs".to_string(), json!(run.duration_ms)),
            ("filesScanned".to_string(), json!(run.files_scanned)),
            ("findingsTotal".to_string(), json!(counts.total)),
            ("skillsExecuted".to_string(), json!(run.skill_reports.len())),
            ("skillsFailed".to_string(), json!(skills_failed)),
        ]);

        Ok(AgentOutput {
            schema_version: SCHEMA_VERSION.to_string(),
            agent: AgentInfo {
                name: self.agent.name.clone(),
                version: self.agent.version.clone(),
                category: self.agent.category.clone(),
            },
            execution: ExecutionInfo {
                timestamp: run.started_at.to_rfc3339(),
                duration_ms: run.duration_ms,
                status,
                workflow_name: run.workflow.name.clone(),
            },
            context: EnvelopeContext {
                input,
                metadata: json!({
                    "workflowDescription": run.workflow.description,
                    "filesByPattern": run.files_by_pattern,
                    "cancelled": run.cancelled,
                }),
            },
            results: Results {
                data,
                artifacts: Vec::new(),
                metrics,
            },
            findings: FindingGroups::split(&run.findings),
            recommendations: recommendations(&run.findings),
            next_actions: self.next_actions_for(&counts),
        })
    }

    fn next_actions_for(&self, counts: &SeverityCounts) -> NextActions {
        let mut actions = NextActions::default();
        if counts.total > 0 {
            actions
                .suggested_agents
                .push(self.next_actions.peer_audit_agent.clone());
        }
        if counts.critical > 0 {
            actions
                .required_skills
                .push(self.next_actions.auto_fix_skill.clone());
        }
        actions
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SecurityData<'a> {
    score: u8,
    severity_counts: SeverityCounts,
    categories: &'a BTreeMap<&'a str, usize>,
    skills: &'a [SkillReport],
    skill_errors: &'a [SkillError],
    files_scanned: usize,
}

fn execution_status(run: &WorkflowRun) -> ExecutionStatus {
    if run.cancelled {
        ExecutionStatus::Partial
    } else if run.skill_errors.is_empty() {
        ExecutionStatus::Success
    } else if run.skill_errors.len() >= run.workflow.skill_names.len() {
        ExecutionStatus::Failed
    } else {
        ExecutionStatus::Partial
    }
}

/// One recommendation per category with at least one finding, in category
/// order. A pure function of the category set.
#[must_use]
pub fn recommendations(findings: &[Finding]) -> Vec<String> {
    findings
        .iter()
        .map(|f| f.category.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|c| category_recommendation(c).to_string())
        .collect()
}
