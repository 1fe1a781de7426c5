// SPDX-License-Identifier: Apache-2.0

//! Workflow execution.
//!
//! Resolves a workflow's skills, runs them against one [`ExecutionContext`]
//! (sequentially, or on a bounded pool when the workflow is parallel), and
//! returns the merged, sorted findings with per-skill outcomes.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::context::{ExecutionContext, SkillError};
use super::definition::{Workflow, WorkflowCatalog};
use crate::error::WardenError;
use crate::finding::{Finding, Severity, sort_findings};
use crate::skills::{Skill, SkillContext, SkillRegistry};

/// How one skill's invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillOutcome {
    /// Findings were merged.
    Succeeded,
    /// The skill returned an error or panicked.
    Failed,
    /// The skill exceeded its budget and was cancelled.
    TimedOut,
    /// The whole run was cancelled before the skill finished.
    Cancelled,
}

/// Per-skill summary of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillReport {
    /// Skill name.
    pub name: String,
    /// Findings merged after ignore rules.
    pub findings: usize,
    /// Wall-clock time spent on the skill.
    pub duration_ms: u64,
    /// How the invocation ended.
    pub outcome: SkillOutcome,
}

/// Everything one workflow execution produced.
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    /// The executed workflow.
    pub workflow: Arc<Workflow>,
    /// When execution started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
    /// Merged findings, sorted by path, line and the remaining fields.
    pub findings: Vec<Finding>,
    /// Failed skills, in workflow order.
    pub skill_errors: Vec<SkillError>,
    /// One entry per skill, in workflow order.
    pub skill_reports: Vec<SkillReport>,
    /// Number of files scanned.
    pub files_scanned: usize,
    /// Number of files selected by each include pattern.
    pub files_by_pattern: BTreeMap<String, usize>,
    /// Whether the run was cancelled from outside.
    pub cancelled: bool,
}

impl WorkflowRun {
    /// Returns true if at least one critical finding exists.
    #[must_use]
    pub fn has_critical(&self) -> bool {
        self.findings
            .iter()
            .any(|f| f.severity == Severity::Critical)
    }
}

/// Runs workflows from a catalog against a registry.
#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    registry: Arc<SkillRegistry>,
    catalog: Arc<WorkflowCatalog>,
    max_workers: usize,
    default_timeout_ms: u64,
}

impl WorkflowEngine {
    /// Creates an engine. `max_workers` bounds parallel workflows and is
    /// clamped to at least one.
    #[must_use]
    pub fn new(
        registry: Arc<SkillRegistry>,
        catalog: Arc<WorkflowCatalog>,
        max_workers: usize,
        default_timeout_ms: u64,
    ) -> Self {
        Self {
            registry,
            catalog,
            max_workers: max_workers.max(1),
            default_timeout_ms,
        }
    }

    /// The workflow catalog.
    #[must_use]
    pub fn catalog(&self) -> &WorkflowCatalog {
        &self.catalog
    }

    /// Executes the named workflow.
    ///
    /// Skill failures and timeouts are recorded in the result, never returned
    /// as errors. Cancelling `cancel` stops pending skills and drops the
    /// findings of in-flight ones; anything already merged is kept.
    ///
    /// # Errors
    ///
    /// Returns `UnknownWorkflow` or `UnknownSkill` before any skill runs.
    pub async fn execute(
        &self,
        workflow_name: &str,
        ctx: ExecutionContext,
        cancel: &CancellationToken,
    ) -> Result<WorkflowRun, WardenError> {
        let workflow = self.catalog.get(workflow_name)?;
        self.execute_workflow(workflow, ctx, cancel).await
    }

    /// Executes a workflow that need not be in the catalog, such as a catalog
    /// entry with overridden settings.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSkill` before any skill runs.
    pub async fn execute_workflow(
        &self,
        workflow: Arc<Workflow>,
        ctx: ExecutionContext,
        cancel: &CancellationToken,
    ) -> Result<WorkflowRun, WardenError> {
        let skills = workflow
            .skill_names
            .iter()
            .map(|name| self.registry.get(name))
            .collect::<Result<Vec<_>, _>>()?;

        let timeout_ms = workflow
            .config
            .timeout_ms
            .unwrap_or(self.default_timeout_ms);
        let workers = if workflow.config.parallel {
            self.max_workers
        } else {
            1
        };

        let files = ctx.files();
        let ctx = Arc::new(ctx);
        let started_at = Utc::now();
        let start = Instant::now();
        info!(
            workflow = %workflow.name,
            skills = skills.len(),
            files = files.len(),
            workers,
            "Workflow started"
        );

        let mut reports: Vec<(usize, SkillReport)> = stream::iter(skills.into_iter().enumerate())
            .map(|(idx, skill)| {
                let ctx = Arc::clone(&ctx);
                let cancel = cancel.clone();
                async move { (idx, run_skill(skill, ctx, cancel, timeout_ms).await) }
            })
            .buffer_unordered(workers)
            .collect()
            .await;
        reports.sort_by_key(|(idx, _)| *idx);

        let (mut findings, mut skill_errors) = ctx.take_parts();
        sort_findings(&mut findings);
        let position = |name: &str| workflow.skill_names.iter().position(|n| n == name);
        skill_errors.sort_by_key(|e| position(&e.skill_name));

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let cancelled = cancel.is_cancelled();
        info!(
            workflow = %workflow.name,
            findings = findings.len(),
            skill_errors = skill_errors.len(),
            duration_ms,
            cancelled,
            "Workflow finished"
        );

        Ok(WorkflowRun {
            files_scanned: files.len(),
            files_by_pattern: files
                .files_by_pattern()
                .into_iter()
                .map(|(pattern, paths)| (pattern.to_string(), paths.len()))
                .collect(),
            workflow,
            started_at,
            duration_ms,
            findings,
            skill_errors,
            skill_reports: reports.into_iter().map(|(_, r)| r).collect(),
            cancelled,
        })
    }
}

async fn run_skill(
    skill: Arc<dyn Skill>,
    ctx: Arc<ExecutionContext>,
    cancel: CancellationToken,
    timeout_ms: u64,
) -> SkillReport {
    let name = skill.name().to_string();
    let start = Instant::now();
    let report = |outcome, findings| SkillReport {
        name: name.clone(),
        findings,
        duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        outcome,
    };

    if cancel.is_cancelled() {
        debug!(skill = %name, "Skipping skill, run cancelled");
        return report(SkillOutcome::Cancelled, 0);
    }

    let skill_cancel = cancel.child_token();
    let skill_ctx = SkillContext::new(ctx.files(), skill_cancel.clone());
    let task = tokio::task::spawn_blocking(move || skill.run(&skill_ctx));

    let result = tokio::select! {
        () = cancel.cancelled() => {
            skill_cancel.cancel();
            Err(WardenError::Cancelled)
        }
        joined = tokio::time::timeout(Duration::from_millis(timeout_ms), task) => match joined {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(WardenError::SkillExecution {
                skill: name.clone(),
                message: format!("skill panicked: {join_err}"),
            }),
            Err(_) => {
                skill_cancel.cancel();
                Err(WardenError::Timeout {
                    skill: name.clone(),
                    timeout_ms,
                })
            }
        },
    };

    match result {
        Ok(findings) => {
            let kept = ctx.merge(findings);
            debug!(skill = %name, findings = kept, "Skill finished");
            report(SkillOutcome::Succeeded, kept)
        }
        Err(WardenError::Cancelled) if cancel.is_cancelled() => {
            debug!(skill = %name, "Skill cancelled");
            report(SkillOutcome::Cancelled, 0)
        }
        Err(err) => {
            warn!(skill = %name, error = %err, "Skill failed");
            let outcome = if matches!(err, WardenError::Timeout { .. }) {
                SkillOutcome::TimedOut
            } else {
                SkillOutcome::Failed
            };
            ctx.record_error(SkillError::from_error(&name, &err));
            report(outcome, 0)
        }
    }
}
