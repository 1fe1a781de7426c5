// SPDX-License-Identifier: Apache-2.0

//! Per-run state shared by the skills of one workflow execution.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::config::IgnoreConfig;
use crate::error::WardenError;
use crate::files::FileSet;
use crate::finding::Finding;

/// How a skill failure is classified in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillErrorKind {
    /// The skill returned an error or panicked.
    Execution,
    /// The skill exceeded the workflow's time budget.
    Timeout,
}

/// A recorded, non-fatal skill failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillError {
    /// Failing skill.
    pub skill_name: String,
    /// Failure class.
    pub kind: SkillErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl SkillError {
    /// Classifies a skill's error.
    #[must_use]
    pub fn from_error(skill_name: &str, err: &WardenError) -> Self {
        let kind = match err {
            WardenError::Timeout { .. } => SkillErrorKind::Timeout,
            _ => SkillErrorKind::Execution,
        };
        let message = match err {
            WardenError::SkillExecution { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            skill_name: skill_name.to_string(),
            kind,
            message,
        }
    }
}

/// Mutable bag owned by one workflow execution.
///
/// The findings list is guarded by the aggregation lock; it is the only
/// shared mutable state while skills run.
#[derive(Debug)]
pub struct ExecutionContext {
    files: Arc<FileSet>,
    ignore: IgnoreConfig,
    accumulated: Mutex<Vec<Finding>>,
    skill_errors: Mutex<Vec<SkillError>>,
}

impl ExecutionContext {
    /// Creates a context over the files to scan.
    #[must_use]
    pub fn new(files: FileSet) -> Self {
        Self::with_ignore(files, IgnoreConfig::default())
    }

    /// Creates a context that drops findings matched by `ignore`.
    #[must_use]
    pub fn with_ignore(files: FileSet, ignore: IgnoreConfig) -> Self {
        Self {
            files: Arc::new(files),
            ignore,
            accumulated: Mutex::new(Vec::new()),
            skill_errors: Mutex::new(Vec::new()),
        }
    }

    /// Shared handle to the scanned files.
    #[must_use]
    pub fn files(&self) -> Arc<FileSet> {
        Arc::clone(&self.files)
    }

    /// Returns true if `finding` should be dropped.
    #[must_use]
    pub fn should_ignore(&self, finding: &Finding) -> bool {
        self.ignore.categories.contains(&finding.category)
            || self
                .ignore
                .paths
                .iter()
                .any(|prefix| finding.location.path.starts_with(prefix.as_str()))
    }

    /// Appends one skill's findings under the aggregation lock.
    ///
    /// Returns how many were kept after ignore rules.
    pub fn merge(&self, findings: Vec<Finding>) -> usize {
        let kept: Vec<Finding> = findings
            .into_iter()
            .filter(|f| !self.should_ignore(f))
            .collect();
        let count = kept.len();
        self.accumulated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(kept);
        count
    }

    /// Records a failed skill.
    pub fn record_error(&self, error: SkillError) {
        self.skill_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }

    /// Takes the accumulated findings and errors, leaving the context empty.
    #[must_use]
    pub fn take_parts(&self) -> (Vec<Finding>, Vec<SkillError>) {
        let findings = std::mem::take(
            &mut *self
                .accumulated
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let errors = std::mem::take(
            &mut *self
                .skill_errors
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        (findings, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{Location, Severity};

    fn finding(path: &str, category: &str) -> Finding {
        Finding::builder()
            .category(category)
            .severity(Severity::Low)
            .location(Location::new(path, 1))
            .snippet("s")
            .description("d")
            .recommendation("r")
            .build()
    }

    #[test]
    fn test_merge_applies_ignore_rules() {
        let ctx = ExecutionContext::with_ignore(
            FileSet::default(),
            IgnoreConfig {
                categories: vec!["mobileSpecific".to_string()],
                paths: vec!["vendor/".to_string()],
            },
        );

        let kept = ctx.merge(vec![
            finding("src/a.js", "xss"),
            finding("vendor/lib.js", "xss"),
            finding("src/b.js", "mobileSpecific"),
        ]);
        assert_eq!(kept, 1);

        let (findings, errors) = ctx.take_parts();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.path, "src/a.js");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_skill_error_classification() {
        let timeout = SkillError::from_error(
            "slow",
            &WardenError::Timeout {
                skill: "slow".to_string(),
                timeout_ms: 5,
            },
        );
        assert_eq!(timeout.kind, SkillErrorKind::Timeout);

        let failed = SkillError::from_error(
            "bad",
            &WardenError::SkillExecution {
                skill: "bad".to_string(),
                message: "boom".to_string(),
            },
        );
        assert_eq!(failed.kind, SkillErrorKind::Execution);
        assert_eq!(failed.message, "boom");
    }
}
