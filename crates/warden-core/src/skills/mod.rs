// SPDX-License-Identifier: Apache-2.0

//! Skills: named, stateless scanners over a shared file set.
//!
//! A skill receives a read-only [`SkillContext`] and returns its findings.
//! Skills never touch the registry or each other; identical input always
//! yields identical output.

pub mod document;
pub mod pattern;
pub mod patterns;
pub mod registry;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::WardenError;
use crate::files::FileSet;
use crate::finding::Finding;

pub use document::{CspValidator, CsrfValidator, ReactStandards};
pub use pattern::PatternSkill;
pub use patterns::{PatternDefinition, PatternEngine};
pub use registry::SkillRegistry;

/// Capability every built-in skill needs.
pub const READ_FILES: &str = "read_files";

/// Input handed to a skill.
#[derive(Debug, Clone)]
pub struct SkillContext {
    files: Arc<FileSet>,
    cancel: CancellationToken,
}

impl SkillContext {
    /// Creates a context over `files`; `cancel` fires on timeout or abort.
    #[must_use]
    pub fn new(files: Arc<FileSet>, cancel: CancellationToken) -> Self {
        Self { files, cancel }
    }

    /// The files to scan.
    #[must_use]
    pub fn files(&self) -> &FileSet {
        &self.files
    }

    /// Fails with `Cancelled` once the run or this skill was cancelled.
    ///
    /// Skills call this between files so a timeout stops the scan promptly.
    pub fn checkpoint(&self) -> Result<(), WardenError> {
        if self.cancel.is_cancelled() {
            Err(WardenError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A named scanning function.
pub trait Skill: Send + Sync {
    /// Unique registry key.
    fn name(&self) -> &str;

    /// One-line summary.
    fn description(&self) -> &str;

    /// Primary category of the findings this skill emits.
    fn category(&self) -> &str;

    /// Capabilities the skill relies on.
    fn required_capabilities(&self) -> Vec<String> {
        vec![READ_FILES.to_string()]
    }

    /// Static configuration, reported in listings.
    fn config(&self) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }

    /// Scans the context's files.
    ///
    /// Runs on a blocking thread that cannot be interrupted. Implementations
    /// must call [`SkillContext::checkpoint`] between files and return its
    /// error, otherwise a timed-out or cancelled skill keeps its thread busy
    /// until it finishes and delays runtime shutdown.
    fn run(&self, ctx: &SkillContext) -> Result<Vec<Finding>, WardenError>;
}

impl fmt::Debug for dyn Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Skill")
            .field("name", &self.name())
            .field("category", &self.category())
            .finish()
    }
}

/// Serializable description of a registered skill.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillInfo {
    /// Skill name.
    pub name: String,
    /// One-line summary.
    pub description: String,
    /// Primary category.
    pub category: String,
    /// Required capabilities.
    pub required_capabilities: Vec<String>,
    /// Static configuration.
    pub config: BTreeMap<String, Value>,
}

impl From<&dyn Skill> for SkillInfo {
    fn from(skill: &dyn Skill) -> Self {
        Self {
            name: skill.name().to_string(),
            description: skill.description().to_string(),
            category: skill.category().to_string(),
            required_capabilities: skill.required_capabilities(),
            config: skill.config(),
        }
    }
}

/// The built-in skills, in registration order.
#[must_use]
pub fn builtin_skills() -> Vec<Arc<dyn Skill>> {
    vec![
        Arc::new(PatternSkill::new(
            "xssScanner",
            "Detects DOM and React cross-site scripting sinks",
            "xss",
        )),
        Arc::new(PatternSkill::new(
            "secretScanner",
            "Detects hardcoded API keys, passwords and tokens",
            "sensitiveDataExposure",
        )),
        Arc::new(PatternSkill::new(
            "storageScanner",
            "Detects sensitive values kept in web storage",
            "insecureStorage",
        )),
        Arc::new(PatternSkill::new(
            "corsChecker",
            "Detects wildcard CORS origins",
            "cors",
        )),
        Arc::new(PatternSkill::new(
            "mobileScanner",
            "Detects mobile web accessibility and tab-nabbing issues",
            "mobileSpecific",
        )),
        Arc::new(PatternSkill::new(
            "injectionScanner",
            "Detects shell and SQL command construction from strings",
            "injection",
        )),
        Arc::new(CsrfValidator),
        Arc::new(CspValidator),
        Arc::new(ReactStandards),
    ]
}
