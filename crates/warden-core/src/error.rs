// SPDX-License-Identifier: Apache-2.0

//! Error types for Warden.
//!
//! Uses `thiserror` for deriving `std::error::Error` implementations.
//! Application code should use `anyhow::Result` for top-level error handling.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during Warden operations.
#[derive(Error, Debug)]
pub enum WardenError {
    /// A workflow or caller referenced a skill that is not registered.
    #[error("Unknown skill: {name}")]
    UnknownSkill {
        /// Requested skill name.
        name: String,
    },

    /// A skill with the same name is already registered.
    #[error("Skill already registered: {name}")]
    DuplicateSkill {
        /// Conflicting skill name.
        name: String,
    },

    /// A skill failed while scanning. Recorded per skill, never fatal to a run.
    #[error("Skill {skill} failed: {message}")]
    SkillExecution {
        /// Name of the failing skill.
        skill: String,
        /// Failure description.
        message: String,
    },

    /// A skill exceeded the workflow's time budget.
    #[error("Skill {skill} timed out after {timeout_ms}ms")]
    Timeout {
        /// Name of the skill that was cancelled.
        skill: String,
        /// Budget that was exceeded.
        timeout_ms: u64,
    },

    /// A document failed schema validation.
    #[error("Document does not match schema {schema}: {errors}")]
    SchemaValidation {
        /// Schema the document was checked against.
        schema: String,
        /// All validation errors, concatenated.
        errors: String,
    },

    /// No schema with the requested name could be loaded.
    #[error("Schema not found: {name}")]
    SchemaNotFound {
        /// Requested schema name.
        name: String,
    },

    /// A message failed validation before it was written.
    #[error("Invalid message: {errors}")]
    InvalidMessage {
        /// All validation errors, concatenated.
        errors: String,
    },

    /// A message id that is not in the mailbox.
    #[error("Message not found: {id}")]
    MessageNotFound {
        /// Requested message id.
        id: String,
    },

    /// A workflow document could not be loaded.
    #[error("Failed to load workflow {}: {message}", path.display())]
    WorkflowLoad {
        /// Document that failed to load.
        path: PathBuf,
        /// Parse or validation failure.
        message: String,
    },

    /// A workflow name that is not in the catalog.
    #[error("Unknown workflow: {name}")]
    UnknownWorkflow {
        /// Requested workflow name.
        name: String,
    },

    /// Configuration file error.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// The run was cancelled before completion.
    #[error("Operation cancelled")]
    Cancelled,

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WardenError {
    /// Returns true for errors that indicate a broken deployment rather than
    /// a problem with the scanned files.
    #[must_use]
    pub fn is_load_time(&self) -> bool {
        matches!(
            self,
            Self::UnknownSkill { .. }
                | Self::DuplicateSkill { .. }
                | Self::WorkflowLoad { .. }
                | Self::UnknownWorkflow { .. }
                | Self::Config { .. }
        )
    }
}

impl From<config::ConfigError> for WardenError {
    fn from(err: config::ConfigError) -> Self {
        WardenError::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = WardenError::Timeout {
            skill: "xssScanner".to_string(),
            timeout_ms: 250,
        };
        assert_eq!(err.to_string(), "Skill xssScanner timed out after 250ms");
    }

    #[test]
    fn test_load_time_classification() {
        assert!(
            WardenError::UnknownSkill {
                name: "nope".to_string()
            }
            .is_load_time()
        );
        assert!(
            !WardenError::SkillExecution {
                skill: "a".to_string(),
                message: "b".to_string()
            }
            .is_load_time()
        );
        assert!(!WardenError::Cancelled.is_load_time());
    }
}
