// SPDX-License-Identifier: Apache-2.0

//! CLI-specific error formatting with user-friendly hints.
//!
//! Downcasts `anyhow::Error` to `WardenError` and appends a tip per variant,
//! keeping presentation out of the library.

use anyhow::Error;
use warden_core::error::WardenError;

/// Formats an error for CLI display with helpful hints.
///
/// If the error chain does not contain a `WardenError`, returns the error
/// with its context chain.
pub fn format_error(error: &Error) -> String {
    let Some(warden_err) = error.chain().find_map(|e| e.downcast_ref::<WardenError>()) else {
        return format!("{error:#}");
    };

    match warden_err {
        WardenError::UnknownWorkflow { .. } => {
            format!("{warden_err}\n\nTip: Run `warden workflow list` to see available workflows.")
        }
        WardenError::UnknownSkill { .. } => {
            format!(
                "{warden_err}\n\nTip: Run `warden skill list` and check the skill names in your workflow."
            )
        }
        WardenError::DuplicateSkill { .. } => {
            format!("{warden_err}\n\nTip: Skill names must be unique.")
        }
        WardenError::WorkflowLoad { path, .. } => {
            format!(
                "{warden_err}\n\nTip: Check the workflow document at {}",
                path.display()
            )
        }
        WardenError::Config { .. } => {
            format!(
                "{warden_err}\n\nTip: Check your config file at {}",
                warden_core::config_file_path().display()
            )
        }
        WardenError::SchemaValidation { .. } => {
            format!(
                "{warden_err}\n\nTip: Strict mode is on; unset schemas.strict or drop --strict to write reports anyway."
            )
        }
        WardenError::SchemaNotFound { .. } => {
            format!(
                "{warden_err}\n\nTip: Built-in schemas are agent-output-schema, inter-agent-message-schema and security-output-schema."
            )
        }
        WardenError::InvalidMessage { .. } => {
            format!(
                "{warden_err}\n\nTip: Agent names use letters, digits, '_', '.' or '-' and payloads must be JSON objects."
            )
        }
        WardenError::MessageNotFound { .. } => {
            format!(
                "{warden_err}\n\nTip: Only received messages can be answered. Run `warden message receive` first."
            )
        }
        WardenError::Cancelled => format!("{warden_err}\n\nTip: The run was interrupted."),
        WardenError::SkillExecution { .. }
        | WardenError::Timeout { .. }
        | WardenError::Io(_)
        | WardenError::Json(_) => format!("{error:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_format_unknown_workflow() {
        let error = anyhow::Error::new(WardenError::UnknownWorkflow {
            name: "nope".to_string(),
        });
        let formatted = format_error(&error);

        assert!(formatted.contains("Unknown workflow: nope"));
        assert!(formatted.contains("warden workflow list"));
    }

    #[test]
    fn test_format_through_context() {
        let result: anyhow::Result<()> = Err(WardenError::MessageNotFound {
            id: "42".to_string(),
        })
        .context("Failed to reply");
        let formatted = format_error(&result.unwrap_err());

        assert!(formatted.contains("Message not found: 42"));
        assert!(formatted.contains("warden message receive"));
    }

    #[test]
    fn test_format_non_warden_error() {
        let error = anyhow::anyhow!("Some generic error");
        let formatted = format_error(&error);

        assert_eq!(formatted, "Some generic error");
    }
}
