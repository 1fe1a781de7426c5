// SPDX-License-Identifier: Apache-2.0

//! Result types returned by command handlers and rendered by `output`.

use serde::Serialize;
use warden_core::{AgentOutput, Message, ReportFailure, SkillInfo, Workflow};

/// Result of `warden run`.
///
/// Serializes as the envelope itself so JSON/YAML output can be consumed
/// like the JSON report.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct RunResult {
    /// The validated envelope.
    pub envelope: AgentOutput,
    /// Envelope validation errors (non-strict mode).
    #[serde(skip)]
    pub validation_errors: Vec<String>,
    /// Reports that could not be written.
    #[serde(skip)]
    pub report_failures: Vec<ReportFailure>,
    /// Recipient and id of the forwarded envelope.
    #[serde(skip)]
    pub sent: Option<(String, String)>,
    /// Whether the process should exit non-zero.
    #[serde(skip)]
    pub failed: bool,
}

/// Result of `warden skill list`.
#[derive(Debug, Serialize)]
pub struct SkillsResult {
    /// Registered skills in name order.
    pub skills: Vec<SkillInfo>,
}

/// Result of `warden workflow list`.
#[derive(Debug, Serialize)]
pub struct WorkflowsResult {
    /// Workflows in name order.
    pub workflows: Vec<Workflow>,
}

/// Result of `warden validate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResult {
    /// Validated file.
    pub file: String,
    /// Schema used, or `envelope` for the default envelope check.
    pub schema: String,
    /// Whether the document is valid.
    pub ok: bool,
    /// `path: message` per violation.
    pub errors: Vec<String>,
}

/// Result of `warden message send` and `warden message reply`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentResult {
    /// Id of the new message.
    pub message_id: String,
    /// Recipient, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_agent: Option<String>,
}

/// Result of `warden message receive`.
#[derive(Debug, Serialize)]
pub struct MessagesResult {
    /// Received messages, oldest first.
    pub messages: Vec<Message>,
}
