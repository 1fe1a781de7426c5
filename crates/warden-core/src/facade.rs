// SPDX-License-Identifier: Apache-2.0

//! Platform-agnostic facade functions for CLI integration.
//!
//! Each function wires the registry, workflow catalog, engine, aggregator,
//! validator, report generator and messenger from one [`AppConfig`], so
//! front ends only parse arguments and render results.

use std::path::PathBuf;
use std::sync::Arc;

use bon::Builder;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::aggregate::{AgentOutput, Aggregator};
use crate::config::AppConfig;
use crate::error::WardenError;
use crate::files::FileSet;
use crate::messaging::{AgentMessenger, FsMailbox, Message, MessageType};
use crate::report::{ReportFormat, ReportGenerator, ReportOutcome};
use crate::schema::{SchemaValidator, ValidationReport};
use crate::skills::{SkillInfo, SkillRegistry};
use crate::workflow::{ExecutionContext, Workflow, WorkflowCatalog, WorkflowConfig, WorkflowEngine};

/// What to audit and how.
#[derive(Debug, Clone, Builder)]
pub struct AuditRequest {
    /// Workflow to execute.
    #[builder(into)]
    pub workflow: String,
    /// Scan root.
    #[builder(into, default = PathBuf::from("."))]
    pub root: PathBuf,
    /// Include globs; the configured list applies when empty.
    #[builder(default)]
    pub include: Vec<String>,
    /// Exclude globs; the configured list applies when empty.
    #[builder(default)]
    pub exclude: Vec<String>,
    /// Report directory; the configured one applies when absent.
    #[builder(into)]
    pub out_dir: Option<PathBuf>,
    /// Report formats; the workflow's apply when empty.
    #[builder(default)]
    pub formats: Vec<ReportFormat>,
    /// Fail on critical findings even if the workflow does not.
    #[builder(default)]
    pub exit_on_critical: bool,
    /// Run the workflow's skills concurrently even if it is sequential.
    #[builder(default)]
    pub parallel: bool,
    /// Refuse to write reports for an envelope that fails validation.
    #[builder(default)]
    pub strict: bool,
    /// Forward the envelope to this agent's inbox.
    #[builder(into)]
    pub send_to: Option<String>,
}

/// Everything one audit produced.
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    /// The validated envelope, with its planned artifacts.
    pub output: AgentOutput,
    /// Validation result for the envelope.
    pub validation: ValidationReport,
    /// Written reports and per-format failures.
    pub reports: ReportOutcome,
    /// Whether critical findings should fail the run.
    pub exit_on_critical: bool,
    /// Id of the forwarded message, if any.
    pub sent_message: Option<Uuid>,
}

impl AuditOutcome {
    /// Returns true when the caller should exit non-zero.
    #[must_use]
    pub fn should_fail(&self) -> bool {
        self.exit_on_critical && self.output.has_critical()
    }
}

/// Runs an audit end to end: collect files, execute the workflow, aggregate,
/// validate, write reports and optionally forward the envelope.
///
/// # Errors
///
/// Fails on load-time errors (unknown workflow or skill, malformed workflow
/// document, bad globs, missing scan root), on strict-mode validation
/// failures, and when forwarding the envelope fails. Skill failures are
/// recorded in the envelope instead.
#[instrument(skip_all, fields(workflow = %request.workflow))]
pub async fn run_audit(
    config: &AppConfig,
    request: AuditRequest,
    cancel: &CancellationToken,
) -> crate::Result<AuditOutcome> {
    let registry = Arc::new(SkillRegistry::with_builtin());
    let catalog = Arc::new(WorkflowCatalog::load(
        config.workflows.dir.as_deref(),
        &registry,
    )?);
    let workflow = effective_workflow(&catalog, &request)?;

    let include = non_empty_or(&request.include, &config.scan.include);
    let exclude = non_empty_or(&request.exclude, &config.scan.exclude);
    let files = FileSet::collect(&request.root, include, exclude, config.scan.max_file_bytes)?;
    info!(files = files.len(), root = %request.root.display(), "Collected scan targets");

    let engine = WorkflowEngine::new(
        registry,
        catalog,
        config.execution.max_workers,
        config.execution.default_timeout_ms,
    );
    let ctx = ExecutionContext::with_ignore(files, config.ignore.clone());
    let run = engine
        .execute_workflow(Arc::clone(&workflow), ctx, cancel)
        .await?;

    let aggregator = Aggregator::new(
        config.agent.clone(),
        config.scoring,
        config.next_actions.clone(),
    );
    let input = json!({
        "path": request.root.display().to_string(),
        "include": include,
        "exclude": exclude,
    });
    let output = aggregator.aggregate(&run, input)?;

    let generator = ReportGenerator::new(
        request
            .out_dir
            .clone()
            .unwrap_or_else(|| config.report.output_dir.clone()),
    );
    let planned = generator.plan(&output, &workflow.config.report_formats);
    let output = output.with_artifacts(planned);

    let mut owned = None;
    let validator = configured_validator(config, &mut owned);
    let envelope = serde_json::to_value(&output)?;
    let validation = validator.validate_envelope(&envelope)?;
    if !validation.ok {
        for error in &validation.errors {
            warn!(path = %error.path, message = %error.message, "Envelope validation error");
        }
        if request.strict || config.schemas.strict {
            return Err(WardenError::SchemaValidation {
                schema: crate::schema::AGENT_OUTPUT_SCHEMA.to_string(),
                errors: validation.joined(),
            });
        }
    }

    let reports = generator.write(&output);

    let sent_message = match &request.send_to {
        Some(to) => {
            let messenger = AgentMessenger::new(
                config.agent.name.as_str(),
                FsMailbox::new(&config.messages.dir),
                validator,
            )?;
            Some(messenger.send(to, MessageType::Notification, envelope, None)?)
        }
        None => None,
    };

    Ok(AuditOutcome {
        exit_on_critical: request.exit_on_critical || workflow.config.exit_on_critical,
        output,
        validation,
        reports,
        sent_message,
    })
}

fn effective_workflow(
    catalog: &WorkflowCatalog,
    request: &AuditRequest,
) -> Result<Arc<Workflow>, WardenError> {
    let workflow = catalog.get(&request.workflow)?;
    if !request.parallel && request.formats.is_empty() {
        return Ok(workflow);
    }
    let base = &workflow.config;
    Ok(Arc::new(Workflow {
        config: WorkflowConfig {
            parallel: base.parallel || request.parallel,
            report_formats: if request.formats.is_empty() {
                base.report_formats.clone()
            } else {
                request.formats.clone()
            },
            ..base.clone()
        },
        ..(*workflow).clone()
    }))
}

/// The validator for `config`: the process-wide one over the embedded
/// schemas, or a fresh one stored in `owned` when a schema dir is configured.
fn configured_validator<'a>(
    config: &AppConfig,
    owned: &'a mut Option<SchemaValidator>,
) -> &'a SchemaValidator {
    match &config.schemas.dir {
        Some(dir) => &*owned.insert(SchemaValidator::with_dir(dir)),
        None => SchemaValidator::global(),
    }
}

fn non_empty_or<'a>(requested: &'a [String], configured: &'a [String]) -> &'a [String] {
    if requested.is_empty() {
        configured
    } else {
        requested
    }
}

/// Registered skills in name order, optionally filtered by category.
#[must_use]
pub fn list_skills(category: Option<&str>) -> Vec<SkillInfo> {
    let registry = SkillRegistry::with_builtin();
    registry
        .list(category)
        .map(|skill| SkillInfo::from(skill.as_ref()))
        .collect()
}

/// Built-in and configured workflows in name order.
///
/// # Errors
///
/// Fails if a workflow document is malformed or references an unknown skill.
pub fn list_workflows(config: &AppConfig) -> crate::Result<Vec<Arc<Workflow>>> {
    let catalog = WorkflowCatalog::load(
        config.workflows.dir.as_deref(),
        &SkillRegistry::with_builtin(),
    )?;
    Ok(catalog.iter().cloned().collect())
}

/// Validates a JSON document.
///
/// Without a schema name the document is treated as an envelope and also
/// checked against its category extension.
///
/// # Errors
///
/// Fails only if the schema cannot be loaded.
pub fn validate_document(
    config: &AppConfig,
    document: &Value,
    schema: Option<&str>,
) -> crate::Result<ValidationReport> {
    let mut owned = None;
    let validator = configured_validator(config, &mut owned);
    match schema {
        Some(name) => validator.validate(document, name),
        None => validator.validate_envelope(document),
    }
}

/// Sends a message from `agent` (or the configured agent) to `to`.
///
/// # Errors
///
/// Returns `InvalidMessage` if the message fails validation.
pub fn send_message(
    config: &AppConfig,
    agent: Option<&str>,
    to: &str,
    message_type: MessageType,
    payload: Value,
    correlation_id: Option<String>,
) -> crate::Result<Uuid> {
    with_messenger(config, agent, |messenger| {
        messenger.send(to, message_type, payload, correlation_id)
    })
}

/// Receives every message in the agent's inbox, consuming them unless `keep`.
///
/// # Errors
///
/// Fails if the inbox cannot be listed.
pub fn receive_messages(
    config: &AppConfig,
    agent: Option<&str>,
    keep: bool,
) -> crate::Result<Vec<Message>> {
    with_messenger(config, agent, |messenger| {
        Ok(messenger.receive(!keep)?.collect())
    })
}

/// Answers a consumed message.
///
/// # Errors
///
/// Returns `MessageNotFound` when no consumed message has that id.
pub fn reply_to_message(
    config: &AppConfig,
    agent: Option<&str>,
    message_id: &str,
    payload: Value,
) -> crate::Result<Uuid> {
    with_messenger(config, agent, |messenger| {
        let original =
            messenger
                .find_read(message_id)?
                .ok_or_else(|| WardenError::MessageNotFound {
                    id: message_id.to_string(),
                })?;
        messenger.send_response(&original, payload)
    })
}

/// Runs `f` with a messenger for `agent` that validates against the
/// configured schemas.
fn with_messenger<T>(
    config: &AppConfig,
    agent: Option<&str>,
    f: impl FnOnce(&AgentMessenger<'_>) -> crate::Result<T>,
) -> crate::Result<T> {
    let mut owned = None;
    let validator = configured_validator(config, &mut owned);
    let messenger = AgentMessenger::new(
        agent.unwrap_or(&config.agent.name),
        FsMailbox::new(&config.messages.dir),
        validator,
    )?;
    f(&messenger)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.messages.dir = dir.join("messages");
        config.report.output_dir = dir.join("reports");
        config.workflows.dir = None;
        config
    }

    #[tokio::test]
    async fn test_run_audit_writes_reports_and_forwards() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(
            src.join("Widget.jsx"),
            "export const W = ({x}) => <div dangerouslySetInnerHTML={{__html: x}} />;\n",
        )
        .unwrap();
        let config = config_in(dir.path());

        let request = AuditRequest::builder()
            .workflow("xss-audit")
            .root(&src)
            .formats(vec![ReportFormat::Json, ReportFormat::Sarif])
            .send_to("code-review-agent")
            .build();
        let outcome = run_audit(&config, request, &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.validation.ok, "{}", outcome.validation.joined());
        assert!(outcome.output.has_critical());
        assert!(!outcome.should_fail());
        assert_eq!(outcome.reports.artifacts.len(), 2);
        assert!(outcome.reports.is_complete());

        let inbox: Vec<_> = receive_messages(&config, Some("code-review-agent"), false).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].message_id, outcome.sent_message.unwrap());
        assert_eq!(inbox[0].payload["execution"]["workflowName"], "xss-audit");
    }

    #[tokio::test]
    async fn test_run_audit_unknown_workflow_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let request = AuditRequest::builder()
            .workflow("nope")
            .root(dir.path())
            .build();
        let err = run_audit(&config_in(dir.path()), request, &CancellationToken::new())
            .await
            .expect_err("unknown workflow");
        assert!(err.is_load_time());
    }

    #[test]
    fn test_reply_requires_consumed_message() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let id = send_message(
            &config,
            Some("agentA"),
            "agentB",
            MessageType::Request,
            json!({"action": "scan"}),
            None,
        )
        .unwrap();

        let err = reply_to_message(&config, Some("agentB"), &id.to_string(), json!({}))
            .expect_err("not consumed yet");
        assert!(matches!(err, WardenError::MessageNotFound { .. }));

        assert_eq!(receive_messages(&config, Some("agentB"), true).unwrap().len(), 1);
        assert_eq!(receive_messages(&config, Some("agentB"), true).unwrap().len(), 1);
        let err = reply_to_message(&config, Some("agentB"), &id.to_string(), json!({}))
            .expect_err("kept messages are not consumed");
        assert!(matches!(err, WardenError::MessageNotFound { .. }));

        assert_eq!(receive_messages(&config, Some("agentB"), false).unwrap().len(), 1);
        assert!(receive_messages(&config, Some("agentB"), false).unwrap().is_empty());
        let reply = reply_to_message(&config, Some("agentB"), &id.to_string(), json!({"ok": true}))
            .unwrap();

        let answers = receive_messages(&config, Some("agentA"), true).unwrap();
        assert_eq!(answers[0].message_id, reply);
        assert_eq!(answers[0].correlation_id, Some(id.to_string()));
    }

    #[test]
    fn test_message_helpers_use_configured_schemas() {
        let dir = tempfile::tempdir().unwrap();
        let schemas = dir.path().join("schemas");
        std::fs::create_dir_all(&schemas).unwrap();
        std::fs::write(
            schemas.join("inter-agent-message-schema.json"),
            r#"{"type": "object", "required": ["priority"]}"#,
        )
        .unwrap();
        let mut config = config_in(dir.path());
        config.schemas.dir = Some(schemas);

        let err = send_message(
            &config,
            Some("agentA"),
            "agentB",
            MessageType::Request,
            json!({"action": "scan"}),
            None,
        )
        .expect_err("message lacks the configured required field");
        assert!(matches!(err, WardenError::InvalidMessage { .. }));
        assert!(!config.messages.dir.join("agentB").exists());
    }

    #[test]
    fn test_list_helpers() {
        assert_eq!(list_skills(None).len(), 9);
        assert!(list_skills(Some("xss")).iter().all(|s| s.category == "xss"));

        let dir = tempfile::tempdir().unwrap();
        let workflows = list_workflows(&config_in(dir.path())).unwrap();
        assert_eq!(workflows.len(), 3);
    }

    #[test]
    fn test_validate_document_defaults_to_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let report = validate_document(&config_in(dir.path()), &json!({}), None).unwrap();
        assert!(!report.ok);
        assert_eq!(report.errors[0].path, "/schemaVersion");
    }
}
