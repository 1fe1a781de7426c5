// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! # Warden Core
//!
//! Core library for Warden - skill-based static security audits that produce
//! schema-validated agent output.
//!
//! This crate provides reusable components for:
//! - Scanning skills and their registry
//! - Declarative workflows run sequentially or on a bounded worker pool
//! - Output aggregation and severity-weighted scoring
//! - Schema validation of envelopes and messages
//! - File-mailbox messaging between agents
//! - JSON, Markdown, HTML and SARIF reports
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use warden_core::{AuditRequest, load_config, run_audit};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = load_config()?;
//! let request = AuditRequest::builder()
//!     .workflow("security-audit")
//!     .root("./web")
//!     .build();
//!
//! let outcome = run_audit(&config, request, &CancellationToken::new()).await?;
//! println!("Score: {:?}", outcome.output.score());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`skills`] - Skill trait, built-in scanners and registry
//! - [`workflow`] - Workflow documents and the execution engine
//! - [`aggregate`] - Envelope construction and scoring
//! - [`schema`] - Schema loading and validation
//! - [`messaging`] - Agent mailboxes
//! - [`report`] - Report artifacts

// ============================================================================
// Error Handling
// ============================================================================

pub use error::WardenError;

/// Convenience Result type for Warden operations.
///
/// This is equivalent to `std::result::Result<T, WardenError>`.
pub type Result<T> = std::result::Result<T, WardenError>;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{
    AgentConfig, AppConfig, ExecutionConfig, IgnoreConfig, MessagesConfig, NextActionsConfig,
    ReportConfig, ScanConfig, SchemasConfig, ScoringConfig, WorkflowsConfig, config_dir,
    config_file_path, load_config, load_config_from,
};

// ============================================================================
// Findings and Scan Targets
// ============================================================================

pub use files::{FileSet, SourceFile};
pub use finding::{Finding, Location, Severity, category_recommendation, sort_findings};

// ============================================================================
// Skills
// ============================================================================

pub use skills::{Skill, SkillContext, SkillInfo, SkillRegistry, builtin_skills};

// ============================================================================
// Workflows
// ============================================================================

pub use workflow::{
    ExecutionContext, SkillError, SkillErrorKind, SkillOutcome, SkillReport, Workflow,
    WorkflowCatalog, WorkflowConfig, WorkflowEngine, WorkflowRun,
};

// ============================================================================
// Aggregation
// ============================================================================

pub use aggregate::{
    AgentOutput, Aggregator, ExecutionStatus, FindingGroups, SCHEMA_VERSION, ScoringPolicy,
    SeverityCounts,
};

// ============================================================================
// Schema Validation
// ============================================================================

pub use schema::{
    AGENT_OUTPUT_SCHEMA, MESSAGE_SCHEMA, Schema, SchemaError, SchemaValidator, ValidationReport,
};

// ============================================================================
// Messaging
// ============================================================================

pub use messaging::{AgentMessenger, FsMailbox, Inbox, Mailbox, Message, MessageType};

// ============================================================================
// Reports
// ============================================================================

pub use report::{Artifact, ReportFailure, ReportFormat, ReportGenerator, ReportOutcome};

// ============================================================================
// Platform-Agnostic Facade
// ============================================================================

pub use facade::{
    AuditOutcome, AuditRequest, list_skills, list_workflows, receive_messages, reply_to_message,
    run_audit, send_message, validate_document,
};

// ============================================================================
// Modules
// ============================================================================

pub mod aggregate;
pub mod config;
pub mod error;
pub mod facade;
pub mod files;
pub mod finding;
pub mod messaging;
pub mod report;
pub mod schema;
pub mod skills;
pub mod workflow;
