// SPDX-License-Identifier: Apache-2.0

//! Workflows: declarative skill compositions and their execution.

pub mod context;
pub mod definition;
pub mod engine;

pub use context::{ExecutionContext, SkillError, SkillErrorKind};
pub use definition::{Workflow, WorkflowCatalog, WorkflowConfig};
pub use engine::{SkillOutcome, SkillReport, WorkflowEngine, WorkflowRun};
