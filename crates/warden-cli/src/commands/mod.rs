// SPDX-License-Identifier: Apache-2.0

//! Command handlers for the Warden CLI.

pub mod catalog;
pub mod completion;
pub mod message;
pub mod run;
pub mod types;
pub mod validate;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use warden_core::AppConfig;

use crate::cli::{
    Commands, CompletionCommand, MessageCommand, OutputContext, SkillCommand, WorkflowCommand,
};
use crate::output;

/// Creates a styled spinner (only if interactive).
fn maybe_spinner(ctx: &OutputContext, message: &str) -> Option<ProgressBar> {
    if ctx.is_interactive() {
        let s = ProgressBar::new_spinner();
        s.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("Invalid spinner template"),
        );
        s.set_message(message.to_string());
        s.enable_steady_tick(Duration::from_millis(100));
        Some(s)
    } else {
        None
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Dispatch to the appropriate command handler.
pub async fn run(
    command: Commands,
    ctx: OutputContext,
    config: &AppConfig,
    cancel: &CancellationToken,
) -> Result<ExitCode> {
    match command {
        Commands::Run(args) => {
            let spinner = maybe_spinner(&ctx, &format!("Running {}...", args.workflow));
            let result = run::run(args, config, cancel).await;
            if let Some(s) = spinner {
                s.finish_and_clear();
            }
            let result = result?;
            output::render(&result, &ctx)?;
            Ok(exit_code(!result.failed))
        }

        Commands::Skill(SkillCommand::List { category }) => {
            output::render(&catalog::skills(category.as_deref()), &ctx)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Workflow(WorkflowCommand::List) => {
            output::render(&catalog::workflows(config)?, &ctx)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate { file, schema } => {
            let result = validate::run(config, &file, schema.as_deref())?;
            output::render(&result, &ctx)?;
            Ok(exit_code(result.ok))
        }

        Commands::Message { agent, command } => {
            let agent = agent.as_deref();
            match command {
                MessageCommand::Send {
                    to,
                    message_type,
                    payload,
                    correlation_id,
                } => {
                    let result =
                        message::send(config, agent, &to, message_type, &payload, correlation_id)?;
                    output::render(&result, &ctx)?;
                }
                MessageCommand::Receive { keep } => {
                    output::render(&message::receive(config, agent, keep)?, &ctx)?;
                }
                MessageCommand::Reply {
                    message_id,
                    payload,
                } => {
                    let result = message::reply(config, agent, &message_id, &payload)?;
                    output::render(&result, &ctx)?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Completion(cmd) => {
            match cmd {
                CompletionCommand::Generate { shell } => completion::run_generate(shell)?,
                CompletionCommand::Install { shell, dry_run } => {
                    completion::run_install(shell, dry_run)?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
