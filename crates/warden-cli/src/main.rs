// SPDX-License-Identifier: Apache-2.0

//! Warden - skill-based static security audits.
//!
//! Runs workflows of scanning skills over a source tree, writes reports and
//! exchanges schema-validated envelopes with other agents through file
//! mailboxes.

mod cli;
mod commands;
mod errors;
mod logging;
mod output;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use warden_core::config;

use crate::cli::{Cli, OutputContext};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            let formatted = errors::format_error(&e);
            eprintln!("Error: {formatted}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let output_ctx = OutputContext::from_cli(cli.output, cli.quiet, cli.verbose);

    let config = match &cli.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
    .context("Failed to load configuration")?;
    debug!("Configuration loaded successfully");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping pending skills");
            on_interrupt.cancel();
        }
    });

    commands::run(cli.command, output_ctx, &config, &cancel).await
}
