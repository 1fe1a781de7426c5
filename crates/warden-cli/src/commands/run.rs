// SPDX-License-Identifier: Apache-2.0

//! Run a workflow command.

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use warden_core::{AppConfig, AuditRequest, run_audit};

use super::types::RunResult;
use crate::cli::RunArgs;

/// Runs `args.workflow` over `args.path` and collects what the CLI shows.
pub async fn run(args: RunArgs, config: &AppConfig, cancel: &CancellationToken) -> Result<RunResult> {
    let request = AuditRequest::builder()
        .workflow(args.workflow)
        .root(args.path)
        .include(args.include)
        .exclude(args.exclude)
        .maybe_out_dir(args.out_dir)
        .formats(args.formats)
        .exit_on_critical(args.exit_on_critical)
        .parallel(args.parallel)
        .strict(args.strict)
        .maybe_send_to(args.send_to.clone())
        .build();

    let outcome = run_audit(config, request, cancel).await?;
    for failure in &outcome.reports.failures {
        warn!(%failure, "Report not written");
    }
    debug!(
        artifacts = outcome.reports.artifacts.len(),
        failures = outcome.reports.failures.len(),
        "Reports written"
    );

    let failed = outcome.should_fail();
    Ok(RunResult {
        validation_errors: outcome
            .validation
            .errors
            .iter()
            .map(ToString::to_string)
            .collect(),
        report_failures: outcome.reports.failures,
        sent: args
            .send_to
            .zip(outcome.sent_message)
            .map(|(to, id)| (to, id.to_string())),
        failed,
        envelope: outcome.output,
    })
}
