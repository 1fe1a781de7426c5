// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for the Warden CLI.
//!
//! Uses `tracing` with `tracing-subscriber`. Logs go to stderr so stdout
//! stays machine-readable; `RUST_LOG` overrides the default filter.
//!
//! # Examples
//!
//! ```bash
//! # Per-skill timings and findings counts
//! RUST_LOG=warden_core=info warden run security-audit
//!
//! # Everything, including per-file pattern matches
//! RUST_LOG=warden=trace,warden_core=trace warden run security-audit
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is unset.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "warden=debug,warden_core=debug"
    } else {
        "warden=warn,warden_core=warn"
    }
}

/// Initialize the logging subsystem.
///
/// # Arguments
///
/// * `verbose` - Raise the default filter to debug (-v flag)
pub fn init_logging(verbose: bool) {
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbose)))
        .expect("valid default filter directives");

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_parse() {
        for verbose in [false, true] {
            assert!(EnvFilter::try_new(default_filter(verbose)).is_ok());
        }
    }
}
