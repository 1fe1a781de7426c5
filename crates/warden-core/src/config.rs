// SPDX-License-Identifier: Apache-2.0

//! Configuration management for Warden.
//!
//! Provides layered configuration from files and environment variables.
//! Uses XDG-compliant paths with environment variable support.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables (prefix: `WARDEN_`)
//! 2. Config file: `~/.config/warden/config.toml`
//! 3. Built-in defaults
//!
//! # Examples
//!
//! ```bash
//! # Double the weight of critical findings
//! WARDEN_SCORING__CRITICAL=20 warden run security-audit
//! ```

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::WardenError;
use crate::finding::Severity;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Identity reported in every envelope.
    pub agent: AgentConfig,
    /// Scan target selection.
    pub scan: ScanConfig,
    /// Findings to drop before aggregation.
    pub ignore: IgnoreConfig,
    /// Workflow document location.
    pub workflows: WorkflowsConfig,
    /// Schema location and strictness.
    pub schemas: SchemasConfig,
    /// Mailbox location.
    pub messages: MessagesConfig,
    /// Report output.
    pub report: ReportConfig,
    /// Worker pool and timeouts.
    pub execution: ExecutionConfig,
    /// Severity weights.
    pub scoring: ScoringConfig,
    /// Follow-up agent and skill identifiers.
    pub next_actions: NextActionsConfig,
}

/// Agent identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Agent name, also the local mailbox name.
    pub name: String,
    /// Agent version.
    pub version: String,
    /// Agent category; selects the category extension schema.
    pub category: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "security-agent".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            category: "security".to_string(),
        }
    }
}

/// Scan target selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Glob patterns of files to scan, relative to the scan root.
    pub include: Vec<String>,
    /// Glob patterns to skip; wins over `include`.
    pub exclude: Vec<String>,
    /// Files larger than this are skipped.
    pub max_file_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include: [
                "**/*.ts", "**/*.tsx", "**/*.js", "**/*.jsx", "**/*.html", "**/*.htm", "**/*.py",
            ]
            .map(String::from)
            .to_vec(),
            exclude: [
                "**/node_modules/**",
                "**/dist/**",
                "**/build/**",
                "**/.git/**",
            ]
            .map(String::from)
            .to_vec(),
            max_file_bytes: 1024 * 1024,
        }
    }
}

/// Ignore rules applied as findings are merged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Categories to drop (e.g. `["mobileSpecific"]`).
    pub categories: Vec<String>,
    /// Path prefixes to drop (e.g. `["test/", "vendor/"]`).
    pub paths: Vec<String>,
}

/// Workflow document location.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowsConfig {
    /// Directory of `.yaml`, `.toml` or `.json` workflow documents.
    pub dir: Option<PathBuf>,
}

impl Default for WorkflowsConfig {
    fn default() -> Self {
        Self {
            dir: Some(config_dir().join("workflows")),
        }
    }
}

/// Schema location and strictness.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemasConfig {
    /// Directory overriding the embedded schemas by file name.
    pub dir: Option<PathBuf>,
    /// Refuse to write reports or forward envelopes that fail validation.
    pub strict: bool,
}

/// Mailbox location.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Mailbox root holding one directory per agent.
    pub dir: PathBuf,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".agent-messages"),
        }
    }
}

/// Report output.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory report artifacts are written to.
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("security-reports"),
        }
    }
}

/// Worker pool and timeouts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Upper bound on concurrently running skills in parallel workflows.
    pub max_workers: usize,
    /// Per-skill budget when a workflow sets none.
    pub default_timeout_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            default_timeout_ms: 60_000,
        }
    }
}

/// Score deduction per finding, by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of a critical finding.
    pub critical: u32,
    /// Weight of a high finding.
    pub high: u32,
    /// Weight of a medium finding.
    pub medium: u32,
    /// Weight of a low finding.
    pub low: u32,
    /// Weight of an informational finding.
    pub info: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            critical: 10,
            high: 5,
            medium: 2,
            low: 1,
            info: 0,
        }
    }
}

impl ScoringConfig {
    /// Weight for one severity.
    #[must_use]
    pub fn weight(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Info => self.info,
        }
    }
}

/// Identifiers used to build `nextActions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NextActionsConfig {
    /// Agent suggested whenever a run has findings.
    pub peer_audit_agent: String,
    /// Skill required whenever a run has critical findings.
    pub auto_fix_skill: String,
}

impl Default for NextActionsConfig {
    fn default() -> Self {
        Self {
            peer_audit_agent: "code-review-agent".to_string(),
            auto_fix_skill: "autoFix".to_string(),
        }
    }
}

/// Returns the Warden configuration directory.
///
/// Respects the `XDG_CONFIG_HOME` environment variable if set,
/// otherwise defaults to `~/.config/warden`. Falls back to a relative
/// `.warden` directory when no home directory is known.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return PathBuf::from(xdg_config).join("warden");
    }
    dirs::home_dir().map_or_else(
        || PathBuf::from(".warden"),
        |home| home.join(".config").join("warden"),
    )
}

/// Returns the path to the configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load application configuration.
///
/// Loads from config file (if exists) and environment variables.
/// Environment variables use the prefix `WARDEN_` and double underscore
/// for nested keys (e.g., `WARDEN_EXECUTION__MAX_WORKERS`).
///
/// # Errors
///
/// Returns `WardenError::Config` if the config file exists but is invalid.
pub fn load_config() -> Result<AppConfig, WardenError> {
    load_config_from(&config_file_path())
}

/// Load configuration using an explicit file instead of the XDG location.
pub fn load_config_from(config_path: &Path) -> Result<AppConfig, WardenError> {
    let config = Config::builder()
        // Load from config file (optional - may not exist)
        .add_source(File::from(config_path).required(false))
        // Override with environment variables
        .add_source(
            Environment::with_prefix("WARDEN")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("scan.include")
                .with_list_parse_key("scan.exclude")
                .with_list_parse_key("ignore.categories")
                .with_list_parse_key("ignore.paths")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    if app_config.execution.max_workers == 0 {
        return Err(WardenError::Config {
            message: "execution.max_workers must be at least 1".to_string(),
        });
    }

    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_config_defaults() {
        let config = load_config_from(Path::new("/nonexistent/warden/config.toml"))
            .expect("should load with defaults");

        assert_eq!(config.agent.name, "security-agent");
        assert_eq!(config.agent.category, "security");
        assert_eq!(config.scoring, ScoringConfig::default());
        assert_eq!(config.execution.max_workers, 4);
        assert_eq!(config.messages.dir, PathBuf::from(".agent-messages"));
        assert!(config.scan.include.iter().any(|g| g == "**/*.tsx"));
        assert!(!config.schemas.strict);
    }

    #[test]
    #[serial]
    fn test_config_dir_ends_with_warden() {
        assert!(config_dir().ends_with("warden"));
        assert!(config_file_path().ends_with("config.toml"));
    }

    #[test]
    #[serial]
    fn test_config_dir_respects_xdg_config_home() {
        let original = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "/custom/config");
        }

        let dir = config_dir();
        assert_eq!(dir, PathBuf::from("/custom/config/warden"));

        unsafe {
            match original {
                Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
                None => std::env::remove_var("XDG_CONFIG_HOME"),
            }
        }
    }

    #[test]
    fn test_scoring_weights_from_toml() {
        let config_str = r#"
[scoring]
critical = 25
info = 1

[ignore]
paths = ["vendor/"]
"#;

        let config = Config::builder()
            .add_source(config::File::from_str(config_str, config::FileFormat::Toml))
            .build()
            .expect("should build config");

        let app_config: AppConfig = config.try_deserialize().expect("should deserialize");

        assert_eq!(app_config.scoring.weight(Severity::Critical), 25);
        assert_eq!(app_config.scoring.weight(Severity::High), 5);
        assert_eq!(app_config.scoring.weight(Severity::Info), 1);
        assert_eq!(app_config.ignore.paths, vec!["vendor/".to_string()]);
    }

    #[test]
    #[serial]
    fn test_env_override() {
        unsafe {
            std::env::set_var("WARDEN_SCORING__HIGH", "7");
        }
        let config = load_config_from(Path::new("/nonexistent/warden/config.toml"));
        unsafe {
            std::env::remove_var("WARDEN_SCORING__HIGH");
        }

        assert_eq!(config.expect("should load").scoring.high, 7);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[execution]\nmax_workers = 0\n").expect("write");

        let err = load_config_from(&path).expect_err("zero workers is invalid");
        assert!(matches!(err, WardenError::Config { .. }));
    }
}
