// SPDX-License-Identifier: Apache-2.0

//! Command-line interface definition for Warden.
//!
//! Uses clap's derive API with noun-verb subcommands.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use warden_core::{MessageType, ReportFormat};

/// Extended help text for the generate subcommand with shell-specific examples.
const COMPLETION_GENERATE_HELP: &str = r#"EXAMPLES

  bash
    Add to ~/.bashrc or ~/.bash_profile:
      eval "$(warden completion generate bash)"

  zsh
    Generate completion file:
      mkdir -p ~/.zsh/completions
      warden completion generate zsh > ~/.zsh/completions/_warden

    Add to ~/.zshrc (before compinit):
      fpath=(~/.zsh/completions $fpath)
      autoload -U compinit && compinit -i

  fish
    Generate completion file:
      warden completion generate fish > ~/.config/fish/completions/warden.fish

  PowerShell
    Add to $PROFILE:
      warden completion generate powershell | Out-String | Invoke-Expression
"#;

/// Output format for CLI results.
#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with colors (default)
    #[default]
    Text,
    /// JSON output for programmatic consumption
    Json,
    /// YAML output for programmatic consumption
    Yaml,
    /// Markdown output
    Markdown,
}

/// Global output configuration passed to commands.
#[derive(Clone)]
pub struct OutputContext {
    /// Output format (text, json, yaml, markdown)
    pub format: OutputFormat,
    /// Suppress non-essential output (spinners, progress)
    pub quiet: bool,
    /// Enable verbose output (debug-level logging)
    pub verbose: bool,
    /// Whether stdout is a terminal (TTY)
    pub is_tty: bool,
}

impl OutputContext {
    /// Creates an `OutputContext` from CLI arguments.
    pub fn from_cli(format: OutputFormat, quiet: bool, verbose: bool) -> Self {
        Self {
            format,
            quiet,
            verbose,
            is_tty: std::io::stdout().is_terminal(),
        }
    }

    /// Returns true if interactive elements (spinners, colors) should be shown.
    pub fn is_interactive(&self) -> bool {
        self.is_tty && !self.quiet && matches!(self.format, OutputFormat::Text)
    }
}

/// Warden - skill-based static security audits.
///
/// Runs declarative workflows of scanning skills over a source tree and
/// emits a schema-validated envelope that other agents can consume.
#[derive(Parser)]
#[command(name = "warden")]
#[command(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Output format (text, json, yaml, markdown)
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    pub output: OutputFormat,

    /// Suppress non-essential output (spinners, progress)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug-level logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Read configuration from this file instead of ~/.config/warden/config.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a workflow over a source tree
    Run(RunArgs),

    /// Inspect registered skills
    #[command(subcommand)]
    Skill(SkillCommand),

    /// Inspect available workflows
    #[command(subcommand)]
    Workflow(WorkflowCommand),

    /// Validate a JSON document against a schema
    Validate {
        /// Document to validate
        file: PathBuf,

        /// Schema name (default: agent output envelope plus its category extension)
        #[arg(long, short = 's')]
        schema: Option<String>,
    },

    /// Exchange messages with other agents
    Message {
        /// Local agent whose mailbox is used (default: agent.name from config)
        #[arg(long, global = true)]
        agent: Option<String>,

        #[command(subcommand)]
        command: MessageCommand,
    },

    /// Generate or install shell completion scripts
    #[command(subcommand)]
    Completion(CompletionCommand),
}

/// Arguments of `warden run`.
#[derive(clap::Args)]
pub struct RunArgs {
    /// Workflow name (see `warden workflow list`)
    pub workflow: String,

    /// Root directory to scan
    #[arg(long, short = 'p', default_value = ".")]
    pub path: PathBuf,

    /// Include glob, relative to the scan root (repeatable; default from config)
    #[arg(long, value_name = "GLOB")]
    pub include: Vec<String>,

    /// Exclude glob, relative to the scan root (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Directory for report artifacts (default: report.output_dir)
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Report format: json, markdown, html, sarif (repeatable; default from the workflow)
    #[arg(long = "format", short = 'f', value_name = "FMT", value_parser = parse_report_format)]
    pub formats: Vec<ReportFormat>,

    /// Exit with status 1 when any critical finding exists
    #[arg(long)]
    pub exit_on_critical: bool,

    /// Run skills concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Refuse to write reports when the envelope fails validation
    #[arg(long)]
    pub strict: bool,

    /// Forward the envelope to this agent's inbox
    #[arg(long, value_name = "AGENT")]
    pub send_to: Option<String>,
}

/// Skill subcommands
#[derive(Subcommand)]
pub enum SkillCommand {
    /// List registered skills
    List {
        /// Only skills of this category (e.g., xss, csrf)
        #[arg(long, short = 'c')]
        category: Option<String>,
    },
}

/// Workflow subcommands
#[derive(Subcommand)]
pub enum WorkflowCommand {
    /// List built-in and configured workflows
    List,
}

/// Message subcommands
#[derive(Subcommand)]
pub enum MessageCommand {
    /// Send a message to another agent
    Send {
        /// Recipient agent
        to: String,

        /// Message type: request, response, notification, error
        #[arg(long = "type", short = 't', default_value = "request", value_parser = parse_message_type)]
        message_type: MessageType,

        /// JSON object payload
        #[arg(long, default_value = "{}")]
        payload: String,

        /// Id of the message this one answers
        #[arg(long)]
        correlation_id: Option<String>,
    },

    /// Receive messages from the inbox
    Receive {
        /// Leave messages in the inbox instead of moving them to read/
        #[arg(long)]
        keep: bool,
    },

    /// Answer a received request
    Reply {
        /// Id of the received message
        message_id: String,

        /// JSON object payload
        #[arg(long, default_value = "{}")]
        payload: String,
    },
}

/// Completion subcommands
#[derive(Subcommand)]
pub enum CompletionCommand {
    /// Generate completion script to stdout
    #[command(after_long_help = COMPLETION_GENERATE_HELP)]
    Generate {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Install completion script to the standard location
    Install {
        /// Shell to install for (auto-detected from $SHELL if omitted)
        #[arg(long, value_enum)]
        shell: Option<Shell>,

        /// Print what would be installed without writing files
        #[arg(long)]
        dry_run: bool,
    },
}

fn parse_report_format(value: &str) -> Result<ReportFormat, String> {
    value.parse()
}

fn parse_message_type(value: &str) -> Result<MessageType, String> {
    value.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_args_parse_formats() {
        let cli = Cli::try_parse_from([
            "warden",
            "run",
            "security-audit",
            "--format",
            "sarif",
            "-f",
            "md",
            "--exit-on-critical",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.workflow, "security-audit");
        assert_eq!(args.formats, vec![ReportFormat::Sarif, ReportFormat::Markdown]);
        assert!(args.exit_on_critical);
        assert!(!args.parallel);
    }

    #[test]
    fn test_unknown_report_format_rejected() {
        let result = Cli::try_parse_from(["warden", "run", "security-audit", "--format", "pdf"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_message_agent_is_global() {
        let cli = Cli::try_parse_from(["warden", "message", "receive", "--agent", "agentB", "--keep"])
            .unwrap();
        let Commands::Message { agent, command } = cli.command else {
            panic!("expected message");
        };
        assert_eq!(agent.as_deref(), Some("agentB"));
        assert!(matches!(command, MessageCommand::Receive { keep: true }));
    }
}
