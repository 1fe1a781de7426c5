// SPDX-License-Identifier: Apache-2.0

//! Shell completion generation and installation.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use console::style;
use tracing::debug;

use crate::cli::Cli;

/// Where a shell looks for the completion script, and how to enable it.
#[derive(Debug, Clone)]
struct CompletionTarget {
    path: PathBuf,
    instructions: &'static str,
    reload: &'static str,
}

impl CompletionTarget {
    fn for_shell(shell: Shell, home: &Path) -> Result<Self> {
        let (relative, instructions, reload) = match shell {
            Shell::Bash => (
                ".bash_completion.d/warden",
                "Add to ~/.bashrc or ~/.bash_profile:\n  source ~/.bash_completion.d/warden",
                "source ~/.bashrc",
            ),
            Shell::Zsh => (
                ".zsh/completions/_warden",
                "Add to ~/.zshrc (before compinit):\n  fpath=(~/.zsh/completions $fpath)\n  autoload -U compinit && compinit -i",
                "exec zsh",
            ),
            Shell::Fish => (
                ".config/fish/completions/warden.fish",
                "Completions are loaded automatically from ~/.config/fish/completions/",
                "exec fish",
            ),
            Shell::PowerShell => (
                ".config/powershell/warden.ps1",
                "Add to your PowerShell profile ($PROFILE):\n  . $HOME/.config/powershell/warden.ps1",
                ". $PROFILE",
            ),
            Shell::Elvish => (
                ".local/share/elvish/lib/warden.elv",
                "Add to ~/.config/elvish/rc.elv:\n  use warden",
                "restart your terminal",
            ),
            _ => {
                return Err(anyhow!(
                    "Unsupported shell: {shell:?}. Supported shells: bash, zsh, fish, powershell, elvish"
                ));
            }
        };
        Ok(Self {
            path: home.join(relative),
            instructions,
            reload,
        })
    }
}

fn detect_shell() -> Result<Shell> {
    let shell_env = std::env::var("SHELL")
        .context("$SHELL environment variable not set. Use --shell to specify.")?;
    let name = Path::new(&shell_env)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Could not parse shell name from $SHELL"))?;

    match name {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        "pwsh" | "powershell" => Ok(Shell::PowerShell),
        "elvish" => Ok(Shell::Elvish),
        _ => Err(anyhow!(
            "Unsupported shell: {name}. Supported: bash, zsh, fish, powershell, elvish"
        )),
    }
}

fn script(shell: Shell) -> Vec<u8> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    let mut out = Vec::new();
    generate(shell, &mut cmd, name, &mut out);
    out
}

/// Writes the completion script to stdout.
pub fn run_generate(shell: Shell) -> Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(&script(shell))?;
    stdout.flush()?;
    Ok(())
}

/// Installs the completion script to the shell's standard location.
pub fn run_install(shell: Option<Shell>, dry_run: bool) -> Result<()> {
    let shell = match shell {
        Some(s) => s,
        None => detect_shell()?,
    };
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    let target = CompletionTarget::for_shell(shell, &home)?;

    if dry_run {
        println!("{}", style("DRY RUN - No files will be modified").yellow().bold());
        println!("  {} {shell:?}", style("Shell:").dim());
        println!("  {} {}", style("Path:").dim(), target.path.display());
        println!();
        println!("{}", target.instructions);
        return Ok(());
    }

    if let Some(parent) = target.path.parent() {
        debug!("Creating {}", parent.display());
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    warden_core::files::write_atomic(&target.path, &script(shell))
        .with_context(|| format!("Failed to write {}", target.path.display()))?;

    println!(
        "{} {}",
        style("Completion script installed:").green().bold(),
        style(target.path.display()).cyan()
    );
    println!();
    println!("{}", target.instructions);
    println!();
    println!("{} {}", style("Then run:").dim(), target.reload);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_paths() {
        let home = Path::new("/home/u");
        let zsh = CompletionTarget::for_shell(Shell::Zsh, home).unwrap();
        assert_eq!(zsh.path, home.join(".zsh/completions/_warden"));

        let fish = CompletionTarget::for_shell(Shell::Fish, home).unwrap();
        assert!(fish.path.ends_with("fish/completions/warden.fish"));
    }

    #[test]
    fn test_generated_script_names_binary() {
        let bash = String::from_utf8(script(Shell::Bash)).unwrap();
        assert!(bash.contains("warden"));
    }
}
