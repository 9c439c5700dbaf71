//! CLI for CWGH.

mod commands;
mod snapshot;
mod terminal;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use cwgh_core::settings::TomlSettingsStore;
use std::path::PathBuf;

use commands::{run_completions, run_configure, run_probe, run_save, run_status, SaveArgs};

/// Top-level CLI for CWGH.
#[derive(Debug, Parser)]
#[command(name = "cwgh")]
#[command(about = "CWGH: save kata solutions and descriptions to a GitHub repository", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Save the kata captured in a page snapshot (JSON) to the repository.
    Save {
        /// Path to the page snapshot.
        snapshot: PathBuf,

        /// Read the solution from this file instead of the snapshot.
        #[arg(long, value_name = "FILE")]
        solution: Option<PathBuf>,

        /// Fail instead of asking for missing repository settings.
        #[arg(long)]
        no_prompt: bool,
    },

    /// Set repository credentials. Prompts for all of them when no flag is given.
    Configure {
        /// Personal access token with contents write permission.
        #[arg(long)]
        token: Option<String>,
        /// Repository owner (user or organization).
        #[arg(long)]
        owner: Option<String>,
        /// Repository name.
        #[arg(long)]
        repo: Option<String>,
        /// Branch to write to.
        #[arg(long)]
        branch: Option<String>,
    },

    /// Show the current configuration (token masked).
    Status,

    /// Check whether a repository path exists and print its revision.
    Probe {
        /// Repository path, e.g. "Codewars/6 kyu/Valid_Braces/solution.py".
        path: String,
    },

    /// Print shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        if let CliCommand::Completions { shell } = cli.command {
            return run_completions(shell);
        }

        let store = TomlSettingsStore::open()?;
        tracing::debug!("loaded config from {}", store.path().display());

        match cli.command {
            CliCommand::Save {
                snapshot,
                solution,
                no_prompt,
            } => {
                run_save(
                    store,
                    SaveArgs {
                        snapshot,
                        solution,
                        no_prompt,
                    },
                )
                .await?
            }
            CliCommand::Configure {
                token,
                owner,
                repo,
                branch,
            } => run_configure(store, token, owner, repo, branch)?,
            CliCommand::Status => run_status(&store)?,
            CliCommand::Probe { path } => run_probe(&store, &path).await?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
