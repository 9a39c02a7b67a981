use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Codesmith - plan, generate and document workspace changes with an LLM
#[derive(Parser)]
#[command(name = "codesmith")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Workspace root (auto-detects git root if absent)
    #[arg(short = 'w', long)]
    pub workspace: Option<String>,

    /// LLM configuration file (defaults to $CODESMITH_CONFIG, then ~/.codesmith/config.json)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Print the full task response as JSON
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a question about the project without changing any file
    Ask {
        query: String,

        /// Send every workspace file to the model
        #[arg(long)]
        full_context: bool,
    },
    /// Plan, generate and apply changes for a requirement
    Agent {
        requirements: String,

        /// Send every workspace file to the model instead of only the planned ones
        #[arg(long)]
        full_context: bool,

        /// Let the Enhancer agent rewrite the requirement before planning
        #[arg(long)]
        enhance: bool,
    },
    /// Roll the workspace back to the latest checkpoint
    Restore,
    /// List existing checkpoints, newest first
    Checkpoints,
}
