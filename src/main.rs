use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

mod agents;
mod cli;
mod command;
mod config;
mod domain;
mod llm;
mod orchestrator;
mod sanitize;
mod workspace;

use cli::{Cli, Commands};
use config::LlmConfig;
use domain::TaskRequest;
use llm::LlmClient;
use orchestrator::Orchestrator;
use workspace::{CheckpointManager, FileStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = LlmConfig::load(cli.config.as_deref()).context("Failed to load LLM configuration")?;
    let client = LlmClient::new(Arc::new(config)).context("Failed to build HTTP client")?;
    info!("Default provider: {}", client.config().default_provider);

    let root = cli::resolve_workspace_root(cli.workspace.as_deref())?;

    let Some(command) = cli.command else {
        return command::run_interactive(client, &root, cli.json).await;
    };

    let files = FileStore::new(&root)
        .with_context(|| format!("Failed to open workspace: {}", root.display()))?;
    info!("📂 Workspace: {}", files.root().display());

    match command {
        Commands::Ask {
            query,
            full_context,
        } => {
            let orchestrator = Orchestrator::new(client, files);
            command::run_task(&orchestrator, TaskRequest::ask(query, full_context), cli.json).await
        }
        Commands::Agent {
            requirements,
            full_context,
            enhance,
        } => {
            let orchestrator = Orchestrator::new(client, files);
            let request = TaskRequest::agent(requirements, full_context).with_enhancement(enhance);
            command::run_task(&orchestrator, request, cli.json).await
        }
        Commands::Restore => {
            let orchestrator = Orchestrator::new(client, files);
            command::run_task(&orchestrator, TaskRequest::restore(), cli.json).await
        }
        Commands::Checkpoints => command::run_checkpoints(&CheckpointManager::new(files), cli.json),
    }
}
