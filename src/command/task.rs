use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::domain::{RequestType, TaskRequest, TaskResponse};
use crate::llm::PromptClient;
use crate::orchestrator::Orchestrator;

/// Run one request with a fresh cancellation token wired to Ctrl-C.
pub async fn run_cancellable<C: PromptClient>(
    orchestrator: &Orchestrator<C>,
    request: &TaskRequest,
) -> TaskResponse {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl-C received; cancelling the running task");
                cancel.cancel();
            }
        })
    };

    let response = orchestrator.handle_task(request, &cancel).await;
    watcher.abort();
    response
}

/// One-shot `ask` / `agent` / `restore` command.
pub async fn run_task<C: PromptClient>(
    orchestrator: &Orchestrator<C>,
    request: TaskRequest,
    json: bool,
) -> Result<()> {
    let response = run_cancellable(orchestrator, &request).await;
    print_response(&response, json)?;

    if response.status.is_failure() {
        bail!("Task finished with status: {}", response.status.as_str());
    }
    Ok(())
}

pub fn print_response(response: &TaskResponse, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    match response.request_type {
        RequestType::Ask => match &response.answer {
            Some(answer) => println!("\n{}\n", answer),
            None => println!("❌ No answer was produced ({}).", response.status.as_str()),
        },
        RequestType::Restore => {
            if let Some(message) = &response.answer {
                println!("{}", message);
            }
        }
        RequestType::Agent => print_agent_summary(response),
    }
    Ok(())
}

fn print_agent_summary(response: &TaskResponse) {
    let icon = if response.status.is_failure() { "❌" } else { "✅" };
    println!("\n{} Task {}", icon, response.status.as_str());
    println!("   CorrelationId: {}", response.correlation_id);

    if !response.generated_files.is_empty() {
        println!("   Written:");
        for path in response.generated_files.keys() {
            if !response.rejected_paths.contains(path) {
                println!("     + {}", path);
            }
        }
    }
    if !response.deleted_files.is_empty() {
        println!("   Deleted:");
        for path in &response.deleted_files {
            println!("     - {}", path);
        }
    }
    if !response.missing_files.is_empty() {
        println!("   ⚠️  Planned but not generated: {}", response.missing_files.join(", "));
    }
    if !response.rejected_paths.is_empty() {
        println!("   ⚠️  Refused (outside workspace): {}", response.rejected_paths.join(", "));
    }
    if let Some(checkpoint) = &response.checkpoint {
        println!("   Checkpoint: {} (undo with `codesmith restore`)", checkpoint);
    }
}
