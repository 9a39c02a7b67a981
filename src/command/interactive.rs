use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;

use super::task::{print_response, run_cancellable};
use crate::cli::resolve_workspace_root;
use crate::domain::{RequestType, TaskRequest};
use crate::llm::PromptClient;
use crate::orchestrator::Orchestrator;
use crate::workspace::FileStore;

/// Interactive loop on stdin. Ends on `exit` or end of input.
pub async fn run_interactive<C: PromptClient>(
    client: C,
    default_workspace: &Path,
    json: bool,
) -> Result<()> {
    let mut input = io::BufReader::new(io::stdin());
    interactive_loop(client, default_workspace, &mut input, json).await
}

async fn interactive_loop<C: PromptClient, R: BufRead>(
    client: C,
    default_workspace: &Path,
    input: &mut R,
    json: bool,
) -> Result<()> {
    let label = format!("Workspace path [{}]: ", default_workspace.display());
    let Some(path) = ask(input, &label)? else {
        return Ok(());
    };
    let root = if path.is_empty() {
        default_workspace.to_path_buf()
    } else {
        resolve_workspace_root(Some(path.as_str()))?
    };

    let files = FileStore::new(&root)
        .with_context(|| format!("Failed to open workspace: {}", root.display()))?;
    println!("📂 Workspace: {}", files.root().display());
    let orchestrator = Orchestrator::new(client, files);

    loop {
        let Some(kind) = ask(input, "\nRequest type (ask/agent/restore/exit): ")? else {
            break;
        };
        if kind.eq_ignore_ascii_case("exit") {
            break;
        }
        let request_type = match kind.parse::<RequestType>() {
            Ok(t) => t,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let request = match request_type {
            RequestType::Restore => TaskRequest::restore(),
            RequestType::Ask | RequestType::Agent => {
                let label = if request_type == RequestType::Ask {
                    "Enter your question: "
                } else {
                    "Enter requirements: "
                };
                let Some(text) = ask(input, label)? else {
                    break;
                };
                if text.is_empty() {
                    println!("Nothing entered.");
                    continue;
                }

                let enhance = request_type == RequestType::Agent
                    && yes_no(input, "Enhance the given requirements (y/n): ", false)?;

                let full_context = orchestrator.files().has_files()
                    && yes_no(input, "Include all files context to LLM (y/n): ", true)?;

                match request_type {
                    RequestType::Ask => TaskRequest::ask(text, full_context),
                    _ => TaskRequest::agent(text, full_context).with_enhancement(enhance),
                }
            }
        };

        let response = run_cancellable(&orchestrator, &request).await;
        print_response(&response, json)?;
    }

    Ok(())
}

/// Print `label` and read one trimmed line. `None` at end of input.
fn ask<R: BufRead>(input: &mut R, label: &str) -> Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Yes/no question; anything other than an explicit answer takes `default`.
fn yes_no<R: BufRead>(input: &mut R, label: &str, default: bool) -> Result<bool> {
    let answer = ask(input, label)?.unwrap_or_default().to_lowercase();
    Ok(match answer.as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    })
}
