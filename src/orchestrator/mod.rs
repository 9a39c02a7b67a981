//! Task orchestration: runs the pipeline variant for each request type.
//!
//! ```text
//! AGENT: [enhance] -> docs -> plan* -> narrow context -> codegen* -> checkpoint
//!        -> writes -> deletes -> docs update (isolated)
//! ASK:   docs -> query*
//! RESTORE: checkpoint restore
//! ```
//!
//! Stages marked `*` retry up to [`RETRY_COUNT`] times. `handle_task` never
//! fails: every failure degrades to a [`TaskResponse`] with a status and
//! empty or partial fields.

mod retry;
#[cfg(test)]
mod tests;

pub use retry::{retry_stage, StageOutcome, RETRY_COUNT};

use std::collections::HashSet;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::agents::{Agents, DocsError, README_PATH};
use crate::domain::{GeneratedFileSet, PlanResult, RequestType, TaskRequest, TaskResponse, TaskStatus};
use crate::llm::PromptClient;
use crate::workspace::{CheckpointManager, FileStore, RestoreOutcome, WorkspaceError};

/// Documentation used when the workspace is empty and has no README.
pub const EMPTY_WORKSPACE_DOCUMENTATION: &str =
    "The workspace is empty. There is no existing code or documentation yet.";

/// The running task was cancelled mid-stage.
struct Cancelled;

pub struct Orchestrator<C> {
    client: C,
    files: FileStore,
    checkpoints: CheckpointManager,
    /// Serialises tasks; the workspace has a single writer.
    lock: Mutex<()>,
}

impl<C: PromptClient> Orchestrator<C> {
    pub fn new(client: C, files: FileStore) -> Self {
        let checkpoints = CheckpointManager::new(files.clone());
        Self {
            client,
            files,
            checkpoints,
            lock: Mutex::new(()),
        }
    }

    #[cfg(test)]
    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    /// Run one request to completion.
    pub async fn handle_task(
        &self,
        request: &TaskRequest,
        cancel: &CancellationToken,
    ) -> TaskResponse {
        let _guard = self.lock.lock().await;
        let correlation_id = Uuid::new_v4().to_string();

        info!(
            "🚀 Starting {} task. CorrelationId={}",
            request.request_type.as_str(),
            correlation_id
        );

        let response = match request.request_type {
            RequestType::Restore => self.run_restore(correlation_id.clone()),
            RequestType::Ask => self.run_ask(request, correlation_id.clone(), cancel).await,
            RequestType::Agent => self.run_agent(request, correlation_id.clone(), cancel).await,
        };

        info!(
            "Finished {} task with status {:?}. CorrelationId={}",
            request.request_type.as_str(),
            response.status,
            correlation_id
        );
        response
    }

    fn run_restore(&self, correlation_id: String) -> TaskResponse {
        let outcome = self.checkpoints.restore_latest();
        let status = if outcome.is_restored() {
            TaskStatus::Restored
        } else {
            TaskStatus::NoChanges
        };

        let mut response = TaskResponse::new(RequestType::Restore, correlation_id).with_status(status);
        if let RestoreOutcome::Restored { checkpoint, .. } = &outcome {
            response.checkpoint = Some(checkpoint.clone());
        }
        response.answer = Some(outcome.to_string());
        response
    }

    async fn run_ask(
        &self,
        request: &TaskRequest,
        correlation_id: String,
        cancel: &CancellationToken,
    ) -> TaskResponse {
        let mut response = TaskResponse::new(RequestType::Ask, correlation_id);

        let context = if request.include_full_context {
            self.files.file_context(None)
        } else {
            String::new()
        };

        let documentation = match self.resolve_documentation(&context, false, cancel).await {
            Ok(docs) => docs,
            Err(Cancelled) => return response.with_status(TaskStatus::Cancelled),
        };

        let query = Agents::new(&self.client).query();
        let question = request.requirements.as_str();
        let docs = documentation.as_str();
        let ctx = context.as_str();
        let query = &query;

        let outcome = retry_stage(
            "Query",
            RETRY_COUNT,
            cancel,
            move || async move { query.ask(question, docs, ctx, cancel).await.map(Some) },
            |answer: &String| !answer.trim().is_empty(),
        )
        .await;

        response.documentation = documentation;
        match outcome {
            StageOutcome::Success(answer) => {
                response.answer = Some(answer);
                response.with_status(TaskStatus::Answered)
            }
            StageOutcome::Exhausted => {
                warn!("Query agent returned no answer after {} attempts", RETRY_COUNT);
                response.with_status(TaskStatus::Unanswered)
            }
            StageOutcome::Cancelled => response.with_status(TaskStatus::Cancelled),
        }
    }

    async fn run_agent(
        &self,
        request: &TaskRequest,
        correlation_id: String,
        cancel: &CancellationToken,
    ) -> TaskResponse {
        let mut response = TaskResponse::new(RequestType::Agent, correlation_id);
        let agents = Agents::new(&self.client);

        let requirements = if request.enhance_requirements {
            match self.enhance(&request.requirements, cancel).await {
                Ok(enhanced) => enhanced,
                Err(Cancelled) => return response.with_status(TaskStatus::Cancelled),
            }
        } else {
            request.requirements.clone()
        };

        // 1. Full context now, or narrowed once the plan is known.
        let mut context = if request.include_full_context {
            self.files.file_context(None)
        } else {
            String::new()
        };

        // 2. Documentation.
        let documentation = match self.resolve_documentation(&context, true, cancel).await {
            Ok(docs) => docs,
            Err(Cancelled) => return response.with_status(TaskStatus::Cancelled),
        };
        response.documentation = documentation.clone();

        // 3. Planning. An empty plan is a valid outcome.
        let planner = agents.planner();
        let plan = {
            let planner = &planner;
            let req = requirements.as_str();
            let docs = documentation.as_str();
            let ctx = context.as_str();
            retry_stage(
                "Planner",
                RETRY_COUNT,
                cancel,
                move || async move { planner.plan(req, docs, ctx, cancel).await },
                |_: &PlanResult| true,
            )
            .await
        };
        let plan = match plan {
            StageOutcome::Success(plan) => plan,
            StageOutcome::Exhausted => {
                error!("Planning failed after {} attempts; aborting", RETRY_COUNT);
                return response.with_status(TaskStatus::PlanningFailed);
            }
            StageOutcome::Cancelled => return response.with_status(TaskStatus::Cancelled),
        };
        info!(
            "Plan: {} to update, {} to create, {} to delete",
            plan.update.len(),
            plan.create.len(),
            plan.delete.len()
        );
        response.plan = plan.clone();

        // 4. Context narrowing.
        let context_paths = plan.context_paths();
        if !request.include_full_context && !context_paths.is_empty() {
            context = self.files.file_context(Some(&context_paths));
        }

        if plan.is_empty() {
            info!("Planner decided no changes are needed");
            return response.with_status(TaskStatus::NoChanges);
        }

        // 5. Generation, skipped for delete-only plans.
        let generated = if context_paths.is_empty() {
            info!("Plan only deletes files; skipping code generation");
            GeneratedFileSet::new()
        } else {
            let codegen = agents.codegen();
            let codegen = &codegen;
            let req = requirements.as_str();
            let ctx = context.as_str();
            let outcome = retry_stage(
                "CodeGen",
                RETRY_COUNT,
                cancel,
                move || async move { codegen.generate(req, ctx, cancel).await },
                |files: &GeneratedFileSet| !files.is_empty(),
            )
            .await;

            match outcome {
                StageOutcome::Success(files) => files,
                StageOutcome::Exhausted => {
                    warn!("CodeGen output is empty. No files were created/updated.");
                    return response.with_status(TaskStatus::GenerationFailed);
                }
                StageOutcome::Cancelled => return response.with_status(TaskStatus::Cancelled),
            }
        };

        let returned: HashSet<String> = generated
            .keys()
            .map(|path| normalize_separators(path))
            .collect();
        response.missing_files = context_paths
            .iter()
            .filter(|path| !returned.contains(&normalize_separators(path)))
            .cloned()
            .collect();
        if !response.missing_files.is_empty() {
            warn!(
                "CodeGen did not return {} planned file(s): {}",
                response.missing_files.len(),
                response.missing_files.join(", ")
            );
        }

        if cancel.is_cancelled() {
            warn!("Task cancelled before applying changes; workspace untouched");
            return response.with_status(TaskStatus::Cancelled);
        }

        // 6. Checkpoint, then writes, then deletes.
        match self.checkpoints.create_checkpoint() {
            Ok(Some(checkpoint)) => response.checkpoint = Some(checkpoint.name),
            Ok(None) => debug!("Workspace was empty; no checkpoint taken"),
            Err(e) => {
                error!("Failed to create checkpoint, no changes applied: {}", e);
                return response.with_status(TaskStatus::ApplyFailed);
            }
        }

        let written = self.apply_changes(&generated, &plan.delete, &mut response);
        info!(
            "✅ Wrote {} file(s), deleted {} file(s)",
            written,
            response.deleted_files.len()
        );
        response.generated_files = generated;

        // 7. Documentation update: failures never affect the applied changes.
        self.update_documentation(&requirements, &documentation, &plan, &mut response, cancel)
            .await;

        response.with_status(TaskStatus::Completed)
    }

    /// Enhanced requirement, or the original when enhancement fails.
    async fn enhance(
        &self,
        requirements: &str,
        cancel: &CancellationToken,
    ) -> Result<String, Cancelled> {
        let enhancer = Agents::new(&self.client).enhancer();
        match enhancer.enhance(requirements, cancel).await {
            Ok(enhanced) if !enhanced.trim().is_empty() => {
                info!("Enhanced requirement: {}", enhanced);
                Ok(enhanced)
            }
            Ok(_) => {
                warn!("Enhancer returned nothing; using the original requirement");
                Ok(requirements.to_string())
            }
            Err(e) if e.is_cancelled() => Err(Cancelled),
            Err(e) => {
                warn!("Enhancer failed ({}); using the original requirement", e);
                Ok(requirements.to_string())
            }
        }
    }

    /// Existing README, else documentation synthesised from the workspace,
    /// else the empty-workspace fallback.
    ///
    /// Synthesised documentation is saved as the README only when `persist` is set.
    async fn resolve_documentation(
        &self,
        context: &str,
        persist: bool,
        cancel: &CancellationToken,
    ) -> Result<String, Cancelled> {
        let docs = Agents::new(&self.client).docs(&self.files);

        match docs.existing_documentation() {
            Ok(existing) if !existing.trim().is_empty() => return Ok(existing),
            Ok(_) => {}
            Err(e) => warn!("Could not read documentation: {}", e),
        }

        if !self.files.has_files() {
            debug!("Empty workspace; using fallback documentation");
            return Ok(EMPTY_WORKSPACE_DOCUMENTATION.to_string());
        }

        let full_context;
        let context = if context.trim().is_empty() {
            full_context = self.files.file_context(None);
            full_context.as_str()
        } else {
            context
        };

        let synthesised = if persist {
            docs.load_documentation(context, cancel).await
        } else {
            docs.synthesize_documentation(context, cancel)
                .await
                .map_err(DocsError::from)
        };

        match synthesised {
            Ok(generated) if !generated.trim().is_empty() => Ok(generated),
            Ok(_) => {
                warn!("Documentation synthesis returned nothing; continuing without it");
                Ok(String::new())
            }
            Err(e) if e.is_cancelled() => Err(Cancelled),
            Err(e) => {
                warn!("Documentation synthesis failed ({}); continuing without it", e);
                Ok(String::new())
            }
        }
    }

    fn apply_changes(
        &self,
        generated: &GeneratedFileSet,
        deletes: &[String],
        response: &mut TaskResponse,
    ) -> usize {
        let mut written = 0;
        for (path, content) in generated {
            match self.files.save_file(path, content) {
                Ok(()) => written += 1,
                Err(e) => record_failure("write", path, e, response),
            }
        }

        for path in deletes {
            match self.files.delete_file(path) {
                Ok(()) => response.deleted_files.push(path.clone()),
                Err(e) => record_failure("delete", path, e, response),
            }
        }
        written
    }

    async fn update_documentation(
        &self,
        requirements: &str,
        old_documentation: &str,
        plan: &PlanResult,
        response: &mut TaskResponse,
        cancel: &CancellationToken,
    ) {
        let docs = Agents::new(&self.client).docs(&self.files);
        let file_context = serde_json::to_string(&response.generated_files).unwrap_or_default();

        match docs
            .generate_readme(requirements, old_documentation, &plan.to_json(), &file_context, cancel)
            .await
        {
            Ok(doc) if !doc.trim().is_empty() => match docs.save_documentation(&doc) {
                Ok(()) => {
                    info!("📝 Updated {}", README_PATH);
                    response.documentation = doc;
                }
                Err(e) => warn!("Docs update failed, continuing: {}", e),
            },
            Ok(_) => warn!("Docs agent returned nothing; README left unchanged"),
            Err(e) if e.is_cancelled() => {
                warn!("Docs update cancelled; applied changes kept, README left unchanged")
            }
            Err(e) => warn!("Docs update failed, continuing: {}", e),
        }
    }
}

/// Path key that ignores `\` vs `/` separators and a leading `./`.
fn normalize_separators(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    path.trim_start_matches("./").to_string()
}

fn record_failure(action: &str, path: &str, err: WorkspaceError, response: &mut TaskResponse) {
    if err.is_unauthorized() {
        warn!("Refused to {} {}: {}", action, path, err);
        response.rejected_paths.push(path.to_string());
    } else {
        error!("Failed to {} {}: {}", action, path, err);
    }
}
