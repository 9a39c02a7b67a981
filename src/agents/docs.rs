//! Project documentation kept in the workspace README.

use chrono::Local;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::prompts::{initial_docs_prompt, readme_prompt};
use super::DOCS_AGENT;
use crate::llm::{PromptClient, PromptError};
use crate::workspace::{FileStore, WorkspaceError};

/// Documentation file maintained by the Docs agent.
pub const README_PATH: &str = "README.md";

#[derive(Debug, Error)]
pub enum DocsError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

impl DocsError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DocsError::Prompt(e) if e.is_cancelled())
    }
}

pub struct DocsAgent<'a, C> {
    pub(super) client: &'a C,
    pub(super) files: &'a FileStore,
}

impl<'a, C: PromptClient> DocsAgent<'a, C> {
    /// Existing README content, or an empty string when there is none.
    pub fn existing_documentation(&self) -> Result<String, WorkspaceError> {
        self.files.read_file(README_PATH)
    }

    /// Return the README verbatim, or synthesise and persist one from `context`.
    ///
    /// With no README and a blank context the result is an empty string and
    /// no prompt is sent.
    pub async fn load_documentation(
        &self,
        context: &str,
        cancel: &CancellationToken,
    ) -> Result<String, DocsError> {
        let existing = self.existing_documentation()?;
        if !existing.trim().is_empty() {
            debug!("Loaded existing documentation ({} chars)", existing.len());
            return Ok(existing);
        }

        if context.trim().is_empty() {
            return Ok(String::new());
        }

        let generated = self.synthesize_documentation(context, cancel).await?;
        if !generated.trim().is_empty() {
            self.save_documentation(&generated)?;
        }
        Ok(generated)
    }

    /// Ask for initial documentation of `context` without touching the workspace.
    pub async fn synthesize_documentation(
        &self,
        context: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PromptError> {
        info!("📝 No documentation found; generating it from the workspace");
        self.client
            .execute_prompt(DOCS_AGENT, &initial_docs_prompt(context), cancel)
            .await
    }

    /// Rewrite the documentation after a change. The reply is the new document.
    pub async fn generate_readme(
        &self,
        requirements: &str,
        old_documentation: &str,
        plan_json: &str,
        file_context: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PromptError> {
        let today = Local::now().format("%Y-%m-%d").to_string();
        let prompt = readme_prompt(
            file_context,
            requirements,
            old_documentation,
            plan_json,
            &today,
        );
        self.client.execute_prompt(DOCS_AGENT, &prompt, cancel).await
    }

    pub fn save_documentation(&self, content: &str) -> Result<(), WorkspaceError> {
        self.files.save_file(README_PATH, content)
    }
}
