use tokio_util::sync::CancellationToken;

use super::prompts::codegen_prompt;
use super::CODEGEN_AGENT;
use crate::domain::GeneratedFileSet;
use crate::llm::{PromptClient, PromptError};
use crate::sanitize::sanitize;

pub struct CodeGenAgent<'a, C> {
    pub(super) client: &'a C,
}

impl<'a, C: PromptClient> CodeGenAgent<'a, C> {
    /// Generate full file contents. `Ok(None)` means the reply was not a file map.
    pub async fn generate(
        &self,
        requirements: &str,
        context: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<GeneratedFileSet>, PromptError> {
        let reply = self
            .client
            .execute_prompt(CODEGEN_AGENT, &codegen_prompt(requirements, context), cancel)
            .await?;
        Ok(sanitize::<GeneratedFileSet>(&reply))
    }
}
