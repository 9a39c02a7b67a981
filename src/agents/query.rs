use tokio_util::sync::CancellationToken;

use super::prompts::query_prompt;
use super::QUERY_AGENT;
use crate::llm::{PromptClient, PromptError};

/// Answers free-form questions about the project.
pub struct QueryAgent<'a, C> {
    pub(super) client: &'a C,
}

impl<'a, C: PromptClient> QueryAgent<'a, C> {
    pub async fn ask(
        &self,
        query: &str,
        documentation: &str,
        context: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PromptError> {
        self.client
            .execute_prompt(QUERY_AGENT, &query_prompt(query, documentation, context), cancel)
            .await
    }
}
