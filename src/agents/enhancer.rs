use tokio_util::sync::CancellationToken;

use super::prompts::enhancer_prompt;
use super::ENHANCER_AGENT;
use crate::llm::{PromptClient, PromptError};

/// Rewrites a raw requirement into a clearer one. The reply is used verbatim.
pub struct EnhancerAgent<'a, C> {
    pub(super) client: &'a C,
}

impl<'a, C: PromptClient> EnhancerAgent<'a, C> {
    pub async fn enhance(
        &self,
        requirements: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PromptError> {
        self.client
            .execute_prompt(ENHANCER_AGENT, &enhancer_prompt(requirements), cancel)
            .await
    }
}
