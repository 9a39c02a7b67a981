use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::prompts::planner_prompt;
use super::PLANNER_AGENT;
use crate::domain::PlanResult;
use crate::llm::{PromptClient, PromptError};
use crate::sanitize::sanitize;

pub struct PlannerAgent<'a, C> {
    pub(super) client: &'a C,
}

impl<'a, C: PromptClient> PlannerAgent<'a, C> {
    /// Ask for a plan. `Ok(None)` means the reply held no decodable plan.
    pub async fn plan(
        &self,
        requirements: &str,
        documentation: &str,
        context: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<PlanResult>, PromptError> {
        let prompt = planner_prompt(requirements, context, documentation);
        let reply = self
            .client
            .execute_prompt(PLANNER_AGENT, &prompt, cancel)
            .await?;

        let plan = sanitize::<PlanResult>(&reply);
        if let Some(plan) = &plan {
            debug!("Planner response: {}", plan.to_json());
        }
        Ok(plan)
    }
}
