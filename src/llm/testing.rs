//! Scripted prompt client for tests: per-agent reply queues and call counters.
//!
//! Clones share their queues and call log, so a test can keep a handle after
//! moving the client into an orchestrator.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use super::{PromptClient, PromptError};

enum Scripted {
    Reply(String),
    Fail,
    /// Trip the cancellation token, as a Ctrl-C arriving mid-call would.
    Cancel,
}

#[derive(Default, Clone)]
pub struct ScriptedClient {
    queues: Arc<Mutex<HashMap<String, VecDeque<Scripted>>>>,
    prompts: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, agent: &str, item: Scripted) -> Self {
        self.queues
            .lock()
            .unwrap()
            .entry(agent.to_string())
            .or_default()
            .push_back(item);
        self
    }

    pub fn reply(self, agent: &str, text: &str) -> Self {
        self.push(agent, Scripted::Reply(text.to_string()))
    }

    pub fn fail(self, agent: &str) -> Self {
        self.push(agent, Scripted::Fail)
    }

    pub fn cancel(self, agent: &str) -> Self {
        self.push(agent, Scripted::Cancel)
    }

    pub fn calls(&self, agent: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a == agent)
            .count()
    }

    pub fn prompts(&self, agent: &str) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a == agent)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl PromptClient for ScriptedClient {
    async fn execute_prompt(
        &self,
        agent: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PromptError> {
        if cancel.is_cancelled() {
            return Err(PromptError::Cancelled);
        }

        self.prompts
            .lock()
            .unwrap()
            .push((agent.to_string(), prompt.to_string()));

        let next = self
            .queues
            .lock()
            .unwrap()
            .get_mut(agent)
            .and_then(|queue| queue.pop_front());

        match next {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Fail) => Err(PromptError::Status {
                status: 500,
                body: "scripted failure".to_string(),
            }),
            Some(Scripted::Cancel) => {
                cancel.cancel();
                Err(PromptError::Cancelled)
            }
            None => Err(PromptError::MalformedReply(format!(
                "no scripted reply for {}",
                agent
            ))),
        }
    }
}
