//! Agents: one prompt template plus the prompt client plus decoding each.
//!
//! Agents are thin borrowing wrappers over a [`PromptClient`]; they keep no
//! state between calls and never retry. Retry policy belongs to the
//! orchestrator.

mod codegen;
mod docs;
mod enhancer;
mod planner;
mod prompts;
mod query;

pub use codegen::CodeGenAgent;
pub use docs::{DocsAgent, DocsError, README_PATH};
pub use enhancer::EnhancerAgent;
pub use planner::PlannerAgent;
pub use prompts::{default_system_prompt, REQUIREMENTS_MARKER};
pub use query::QueryAgent;

use crate::llm::PromptClient;
use crate::workspace::FileStore;

pub const ENHANCER_AGENT: &str = "Enhancer";
pub const PLANNER_AGENT: &str = "Planner";
pub const CODEGEN_AGENT: &str = "CodeGen";
pub const DOCS_AGENT: &str = "Docs";
pub const QUERY_AGENT: &str = "Query";

/// Borrowing constructors for every agent over one client.
pub struct Agents<'a, C> {
    client: &'a C,
}

impl<'a, C: PromptClient> Agents<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub fn enhancer(&self) -> EnhancerAgent<'a, C> {
        EnhancerAgent { client: self.client }
    }

    pub fn planner(&self) -> PlannerAgent<'a, C> {
        PlannerAgent { client: self.client }
    }

    pub fn codegen(&self) -> CodeGenAgent<'a, C> {
        CodeGenAgent { client: self.client }
    }

    pub fn docs(&self, files: &'a FileStore) -> DocsAgent<'a, C> {
        DocsAgent {
            client: self.client,
            files,
        }
    }

    pub fn query(&self) -> QueryAgent<'a, C> {
        QueryAgent { client: self.client }
    }
}
