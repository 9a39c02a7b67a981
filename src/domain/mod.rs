//! Domain types shared across modules.
//!
//! These are the request/response shapes that flow between the CLI, the
//! orchestrator and the agents. Keeping them here avoids circular
//! dependencies between `agents`, `orchestrator` and `workspace`.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// Kind of interaction requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestType {
    /// Answer a question about the project, no file mutation.
    Ask,
    /// Plan, generate and apply file changes.
    Agent,
    /// Roll the workspace back to the latest checkpoint.
    Restore,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Ask => "ask",
            RequestType::Agent => "agent",
            RequestType::Restore => "restore",
        }
    }
}

impl std::str::FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ask" => Ok(RequestType::Ask),
            "agent" => Ok(RequestType::Agent),
            "restore" => Ok(RequestType::Restore),
            other => Err(format!("Unknown request type: {}", other)),
        }
    }
}

/// One user interaction. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub request_type: RequestType,
    pub requirements: String,
    pub include_full_context: bool,
    #[serde(default)]
    pub enhance_requirements: bool,
}

impl TaskRequest {
    pub fn ask(query: impl Into<String>, include_full_context: bool) -> Self {
        Self {
            request_type: RequestType::Ask,
            requirements: query.into(),
            include_full_context,
            enhance_requirements: false,
        }
    }

    pub fn agent(requirements: impl Into<String>, include_full_context: bool) -> Self {
        Self {
            request_type: RequestType::Agent,
            requirements: requirements.into(),
            include_full_context,
            enhance_requirements: false,
        }
    }

    pub fn restore() -> Self {
        Self {
            request_type: RequestType::Restore,
            requirements: String::new(),
            include_full_context: false,
            enhance_requirements: false,
        }
    }

    pub fn with_enhancement(mut self, enhance: bool) -> Self {
        self.enhance_requirements = enhance;
        self
    }
}

/// Planner decision: which workspace-relative paths to touch.
///
/// Decoding is tolerant: missing lists default to empty and the common key
/// spellings models produce are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanResult {
    #[serde(alias = "Update", alias = "filesToUpdate", alias = "files_to_update")]
    pub update: Vec<String>,
    #[serde(alias = "Create", alias = "filesToCreate", alias = "files_to_create")]
    pub create: Vec<String>,
    #[serde(alias = "Delete", alias = "filesToDelete", alias = "files_to_delete")]
    pub delete: Vec<String>,
}

impl PlanResult {
    /// True when the plan asks for no change at all.
    pub fn is_empty(&self) -> bool {
        self.update.is_empty() && self.create.is_empty() && self.delete.is_empty()
    }

    /// Update ∪ Create with duplicates removed, first occurrence wins.
    pub fn context_paths(&self) -> Vec<String> {
        dedup_paths(self.update.iter().chain(self.create.iter()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Remove duplicate paths while keeping the original order.
pub fn dedup_paths<'a>(paths: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|p| seen.insert(p.as_str()))
        .cloned()
        .collect()
}

/// Path → full file content, as produced by the CodeGen agent.
pub type GeneratedFileSet = BTreeMap<String, String>;

/// Final state of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Files were generated and applied.
    Completed,
    /// The planner decided nothing needs to change.
    NoChanges,
    PlanningFailed,
    GenerationFailed,
    /// Checkpoint creation failed; nothing was written.
    ApplyFailed,
    Answered,
    Unanswered,
    Restored,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Completed => "completed",
            TaskStatus::NoChanges => "no changes",
            TaskStatus::PlanningFailed => "planning failed",
            TaskStatus::GenerationFailed => "generation failed",
            TaskStatus::ApplyFailed => "apply failed",
            TaskStatus::Answered => "answered",
            TaskStatus::Unanswered => "unanswered",
            TaskStatus::Restored => "restored",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the run ended without doing what was asked.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            TaskStatus::PlanningFailed
                | TaskStatus::GenerationFailed
                | TaskStatus::ApplyFailed
                | TaskStatus::Unanswered
                | TaskStatus::Cancelled
        )
    }
}

/// Aggregated result of one `handle_task` call.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    pub request_type: RequestType,
    pub status: TaskStatus,
    pub correlation_id: String,
    pub plan: PlanResult,
    pub generated_files: GeneratedFileSet,
    pub deleted_files: Vec<String>,
    pub documentation: String,
    /// Free-form text for ASK answers and RESTORE outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected_paths: Vec<String>,
}

impl TaskResponse {
    pub fn new(request_type: RequestType, correlation_id: impl Into<String>) -> Self {
        Self {
            request_type,
            status: TaskStatus::NoChanges,
            correlation_id: correlation_id.into(),
            plan: PlanResult::default(),
            generated_files: GeneratedFileSet::new(),
            deleted_files: Vec::new(),
            documentation: String::new(),
            answer: None,
            checkpoint: None,
            missing_files: Vec::new(),
            rejected_paths: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }
}
