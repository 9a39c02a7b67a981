//! Prompt templates and built-in system prompts.
//!
//! User prompts carry the data in labelled sections; the output contract
//! lives in the system prompt so a configured `systemPrompt` can replace it.

use super::{CODEGEN_AGENT, DOCS_AGENT, ENHANCER_AGENT, PLANNER_AGENT, QUERY_AGENT};

/// Label preceding the raw requirement in the Enhancer prompt.
pub const REQUIREMENTS_MARKER: &str = "Requirements:\n";

const README_TEMPLATE: &str = "\
# Documentation
## Project Structure
## File Descriptions
## Dependencies
## Recent Changes
## TODOs";

const ENHANCER_SYSTEM_PROMPT: &str = "\
You are a senior software engineer refining feature requests. Rewrite the \
requirements you are given so they are specific, complete and unambiguous. \
Return only the enhanced requirement text without markdown or any other formatting.";

const PLANNER_SYSTEM_PROMPT: &str = r#"You are a project planning assistant.
Decide which files should be CREATED, UPDATED and DELETED to complete the task.
Use workspace-relative paths with forward slashes. Never plan changes to the
documentation file; it is maintained separately. If the documentation is
empty, every file you need is a new file to create.
Return only valid raw JSON without markdown formatting, without explanations
and without surrounding code fences. Example of the required format:
{
  "update": ["Controllers/AuthController.cs"],
  "create": ["Services/EmailService.cs"],
  "delete": ["Services/TempService.cs"]
}"#;

const CODEGEN_SYSTEM_PROMPT: &str = r#"You are an expert software engineer.
Write the complete content of every file needed to complete the task, using
the provided context for files that already exist. Always return whole files,
never fragments or diffs.
Return only a flat JSON object mapping each workspace-relative path to its full
content, without markdown formatting, without code blocks and without
explanations:
{
  "filepath/fileName.ext": "file content",
  "filepath/fileName2.ext": "file2 content"
}"#;

const QUERY_SYSTEM_PROMPT: &str = "\
You are a helpful assistant answering questions about a software project. \
Use the documentation and file context provided. If the answer is not in the \
material, say so instead of guessing.";

const DOCS_SYSTEM_PROMPT_HEAD: &str = "\
You are maintaining project documentation in markdown format.
Write the documentation in the following format:";

const DOCS_SYSTEM_PROMPT_RULES: &str = "\
- Update '## Project Structure' to reflect the actual files and folders as a tree.
- In '## File Descriptions', keep previous entries intact and only add, update or \
remove entries. Summarise each file by its purpose, its key types, functions or \
settings, and how it fits into the overall project.
- In '## Dependencies', list the libraries, frameworks and configuration required.
- In '## Recent Changes', keep previous entries intact and add a new dated entry \
summarising created, updated and deleted files.
- Keep '## TODOs' current with the implementation and add relevant new items.
- Return the full updated markdown only.";

/// Built-in system prompt for `agent`, used when the config sets none.
pub fn default_system_prompt(agent: &str) -> String {
    match agent {
        ENHANCER_AGENT => ENHANCER_SYSTEM_PROMPT.to_string(),
        PLANNER_AGENT => PLANNER_SYSTEM_PROMPT.to_string(),
        CODEGEN_AGENT => CODEGEN_SYSTEM_PROMPT.to_string(),
        DOCS_AGENT => format!(
            "{}\n{}\n{}",
            DOCS_SYSTEM_PROMPT_HEAD, README_TEMPLATE, DOCS_SYSTEM_PROMPT_RULES
        ),
        QUERY_AGENT => QUERY_SYSTEM_PROMPT.to_string(),
        _ => String::new(),
    }
}

pub(super) fn enhancer_prompt(requirements: &str) -> String {
    format!("{}{}", REQUIREMENTS_MARKER, requirements)
}

pub(super) fn planner_prompt(task: &str, context: &str, documentation: &str) -> String {
    format!(
        "TASK:\n{}\n\nCONTEXT:\n{}\n\nDOCUMENTATION:\n{}",
        task, context, documentation
    )
}

pub(super) fn codegen_prompt(task: &str, context: &str) -> String {
    format!("TASK:\n{}\n\nCONTEXT:\n{}", task, context)
}

pub(super) fn initial_docs_prompt(context: &str) -> String {
    format!("CONTEXT:\n{}", context)
}

pub(super) fn readme_prompt(
    file_context: &str,
    requirements: &str,
    old_documentation: &str,
    plan_json: &str,
    date: &str,
) -> String {
    format!(
        "CONTEXT:\n{}\n\nREQUIREMENTS:\n{}\n\nOLD DOCUMENTATION:\n{}\n\nPLAN JSON:\n{}\n\nTODAY:\n{}",
        file_context, requirements, old_documentation, plan_json, date
    )
}

pub(super) fn query_prompt(query: &str, documentation: &str, context: &str) -> String {
    format!(
        "QUERY:\n{}\n\nDOCUMENTATION:\n{}\n\nCONTEXT:\n{}",
        query, documentation, context
    )
}
