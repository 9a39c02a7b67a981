//! Offline provider returning canned replies keyed by agent name.
//!
//! Lets the whole pipeline run end to end without any API key.

use crate::agents::REQUIREMENTS_MARKER;

pub(super) const MOCK_FILE: &str = "src/MockFile.cs";

pub(super) fn reply(agent: &str, prompt: &str) -> String {
    match agent.to_lowercase().as_str() {
        "enhancer" => {
            let requirements = prompt.rsplit(REQUIREMENTS_MARKER).next().unwrap_or(prompt);
            format!("{}\n[ENHANCED]", requirements.trim())
        }
        "planner" => format!(
            "{{\"update\":[],\"create\":[\"{}\"],\"delete\":[]}}",
            MOCK_FILE
        ),
        "codegen" => serde_json::json!({
            MOCK_FILE: "// Generated file\nnamespace Example { public class Generated {} }\n"
        })
        .to_string(),
        "docs" => "# Documentation\n\n## Project Structure\n\n- src/\n\n## File Descriptions\n\n\
                   ## Dependencies\n\n## Recent Changes\n\n## TODOs\n"
            .to_string(),
        "query" => "This is a mock answer. Configure a real provider to ask questions about \
                    the project."
            .to_string(),
        _ => String::new(),
    }
}
