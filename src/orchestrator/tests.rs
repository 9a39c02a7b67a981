//! Tests for the orchestration pipeline.

#[cfg(test)]
mod tests {
    use crate::agents::{
        README_PATH, CODEGEN_AGENT, DOCS_AGENT, ENHANCER_AGENT, PLANNER_AGENT, QUERY_AGENT,
    };
    use crate::domain::{TaskRequest, TaskStatus};
    use crate::llm::testing::ScriptedClient;
    use crate::orchestrator::{Orchestrator, EMPTY_WORKSPACE_DOCUMENTATION, RETRY_COUNT};
    use crate::workspace::FileStore;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    const FOO_PLAN: &str = r#"{"update": [], "create": ["Foo.cs"], "delete": []}"#;
    const FOO_FILES: &str = r#"{"Foo.cs": "public class Foo {}"}"#;

    fn orchestrator(temp_dir: &TempDir, client: ScriptedClient) -> Orchestrator<ScriptedClient> {
        Orchestrator::new(client, FileStore::new(temp_dir.path()).unwrap())
    }

    /// Workspace with one source file and an existing README.
    fn seeded(temp_dir: &TempDir) {
        let files = FileStore::new(temp_dir.path()).unwrap();
        files.save_file("Bar.cs", "public class Bar {}").unwrap();
        files.save_file(README_PATH, "# Old docs").unwrap();
    }

    #[tokio::test]
    async fn test_agent_end_to_end_on_empty_workspace() {
        let temp_dir = TempDir::new().unwrap();
        let client = ScriptedClient::new()
            .reply(PLANNER_AGENT, FOO_PLAN)
            .reply(CODEGEN_AGENT, &format!("Sure!\n```json\n{}\n```", FOO_FILES))
            .reply(DOCS_AGENT, "# Documentation\n## Recent Changes\n- Added Foo.cs\n");
        let orch = orchestrator(&temp_dir, client);
        let cancel = CancellationToken::new();

        let response = orch
            .handle_task(&TaskRequest::agent("add a Foo class", false), &cancel)
            .await;

        assert_eq!(response.status, TaskStatus::Completed);
        assert!(!response.correlation_id.is_empty());
        assert_eq!(response.plan.create, vec!["Foo.cs".to_string()]);
        assert_eq!(response.generated_files["Foo.cs"], "public class Foo {}");
        assert!(response.documentation.starts_with("# Documentation"));
        assert!(response.missing_files.is_empty());
        // Nothing existed to protect.
        assert!(response.checkpoint.is_none());

        let files = orch.files();
        assert_eq!(files.read_file("Foo.cs").unwrap(), "public class Foo {}");
        assert_eq!(files.read_file(README_PATH).unwrap(), response.documentation);

        // The empty-workspace fallback fed the planner; no synthesis call was made.
        let planner_prompt = &orch.client().prompts(PLANNER_AGENT)[0];
        assert!(planner_prompt.contains(EMPTY_WORKSPACE_DOCUMENTATION));
        assert!(planner_prompt.contains("add a Foo class"));
        assert_eq!(orch.client().calls(DOCS_AGENT), 1);
    }

    #[tokio::test]
    async fn test_empty_plan_skips_generation() {
        let temp_dir = TempDir::new().unwrap();
        seeded(&temp_dir);
        let client = ScriptedClient::new().reply(PLANNER_AGENT, "{}");
        let orch = orchestrator(&temp_dir, client);

        let response = orch
            .handle_task(&TaskRequest::agent("nothing to do", true), &CancellationToken::new())
            .await;

        assert_eq!(response.status, TaskStatus::NoChanges);
        assert!(response.plan.is_empty());
        assert_eq!(orch.client().calls(CODEGEN_AGENT), 0);
        assert_eq!(orch.client().calls(DOCS_AGENT), 0);
        assert!(orch.checkpoints().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_planner_exhaustion_leaves_workspace_untouched() {
        let temp_dir = TempDir::new().unwrap();
        seeded(&temp_dir);
        let client = ScriptedClient::new()
            .reply(PLANNER_AGENT, "no json")
            .fail(PLANNER_AGENT)
            .reply(PLANNER_AGENT, "{ broken");
        let orch = orchestrator(&temp_dir, client);

        let response = orch
            .handle_task(&TaskRequest::agent("add Foo", false), &CancellationToken::new())
            .await;

        assert_eq!(response.status, TaskStatus::PlanningFailed);
        assert!(response.plan.is_empty());
        assert!(response.generated_files.is_empty());
        assert_eq!(orch.client().calls(PLANNER_AGENT), RETRY_COUNT as usize);
        assert_eq!(orch.client().calls(CODEGEN_AGENT), 0);
        assert_eq!(orch.files().enumerate_files(), vec!["Bar.cs", "README.md"]);
        assert!(orch.checkpoints().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_planner_success_on_second_attempt() {
        let temp_dir = TempDir::new().unwrap();
        let client = ScriptedClient::new()
            .reply(PLANNER_AGENT, "Let me think about it.")
            .reply(PLANNER_AGENT, FOO_PLAN)
            .reply(CODEGEN_AGENT, FOO_FILES)
            .reply(DOCS_AGENT, "# Documentation");
        let orch = orchestrator(&temp_dir, client);

        let response = orch
            .handle_task(&TaskRequest::agent("add Foo", false), &CancellationToken::new())
            .await;

        assert_eq!(response.status, TaskStatus::Completed);
        assert_eq!(orch.client().calls(PLANNER_AGENT), 2);
        assert_eq!(orch.client().calls(CODEGEN_AGENT), 1);
    }

    #[tokio::test]
    async fn test_codegen_exhaustion_mutates_nothing() {
        let temp_dir = TempDir::new().unwrap();
        seeded(&temp_dir);
        let client = ScriptedClient::new()
            .reply(PLANNER_AGENT, r#"{"update": ["Bar.cs"], "delete": ["README.md"]}"#)
            .reply(CODEGEN_AGENT, "{}")
            .reply(CODEGEN_AGENT, "not a map")
            .fail(CODEGEN_AGENT);
        let orch = orchestrator(&temp_dir, client);

        let response = orch
            .handle_task(&TaskRequest::agent("change Bar", false), &CancellationToken::new())
            .await;

        assert_eq!(response.status, TaskStatus::GenerationFailed);
        assert_eq!(orch.client().calls(CODEGEN_AGENT), RETRY_COUNT as usize);
        assert!(response.deleted_files.is_empty());
        assert_eq!(orch.files().read_file("Bar.cs").unwrap(), "public class Bar {}");
        assert_eq!(orch.files().read_file(README_PATH).unwrap(), "# Old docs");
        assert!(orch.checkpoints().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_context_narrowed_to_planned_files() {
        let temp_dir = TempDir::new().unwrap();
        seeded(&temp_dir);
        let files = FileStore::new(temp_dir.path()).unwrap();
        files.save_file("Other.cs", "class Other {}").unwrap();

        let client = ScriptedClient::new()
            .reply(PLANNER_AGENT, r#"{"update": ["Bar.cs", "Bar.cs"]}"#)
            .reply(CODEGEN_AGENT, r#"{"Bar.cs": "public class Bar { int x; }"}"#)
            .reply(DOCS_AGENT, "# Documentation");
        let orch = orchestrator(&temp_dir, client);

        orch.handle_task(&TaskRequest::agent("change Bar", false), &CancellationToken::new())
            .await;

        let codegen_prompt = &orch.client().prompts(CODEGEN_AGENT)[0];
        assert_eq!(codegen_prompt.matches("# FILE: Bar.cs").count(), 1);
        assert!(!codegen_prompt.contains("Other.cs"));
    }

    #[tokio::test]
    async fn test_checkpoint_then_restore_recovers_previous_state() {
        let temp_dir = TempDir::new().unwrap();
        seeded(&temp_dir);
        let client = ScriptedClient::new()
            .reply(PLANNER_AGENT, r#"{"update": ["Bar.cs"], "create": ["Foo.cs"]}"#)
            .reply(
                CODEGEN_AGENT,
                r#"{"Bar.cs": "public class Bar { }", "Foo.cs": "public class Foo {}"}"#,
            )
            .reply(DOCS_AGENT, "# New docs");
        let orch = orchestrator(&temp_dir, client);
        let cancel = CancellationToken::new();

        let response = orch
            .handle_task(&TaskRequest::agent("add Foo", false), &cancel)
            .await;
        assert_eq!(response.status, TaskStatus::Completed);
        assert!(response.checkpoint.is_some());
        assert_eq!(orch.files().read_file(README_PATH).unwrap(), "# New docs");

        let restored = orch.handle_task(&TaskRequest::restore(), &cancel).await;
        assert_eq!(restored.status, TaskStatus::Restored);
        assert_eq!(restored.checkpoint, response.checkpoint);
        assert!(restored
            .answer
            .as_deref()
            .unwrap()
            .starts_with("Workspace restored from checkpoint"));

        assert_eq!(orch.files().enumerate_files(), vec!["Bar.cs", "README.md"]);
        assert_eq!(orch.files().read_file("Bar.cs").unwrap(), "public class Bar {}");
        assert_eq!(orch.files().read_file(README_PATH).unwrap(), "# Old docs");
        assert!(orch.checkpoints().list().unwrap().is_empty());

        // Restore never reaches an agent.
        assert_eq!(orch.client().total_calls(), 3);
    }

    #[tokio::test]
    async fn test_restore_without_checkpoints() {
        let temp_dir = TempDir::new().unwrap();
        seeded(&temp_dir);
        let orch = orchestrator(&temp_dir, ScriptedClient::new());

        let response = orch
            .handle_task(&TaskRequest::restore(), &CancellationToken::new())
            .await;

        assert_eq!(response.status, TaskStatus::NoChanges);
        assert_eq!(response.answer.as_deref(), Some("No checkpoints found to restore."));
        assert_eq!(orch.files().enumerate_files(), vec!["Bar.cs", "README.md"]);
    }

    #[tokio::test]
    async fn test_docs_failure_is_isolated() {
        let temp_dir = TempDir::new().unwrap();
        seeded(&temp_dir);
        let client = ScriptedClient::new()
            .reply(PLANNER_AGENT, FOO_PLAN)
            .reply(CODEGEN_AGENT, FOO_FILES)
            .fail(DOCS_AGENT);
        let orch = orchestrator(&temp_dir, client);

        let response = orch
            .handle_task(&TaskRequest::agent("add Foo", false), &CancellationToken::new())
            .await;

        assert_eq!(response.status, TaskStatus::Completed);
        assert_eq!(orch.files().read_file("Foo.cs").unwrap(), "public class Foo {}");
        assert_eq!(orch.files().read_file(README_PATH).unwrap(), "# Old docs");
        assert_eq!(response.documentation, "# Old docs");
        assert_eq!(orch.checkpoints().list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_only_plan() {
        let temp_dir = TempDir::new().unwrap();
        seeded(&temp_dir);
        let client = ScriptedClient::new()
            .reply(PLANNER_AGENT, r#"{"delete": ["Bar.cs"]}"#)
            .reply(DOCS_AGENT, "# Docs without Bar");
        let orch = orchestrator(&temp_dir, client);

        let response = orch
            .handle_task(&TaskRequest::agent("remove Bar", false), &CancellationToken::new())
            .await;

        assert_eq!(response.status, TaskStatus::Completed);
        assert_eq!(orch.client().calls(CODEGEN_AGENT), 0);
        assert_eq!(response.deleted_files, vec!["Bar.cs".to_string()]);
        assert!(response.checkpoint.is_some());
        assert!(!orch.files().file_exists("Bar.cs").unwrap());
        assert_eq!(orch.files().read_file(README_PATH).unwrap(), "# Docs without Bar");
    }

    #[tokio::test]
    async fn test_escaping_and_missing_paths_are_reported() {
        let temp_dir = TempDir::new().unwrap();
        let workspace = temp_dir.path().join("ws");
        let client = ScriptedClient::new()
            .reply(PLANNER_AGENT, r#"{"create": ["Foo.cs", "Baz.cs"]}"#)
            .reply(
                CODEGEN_AGENT,
                r#"{"Foo.cs": "class Foo {}", "../evil.cs": "class Evil {}"}"#,
            )
            .reply(DOCS_AGENT, "# Documentation");
        let orch = Orchestrator::new(client, FileStore::new(&workspace).unwrap());

        let response = orch
            .handle_task(&TaskRequest::agent("add Foo and Baz", false), &CancellationToken::new())
            .await;

        assert_eq!(response.status, TaskStatus::Completed);
        assert_eq!(response.missing_files, vec!["Baz.cs".to_string()]);
        assert_eq!(response.rejected_paths, vec!["../evil.cs".to_string()]);
        assert!(orch.files().file_exists("Foo.cs").unwrap());
        assert!(!temp_dir.path().join("evil.cs").exists());
        assert_eq!(orch.client().calls(CODEGEN_AGENT), 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_pipeline() {
        let temp_dir = TempDir::new().unwrap();
        seeded(&temp_dir);
        let client = ScriptedClient::new()
            .cancel(PLANNER_AGENT)
            .reply(PLANNER_AGENT, FOO_PLAN);
        let orch = orchestrator(&temp_dir, client);
        let cancel = CancellationToken::new();

        let response = orch
            .handle_task(&TaskRequest::agent("add Foo", false), &cancel)
            .await;

        assert_eq!(response.status, TaskStatus::Cancelled);
        assert_eq!(orch.client().calls(PLANNER_AGENT), 1);
        assert_eq!(orch.client().calls(CODEGEN_AGENT), 0);
        assert!(!orch.files().file_exists("Foo.cs").unwrap());
    }

    #[tokio::test]
    async fn test_enhancement_feeds_planner_and_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        seeded(&temp_dir);
        let client = ScriptedClient::new()
            .reply(ENHANCER_AGENT, "Add a public Foo class with XML docs")
            .reply(PLANNER_AGENT, "{}")
            .fail(ENHANCER_AGENT)
            .reply(PLANNER_AGENT, "{}");
        let orch = orchestrator(&temp_dir, client);
        let cancel = CancellationToken::new();

        let request = TaskRequest::agent("add Foo", false).with_enhancement(true);
        orch.handle_task(&request, &cancel).await;
        let response = orch.handle_task(&request, &cancel).await;

        assert_eq!(response.status, TaskStatus::NoChanges);
        let prompts = orch.client().prompts(PLANNER_AGENT);
        assert!(prompts[0].contains("Add a public Foo class with XML docs"));
        assert!(prompts[1].contains("add Foo"));
        assert_eq!(orch.client().calls(ENHANCER_AGENT), 2);
    }

    #[tokio::test]
    async fn test_documentation_synthesised_for_undocumented_workspace() {
        let temp_dir = TempDir::new().unwrap();
        FileStore::new(temp_dir.path())
            .unwrap()
            .save_file("Bar.cs", "public class Bar {}")
            .unwrap();
        let client = ScriptedClient::new()
            .reply(DOCS_AGENT, "# Initial docs")
            .reply(PLANNER_AGENT, "{}");
        let orch = orchestrator(&temp_dir, client);

        let response = orch
            .handle_task(&TaskRequest::agent("anything", false), &CancellationToken::new())
            .await;

        assert_eq!(response.documentation, "# Initial docs");
        assert_eq!(orch.files().read_file(README_PATH).unwrap(), "# Initial docs");
        let docs_prompt = &orch.client().prompts(DOCS_AGENT)[0];
        assert!(docs_prompt.contains("# FILE: Bar.cs"));
    }

    #[tokio::test]
    async fn test_ask_retries_blank_answers() {
        let temp_dir = TempDir::new().unwrap();
        seeded(&temp_dir);
        let client = ScriptedClient::new()
            .reply(QUERY_AGENT, "")
            .reply(QUERY_AGENT, "   ")
            .reply(QUERY_AGENT, "Bar is a class.");
        let orch = orchestrator(&temp_dir, client);

        let response = orch
            .handle_task(&TaskRequest::ask("what is Bar?", true), &CancellationToken::new())
            .await;

        assert_eq!(response.status, TaskStatus::Answered);
        assert_eq!(response.answer.as_deref(), Some("Bar is a class."));
        assert_eq!(orch.client().calls(QUERY_AGENT), 3);
        assert!(orch.client().prompts(QUERY_AGENT)[0].contains("# FILE: Bar.cs"));
        assert_eq!(orch.files().read_file("Bar.cs").unwrap(), "public class Bar {}");
    }

    #[tokio::test]
    async fn test_ask_unanswered_after_retries() {
        let temp_dir = TempDir::new().unwrap();
        seeded(&temp_dir);
        let client = ScriptedClient::new()
            .reply(QUERY_AGENT, "")
            .fail(QUERY_AGENT)
            .reply(QUERY_AGENT, "\n");
        let orch = orchestrator(&temp_dir, client);

        let response = orch
            .handle_task(&TaskRequest::ask("what?", false), &CancellationToken::new())
            .await;

        assert_eq!(response.status, TaskStatus::Unanswered);
        assert!(response.answer.is_none());
        assert_eq!(orch.client().calls(QUERY_AGENT), RETRY_COUNT as usize);
    }

    #[tokio::test]
    async fn test_ask_keeps_synthesised_documentation_in_memory() {
        let temp_dir = TempDir::new().unwrap();
        FileStore::new(temp_dir.path())
            .unwrap()
            .save_file("Bar.cs", "public class Bar {}")
            .unwrap();
        let client = ScriptedClient::new()
            .reply(DOCS_AGENT, "# Synthesised")
            .reply(QUERY_AGENT, "Bar is a class.");
        let orch = orchestrator(&temp_dir, client);
        let before = orch.files().enumerate_files();

        let response = orch
            .handle_task(&TaskRequest::ask("what?", false), &CancellationToken::new())
            .await;

        assert_eq!(response.status, TaskStatus::Answered);
        assert_eq!(response.documentation, "# Synthesised");
        assert!(orch.client().prompts(QUERY_AGENT)[0].contains("# Synthesised"));
        assert_eq!(orch.files().enumerate_files(), before);
        assert!(!orch.files().file_exists(README_PATH).unwrap());
    }

    #[tokio::test]
    async fn test_checkpoint_failure_aborts_apply() {
        let temp_dir = TempDir::new().unwrap();
        seeded(&temp_dir);
        // A plain file where the checkpoint directory should be.
        std::fs::write(temp_dir.path().join(".checkpoints"), "not a directory").unwrap();
        let client = ScriptedClient::new()
            .reply(
                PLANNER_AGENT,
                r#"{"update": ["Bar.cs"], "create": ["Foo.cs"], "delete": ["README.md"]}"#,
            )
            .reply(
                CODEGEN_AGENT,
                r#"{"Bar.cs": "public class Bar { int x; }", "Foo.cs": "public class Foo {}"}"#,
            );
        let orch = orchestrator(&temp_dir, client);

        let response = orch
            .handle_task(&TaskRequest::agent("add Foo", false), &CancellationToken::new())
            .await;

        assert_eq!(response.status, TaskStatus::ApplyFailed);
        assert!(response.checkpoint.is_none());
        assert!(response.generated_files.is_empty());
        assert!(response.deleted_files.is_empty());
        assert_eq!(orch.files().read_file("Bar.cs").unwrap(), "public class Bar {}");
        assert!(!orch.files().file_exists("Foo.cs").unwrap());
        assert_eq!(orch.files().read_file(README_PATH).unwrap(), "# Old docs");
        assert_eq!(orch.client().calls(DOCS_AGENT), 0);
    }

    #[tokio::test]
    async fn test_cancelled_docs_update_keeps_applied_changes() {
        let temp_dir = TempDir::new().unwrap();
        seeded(&temp_dir);
        let client = ScriptedClient::new()
            .reply(PLANNER_AGENT, FOO_PLAN)
            .reply(CODEGEN_AGENT, FOO_FILES)
            .cancel(DOCS_AGENT);
        let orch = orchestrator(&temp_dir, client);
        let cancel = CancellationToken::new();

        let response = orch
            .handle_task(&TaskRequest::agent("add Foo", false), &cancel)
            .await;

        assert!(cancel.is_cancelled());
        assert_eq!(response.status, TaskStatus::Completed);
        assert_eq!(orch.files().read_file("Foo.cs").unwrap(), "public class Foo {}");
        assert_eq!(orch.files().read_file(README_PATH).unwrap(), "# Old docs");
        assert_eq!(response.documentation, "# Old docs");
    }

    #[tokio::test]
    async fn test_missing_files_ignore_separator_style() {
        let temp_dir = TempDir::new().unwrap();
        let client = ScriptedClient::new()
            .reply(PLANNER_AGENT, r#"{"create": ["src\\Foo.cs", "./src/Bar.cs", "src/Baz.cs"]}"#)
            .reply(
                CODEGEN_AGENT,
                r#"{"src/Foo.cs": "class Foo {}", "src/Bar.cs": "class Bar {}"}"#,
            )
            .reply(DOCS_AGENT, "# Documentation");
        let orch = orchestrator(&temp_dir, client);

        let response = orch
            .handle_task(&TaskRequest::agent("add classes", false), &CancellationToken::new())
            .await;

        assert_eq!(response.status, TaskStatus::Completed);
        assert_eq!(response.missing_files, vec!["src/Baz.cs".to_string()]);
        assert!(orch.files().file_exists("src/Foo.cs").unwrap());
    }
}
