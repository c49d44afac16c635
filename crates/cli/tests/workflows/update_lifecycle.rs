//! Update transaction driven through the CLI

use crate::common::{TestProject, COMMAND_PATH, CONFIG_PATH};
use anyhow::Result;

const USER_CONFIG: &str = "project_name: mine\nlog_level: info\n";

fn customize(project: &TestProject) {
    project.write(".codex/agents/custom.md", "# My agent\n");
    project.write(".codex/state/notes.json", "[\"keep me\"]");
    project.write(CONFIG_PATH, USER_CONFIG);
}

#[test]
fn test_update_keeps_user_files() -> Result<()> {
    let project = TestProject::installed();
    customize(&project);
    let pkg = project.package("pkg-v2");

    let result = project
        .codex(&["update", "--template", &pkg, "--offline"])
        .assert_success()?;
    assert!(result.contains_stdout("Successfully updated from 0.1.0 to 0.2.0"));
    assert!(result.contains_stdout("differences need review"));
    assert!(result.contains_stdout("log_level: debug"));

    assert_eq!(project.read(".codex/agents/dev.md"), "# Dev agent v2\n");
    assert_eq!(project.read(".codex/agents/custom.md"), "# My agent\n");
    assert_eq!(project.read(".codex/state/notes.json"), "[\"keep me\"]");
    assert_eq!(project.read(CONFIG_PATH), USER_CONFIG);
    assert_eq!(project.backups().len(), 1);

    let status = project.codex(&["status"]).assert_success()?;
    assert!(status.contains_stdout("0.2.0"));
    Ok(())
}

#[test]
fn test_update_refreshes_ide_command() -> Result<()> {
    let project = TestProject::installed();
    assert_eq!(project.read(COMMAND_PATH), "# /codex v1\n");
    let pkg = project.package("pkg-v2");

    let result = project
        .codex(&["update", "--template", &pkg, "--offline"])
        .assert_success()?;
    assert!(result.contains_stdout("IDE command:"));
    assert_eq!(project.read(COMMAND_PATH), "# /codex v2\n");
    Ok(())
}

#[test]
fn test_update_with_replace_strategy() -> Result<()> {
    let project = TestProject::installed();
    customize(&project);
    let pkg = project.package("pkg-v2");

    let result = project
        .codex(&["update", "--template", &pkg, "--offline", "--strategy", "replace"])
        .assert_success()?;
    assert!(result.contains_stdout("replaced with the template version"));
    assert_eq!(project.read(CONFIG_PATH), "project_name: demo\nlog_level: debug\n");
    Ok(())
}

#[test]
fn test_same_version_needs_confirmation() -> Result<()> {
    let project = TestProject::installed();
    let pkg = project.package("pkg-v1");

    let declined = project
        .codex(&["update", "--template", &pkg, "--offline"])
        .stdin("n\n")
        .assert_success()?;
    assert!(declined.contains_stdout("Update cancelled by user."));
    assert!(project.backups().is_empty());

    let accepted = project
        .codex(&["update", "--template", &pkg, "--offline"])
        .stdin("y\n")
        .assert_success()?;
    assert!(accepted.contains_stdout("Successfully updated from 0.1.0 to 0.1.0"));

    project
        .codex(&["update", "--template", &pkg, "--offline", "--yes"])
        .assert_success()?;
    assert_eq!(project.backups().len(), 2);
    Ok(())
}

#[test]
fn test_active_workflow_blocks_update() -> Result<()> {
    let project = TestProject::installed();
    project.write(
        ".codex/state/workflow.json",
        r#"{"current_phase":"prd","status":"in_progress","workflow_type":"greenfield-fullstack"}"#,
    );
    let pkg = project.package("pkg-v2");

    let result = project
        .codex(&["update", "--template", &pkg, "--offline"])
        .assert_failure()?;
    assert!(result.contains_stdout("BLOCKED"));
    assert!(result.contains_stdout("greenfield-fullstack"));
    assert!(result.contains_stderr("workflow-in-progress"));
    assert!(project.backups().is_empty());
    assert_eq!(project.read(".codex/agents/dev.md"), "# Dev agent v1\n");
    Ok(())
}

#[test]
fn test_completed_workflow_does_not_block() -> Result<()> {
    let project = TestProject::installed();
    project.write(
        ".codex/state/workflow.json",
        r#"{"current_phase":"completed","status":"completed"}"#,
    );
    let pkg = project.package("pkg-v2");

    project
        .codex(&["update", "--template", &pkg, "--offline"])
        .assert_success()?;
    assert!(project.path(".codex/state/workflow.json").is_file());
    Ok(())
}

#[test]
fn test_schema_mismatch_blocks_without_force() -> Result<()> {
    let project = TestProject::installed();
    let pkg = project.package("pkg-v3");

    let result = project
        .codex(&["update", "--template", &pkg, "--offline"])
        .assert_failure()?;
    assert!(result.contains_stderr("schema-mismatch"));
    assert!(project.backups().is_empty());
    Ok(())
}

#[test]
fn test_schema_override_needs_exact_token() -> Result<()> {
    let project = TestProject::installed();
    let pkg = project.package("pkg-v3");

    let cancelled = project
        .codex(&["update", "--template", &pkg, "--offline", "--force-schema"])
        .stdin("yes\n")
        .assert_success()?;
    assert!(cancelled.contains_stdout("Schema override cancelled"));
    assert_eq!(project.read(".codex/agents/dev.md"), "# Dev agent v1\n");

    project
        .codex(&["update", "--template", &pkg, "--offline", "--force-schema"])
        .stdin("OVERRIDE SCHEMA\n")
        .assert_success()?;
    assert_eq!(project.read(".codex/agents/dev.md"), "# Dev agent v3\n");

    let status = project.codex(&["status"]).assert_success()?;
    assert!(status.contains_stdout("Schema:      2"));
    Ok(())
}

#[test]
fn test_unknown_target_version_is_fetch_error() -> Result<()> {
    let project = TestProject::installed();
    let pkg = project.package("pkg-v2");

    let result = project
        .codex(&["update", "--template", &pkg, "--offline", "--to", "9.9.9"])
        .assert_failure()?;
    assert!(result.contains_stderr("fetch-error"));
    Ok(())
}

#[test]
fn test_check_reports_available_update() -> Result<()> {
    let project = TestProject::installed();
    let pkg = project.package("pkg-v2");

    let result = project
        .codex(&["check", "--template", &pkg, "--offline"])
        .assert_success()?;
    assert!(result.contains_stdout("update is available"));
    assert!(result.contains_stdout("minor"));

    let current = project.package("pkg-v1");
    let result = project
        .codex(&["check", "--template", &current, "--offline"])
        .assert_success()?;
    assert!(result.contains_stdout("Up to date"));
    Ok(())
}
