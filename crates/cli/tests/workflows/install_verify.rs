//! Install, verify and status

use crate::common::{TestProject, COMMAND_PATH};
use anyhow::Result;

#[test]
fn test_install_then_verify() -> Result<()> {
    let project = TestProject::new();
    let pkg = project.package("pkg-v1");

    let result = project.codex(&["install", "--template", &pkg]).assert_success()?;
    assert!(result.contains_stdout("Installed CODEX v"));
    assert!(project.path(".codex/agents/dev.md").is_file());
    assert!(project.path(".codex/install-manifest.yaml").is_file());
    assert!(!project.path(".codex/test-harness").exists());
    assert_eq!(project.read(COMMAND_PATH), "# /codex v1\n");
    assert!(result.contains_stdout("IDE command:"));

    let verify = project.codex(&["verify"]).assert_success()?;
    assert!(verify.contains_stdout("All files match the manifest"));
    assert!(verify.contains_stdout("Tracked files: 2"));
    Ok(())
}

#[test]
fn test_install_with_test_harness() -> Result<()> {
    let project = TestProject::new();
    let pkg = project.package("pkg-v1");

    project
        .codex(&["install", "--template", &pkg, "--with-test-harness", "--ide", "cursor"])
        .assert_success()?;
    assert!(project.path(".codex/test-harness/suite.md").is_file());

    let manifest = project.read(".codex/install-manifest.yaml");
    assert!(manifest.contains("test_harness_included: true"));
    assert!(manifest.contains("cursor"));
    Ok(())
}

#[test]
fn test_install_keeps_existing_ide_command() -> Result<()> {
    let project = TestProject::new();
    project.write(COMMAND_PATH, "# my command\n");
    let pkg = project.package("pkg-v1");

    let result = project.codex(&["install", "--template", &pkg]).assert_success()?;
    assert!(!result.contains_stdout("IDE command:"));
    assert_eq!(project.read(COMMAND_PATH), "# my command\n");
    Ok(())
}

#[test]
fn test_install_refuses_existing_installation() -> Result<()> {
    let project = TestProject::installed();
    let pkg = project.package("pkg-v2");

    let result = project.codex(&["install", "--template", &pkg]).assert_failure()?;
    assert!(result.contains_stderr("already installed"));
    assert_eq!(project.read(".codex/agents/dev.md"), "# Dev agent v1\n");
    Ok(())
}

#[test]
fn test_verify_reports_modified_and_missing() -> Result<()> {
    let project = TestProject::installed();
    project.write(".codex/agents/dev.md", "# Edited\n");
    std::fs::remove_file(project.path(crate::common::CONFIG_PATH))?;

    let result = project.codex(&["verify"]).assert_failure()?;
    assert!(result.contains_stdout("Modified (1):"));
    assert!(result.contains_stdout(".codex/agents/dev.md"));
    assert!(result.contains_stdout("Missing (1):"));
    assert!(result.contains_stderr("1 modified, 1 missing"));

    // Verification is read-only
    let manifest = project.read(".codex/install-manifest.yaml");
    assert!(!manifest.contains("modified: true"));
    Ok(())
}

#[test]
fn test_status_summarizes_installation() -> Result<()> {
    let project = TestProject::installed();

    let result = project.codex(&["status"]).assert_success()?;
    assert!(result.contains_stdout("0.1.0"));
    assert!(result.contains_stdout("greenfield-generic"));
    assert!(result.contains_stdout("Idle"));
    assert!(result.contains_stdout("Backups:       0"));
    Ok(())
}

#[test]
fn test_commands_outside_a_project_fail() -> Result<()> {
    let project = TestProject::new();

    let result = project.codex(&["verify"]).assert_failure()?;
    assert!(result.contains_stderr("Not a CODEX project"));
    Ok(())
}
