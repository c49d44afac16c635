//! Backup listing, pruning and explicit restore

use crate::common::TestProject;
use anyhow::Result;

fn updated_twice() -> Result<TestProject> {
    let project = TestProject::installed();
    let v2 = project.package("pkg-v2");
    project
        .codex(&["update", "--template", &v2, "--offline"])
        .assert_success()?;
    project
        .codex(&["update", "--template", &v2, "--offline", "--yes"])
        .assert_success()?;
    Ok(project)
}

#[test]
fn test_backups_list() -> Result<()> {
    let project = updated_twice()?;

    let result = project.codex(&["backups", "list"]).assert_success()?;
    assert!(result.contains_stdout("Backups (2)"));
    assert!(result.contains_stdout("v0.1.0"));
    assert!(result.contains_stdout("v0.2.0"));

    // Newest first
    let first = result.stdout.find("-v0.2.0").unwrap();
    let second = result.stdout.find("-v0.1.0").unwrap();
    assert!(first < second);
    Ok(())
}

#[test]
fn test_backups_list_empty() -> Result<()> {
    let project = TestProject::installed();
    let result = project.codex(&["backups", "list"]).assert_success()?;
    assert!(result.contains_stdout("No backups"));
    Ok(())
}

#[test]
fn test_backups_prune() -> Result<()> {
    let project = updated_twice()?;

    let result = project
        .codex(&["backups", "prune", "--keep", "1"])
        .assert_success()?;
    assert!(result.contains_stdout("Removed 1 old backup(s)"));
    let remaining = project.backups();
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].ends_with("-v0.2.0"));
    Ok(())
}

#[test]
fn test_restore_latest_brings_back_previous_version() -> Result<()> {
    let project = TestProject::installed();
    project.write(".codex/agents/custom.md", "# My agent\n");
    let v2 = project.package("pkg-v2");
    project
        .codex(&["update", "--template", &v2, "--offline"])
        .assert_success()?;
    assert_eq!(project.read(".codex/agents/dev.md"), "# Dev agent v2\n");

    let result = project.codex(&["restore", "latest", "-y"]).assert_success()?;
    assert!(result.contains_stdout("Restored v0.1.0"));
    assert_eq!(project.read(".codex/agents/dev.md"), "# Dev agent v1\n");
    assert_eq!(project.read(".codex/agents/custom.md"), "# My agent\n");
    assert!(!project.path(".codex/backup-manifest.json").exists());

    let status = project.codex(&["status"]).assert_success()?;
    assert!(status.contains_stdout("0.1.0"));
    Ok(())
}

#[test]
fn test_restore_declined_changes_nothing() -> Result<()> {
    let project = TestProject::installed();
    let v2 = project.package("pkg-v2");
    project
        .codex(&["update", "--template", &v2, "--offline"])
        .assert_success()?;

    let result = project
        .codex(&["restore", "latest"])
        .stdin("n\n")
        .assert_success()?;
    assert!(result.contains_stdout("Restore cancelled"));
    assert_eq!(project.read(".codex/agents/dev.md"), "# Dev agent v2\n");
    Ok(())
}

#[test]
fn test_restore_unknown_backup_fails() -> Result<()> {
    let project = TestProject::installed();
    let result = project
        .codex(&["restore", ".codex-backup-nope", "-y"])
        .assert_failure()?;
    assert!(result.contains_stderr("Unknown backup"));
    Ok(())
}
