//! User configuration commands

use crate::common::TestProject;
use anyhow::Result;

#[test]
fn test_config_set_then_get() -> Result<()> {
    let project = TestProject::new();

    project
        .codex(&["config", "set", "update.keep_backups", "3"])
        .assert_success()?;
    assert!(project.config_file().is_file());

    let result = project
        .codex(&["config", "get", "update.keep_backups"])
        .assert_success()?;
    assert_eq!(result.stdout.trim(), "3");
    Ok(())
}

#[test]
fn test_config_rejects_out_of_range_values() -> Result<()> {
    let project = TestProject::new();

    let result = project
        .codex(&["config", "set", "update.keep_backups", "0"])
        .assert_failure()?;
    assert!(result.contains_stderr("keep_backups"));
    assert!(!project.config_file().exists());

    project
        .codex(&["config", "set", "update.merge_strategy", "overwrite"])
        .assert_failure()?;
    project
        .codex(&["config", "get", "daemon.interval"])
        .assert_failure()?;
    Ok(())
}

#[test]
fn test_config_path_and_list() -> Result<()> {
    let project = TestProject::new();
    let expected = project.config_file().display().to_string();

    let result = project.codex(&["config", "path"]).assert_success()?;
    assert!(result.contains_stdout(&expected));
    assert!(result.contains_stdout("does not exist"));

    project.codex(&["config", "path", "--create"]).assert_success()?;
    assert!(project.config_file().is_file());

    let list = project.codex(&["config", "list"]).assert_success()?;
    assert!(list.contains_stdout("create-codex-project"));
    assert!(list.contains_stdout("merge"));
    Ok(())
}

#[test]
fn test_configured_template_dir_is_used() -> Result<()> {
    let project = TestProject::new();
    let pkg = project.package("pkg-v1");

    project
        .codex(&["config", "set", "update.template_dir", &pkg])
        .assert_success()?;
    project.codex(&["install"]).assert_success()?;
    assert!(project.path(".codex/agents/dev.md").is_file());
    Ok(())
}
