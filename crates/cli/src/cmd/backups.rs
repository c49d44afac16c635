//! List and prune backups

use crate::{system_config, util};
use anyhow::{Context, Result};
use codex_preserve::{cleanup_old_backups, list_backups};
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run_list(project: Option<&Path>) -> Result<()> {
    let project_root = util::find_project_root(project)?;
    let backups = list_backups(&project_root).context("Failed to list backups")?;

    if backups.is_empty() {
        println!("{}", "No backups".dimmed());
        return Ok(());
    }

    println!("{}", format!("Backups ({})", backups.len()).bold());
    println!("{}", util::RULE);
    for backup in &backups {
        println!("{}", backup.name.yellow());
        println!(
            "  v{}  {}  {} files  {}",
            backup.version,
            util::format_relative_time(backup.created_at).dimmed(),
            backup.file_count,
            util::format_size(backup.size_bytes)
        );
    }
    Ok(())
}

pub fn run_prune(project: Option<&Path>, keep: Option<usize>) -> Result<()> {
    let project_root = util::find_project_root(project)?;
    let keep = match keep {
        Some(keep) => keep,
        None => system_config::load()?.update.keep_backups,
    };

    let removed = cleanup_old_backups(&project_root, keep).context("Failed to prune backups")?;
    if removed == 0 {
        println!("{}", format!("Nothing to prune (keeping {keep})").dimmed());
    } else {
        println!("{} Removed {} old backup(s)", "✓".green(), removed);
    }
    Ok(())
}
