//! Restore the template tree from a backup

use crate::{prompt, util};
use anyhow::{Context, Result};
use codex_preserve::{list_backups, restore_backup};
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(project: Option<&Path>, backup: &str, yes: bool) -> Result<()> {
    let project_root = util::find_project_root(project)?;
    let backups = list_backups(&project_root).context("Failed to list backups")?;

    let chosen = if backup == "latest" {
        backups.first()
    } else {
        backups.iter().find(|b| b.name == backup)
    };
    let Some(chosen) = chosen else {
        anyhow::bail!("Unknown backup: '{backup}'. Use 'codex backups list' to see available backups.");
    };

    println!("Backup:        {}", chosen.name.yellow());
    println!("  Version:     v{}", chosen.version);
    println!("  Created:     {}", util::format_absolute_time(chosen.created_at));
    println!("  Files:       {}", chosen.file_count);
    println!();

    if !yes && !prompt::ask_yes_no("Replace the current .codex directory with this backup?") {
        println!("{}", "Restore cancelled".dimmed());
        return Ok(());
    }

    restore_backup(&project_root, &chosen.path).context("Restore failed")?;
    println!("{} Restored v{} from {}", "✓".green(), chosen.version, chosen.name);
    Ok(())
}
