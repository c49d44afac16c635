//! Show installation, workflow and backup status

use crate::util;
use anyhow::{Context, Result};
use codex_journal::ManifestStore;
use codex_preserve::list_backups;
use codex_update::detect_active_workflow;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(project: Option<&Path>) -> Result<()> {
    let project_root = util::find_project_root(project)?;
    let store = ManifestStore::new(&project_root);
    let summary = store
        .summary()
        .context("Failed to read installation manifest")?;

    println!("{}", "CODEX Status".bold());
    println!("{}", util::RULE);
    println!();
    println!("Project:       {}", project_root.display().to_string().cyan());
    println!();

    let Some(summary) = summary else {
        println!("{}", "No installation manifest found".yellow());
        println!("  {}", "Tip: Install with 'codex install --template <dir>'".dimmed());
        return Ok(());
    };

    println!("Installation:");
    println!("  Version:     {}", summary.codex_version.green());
    match summary.schema_version {
        Some(schema) => println!("  Schema:      {schema}"),
        None => println!("  Schema:      {}", "unknown".yellow()),
    }
    println!(
        "  Installed:   {} ({})",
        util::format_relative_time(summary.installed_at),
        util::format_absolute_time(summary.installed_at).dimmed()
    );
    println!("  Workflow:    {}", summary.default_workflow);
    if !summary.ide_setup.is_empty() {
        println!("  IDE setup:   {}", summary.ide_setup.join(", "));
    }
    println!("  Files:       {}", summary.file_count);
    print!("  Updates:     {}", summary.update_count);
    match summary.last_update {
        Some(ts) => println!(" (last: {})", util::format_relative_time(ts)),
        None => println!(),
    }
    println!();

    let report = store.verify();
    print!("Integrity:     ");
    if report.valid {
        println!("{}", "Clean ✓".green());
    } else if !report.errors.is_empty() {
        println!("{}", "Unverifiable".red());
    } else {
        println!(
            "{}",
            format!(
                "{} modified, {} missing",
                report.modified_count(),
                report.missing_count()
            )
            .yellow()
        );
        println!("  {}", "Tip: Run 'codex verify' for details".dimmed());
    }

    print!("Workflow:      ");
    match detect_active_workflow(&project_root) {
        Some(active) => {
            println!("{}", format!("Active in phase '{}'", active.phase).yellow());
            if let Some(kind) = active.workflow_type {
                println!("  Type:        {kind}");
            }
            println!("  {}", "Updates are blocked until the workflow completes".dimmed());
        }
        None => println!("{}", "Idle".dimmed()),
    }
    println!();

    let backups = list_backups(&project_root)?;
    println!("Backups:       {}", backups.len());
    if let Some(latest) = backups.first() {
        println!(
            "  Latest:      v{} ({})",
            latest.version,
            util::format_relative_time(latest.created_at)
        );
        let total: u64 = backups.iter().map(|b| b.size_bytes).sum();
        println!("  Total size:  {}", util::format_size(total));
    }

    Ok(())
}
