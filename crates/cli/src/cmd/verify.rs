//! Compare installed files against the manifest

use crate::util;
use anyhow::Result;
use codex_journal::ManifestStore;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(project: Option<&Path>) -> Result<()> {
    let project_root = util::find_project_root(project)?;
    let report = ManifestStore::new(&project_root).verify();

    println!("{}", "Installation Integrity".bold());
    println!("{}", util::RULE);
    println!();

    for error in &report.errors {
        println!("  {} {}", "✗".red(), error);
    }
    if !report.errors.is_empty() {
        anyhow::bail!("Verification could not run");
    }

    println!("Tracked files: {}", report.total_files);
    if !report.modified.is_empty() {
        println!();
        println!("Modified ({}):", report.modified_count());
        for file in &report.modified {
            println!(
                "  {} {} {}",
                "M".yellow(),
                file.path,
                format!("({} -> {})", file.expected, file.actual).dimmed()
            );
        }
    }
    if !report.missing.is_empty() {
        println!();
        println!("Missing ({}):", report.missing_count());
        for path in &report.missing {
            println!("  {} {}", "D".red(), path);
        }
    }
    println!();

    if report.valid {
        println!("{} All files match the manifest", "✓".green());
        Ok(())
    } else {
        anyhow::bail!(
            "{} modified, {} missing",
            report.modified_count(),
            report.missing_count()
        )
    }
}
