//! Check the registry for a newer release

use crate::{system_config, util};
use anyhow::{Context, Result};
use codex_journal::ManifestStore;
use codex_update::check_for_updates;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(project: Option<&Path>, template: Option<&Path>, offline: bool) -> Result<()> {
    let project_root = util::find_project_root(project)?;
    let config = system_config::load()?;
    let manifest = ManifestStore::new(&project_root)
        .require()
        .context("Failed to read installation manifest")?;

    let source = if offline {
        Some(util::open_template(template, &config)?)
    } else {
        None
    };
    let registry = util::open_registry(&config, offline, source.as_ref())?;

    let spinner = util::spinner("Checking for updates...");
    let check = check_for_updates(
        &manifest.codex_version,
        registry.as_ref(),
        &config.registry.package,
    );
    spinner.finish_and_clear();

    println!("Installed:     v{}", check.current_version);
    if let Some(latest) = &check.latest_version {
        println!("Latest:        v{latest}");
    }
    if let Some(error) = &check.error {
        println!("{} Could not check for updates: {}", "!".yellow(), error);
        return Ok(());
    }

    if check.update_available {
        let kind = check.release_type.map(|r| r.as_str()).unwrap_or("unknown");
        println!(
            "{} A {} update is available",
            "→".cyan(),
            kind.bold()
        );
        println!("  {}", "Run 'codex update' to apply it".dimmed());
    } else {
        println!("{} Up to date", "✓".green());
    }
    Ok(())
}
