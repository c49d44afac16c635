//! Install the template into a project

use crate::{system_config, util};
use anyhow::{Context, Result};
use codex_update::{install, InstallOptions};
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(
    project: Option<&Path>,
    template: Option<&Path>,
    workflow: Option<String>,
    with_test_harness: bool,
    ide: Vec<String>,
) -> Result<()> {
    let project_root = util::project_dir(project)?;
    let config = system_config::load()?;
    let source = util::open_template(template, &config)?;
    let package = source
        .package_info()
        .context("Failed to read the template's package.json")?;

    let mut options = InstallOptions {
        include_test_harness: with_test_harness,
        ..InstallOptions::default()
    };
    if let Some(workflow) = workflow {
        options.default_workflow = workflow;
    }
    if !ide.is_empty() {
        options.ide_setup = ide.into_iter().collect();
    }

    let spinner = util::spinner(&format!("Installing CODEX v{}...", package.version));
    let report = install(&project_root, &source, &package, &options);
    spinner.finish_and_clear();
    let report = report.context("Installation failed")?;

    println!(
        "{} Installed CODEX v{}",
        "✓".green(),
        report.manifest.codex_version.bold()
    );
    println!("  Project:     {}", project_root.display().to_string().cyan());
    println!("  Files:       {}", report.files_copied);
    println!("  Workflow:    {}", report.manifest.default_workflow);
    if report.manifest.test_harness_included {
        println!("  Test harness included");
    }
    if let Some(command) = &report.ide_command {
        println!("  IDE command: {}", command.display());
    }
    for warning in &report.warnings {
        println!("{} {}", "!".yellow(), warning);
    }
    println!();
    println!("{}", "Tip: Run 'codex verify' at any time to check file integrity".dimmed());

    Ok(())
}
