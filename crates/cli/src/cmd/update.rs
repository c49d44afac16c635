//! Update an existing installation

use crate::diff_utils::generate_unified_diff;
use crate::prompt::ConsolePrompt;
use crate::{system_config, util};
use anyhow::Result;
use clap::Args;
use codex_core::store::CONFIG_FILE;
use codex_preserve::{MergeResolution, MergeStrategy};
use codex_update::{
    Decision, DirectorySource, RollbackStatus, UpdateOptions, UpdateOutcome, UpdatePhase,
    UpdateStatus, UpdateTransaction,
};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Template package directory (contains package.json and .codex/)
    #[arg(long)]
    pub template: Option<PathBuf>,
    /// Target version or dist-tag
    #[arg(long = "to", default_value = "latest")]
    pub target: String,
    /// Allow a schema change after typing the override confirmation
    #[arg(long)]
    pub force_schema: bool,
    /// Do not back up the template tree first
    #[arg(long)]
    pub no_backup: bool,
    /// Answer yes to ordinary confirmations
    #[arg(short = 'y', long)]
    pub yes: bool,
    /// Config merge strategy: keep, replace or merge (default: update.merge_strategy)
    #[arg(long)]
    pub strategy: Option<MergeStrategy>,
    /// Backups to keep after a successful update (default: update.keep_backups)
    #[arg(long)]
    pub keep: Option<usize>,
    /// Use the template's package.json instead of the registry
    #[arg(long)]
    pub offline: bool,
}

pub fn run(project: Option<&Path>, args: &UpdateArgs) -> Result<()> {
    let project_root = util::find_project_root(project)?;
    let config = system_config::load()?;
    let source = util::open_template(args.template.as_deref(), &config)?;
    let registry = util::open_registry(&config, args.offline, Some(&source))?;

    let options = UpdateOptions {
        target_version: args.target.clone(),
        package_name: config.registry.package.clone(),
        force_schema: args.force_schema,
        skip_backup: args.no_backup,
        skip_confirmation: args.yes,
        merge_strategy: args.strategy.unwrap_or(config.update.merge_strategy),
        keep_backups: args.keep.unwrap_or(config.update.keep_backups),
    };

    let spinner = util::spinner(UpdatePhase::Detecting.describe());
    let prompt = ConsolePrompt::new(spinner.clone());
    let show_phase = |phase: UpdatePhase| spinner.set_message(format!("{}...", phase.describe()));

    let transaction =
        UpdateTransaction::new(&project_root, registry.as_ref(), &source, options)
            .with_override_confirm(&prompt)
            .on_phase(&show_phase);
    let outcome = if args.yes {
        transaction.with_confirm(&Decision(true)).run()
    } else {
        transaction.with_confirm(&prompt).run()
    };
    spinner.finish_and_clear();

    match outcome.status {
        UpdateStatus::Succeeded => {
            report_success(&outcome, &source);
            Ok(())
        }
        UpdateStatus::Cancelled => {
            println!("{}", outcome.message.dimmed());
            Ok(())
        }
        UpdateStatus::Blocked => {
            println!("{} {}", "BLOCKED".red().bold(), outcome.message);
            if let Some(workflow) = outcome.compatibility.as_ref().and_then(|c| c.workflow.as_ref()) {
                println!("  Active phase: {}", workflow.phase.yellow());
                if let Some(kind) = &workflow.workflow_type {
                    println!("  Workflow:     {kind}");
                }
            }
            anyhow::bail!("Update blocked ({})", outcome.reason_code().unwrap_or("unknown"))
        }
        UpdateStatus::Failed => {
            report_failure(&outcome);
            anyhow::bail!("Update failed ({})", outcome.reason_code().unwrap_or("unknown"))
        }
    }
}

fn report_success(outcome: &UpdateOutcome, source: &DirectorySource) {
    println!("{} {}", "✓".green(), outcome.message.bold());
    println!();
    if let Some(backup) = &outcome.backup_path {
        println!("Backup:        {}", backup.display().to_string().cyan());
    }
    println!("Preserved:     {} files", outcome.preserved);
    if let Some(command) = &outcome.ide_command {
        println!("IDE command:   {}", command.display());
    }

    if let Some(merge) = &outcome.merge {
        println!();
        match merge.resolution {
            MergeResolution::NoChange => println!("Config:        unchanged"),
            MergeResolution::Kept => println!("Config:        kept your version"),
            MergeResolution::Replaced => {
                println!("Config:        replaced with the template version")
            }
            MergeResolution::Manual => {
                println!(
                    "Config:        {} differences need review",
                    merge.changes.len().to_string().yellow()
                );
                for change in &merge.changes {
                    println!("  line {:<4} {}", change.line, change.section.cyan());
                }
                if let Some(diff) = config_diff(outcome, source) {
                    println!();
                    print!("{diff}");
                }
            }
        }
        if let Some(config_backup) = &outcome.config_backup {
            println!("  Your previous config: {}", config_backup.display().to_string().dimmed());
        }
    }

    for warning in &outcome.warnings {
        println!("{} {}", "!".yellow(), warning);
    }
}

/// Diff of the user's config against the one the template ships
fn config_diff(outcome: &UpdateOutcome, source: &DirectorySource) -> Option<String> {
    let yours = std::fs::read_to_string(outcome.config_backup.as_ref()?).ok()?;
    let template = std::fs::read_to_string(source.template_dir().join(CONFIG_FILE)).ok()?;
    let diff = generate_unified_diff(&yours, &template, "your config", "template config", 2);
    (!diff.is_empty()).then_some(diff)
}

fn report_failure(outcome: &UpdateOutcome) {
    println!("{} {}", "✗".red(), outcome.message);
    if let Some(phase) = outcome.failed_phase {
        println!("  Failed during: {}", phase.describe());
    }
    match &outcome.rollback {
        RollbackStatus::NotNeeded => {}
        RollbackStatus::Restored => println!("  {}", "Rolled back to the previous version".green()),
        RollbackStatus::Failed { error } => {
            println!("  {} {}", "Rollback failed:".red().bold(), error);
            if let Some(backup) = &outcome.backup_path {
                println!("  Restore manually from {}", backup.display().to_string().cyan());
            }
        }
        RollbackStatus::NoBackup { hold_path } => {
            println!("  {}", "No backup was taken; the installation may be incomplete".red());
            if let Some(hold) = hold_path {
                println!("  Preserved files are in {}", hold.display().to_string().cyan());
            }
        }
    }
}
