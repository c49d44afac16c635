//! CODEX CLI - codex command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;
mod diff_utils;
mod prompt;
mod registry;
mod system_config;
mod util;

/// CODEX - install and update agent template trees in a project
#[derive(Parser)]
#[command(name = "codex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project directory (default: current directory)
    #[arg(short = 'C', long, global = true)]
    project: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the template into a project without an installation
    Install {
        /// Template package directory (contains package.json and .codex/)
        #[arg(long)]
        template: Option<PathBuf>,
        /// Default workflow recorded in the manifest
        #[arg(long)]
        workflow: Option<String>,
        /// Also install the test-harness directory
        #[arg(long)]
        with_test_harness: bool,
        /// IDE integrations to record (repeatable)
        #[arg(long = "ide")]
        ide: Vec<String>,
    },
    /// Update an existing installation
    Update(cmd::update::UpdateArgs),
    /// Check the registry for a newer release
    Check {
        #[arg(long)]
        template: Option<PathBuf>,
        /// Use the template's package.json instead of the registry
        #[arg(long)]
        offline: bool,
    },
    /// Compare installed files against the manifest
    Verify,
    /// Show installation, workflow and backup status
    Status,
    /// Manage backups
    #[command(subcommand)]
    Backups(BackupCommands),
    /// Restore the template tree from a backup
    Restore {
        /// Backup name, or "latest"
        backup: String,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// View and edit user configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum BackupCommands {
    /// List backups, newest first
    List,
    /// Delete all but the newest backups
    Prune {
        /// Number of backups to keep (default: update.keep_backups)
        #[arg(long)]
        keep: Option<usize>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show all values
    List,
    /// Print one value
    Get { key: String },
    /// Set one value
    Set { key: String, value: String },
    /// Print the config file location
    Path {
        /// Write the default config if the file does not exist
        #[arg(long)]
        create: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project = cli.project.as_deref();
    match cli.command {
        Commands::Install {
            template,
            workflow,
            with_test_harness,
            ide,
        } => cmd::install::run(project, template.as_deref(), workflow, with_test_harness, ide),
        Commands::Update(args) => cmd::update::run(project, &args),
        Commands::Check { template, offline } => {
            cmd::check::run(project, template.as_deref(), offline)
        }
        Commands::Verify => cmd::verify::run(project),
        Commands::Status => cmd::status::run(project),
        Commands::Backups(backup_cmd) => match backup_cmd {
            BackupCommands::List => cmd::backups::run_list(project),
            BackupCommands::Prune { keep } => cmd::backups::run_prune(project, keep),
        },
        Commands::Restore { backup, yes } => cmd::restore::run(project, &backup, yes),
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list(),
            ConfigCommands::Get { key } => cmd::config::run_get(&key),
            ConfigCommands::Set { key, value } => cmd::config::run_set(&key, &value),
            ConfigCommands::Path { create } => cmd::config::run_path(create),
        },
    }
}
