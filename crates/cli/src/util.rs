//! Shared utilities for CLI commands

use crate::registry::HttpRegistry;
use crate::system_config::SystemConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use codex_core::store::CODEX_DIR;
use codex_update::{DirectorySource, PackageRegistry, StaticRegistry};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Resolve the project directory: the explicit one, or the current directory
pub fn project_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir().context("Failed to get current directory"),
    }
}

/// Find the project root by walking up from `start` to a `.codex` directory
pub fn find_project_root_from(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CODEX_DIR).is_dir() {
            return Ok(current);
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => anyhow::bail!(
                "Not a CODEX project (no {CODEX_DIR} directory found). Run 'codex install' first."
            ),
        }
    }
}

pub fn find_project_root(explicit: Option<&Path>) -> Result<PathBuf> {
    find_project_root_from(&project_dir(explicit)?)
}

/// Open the template package from `--template` or the configured default
pub fn open_template(explicit: Option<&Path>, config: &SystemConfig) -> Result<DirectorySource> {
    let dir = explicit
        .map(Path::to_path_buf)
        .or_else(|| config.update.template_dir.clone())
        .context(
            "No template package given. Pass --template <dir> or set update.template_dir with 'codex config set'.",
        )?;
    DirectorySource::open(&dir)
        .with_context(|| format!("Failed to open template package {}", dir.display()))
}

/// Registry to consult: the configured HTTP registry, or the template's own
/// `package.json` when offline
pub fn open_registry(
    config: &SystemConfig,
    offline: bool,
    template: Option<&DirectorySource>,
) -> Result<Box<dyn PackageRegistry>> {
    if offline {
        let template = template.context("--offline needs a template package")?;
        let info = template
            .package_info()
            .context("Failed to read the template's package.json")?;
        return Ok(Box::new(StaticRegistry::single(info)));
    }
    let registry = HttpRegistry::new(
        &config.registry.url,
        Duration::from_secs(config.registry.timeout_secs),
    )?;
    Ok(Box::new(registry))
}

pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
        .template("{spinner:.cyan} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

/// Age of a backup or installation ("3 days ago")
///
/// Anything under a minute is "just now". Ages past eight weeks are shown as
/// the date. Timestamps ahead of the local clock are treated as "just now".
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    let age = Utc::now() - ts;
    if age.num_minutes() < 1 {
        "just now".to_string()
    } else if age.num_hours() < 1 {
        plural(age.num_minutes(), "minute")
    } else if age.num_days() < 1 {
        plural(age.num_hours(), "hour")
    } else if age.num_weeks() < 2 {
        plural(age.num_days(), "day")
    } else if age.num_weeks() < 8 {
        plural(age.num_weeks(), "week")
    } else {
        format!("on {}", ts.format("%Y-%m-%d"))
    }
}

pub fn format_absolute_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Size of a backup on disk; one decimal above a kilobyte
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
