//! User-level configuration
//!
//! Stored as TOML at `<config dir>/codex/config.toml`, or wherever
//! `CODEX_CONFIG` points. Every field has a default, so a missing or partial
//! file is fine.

use anyhow::{bail, ensure, Context, Result};
use codex_preserve::MergeStrategy;
use codex_update::DEFAULT_PACKAGE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "CODEX_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub registry: RegistryConfig,
    pub update: UpdateConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base URL; package metadata is fetched from `<url>/<package>/<version>`
    pub url: String,
    pub package: String,
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: "https://registry.npmjs.org".to_string(),
            package: DEFAULT_PACKAGE.to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    pub keep_backups: usize,
    pub merge_strategy: MergeStrategy,
    /// Package directory used when `--template` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            keep_backups: 5,
            merge_strategy: MergeStrategy::default(),
            template_dir: None,
        }
    }
}

/// Every key accepted by `get` and `set`
pub const KEYS: &[&str] = &[
    "registry.url",
    "registry.package",
    "registry.timeout_secs",
    "update.keep_backups",
    "update.merge_strategy",
    "update.template_dir",
];

impl SystemConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (1..=300).contains(&self.registry.timeout_secs),
            "registry.timeout_secs must be between 1 and 300 (got {})",
            self.registry.timeout_secs
        );
        ensure!(
            (1..=100).contains(&self.update.keep_backups),
            "update.keep_backups must be between 1 and 100 (got {})",
            self.update.keep_backups
        );
        ensure!(!self.registry.package.is_empty(), "registry.package must not be empty");
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "registry.url" => self.registry.url.clone(),
            "registry.package" => self.registry.package.clone(),
            "registry.timeout_secs" => self.registry.timeout_secs.to_string(),
            "update.keep_backups" => self.update.keep_backups.to_string(),
            "update.merge_strategy" => self.update.merge_strategy.to_string(),
            "update.template_dir" => self
                .update
                .template_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            _ => bail!("Unknown config key: {key}. Use 'codex config list' to see available keys."),
        };
        Ok(value)
    }

    /// Parse and assign one value; call `validate` before saving
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "registry.url" => self.registry.url = value.trim_end_matches('/').to_string(),
            "registry.package" => self.registry.package = value.to_string(),
            "registry.timeout_secs" => {
                self.registry.timeout_secs = value
                    .parse()
                    .context("Invalid value: must be a positive integer")?;
            }
            "update.keep_backups" => {
                self.update.keep_backups = value
                    .parse()
                    .context("Invalid value: must be a positive integer")?;
            }
            "update.merge_strategy" => self.update.merge_strategy = value.parse()?,
            "update.template_dir" => {
                self.update.template_dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            _ => bail!("Unknown config key: {key}. Use 'codex config list' to see available keys."),
        }
        Ok(())
    }
}

/// Location of the config file
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("codex").join("config.toml"))
}

/// Load the config, falling back to defaults when the file does not exist
pub fn load() -> Result<SystemConfig> {
    let Some(path) = config_file_path() else {
        return Ok(SystemConfig::default());
    };
    if !path.exists() {
        return Ok(SystemConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

pub fn save(config: &SystemConfig) -> Result<()> {
    let path = config_file_path().context("Could not determine config file path")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

/// Write the default config if no file exists yet
pub fn init_if_missing() -> Result<PathBuf> {
    let path = config_file_path().context("Could not determine config file path")?;
    if !path.exists() {
        save(&SystemConfig::default())?;
    }
    Ok(path)
}
