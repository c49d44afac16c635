//! Preserve-set computation

use codex_core::hash::hash_file_if_exists;
use codex_core::store::{list_files, BACKUP_MARKER, CONFIG_FILE, MANIFEST_FILE, STATE_DIR};
use codex_core::{ExcludeMatcher, ProjectLayout, Result};
use codex_journal::InstallManifest;
use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Why a path must survive an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreserveReason {
    /// Lives under `.codex/state/`
    State,
    /// Template config whose digest no longer matches the manifest
    ModifiedConfig,
    /// Not tracked by the manifest at all
    UserAdded,
    /// The manifest file itself
    InstallRecord,
    /// A config backup from this or an earlier update
    ConfigBackup,
}

impl PreserveReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::State => "state",
            Self::ModifiedConfig => "modified-config",
            Self::UserAdded => "user-added",
            Self::InstallRecord => "install-record",
            Self::ConfigBackup => "config-backup",
        }
    }
}

impl fmt::Display for PreserveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of project-relative paths to carry across an update
///
/// Insertion is idempotent: the first reason recorded for a path wins and the
/// original insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreserveSet {
    entries: IndexMap<String, PreserveReason>,
}

impl PreserveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a path; returns false if it was already present
    pub fn insert(&mut self, path: impl Into<String>, reason: PreserveReason) -> bool {
        let path = path.into();
        if self.entries.contains_key(&path) {
            return false;
        }
        self.entries.insert(path, reason);
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn reason(&self, path: &str) -> Option<PreserveReason> {
        self.entries.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, PreserveReason)> {
        self.entries.iter().map(|(p, r)| (p.as_str(), *r))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of paths recorded for a reason
    pub fn count(&self, reason: PreserveReason) -> usize {
        self.entries.values().filter(|r| **r == reason).count()
    }
}

/// Compute the paths an update must not overwrite
///
/// 1. Every file under `.codex/state/`.
/// 2. The config file, when its digest differs from the manifest entry.
/// 3. Every other file under `.codex/` with no manifest entry. Earlier config
///    backups are kept as such.
pub fn preserve_state(project_root: &Path, manifest: &InstallManifest) -> Result<PreserveSet> {
    let layout = ProjectLayout::new(project_root);
    let codex_dir = layout.codex_dir();
    let mut set = PreserveSet::new();

    for rel in list_files(&layout.state_dir(), &ExcludeMatcher::empty())? {
        set.insert(ProjectLayout::tree_key(&format!("{STATE_DIR}/{rel}")), PreserveReason::State);
    }
    debug!("State files: {}", set.count(PreserveReason::State));

    let config_key = ProjectLayout::tree_key(CONFIG_FILE);
    if let Some(recorded) = manifest.digest_of(&config_key) {
        if let Some(current) = hash_file_if_exists(&layout.config_path())? {
            if current != recorded {
                info!("Modified config detected: {config_key}");
                set.insert(config_key, PreserveReason::ModifiedConfig);
            }
        }
    }

    for rel in list_files(&codex_dir, &ExcludeMatcher::new([STATE_DIR]))? {
        let key = ProjectLayout::tree_key(&rel);
        if manifest.contains(&key) {
            continue;
        }
        let reason = if rel == MANIFEST_FILE {
            PreserveReason::InstallRecord
        } else if rel.contains(BACKUP_MARKER) {
            // Config backups from earlier updates are carried across the swap
            PreserveReason::ConfigBackup
        } else {
            debug!("User file: {key}");
            PreserveReason::UserAdded
        };
        set.insert(key, reason);
    }

    info!(
        "Files to preserve: {} ({} state, {} user-added)",
        set.len(),
        set.count(PreserveReason::State),
        set.count(PreserveReason::UserAdded)
    );
    Ok(set)
}
