//! Manifest data structures

use chrono::{DateTime, Utc};
use codex_core::{FileDigest, FileTree};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Record of one CODEX installation in a project
///
/// Field order here is the serialized order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallManifest {
    /// Installed product version (semver)
    pub codex_version: String,
    /// Template format version; `None` for manifests written before it existed
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub installed_at: DateTime<Utc>,
    #[serde(default)]
    pub default_workflow: String,
    #[serde(default)]
    pub test_harness_included: bool,
    #[serde(default)]
    pub ide_setup: BTreeSet<String>,
    /// Tracked files, sorted by path, as of the last manifest write
    #[serde(default)]
    pub files: Vec<FileEntry>,
    /// Append-only update history
    #[serde(default)]
    pub updates: Vec<UpdateRecord>,
}

/// One tracked file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Project-relative path (`.codex/...`)
    pub path: String,
    pub hash: FileDigest,
    /// Cached hint set by verification; never authoritative
    #[serde(default)]
    pub modified: bool,
}

/// One entry in the update history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub timestamp: DateTime<Utc>,
    /// Top-level field name to its new value
    #[serde(default)]
    pub changes: BTreeMap<String, serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl InstallManifest {
    /// Look up a tracked file by project-relative path
    pub fn entry(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|e| e.path == path)
    }

    /// Recorded digest for a project-relative path
    pub fn digest_of(&self, path: &str) -> Option<FileDigest> {
        self.entry(path).map(|e| e.hash)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entry(path).is_some()
    }

    /// Most recent update, if any
    pub fn last_update(&self) -> Option<&UpdateRecord> {
        self.updates.last()
    }
}

/// Options for a fresh manifest
#[derive(Debug, Clone)]
pub struct ManifestOptions {
    pub codex_version: String,
    pub schema_version: u32,
    pub default_workflow: String,
    pub test_harness_included: bool,
    pub ide_setup: BTreeSet<String>,
}

impl ManifestOptions {
    pub fn new(codex_version: impl Into<String>) -> Self {
        Self {
            codex_version: codex_version.into(),
            ..Self::default()
        }
    }
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self {
            codex_version: String::new(),
            schema_version: 1,
            default_workflow: "greenfield-generic".to_string(),
            test_harness_included: false,
            ide_setup: BTreeSet::from(["claude-code".to_string()]),
        }
    }
}

/// Partial update of a manifest; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct ManifestUpdate {
    pub codex_version: Option<String>,
    pub schema_version: Option<u32>,
    pub default_workflow: Option<String>,
    pub test_harness_included: Option<bool>,
    pub ide_setup: Option<BTreeSet<String>>,
    /// Recompute `files` from the tree on disk
    pub regenerate_files: bool,
    /// Record these template files (keys relative to `.codex`) instead of
    /// re-hashing the tree; takes precedence over `regenerate_files`
    pub snapshot: Option<FileTree>,
    /// Free-form description stored with the history entry
    pub summary: Option<String>,
}
