//! Manifest persistence and update history

use crate::manifest::{FileEntry, InstallManifest, ManifestOptions, ManifestUpdate, UpdateRecord};
use chrono::Utc;
use codex_core::store::{atomic_write, BACKUP_MARKER, MANIFEST_FILE};
use codex_core::{hash_tree, CodexError, ExcludeMatcher, FileTree, IoResultExt, ProjectLayout, Result};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Reads and writes `.codex/install-manifest.yaml`
pub struct ManifestStore {
    layout: ProjectLayout,
}

impl ManifestStore {
    pub fn new(project_root: &Path) -> Self {
        Self {
            layout: ProjectLayout::new(project_root),
        }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Create a fresh manifest for an already-copied template tree
    pub fn create(&self, options: &ManifestOptions) -> Result<InstallManifest> {
        if !self.layout.is_installed() {
            return Err(CodexError::Precondition(format!(
                "template tree not found at {}",
                self.layout.codex_dir().display()
            )));
        }

        let manifest = InstallManifest {
            codex_version: options.codex_version.clone(),
            schema_version: Some(options.schema_version),
            installed_at: Utc::now(),
            default_workflow: options.default_workflow.clone(),
            test_harness_included: options.test_harness_included,
            ide_setup: options.ide_setup.clone(),
            files: self.collect_files()?,
            updates: Vec::new(),
        };

        self.write(&manifest)?;
        info!(
            "Created manifest for v{} ({} files)",
            manifest.codex_version,
            manifest.files.len()
        );
        Ok(manifest)
    }

    /// Read the manifest; `Ok(None)` when it does not exist
    pub fn read(&self) -> Result<Option<InstallManifest>> {
        let path = self.layout.manifest_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CodexError::Io { path, source: e }),
        };

        let mut manifest: InstallManifest =
            serde_yaml::from_str(&content).map_err(|e| CodexError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;
        manifest.files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Some(manifest))
    }

    /// Read the manifest, failing with `Precondition` when absent
    pub fn require(&self) -> Result<InstallManifest> {
        self.read()?.ok_or_else(|| {
            CodexError::Precondition(format!(
                "no manifest at {}",
                self.layout.manifest_path().display()
            ))
        })
    }

    /// Merge provided fields and append one history entry
    pub fn update(&self, update: &ManifestUpdate) -> Result<InstallManifest> {
        let mut manifest = self.require()?;
        let mut changes: BTreeMap<String, Value> = BTreeMap::new();

        if let Some(version) = &update.codex_version {
            if *version != manifest.codex_version {
                changes.insert("codex_version".into(), Value::from(version.clone()));
            }
            manifest.codex_version = version.clone();
        }
        if let Some(schema) = update.schema_version {
            if Some(schema) != manifest.schema_version {
                changes.insert("schema_version".into(), Value::from(schema));
            }
            manifest.schema_version = Some(schema);
        }
        if let Some(workflow) = &update.default_workflow {
            if *workflow != manifest.default_workflow {
                changes.insert("default_workflow".into(), Value::from(workflow.clone()));
            }
            manifest.default_workflow = workflow.clone();
        }
        if let Some(included) = update.test_harness_included {
            if included != manifest.test_harness_included {
                changes.insert("test_harness_included".into(), Value::from(included));
            }
            manifest.test_harness_included = included;
        }
        if let Some(ides) = &update.ide_setup {
            if *ides != manifest.ide_setup {
                let seq = ides.iter().cloned().map(Value::from).collect::<Vec<_>>();
                changes.insert("ide_setup".into(), Value::Sequence(seq));
            }
            manifest.ide_setup = ides.clone();
        }
        if let Some(snapshot) = &update.snapshot {
            manifest.files = to_entries(snapshot);
            changes.insert("files_regenerated".into(), Value::from(true));
        } else if update.regenerate_files {
            manifest.files = self.collect_files()?;
            changes.insert("files_regenerated".into(), Value::from(true));
        }

        debug!("Manifest update changes: {:?}", changes.keys().collect::<Vec<_>>());
        manifest.updates.push(UpdateRecord {
            timestamp: Utc::now(),
            changes,
            summary: update.summary.clone(),
        });

        self.write(&manifest)?;
        Ok(manifest)
    }

    /// Serialize and atomically replace the manifest file
    pub fn write(&self, manifest: &InstallManifest) -> Result<()> {
        let path = self.layout.manifest_path();
        let yaml = serde_yaml::to_string(manifest).map_err(|e| CodexError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        atomic_write(&path, yaml.as_bytes())
    }

    fn collect_files(&self) -> Result<Vec<FileEntry>> {
        Ok(to_entries(&tracked_tree(&self.layout.codex_dir())?))
    }
}

/// Hash the files of a template tree that a manifest tracks
///
/// Keys are relative to `codex_dir`. The manifest itself and config backup
/// artefacts are not tracked.
pub fn tracked_tree(codex_dir: &Path) -> Result<FileTree> {
    std::fs::metadata(codex_dir).at(codex_dir)?;
    let exclude = ExcludeMatcher::new([
        MANIFEST_FILE.to_string(),
        format!("**/*{BACKUP_MARKER}-*"),
    ]);
    hash_tree(codex_dir, &exclude)
}

fn to_entries(tree: &FileTree) -> Vec<FileEntry> {
    tree.iter()
        .map(|(rel, hash)| FileEntry {
            path: ProjectLayout::tree_key(rel),
            hash: *hash,
            modified: false,
        })
        .collect()
}
