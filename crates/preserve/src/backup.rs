//! Timestamped backups of the template tree

use chrono::{DateTime, Utc};
use codex_core::hash::hash_file_if_exists;
use codex_core::store::{
    atomic_write, copy_file_new, copy_tree, dir_size, remove_tree, BACKUP_MARKER,
    BACKUP_PREFIX, CONFIG_FILE,
};
use codex_core::{CodexError, ExcludeMatcher, IoResultExt, ProjectLayout, Result};
use codex_journal::InstallManifest;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Record file written at the root of every backup directory
pub const BACKUP_RECORD_FILE: &str = "backup-manifest.json";

/// Timestamp format used in backup names: ISO 8601 with `:` replaced by `-`
const NAME_TIMESTAMP: &str = "%Y-%m-%dT%H-%M-%S%.3fZ";

/// Metadata stored inside a backup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub created_at: DateTime<Utc>,
    pub version: String,
    #[serde(alias = "files_backed_up")]
    pub file_count: usize,
}

impl BackupRecord {
    /// Load and validate the record of a backup directory
    pub fn load(backup_path: &Path) -> Result<Self> {
        let record_path = backup_path.join(BACKUP_RECORD_FILE);
        let content = match fs::read_to_string(&record_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CodexError::InvalidBackup {
                    path: backup_path.to_path_buf(),
                    reason: "missing backup record".to_string(),
                })
            }
            Err(e) => return Err(CodexError::Io { path: record_path, source: e }),
        };
        serde_json::from_str(&content).map_err(|e| CodexError::InvalidBackup {
            path: backup_path.to_path_buf(),
            reason: format!("unreadable backup record: {e}"),
        })
    }

    fn write(&self, backup_path: &Path) -> Result<()> {
        let record_path = backup_path.join(BACKUP_RECORD_FILE);
        let json = serde_json::to_vec_pretty(self).map_err(|e| CodexError::Parse {
            path: record_path.clone(),
            message: e.to_string(),
        })?;
        atomic_write(&record_path, &json)
    }
}

/// A backup found on disk
#[derive(Debug, Clone, PartialEq)]
pub struct BackupInfo {
    /// Directory name, e.g. `.codex-backup-2024-10-09T12-30-45.123Z-v0.1.0`
    pub name: String,
    pub path: PathBuf,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub file_count: usize,
    /// Total size of the backed-up files in bytes
    pub size_bytes: u64,
}

/// Snapshot `.codex` into `<project>/.codex-backup-<timestamp>-v<version>`
///
/// Fails with `AlreadyExists` rather than merging into an existing directory.
pub fn create_backup(project_root: &Path, version: &str) -> Result<PathBuf> {
    let layout = ProjectLayout::new(project_root);
    let codex_dir = layout.codex_dir();
    if !codex_dir.is_dir() {
        return Err(CodexError::Precondition(format!(
            "no template tree to back up at {}",
            codex_dir.display()
        )));
    }

    let created_at = Utc::now();
    let name = format!("{BACKUP_PREFIX}{}-v{version}", created_at.format(NAME_TIMESTAMP));
    let backup_path = project_root.join(&name);

    match fs::create_dir(&backup_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(CodexError::AlreadyExists(backup_path))
        }
        Err(e) => return Err(CodexError::Io { path: backup_path, source: e }),
    }

    let file_count = copy_tree(&codex_dir, &backup_path, &ExcludeMatcher::empty())?;
    BackupRecord {
        created_at,
        version: version.to_string(),
        file_count,
    }
    .write(&backup_path)?;

    info!("Backup created: {name} ({file_count} files)");
    Ok(backup_path)
}

/// Replace `.codex` with the contents of a backup
///
/// The backup record is validated before anything is deleted. The backup
/// itself is left in place.
pub fn restore_backup(project_root: &Path, backup_path: &Path) -> Result<()> {
    if !backup_path.is_dir() {
        return Err(CodexError::InvalidBackup {
            path: backup_path.to_path_buf(),
            reason: "backup directory not found".to_string(),
        });
    }
    let record = BackupRecord::load(backup_path)?;
    info!(
        "Restoring backup of v{} created {}",
        record.version,
        record.created_at.to_rfc3339()
    );

    let codex_dir = ProjectLayout::new(project_root).codex_dir();
    remove_tree(&codex_dir)?;
    let restored = copy_tree(backup_path, &codex_dir, &ExcludeMatcher::new([BACKUP_RECORD_FILE]))?;

    info!("Restoration complete ({restored} files)");
    Ok(())
}

/// Copy a user-modified config aside as `<config>.backup-<timestamp>`
///
/// Returns `None` when the config is absent or still matches the manifest.
pub fn backup_modified_config(
    project_root: &Path,
    manifest: &InstallManifest,
) -> Result<Option<PathBuf>> {
    let layout = ProjectLayout::new(project_root);
    let config_path = layout.config_path();
    let Some(current) = hash_file_if_exists(&config_path)? else {
        return Ok(None);
    };

    if manifest.digest_of(&ProjectLayout::tree_key(CONFIG_FILE)) == Some(current) {
        debug!("Config file not modified, no backup needed");
        return Ok(None);
    }

    let mut backup_name = config_path.as_os_str().to_os_string();
    backup_name.push(format!(
        "{BACKUP_MARKER}-{}",
        Utc::now().format(NAME_TIMESTAMP)
    ));
    let backup_path = PathBuf::from(backup_name);
    copy_file_new(&config_path, &backup_path)?;

    info!("Config backed up: {}", backup_path.display());
    Ok(Some(backup_path))
}

/// Every valid backup under the project root, newest first
///
/// Directories with the backup prefix but no readable record are skipped. A
/// backup whose contents cannot be walked is listed with a size of zero.
pub fn list_backups(project_root: &Path) -> Result<Vec<BackupInfo>> {
    let mut backups = Vec::new();

    for entry in fs::read_dir(project_root).at(project_root)? {
        let entry = entry.at(project_root)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(BACKUP_PREFIX) || !entry.path().is_dir() {
            continue;
        }

        let path = entry.path();
        let record = match BackupRecord::load(&path) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping {name}: {e}");
                continue;
            }
        };
        let size_bytes = match dir_size(&path) {
            Ok(size) => size,
            Err(e) => {
                warn!("Could not measure {name}: {e}");
                0
            }
        };
        backups.push(BackupInfo {
            name,
            path,
            version: record.version,
            created_at: record.created_at,
            file_count: record.file_count,
            size_bytes,
        });
    }

    backups.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.name.cmp(&a.name))
    });
    Ok(backups)
}
