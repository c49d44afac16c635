//! Backup retention

use crate::backup::{list_backups, BackupInfo};
use codex_core::store::remove_tree;
use codex_core::Result;
use std::path::Path;
use tracing::{info, warn};

/// Retention policy configuration
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    /// Number of most recent backups to keep (default: 5)
    pub keep_count: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { keep_count: 5 }
    }
}

impl RetentionPolicy {
    pub fn new(keep_count: usize) -> Self {
        Self { keep_count }
    }

    /// Backups that fall outside the policy, given a newest-first listing
    pub fn expired<'a>(&self, backups: &'a [BackupInfo]) -> &'a [BackupInfo] {
        backups.get(self.keep_count..).unwrap_or(&[])
    }
}

/// Delete all but the `keep_count` newest backups
///
/// A backup that cannot be removed is logged and skipped. Returns the number
/// actually removed.
pub fn cleanup_old_backups(project_root: &Path, keep_count: usize) -> Result<usize> {
    let backups = list_backups(project_root)?;
    let expired = RetentionPolicy::new(keep_count).expired(&backups);
    if expired.is_empty() {
        info!("No backup cleanup needed ({} backups)", backups.len());
        return Ok(0);
    }

    let mut removed = 0usize;
    for backup in expired {
        match remove_tree(&backup.path) {
            Ok(()) => {
                info!("Removed backup {}", backup.name);
                removed += 1;
            }
            Err(e) => warn!("Failed to remove backup {}: {e}", backup.name),
        }
    }

    info!("Cleaned up {removed} old backup(s)");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::BACKUP_RECORD_FILE;
    use std::fs;

    fn seed_backup(root: &Path, day: u32) -> String {
        let name = format!(".codex-backup-2024-01-{day:02}T00-00-00.000Z-v0.{day}.0");
        let path = root.join(&name);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("agent.md"), "x").unwrap();
        fs::write(
            path.join(BACKUP_RECORD_FILE),
            format!(
                r#"{{"created_at":"2024-01-{day:02}T00:00:00Z","version":"0.{day}.0","file_count":1}}"#
            ),
        )
        .unwrap();
        name
    }

    #[test]
    fn test_cleanup_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        // Created out of order so directory order does not match age
        let names: Vec<_> = [4, 1, 7, 2, 8, 3, 6, 5]
            .into_iter()
            .map(|day| (day, seed_backup(dir.path(), day)))
            .collect();

        let removed = cleanup_old_backups(dir.path(), 5).unwrap();
        assert_eq!(removed, 3);

        for (day, name) in names {
            assert_eq!(dir.path().join(name).exists(), day > 3, "day {day}");
        }
    }

    #[test]
    fn test_cleanup_under_limit_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        seed_backup(dir.path(), 1);
        seed_backup(dir.path(), 2);
        assert_eq!(cleanup_old_backups(dir.path(), 5).unwrap(), 0);
        assert_eq!(list_backups(dir.path()).unwrap().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_cleanup_continues_past_unreadable_backup() {
        let dir = tempfile::tempdir().unwrap();
        let names: Vec<_> = (1..=7).map(|day| seed_backup(dir.path(), day)).collect();
        // Newest backup can no longer be walked
        std::os::unix::fs::symlink(
            dir.path().join("nowhere"),
            dir.path().join(&names[6]).join("dangling"),
        )
        .unwrap();

        assert_eq!(cleanup_old_backups(dir.path(), 5).unwrap(), 2);
        assert!(!dir.path().join(&names[0]).exists());
        assert!(!dir.path().join(&names[1]).exists());
        assert!(dir.path().join(&names[6]).exists());

        let listed = list_backups(dir.path()).unwrap();
        assert_eq!(listed.len(), 5);
        assert_eq!(listed[0].name, names[6]);
        assert_eq!(listed[0].size_bytes, 0);
        assert!(listed[1].size_bytes > 0);
    }

    #[test]
    fn test_expired_slice() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.keep_count, 5);
        assert!(policy.expired(&[]).is_empty());
    }
}
