//! User-state preservation for template updates
//!
//! This crate provides:
//! - The three-pass preserve set (state, modified config, user-added files)
//! - Timestamped backups of the template tree, with listing and restore
//! - Retention of the most recent backups
//! - Line-oriented config comparison and merge strategies

pub mod backup;
pub mod merge;
pub mod preserve;
pub mod retention;

// Re-exports
pub use backup::{
    backup_modified_config, create_backup, list_backups, restore_backup, BackupInfo,
    BackupRecord, BACKUP_RECORD_FILE,
};
pub use merge::{detect_config_changes, merge_config, ConfigChange, MergeResolution, MergeResult, MergeStrategy};
pub use preserve::{preserve_state, PreserveReason, PreserveSet};
pub use retention::{cleanup_old_backups, RetentionPolicy};
