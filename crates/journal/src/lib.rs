//! Installation manifest and update history
//!
//! This crate provides:
//! - The `InstallManifest` record persisted at `.codex/install-manifest.yaml`
//! - Atomic create/read/update through `ManifestStore`
//! - An append-only update history inside the manifest
//! - Read-only integrity verification and summaries

pub mod journal;
pub mod manifest;
pub mod verify;

// Re-exports
pub use journal::{tracked_tree, ManifestStore};
pub use manifest::{FileEntry, InstallManifest, ManifestOptions, ManifestUpdate, UpdateRecord};
pub use verify::{ManifestSummary, ModifiedFile, VerifyReport};
