//! Read-only integrity verification and summaries

use crate::journal::ManifestStore;
use crate::manifest::InstallManifest;
use chrono::{DateTime, Utc};
use codex_core::hash::hash_file_if_exists;
use codex_core::store::normalize_path;
use codex_core::FileDigest;
use tracing::debug;

/// A tracked file whose content no longer matches the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifiedFile {
    pub path: String,
    pub expected: FileDigest,
    pub actual: FileDigest,
}

/// Result of checking the tree against the manifest
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    pub valid: bool,
    pub total_files: usize,
    pub missing: Vec<String>,
    pub modified: Vec<ModifiedFile>,
    pub errors: Vec<String>,
}

impl VerifyReport {
    pub fn missing_count(&self) -> usize {
        self.missing.len()
    }

    pub fn modified_count(&self) -> usize {
        self.modified.len()
    }

    fn failed(error: String) -> Self {
        Self {
            valid: false,
            errors: vec![error],
            ..Self::default()
        }
    }
}

/// Condensed view of a manifest
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestSummary {
    pub codex_version: String,
    pub schema_version: Option<u32>,
    pub installed_at: DateTime<Utc>,
    pub default_workflow: String,
    pub test_harness_included: bool,
    pub ide_setup: Vec<String>,
    pub file_count: usize,
    pub update_count: usize,
    pub last_update: Option<DateTime<Utc>>,
}

impl From<&InstallManifest> for ManifestSummary {
    fn from(m: &InstallManifest) -> Self {
        Self {
            codex_version: m.codex_version.clone(),
            schema_version: m.schema_version,
            installed_at: m.installed_at,
            default_workflow: m.default_workflow.clone(),
            test_harness_included: m.test_harness_included,
            ide_setup: m.ide_setup.iter().cloned().collect(),
            file_count: m.files.len(),
            update_count: m.updates.len(),
            last_update: m.last_update().map(|u| u.timestamp),
        }
    }
}

impl ManifestStore {
    /// Verify the on-disk tree against the persisted manifest
    ///
    /// Never writes anything. Problems reading the manifest itself are
    /// reported in `errors` rather than returned as `Err`.
    pub fn verify(&self) -> VerifyReport {
        match self.read() {
            Ok(Some(mut manifest)) => self.verify_manifest(&mut manifest),
            Ok(None) => VerifyReport::failed("manifest file does not exist".to_string()),
            Err(e) => VerifyReport::failed(format!("failed to read manifest: {e}")),
        }
    }

    /// Verify against an in-memory manifest, setting its `modified` hints
    pub fn verify_manifest(&self, manifest: &mut InstallManifest) -> VerifyReport {
        let mut report = VerifyReport {
            valid: true,
            total_files: manifest.files.len(),
            ..VerifyReport::default()
        };

        for entry in &mut manifest.files {
            let rel = match normalize_path(&entry.path) {
                Ok(rel) => rel,
                Err(e) => {
                    report.errors.push(format!("rejected manifest entry {}: {e}", entry.path));
                    continue;
                }
            };

            match hash_file_if_exists(&self.layout().resolve(&rel)) {
                Ok(None) => report.missing.push(entry.path.clone()),
                Ok(Some(actual)) if actual != entry.hash => {
                    entry.modified = true;
                    report.modified.push(ModifiedFile {
                        path: entry.path.clone(),
                        expected: entry.hash,
                        actual,
                    });
                }
                Ok(Some(_)) => entry.modified = false,
                Err(e) => report.errors.push(format!("failed to verify {}: {e}", entry.path)),
            }
        }

        report.valid =
            report.missing.is_empty() && report.modified.is_empty() && report.errors.is_empty();
        debug!(
            "Verified {} files: {} missing, {} modified, {} errors",
            report.total_files,
            report.missing.len(),
            report.modified.len(),
            report.errors.len()
        );
        report
    }

    /// Summary of the persisted manifest; `Ok(None)` when absent
    pub fn summary(&self) -> codex_core::Result<Option<ManifestSummary>> {
        Ok(self.read()?.as_ref().map(ManifestSummary::from))
    }
}
