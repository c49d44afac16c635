//! The update transaction
//!
//! ```text
//! Detecting -> CheckingCompatibility -> [ConfirmingSchemaOverride] -> [AwaitingConfirmation]
//!   -> BackingUp -> Preserving -> Swapping -> Restoring -> [Merging]
//!   -> Recording -> Cleaning -> Done
//! ```
//!
//! Any failure from `Preserving` through `Merging` enters `RollingBack`, which
//! restores the backup taken in `BackingUp`. Failures in `Recording` and
//! `Cleaning` only add warnings.

use crate::compat::{check_compatibility, InstallState, Installed, Reason};
use crate::confirm::{Confirm, Decision, SchemaOverrideConfirm, TypedToken, OVERRIDE_TOKEN};
use crate::install::{template_exclude, write_ide_command};
use crate::outcome::{ReasonCode, RollbackStatus, UpdateOutcome, UpdatePhase, UpdateStatus};
use crate::registry::{PackageInfo, PackageRegistry, DEFAULT_PACKAGE};
use crate::source::TemplateSource;
use crate::workflow::detect_active_workflow;
use codex_core::store::{atomic_write, copy_file, remove_tree};
use codex_core::{CodexError, FileTree, IoResultExt, ProjectLayout, Result};
use codex_journal::{tracked_tree, InstallManifest, ManifestStore, ManifestUpdate};
use codex_preserve::{
    backup_modified_config, cleanup_old_backups, create_backup, merge_config, preserve_state,
    restore_backup, MergeStrategy, PreserveReason, PreserveSet,
};
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

static DECLINE: Decision = Decision(false);
static NO_TOKEN: TypedToken = TypedToken(None);

/// Prefix of the temporary holding area created under the project root
const HOLD_PREFIX: &str = ".codex-hold-";

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Concrete version or `latest`
    pub target_version: String,
    pub package_name: String,
    /// Offer the schema override instead of blocking on a schema mismatch
    pub force_schema: bool,
    pub skip_backup: bool,
    /// Treat ordinary confirmations as already given
    pub skip_confirmation: bool,
    pub merge_strategy: MergeStrategy,
    pub keep_backups: usize,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            target_version: "latest".to_string(),
            package_name: DEFAULT_PACKAGE.to_string(),
            force_schema: false,
            skip_backup: false,
            skip_confirmation: false,
            merge_strategy: MergeStrategy::default(),
            keep_backups: 5,
        }
    }
}

/// One update of one project
///
/// The project directory must not be used by anything else while `run` is in
/// progress.
pub struct UpdateTransaction<'a> {
    layout: ProjectLayout,
    store: ManifestStore,
    registry: &'a dyn PackageRegistry,
    source: &'a dyn TemplateSource,
    confirm: &'a dyn Confirm,
    override_confirm: &'a dyn SchemaOverrideConfirm,
    on_phase: Option<&'a dyn Fn(UpdatePhase)>,
    options: UpdateOptions,
    outcome: UpdateOutcome,
}

impl<'a> UpdateTransaction<'a> {
    /// Confirmations default to declining until capabilities are supplied
    pub fn new(
        project_root: &Path,
        registry: &'a dyn PackageRegistry,
        source: &'a dyn TemplateSource,
        options: UpdateOptions,
    ) -> Self {
        Self {
            layout: ProjectLayout::new(project_root),
            store: ManifestStore::new(project_root),
            registry,
            source,
            confirm: &DECLINE,
            override_confirm: &NO_TOKEN,
            on_phase: None,
            options,
            outcome: UpdateOutcome::new(),
        }
    }

    pub fn with_confirm(mut self, confirm: &'a dyn Confirm) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn with_override_confirm(mut self, confirm: &'a dyn SchemaOverrideConfirm) -> Self {
        self.override_confirm = confirm;
        self
    }

    /// Called on entry to every phase
    pub fn on_phase(mut self, hook: &'a dyn Fn(UpdatePhase)) -> Self {
        self.on_phase = Some(hook);
        self
    }

    /// Run to a terminal outcome
    pub fn run(mut self) -> UpdateOutcome {
        self.enter(UpdatePhase::Detecting);
        let manifest = match self.store.read() {
            Ok(Some(manifest)) => manifest,
            Ok(None) => {
                return self.finish(
                    UpdateStatus::Failed,
                    ReasonCode::NoInstallation,
                    "No CODEX installation detected. Use install instead.",
                )
            }
            Err(e) => {
                return self.finish(
                    UpdateStatus::Failed,
                    ReasonCode::CheckError,
                    format!("Failed to read installation manifest: {e}"),
                )
            }
        };
        info!(
            "Found CODEX v{} (schema {:?})",
            manifest.codex_version, manifest.schema_version
        );
        self.outcome.previous_version = Some(manifest.codex_version.clone());

        self.enter(UpdatePhase::CheckingCompatibility);
        let state = InstallState {
            installed: Some(Installed {
                version: manifest.codex_version.clone(),
                schema: manifest.schema_version,
            }),
            workflow: detect_active_workflow(self.layout.root()),
        };
        let registry = self.registry;
        let (package_name, target) = (&self.options.package_name, &self.options.target_version);
        let compat = check_compatibility(&state, target, || {
            registry.fetch_package_info(package_name, target)
        });
        debug!("Compatibility: {:?} - {}", compat.reason, compat.message);
        self.outcome.compatibility = Some(compat.clone());

        if compat.reason == Some(Reason::SchemaMismatch) {
            if !self.options.force_schema {
                let message = format!(
                    "{} Migrate manually, or force the schema override with explicit confirmation.",
                    compat.message
                );
                return self.finish(UpdateStatus::Blocked, ReasonCode::SchemaMismatch, message);
            }
            self.enter(UpdatePhase::ConfirmingSchemaOverride);
            let typed = self.override_confirm.request_override(&compat);
            if typed.as_deref() != Some(OVERRIDE_TOKEN) {
                return self.finish(
                    UpdateStatus::Cancelled,
                    ReasonCode::UserCancelled,
                    "Schema override cancelled. Your installation is unchanged.",
                );
            }
            warn!("Proceeding with forced schema override");
        } else if compat.is_blocked() {
            let code = compat
                .reason
                .map(ReasonCode::from_blocking)
                .unwrap_or(ReasonCode::CheckError);
            return self.finish(UpdateStatus::Blocked, code, compat.message.clone());
        }

        if compat.requires_confirmation && !self.options.skip_confirmation {
            self.enter(UpdatePhase::AwaitingConfirmation);
            if !self.confirm.confirm_update(&compat) {
                return self.finish(
                    UpdateStatus::Cancelled,
                    ReasonCode::UserCancelled,
                    "Update cancelled by user.",
                );
            }
        }

        let Some(package) = compat.package.clone() else {
            return self.finish(
                UpdateStatus::Failed,
                ReasonCode::CheckError,
                "Target package information unavailable.",
            );
        };
        self.outcome.new_version = Some(package.version.clone());

        if self.options.skip_backup {
            warn!("Skipping backup");
        } else {
            self.enter(UpdatePhase::BackingUp);
            match create_backup(self.layout.root(), &manifest.codex_version) {
                Ok(path) => self.outcome.backup_path = Some(path),
                Err(e) => {
                    return self.finish(
                        UpdateStatus::Failed,
                        ReasonCode::BackupFailed,
                        format!("Backup failed: {e}. Cannot proceed without a backup."),
                    )
                }
            }
        }

        let mut hold = None;
        let snapshot = match self.apply(&manifest, &mut hold) {
            Ok(snapshot) => snapshot,
            Err(e) => return self.roll_back(e, hold),
        };
        drop(hold);

        self.record(&manifest, &package, snapshot);
        self.clean();

        let message = format!(
            "Successfully updated from {} to {}",
            manifest.codex_version, package.version
        );
        info!("{message}");
        self.enter(UpdatePhase::Done);
        self.outcome.status = UpdateStatus::Succeeded;
        self.outcome.message = message;
        self.outcome
    }

    /// Preserving through Merging, then the editor command refresh. Returns
    /// the template tree snapshot taken right after the swap.
    fn apply(
        &mut self,
        manifest: &InstallManifest,
        hold: &mut Option<TempDir>,
    ) -> Result<FileTree> {
        let root = self.layout.root().to_path_buf();

        self.enter(UpdatePhase::Preserving);
        let mut set = preserve_state(&root, manifest)?;
        if let Some(path) = backup_modified_config(&root, manifest)? {
            set.insert(self.layout.relativize(&path)?, PreserveReason::ConfigBackup);
            self.outcome.config_backup = Some(path);
        }
        self.outcome.preserved = set.len();

        let area = tempfile::Builder::new()
            .prefix(HOLD_PREFIX)
            .tempdir_in(&root)
            .at(&root)?;
        let hold_dir = area.path().to_path_buf();
        *hold = Some(area);
        let staged = stage(&self.layout, &set, &hold_dir)?;
        debug!("Staged {staged} preserved files in {}", hold_dir.display());

        self.enter(UpdatePhase::Swapping);
        let codex_dir = self.layout.codex_dir();
        remove_tree(&codex_dir)?;
        let copied = self
            .source
            .materialize(&codex_dir, &template_exclude(manifest.test_harness_included))?;
        info!("Copied {copied} template files");
        let snapshot = tracked_tree(&codex_dir)?;
        let template_config = match std::fs::read_to_string(self.layout.config_path()) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => {
                return Err(CodexError::Io {
                    path: self.layout.config_path(),
                    source,
                })
            }
        };

        self.enter(UpdatePhase::Restoring);
        let restored = unstage(&self.layout, &set, &hold_dir)?;
        info!("Restored {restored} preserved files");

        if let Some(backup) = self.outcome.config_backup.clone() {
            self.enter(UpdatePhase::Merging);
            match template_config {
                Some(new) => {
                    let old = std::fs::read_to_string(&backup).at(&backup)?;
                    let result = merge_config(&old, &new, self.options.merge_strategy);
                    if let Some(content) = &result.resolved {
                        atomic_write(&self.layout.config_path(), content.as_bytes())?;
                    }
                    info!(
                        "Config merge: {} ({} differences)",
                        result.resolution.as_str(),
                        result.changes.len()
                    );
                    self.outcome.merge = Some(result);
                }
                None => self.outcome.warnings.push(
                    "New template ships no config file; the previous config was kept".to_string(),
                ),
            }
        }

        match write_ide_command(&self.layout, self.source, true) {
            Ok(path) => self.outcome.ide_command = path,
            Err(e) => {
                warn!("Editor command refresh failed: {e}");
                self.outcome
                    .warnings
                    .push(format!("Editor command refresh failed (non-critical): {e}"));
            }
        }

        Ok(snapshot)
    }

    fn roll_back(mut self, err: CodexError, hold: Option<TempDir>) -> UpdateOutcome {
        let phase = self.outcome.phases.last().copied().unwrap_or(UpdatePhase::Preserving);
        error!("Update failed during {phase}: {err}");
        self.outcome.failed_phase = Some(phase);
        self.enter(UpdatePhase::RollingBack);

        let mut message = format!("Update failed during {phase}: {err}.");
        self.outcome.rollback = match &self.outcome.backup_path {
            Some(backup) => match restore_backup(self.layout.root(), backup) {
                Ok(()) => {
                    info!("Rolled back to previous version");
                    message.push_str(" Rolled back to previous version.");
                    RollbackStatus::Restored
                }
                Err(e) => {
                    error!("Rollback failed: {e}");
                    message.push_str(&format!(
                        " Rollback failed: {e}. Backup preserved at {}.",
                        backup.display()
                    ));
                    RollbackStatus::Failed {
                        error: e.to_string(),
                    }
                }
            },
            None => {
                #[allow(deprecated)]
                let hold_path = hold.map(TempDir::into_path);
                if let Some(path) = &hold_path {
                    message.push_str(&format!(
                        " No backup was taken; preserved files are kept at {}.",
                        path.display()
                    ));
                }
                RollbackStatus::NoBackup { hold_path }
            }
        };

        self.outcome
            .terminate(UpdateStatus::Failed, Some(ReasonCode::UpdateFailed), message)
    }

    /// Records the post-swap snapshot: preserved and merged files keep the
    /// template's digests and count as user changes for the next update.
    fn record(&mut self, manifest: &InstallManifest, package: &PackageInfo, snapshot: FileTree) {
        self.enter(UpdatePhase::Recording);
        let update = ManifestUpdate {
            codex_version: Some(package.version.clone()),
            schema_version: package.schema_version,
            regenerate_files: true,
            snapshot: Some(snapshot),
            summary: Some(format!(
                "Updated from {} to {}",
                manifest.codex_version, package.version
            )),
            ..ManifestUpdate::default()
        };
        if let Err(e) = self.store.update(&update) {
            warn!("Manifest update failed: {e}");
            self.outcome
                .warnings
                .push(format!("Manifest update failed (non-critical): {e}"));
        }
    }

    fn clean(&mut self) {
        if self.outcome.backup_path.is_none() {
            return;
        }
        self.enter(UpdatePhase::Cleaning);
        match cleanup_old_backups(self.layout.root(), self.options.keep_backups) {
            Ok(removed) => debug!("Removed {removed} old backups"),
            Err(e) => {
                warn!("Backup cleanup failed: {e}");
                self.outcome
                    .warnings
                    .push(format!("Backup cleanup failed: {e}"));
            }
        }
    }

    fn enter(&mut self, phase: UpdatePhase) {
        debug!("Entering {phase}");
        self.outcome.phases.push(phase);
        if let Some(hook) = self.on_phase {
            hook(phase);
        }
    }

    fn finish(
        self,
        status: UpdateStatus,
        reason: ReasonCode,
        message: impl Into<String>,
    ) -> UpdateOutcome {
        let message = message.into();
        info!("Update {}: {message}", reason.as_str());
        self.outcome.terminate(status, Some(reason), message)
    }
}

/// Copy every preserved path that exists into the holding area
fn stage(layout: &ProjectLayout, set: &PreserveSet, hold_dir: &Path) -> Result<usize> {
    let mut staged = 0usize;
    for path in set.paths() {
        let src = layout.resolve(path);
        if src.is_file() {
            copy_file(&src, &hold_dir.join(path))?;
            staged += 1;
        }
    }
    Ok(staged)
}

/// Copy staged files back to their original locations
fn unstage(layout: &ProjectLayout, set: &PreserveSet, hold_dir: &Path) -> Result<usize> {
    let mut restored = 0usize;
    for path in set.paths() {
        let staged = hold_dir.join(path);
        if staged.is_file() {
            copy_file(&staged, &layout.resolve(path))?;
            restored += 1;
        }
    }
    Ok(restored)
}
