//! Terminal outcome of an update transaction

use crate::compat::{CompatibilityResult, Reason};
use codex_preserve::MergeResult;
use std::fmt;
use std::path::PathBuf;

/// States of the update transaction, in the order they are entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Detecting,
    CheckingCompatibility,
    ConfirmingSchemaOverride,
    AwaitingConfirmation,
    BackingUp,
    Preserving,
    Swapping,
    Restoring,
    Merging,
    Recording,
    Cleaning,
    RollingBack,
    Done,
}

impl UpdatePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detecting => "detecting",
            Self::CheckingCompatibility => "checking-compatibility",
            Self::ConfirmingSchemaOverride => "confirming-schema-override",
            Self::AwaitingConfirmation => "awaiting-confirmation",
            Self::BackingUp => "backing-up",
            Self::Preserving => "preserving",
            Self::Swapping => "swapping",
            Self::Restoring => "restoring",
            Self::Merging => "merging",
            Self::Recording => "recording",
            Self::Cleaning => "cleaning",
            Self::RollingBack => "rolling-back",
            Self::Done => "done",
        }
    }

    /// Human-readable progress label
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Detecting => "Detecting existing installation",
            Self::CheckingCompatibility => "Checking compatibility",
            Self::ConfirmingSchemaOverride => "Confirming schema override",
            Self::AwaitingConfirmation => "Awaiting confirmation",
            Self::BackingUp => "Creating backup",
            Self::Preserving => "Identifying files to preserve",
            Self::Swapping => "Replacing template files",
            Self::Restoring => "Restoring preserved files",
            Self::Merging => "Comparing configuration",
            Self::Recording => "Updating installation manifest",
            Self::Cleaning => "Cleaning up old backups",
            Self::RollingBack => "Rolling back from backup",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    Succeeded,
    /// A gate refused the update; nothing was changed
    Blocked,
    /// The user declined; nothing was changed
    Cancelled,
    Failed,
}

/// Machine-checkable code for a terminal outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    NoInstallation,
    CheckError,
    WorkflowInProgress,
    FetchError,
    SchemaMismatch,
    UserCancelled,
    BackupFailed,
    UpdateFailed,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoInstallation => "no-installation",
            Self::CheckError => "check-error",
            Self::WorkflowInProgress => "workflow-in-progress",
            Self::FetchError => "fetch-error",
            Self::SchemaMismatch => "schema-mismatch",
            Self::UserCancelled => "user-cancelled",
            Self::BackupFailed => "backup-failed",
            Self::UpdateFailed => "update-failed",
        }
    }

    /// Terminal code for a blocking compatibility reason
    pub(crate) fn from_blocking(reason: Reason) -> Self {
        match reason {
            Reason::WorkflowInProgress => Self::WorkflowInProgress,
            Reason::FetchError => Self::FetchError,
            Reason::SchemaMismatch => Self::SchemaMismatch,
            Reason::SchemaUnknown | Reason::InvalidVersion | Reason::CheckError => Self::CheckError,
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to the project after a failed forward update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackStatus {
    /// Nothing had been changed
    NotNeeded,
    /// The template tree was restored from the backup
    Restored,
    /// Restoring from the backup failed; the backup is still on disk
    Failed { error: String },
    /// No backup was taken; preserved files were kept in `hold_path`
    NoBackup { hold_path: Option<PathBuf> },
}

/// Everything the caller needs to report an update
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub status: UpdateStatus,
    pub reason: Option<ReasonCode>,
    pub message: String,
    pub previous_version: Option<String>,
    pub new_version: Option<String>,
    /// Backup of the pre-update tree; always reported when one exists
    pub backup_path: Option<PathBuf>,
    pub config_backup: Option<PathBuf>,
    pub preserved: usize,
    pub merge: Option<MergeResult>,
    /// Editor command file refreshed from the new template
    pub ide_command: Option<PathBuf>,
    /// Non-fatal problems after the tree was updated
    pub warnings: Vec<String>,
    pub rollback: RollbackStatus,
    /// Phase in which a failure occurred
    pub failed_phase: Option<UpdatePhase>,
    pub compatibility: Option<CompatibilityResult>,
    pub phases: Vec<UpdatePhase>,
}

impl UpdateOutcome {
    pub(crate) fn new() -> Self {
        Self {
            status: UpdateStatus::Failed,
            reason: None,
            message: String::new(),
            previous_version: None,
            new_version: None,
            backup_path: None,
            config_backup: None,
            preserved: 0,
            merge: None,
            ide_command: None,
            warnings: Vec::new(),
            rollback: RollbackStatus::NotNeeded,
            failed_phase: None,
            compatibility: None,
            phases: Vec::new(),
        }
    }

    pub(crate) fn terminate(
        mut self,
        status: UpdateStatus,
        reason: Option<ReasonCode>,
        message: impl Into<String>,
    ) -> Self {
        self.status = status;
        self.reason = reason;
        self.message = message.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == UpdateStatus::Succeeded
    }

    pub fn reason_code(&self) -> Option<&'static str> {
        self.reason.map(|r| r.as_str())
    }
}
