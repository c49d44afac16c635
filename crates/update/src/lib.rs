//! Install and update orchestration for CODEX template trees
//!
//! This crate provides:
//! - Active-workflow detection from `.codex/state/workflow.json`
//! - The package registry interface and template sources
//! - The compatibility decision that gates an update
//! - The update transaction with backup, preservation and rollback
//! - Fresh installation and update availability checks

pub mod compat;
pub mod confirm;
pub mod install;
pub mod outcome;
pub mod registry;
pub mod source;
pub mod transaction;
pub mod workflow;

// Re-exports
pub use compat::{
    check_compatibility, check_project, Action, CompatibilityResult, InstallState, Installed, Reason,
    SchemaChange, SchemaDirection, Severity, VersionStatus,
};
pub use confirm::{Confirm, Decision, SchemaOverrideConfirm, TypedToken, OVERRIDE_TOKEN};
pub use install::{check_for_updates, install, InstallOptions, InstallReport, ReleaseType, UpdateCheck};
pub use outcome::{ReasonCode, RollbackStatus, UpdateOutcome, UpdatePhase, UpdateStatus};
pub use registry::{PackageInfo, PackageJson, PackageRegistry, StaticRegistry, DEFAULT_PACKAGE};
pub use source::{DirectorySource, TemplateSource};
pub use transaction::{UpdateOptions, UpdateTransaction};
pub use workflow::{detect_active_workflow, ActiveWorkflow, WorkflowState};
