//! Compatibility decision between an installation and a target release

use crate::registry::{PackageInfo, PackageRegistry};
use crate::workflow::{detect_active_workflow, ActiveWorkflow};
use codex_core::Result;
use codex_journal::ManifestStore;
use semver::Version;
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    None,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Warning,
    Blocked,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "WARNING",
            Self::Blocked => "BLOCKED",
        }
    }
}

/// Why a check did not come out as a plain compatible result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    WorkflowInProgress,
    FetchError,
    SchemaUnknown,
    SchemaMismatch,
    InvalidVersion,
    /// The installation itself could not be inspected
    CheckError,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkflowInProgress => "workflow-in-progress",
            Self::FetchError => "fetch-error",
            Self::SchemaUnknown => "schema-unknown",
            Self::SchemaMismatch => "schema-mismatch",
            Self::InvalidVersion => "invalid-version",
            Self::CheckError => "check-error",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStatus {
    Same,
    Downgrade,
    Upgrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaDirection {
    Upgrade,
    Downgrade,
}

impl SchemaDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upgrade => "upgrade",
            Self::Downgrade => "downgrade",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaChange {
    pub direction: SchemaDirection,
    pub from: u32,
    pub to: u32,
}

/// Version and schema of the current installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    pub version: String,
    pub schema: Option<u32>,
}

/// Everything the decision needs to know about the project
#[derive(Debug, Clone, Default)]
pub struct InstallState {
    /// `None` when nothing is installed
    pub installed: Option<Installed>,
    pub workflow: Option<ActiveWorkflow>,
}

/// Transient decision record; never persisted
#[derive(Debug, Clone)]
pub struct CompatibilityResult {
    pub compatible: bool,
    pub reason: Option<Reason>,
    pub severity: Severity,
    pub action: Option<Action>,
    pub requires_confirmation: bool,
    pub current_version: Option<String>,
    /// Requested target, or the fetched concrete version once resolved
    pub target_version: String,
    pub current_schema: Option<u32>,
    pub target_schema: Option<u32>,
    pub message: String,
    pub version_status: Option<VersionStatus>,
    pub schema_change: Option<SchemaChange>,
    /// The blocking workflow for `workflow-in-progress`
    pub workflow: Option<ActiveWorkflow>,
    /// Target package as fetched; `None` if no fetch happened or it failed
    pub package: Option<PackageInfo>,
}

impl CompatibilityResult {
    fn base(state: &InstallState, target: &str, message: String) -> Self {
        Self {
            compatible: true,
            reason: None,
            severity: Severity::None,
            action: None,
            requires_confirmation: false,
            current_version: state.installed.as_ref().map(|i| i.version.clone()),
            target_version: target.to_string(),
            current_schema: state.installed.as_ref().and_then(|i| i.schema),
            target_schema: None,
            message,
            version_status: None,
            schema_change: None,
            workflow: None,
            package: None,
        }
    }

    fn blocked(mut self, reason: Reason) -> Self {
        self.compatible = false;
        self.reason = Some(reason);
        self.severity = Severity::Critical;
        self.action = Some(Action::Blocked);
        self.requires_confirmation = false;
        self
    }

    fn warning(mut self, reason: Option<Reason>) -> Self {
        self.compatible = reason.is_none();
        self.reason = reason;
        self.severity = Severity::Warning;
        self.action = Some(Action::Warning);
        self.requires_confirmation = true;
        self
    }

    pub fn is_blocked(&self) -> bool {
        self.action == Some(Action::Blocked)
    }

    /// Build the result for an installation that could not be inspected
    pub fn check_error(target: &str, message: String) -> Self {
        Self::base(&InstallState::default(), target, message).blocked(Reason::CheckError)
    }
}

/// Parse a version the way npm does, tolerating a leading `v` or `=`
pub(crate) fn parse_version(raw: &str) -> Option<Version> {
    Version::parse(raw.trim().trim_start_matches(['v', '='])).ok()
}

/// Decide whether an update from `state` to `target` may proceed
///
/// `fetch` is called at most once, and only after the installation and
/// workflow gates pass. Rules are evaluated in order; the first match wins.
pub fn check_compatibility<F>(state: &InstallState, target: &str, fetch: F) -> CompatibilityResult
where
    F: FnOnce() -> Result<PackageInfo>,
{
    let Some(installed) = &state.installed else {
        return CompatibilityResult::base(
            state,
            target,
            "No existing installation detected. Fresh installation is compatible.".to_string(),
        );
    };

    if let Some(workflow) = &state.workflow {
        let mut result = CompatibilityResult::base(
            state,
            target,
            format!(
                "Cannot update: active workflow in progress (phase: {}, type: {}). \
                 Complete or cancel the current workflow before updating.",
                workflow.phase,
                workflow.workflow_type.as_deref().unwrap_or("unknown")
            ),
        )
        .blocked(Reason::WorkflowInProgress);
        result.workflow = Some(workflow.clone());
        return result;
    }

    let package = match fetch() {
        Ok(package) => package,
        Err(e) => {
            return CompatibilityResult::base(
                state,
                target,
                format!("Cannot verify compatibility: {e}"),
            )
            .blocked(Reason::FetchError)
        }
    };
    debug!("Fetched target package v{} (schema {:?})", package.version, package.schema_version);

    let resolved = if target == "latest" { package.version.clone() } else { target.to_string() };
    let mut result = CompatibilityResult::base(state, &resolved, String::new());
    result.target_schema = package.schema_version;
    result.package = Some(package);

    let (current_schema, target_schema) = match (installed.schema, result.target_schema) {
        (Some(current), Some(target)) => (current, target),
        _ => {
            result.message =
                "Cannot determine schema compatibility. Update may cause issues.".to_string();
            return result.warning(Some(Reason::SchemaUnknown));
        }
    };

    if current_schema != target_schema {
        let direction = if target_schema > current_schema {
            SchemaDirection::Upgrade
        } else {
            SchemaDirection::Downgrade
        };
        result.message = match direction {
            SchemaDirection::Upgrade => format!(
                "Incompatible schema version. Upgrading from schema v{current_schema} to \
                 v{target_schema} requires manual migration."
            ),
            SchemaDirection::Downgrade => format!(
                "Incompatible schema version. Downgrading from schema v{current_schema} to \
                 v{target_schema} is not supported."
            ),
        };
        result.schema_change = Some(SchemaChange {
            direction,
            from: current_schema,
            to: target_schema,
        });
        return result.blocked(Reason::SchemaMismatch);
    }

    let Some(current) = parse_version(&installed.version) else {
        result.message = format!(
            "Current version \"{}\" is not a valid semantic version. Update may cause issues.",
            installed.version
        );
        return result.warning(Some(Reason::InvalidVersion));
    };
    let Some(wanted) = parse_version(&resolved) else {
        result.message = format!("Target version \"{resolved}\" is not a valid semantic version.");
        return result.warning(Some(Reason::InvalidVersion));
    };

    match wanted.cmp(&current) {
        Ordering::Equal => {
            result.message = format!(
                "Already running version {current}. Reinstallation will refresh files."
            );
            result.requires_confirmation = true;
            result.version_status = Some(VersionStatus::Same);
            result
        }
        Ordering::Less => {
            result.message = format!(
                "Downgrading from {current} to {wanted}. Same schema version, but newer \
                 features may be lost."
            );
            result.version_status = Some(VersionStatus::Downgrade);
            result.warning(None)
        }
        Ordering::Greater => {
            result.message = format!(
                "Upgrading from {current} to {wanted}. Same schema version, should be compatible."
            );
            result.version_status = Some(VersionStatus::Upgrade);
            result
        }
    }
}

/// Inspect a project and run the decision against a registry
pub fn check_project(
    project_root: &Path,
    registry: &dyn PackageRegistry,
    package_name: &str,
    target: &str,
) -> CompatibilityResult {
    let installed = match ManifestStore::new(project_root).read() {
        Ok(manifest) => manifest.map(|m| Installed {
            version: m.codex_version,
            schema: m.schema_version,
        }),
        Err(e) => {
            return CompatibilityResult::check_error(target, format!("Compatibility check failed: {e}"))
        }
    };

    let state = InstallState {
        workflow: installed.as_ref().and_then(|_| detect_active_workflow(project_root)),
        installed,
    };
    check_compatibility(&state, target, || {
        registry.fetch_package_info(package_name, target)
    })
}
