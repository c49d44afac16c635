//! Active-workflow detection

use codex_core::ProjectLayout;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// The workflow document written by the host tooling
///
/// Only the fields the updater inspects are modelled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowState {
    #[serde(default)]
    pub current_phase: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub workflow_type: Option<String>,
}

impl WorkflowState {
    /// A workflow is active when it has a phase and neither the phase nor
    /// the status is `completed`
    pub fn is_active(&self) -> bool {
        match self.current_phase.as_deref() {
            None | Some("") | Some("completed") => false,
            Some(_) => self.status.as_deref() != Some("completed"),
        }
    }
}

/// An in-progress workflow that blocks updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveWorkflow {
    pub phase: String,
    pub workflow_type: Option<String>,
}

/// Read the workflow document; `None` when absent, inactive, or unreadable
pub fn detect_active_workflow(project_root: &Path) -> Option<ActiveWorkflow> {
    let path = ProjectLayout::new(project_root).workflow_path();
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Failed to read workflow state {}: {e}", path.display());
            return None;
        }
    };

    let state: WorkflowState = match serde_json::from_str(&content) {
        Ok(state) => state,
        Err(e) => {
            warn!("Ignoring malformed workflow state {}: {e}", path.display());
            return None;
        }
    };

    if !state.is_active() {
        return None;
    }
    Some(ActiveWorkflow {
        phase: state.current_phase.unwrap_or_default(),
        workflow_type: state.workflow_type,
    })
}
