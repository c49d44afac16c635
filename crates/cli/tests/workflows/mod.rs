//! Workflow integration tests
//!
//! Tests for complete workflows that exercise multiple commands
//! and validate end-to-end behavior.

pub mod backups_restore;
pub mod config_cmd;
pub mod install_verify;
pub mod update_lifecycle;
