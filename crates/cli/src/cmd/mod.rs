//! CLI command implementations

pub mod backups;
pub mod check;
pub mod config;
pub mod install;
pub mod restore;
pub mod status;
pub mod update;
pub mod verify;
