//! Error taxonomy shared by all CODEX crates

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for CODEX operations
pub type Result<T> = std::result::Result<T, CodexError>;

/// Every failure a CODEX operation can report
#[derive(Debug, Error)]
pub enum CodexError {
    /// Required prior state is missing (no manifest, no template tree, ...)
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Filesystem read/write/hash failure
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A persisted document is present but malformed
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// Registry unreachable, timed out, or answered non-2xx
    #[error("network error: {0}")]
    Network(String),

    /// Refusing to replace something that already exists
    #[error("already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// Backup directory lacks a usable backup record
    #[error("invalid backup at {}: {reason}", path.display())]
    InvalidBackup { path: PathBuf, reason: String },

    /// The user declined a confirmation. Not a system fault.
    #[error("cancelled by user: {0}")]
    UserCancelled(String),
}

impl CodexError {
    /// Stable, machine-checkable code for this error
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Precondition(_) => "precondition",
            Self::Io { .. } => "io",
            Self::Parse { .. } => "parse",
            Self::Network(_) => "network",
            Self::AlreadyExists(_) => "already-exists",
            Self::InvalidBackup { .. } => "invalid-backup",
            Self::UserCancelled(_) => "user-cancelled",
        }
    }

    /// Build an `Io` error that carries a plain message
    pub fn io_message(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            source: io::Error::new(io::ErrorKind::Other, message.into()),
        }
    }
}

/// Attach the offending path to `std::io` results
pub trait IoResultExt<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|source| CodexError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_carries_path() {
        let err = std::fs::read("/definitely/not/here")
            .at(Path::new("/definitely/not/here"))
            .unwrap_err();
        assert_eq!(err.kind(), "io");
        assert!(err.to_string().contains("/definitely/not/here"));
    }

    #[test]
    fn test_kinds_are_distinct() {
        let kinds = [
            CodexError::Precondition("x".into()).kind(),
            CodexError::io_message("p", "m").kind(),
            CodexError::Parse { path: "p".into(), message: "m".into() }.kind(),
            CodexError::Network("x".into()).kind(),
            CodexError::AlreadyExists("p".into()).kind(),
            CodexError::InvalidBackup { path: "p".into(), reason: "r".into() }.kind(),
            CodexError::UserCancelled("x".into()).kind(),
        ];
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
    }
}
