//! Core primitives for CODEX template-tree management
//!
//! This crate provides:
//! - Content digests for files (BLAKE3, truncated for display)
//! - Whole-tree hashing with compiled exclude rules
//! - Tree diffing
//! - Project layout constants and filesystem helpers (atomic write, copy, remove)
//! - The error taxonomy shared by every CODEX crate

pub mod error;
pub mod hash;
pub mod ignore;
pub mod store;
pub mod tree;

// Re-exports
pub use error::{CodexError, IoResultExt, Result};
pub use hash::{hash_bytes, hash_file, FileDigest};
pub use ignore::ExcludeMatcher;
pub use store::ProjectLayout;
pub use tree::{diff_trees, hash_tree, FileTree, TreeDiff};
