//! Whole-tree digests and tree diffing

use crate::error::{CodexError, Result};
use crate::hash::{hash_file, FileDigest};
use crate::ignore::ExcludeMatcher;
use crate::store::{to_slash, walk_error};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Mapping from `/`-separated relative path to content digest, sorted by path
pub type FileTree = BTreeMap<String, FileDigest>;

/// Digest every regular file under `root`
///
/// The walk is depth-first in file-name order. Entries whose relative path is
/// excluded are skipped, and excluded directories are not descended into.
/// Symlinks are followed; a link that loops back to an ancestor fails with an
/// `Io` error instead of recursing forever.
pub fn hash_tree(root: &Path, exclude: &ExcludeMatcher) -> Result<FileTree> {
    if !root.is_dir() {
        return Err(CodexError::io_message(root, "tree root is not a directory"));
    }

    let mut tree = FileTree::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let rel = entry.path().strip_prefix(root).map(to_slash).unwrap_or_default();
            !exclude.is_excluded(&rel)
        });

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map(to_slash)
            .map_err(|_| CodexError::io_message(entry.path(), "walked outside tree root"))?;
        tree.insert(rel, hash_file(entry.path())?);
    }

    debug!("Hashed {} files under {}", tree.len(), root.display());
    Ok(tree)
}

/// Differences between two trees
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeDiff {
    /// Paths only in the new tree
    pub added: Vec<String>,
    /// Paths only in the old tree
    pub removed: Vec<String>,
    /// Paths in both with differing digests
    pub modified: Vec<String>,
}

impl TreeDiff {
    /// Check if there are any changes
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Total number of changed paths
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

/// Compute the diff between two trees. Output lists are sorted by path.
pub fn diff_trees(old: &FileTree, new: &FileTree) -> TreeDiff {
    let mut diff = TreeDiff::default();

    for (path, new_digest) in new {
        match old.get(path) {
            None => diff.added.push(path.clone()),
            Some(old_digest) if old_digest != new_digest => diff.modified.push(path.clone()),
            Some(_) => {}
        }
    }
    diff.removed = old
        .keys()
        .filter(|path| !new.contains_key(*path))
        .cloned()
        .collect();

    diff
}
