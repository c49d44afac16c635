//! Project layout and filesystem helpers

use crate::error::{CodexError, IoResultExt, Result};
use crate::ignore::ExcludeMatcher;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Name of the installed template tree directory
pub const CODEX_DIR: &str = ".codex";
/// Manifest file, relative to the template tree
pub const MANIFEST_FILE: &str = "install-manifest.yaml";
/// State directory, relative to the template tree
pub const STATE_DIR: &str = "state";
/// Workflow state document, relative to the template tree
pub const WORKFLOW_FILE: &str = "state/workflow.json";
/// User-editable config, relative to the template tree
pub const CONFIG_FILE: &str = "config/codex-config.yaml";
/// Prefix shared by every backup directory name
pub const BACKUP_PREFIX: &str = ".codex-backup-";
/// Marker that identifies backup artefacts by file name
pub const BACKUP_MARKER: &str = ".backup";
/// Editor slash command shipped with the template, relative to the project
/// root (and to the package root)
pub const IDE_COMMAND_FILE: &str = ".claude/commands/codex.md";

/// Paths of a CODEX installation inside a project
///
/// ```text
/// <project>/
///   .codex/
///     install-manifest.yaml
///     config/
///       codex-config.yaml
///     state/
///       workflow.json
///   .claude/
///     commands/
///       codex.md
///   .codex-backup-<timestamp>-v<version>/
///     backup-manifest.json
/// ```
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            root: project_root.into(),
        }
    }

    /// Project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<project>/.codex`
    pub fn codex_dir(&self) -> PathBuf {
        self.root.join(CODEX_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.codex_dir().join(MANIFEST_FILE)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.codex_dir().join(STATE_DIR)
    }

    pub fn workflow_path(&self) -> PathBuf {
        self.codex_dir().join(WORKFLOW_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.codex_dir().join(CONFIG_FILE)
    }

    /// `<project>/.claude/commands/codex.md`, outside the template tree
    pub fn ide_command_path(&self) -> PathBuf {
        self.root.join(IDE_COMMAND_FILE)
    }

    /// Project-relative manifest key for a path inside the template tree
    ///
    /// `config/codex-config.yaml` becomes `.codex/config/codex-config.yaml`.
    pub fn tree_key(tree_relative: &str) -> String {
        format!("{CODEX_DIR}/{tree_relative}")
    }

    /// Absolute path for a project-relative key
    pub fn resolve(&self, project_relative: &str) -> PathBuf {
        self.root.join(project_relative)
    }

    /// Project-relative, `/`-separated form of an absolute path under the root
    pub fn relativize(&self, path: &Path) -> Result<String> {
        let rel = path.strip_prefix(&self.root).map_err(|_| {
            CodexError::Precondition(format!(
                "{} is outside project root {}",
                path.display(),
                self.root.display()
            ))
        })?;
        Ok(to_slash(rel))
    }

    /// True when the template tree directory exists
    pub fn is_installed(&self) -> bool {
        self.codex_dir().is_dir()
    }
}

/// Render a relative path with `/` separators
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize a relative path for storage
///
/// - Converts to `/` separators
/// - Rejects `..` and absolute paths
/// - Removes `./` prefix
pub fn normalize_path(path: &str) -> Result<String> {
    let unified = path.replace('\\', "/");
    if unified.starts_with('/') {
        return Err(CodexError::Precondition(format!(
            "absolute path not allowed: {path}"
        )));
    }
    let mut parts = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                return Err(CodexError::Precondition(format!(
                    "parent traversal not allowed: {path}"
                )))
            }
            other => parts.push(other),
        }
    }
    Ok(parts.join("/"))
}

/// Atomic write helper
///
/// Writes data to a temporary file beside the target, fsyncs it, then renames
/// it over the target so readers never observe a truncated file.
pub fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    let parent = target
        .parent()
        .ok_or_else(|| CodexError::io_message(target, "target has no parent directory"))?;
    fs::create_dir_all(parent).at(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).at(parent)?;
    tmp.write_all(data).at(tmp.path())?;
    tmp.as_file().sync_all().at(tmp.path())?;
    tmp.persist(target).map_err(|e| CodexError::Io {
        path: target.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Copy a single file, creating parent directories
pub fn copy_file(src: &Path, dest: &Path) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).at(parent)?;
    }
    fs::copy(src, dest).at(src)
}

/// Copy a file to a destination that must not exist yet
pub fn copy_file_new(src: &Path, dest: &Path) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).at(parent)?;
    }
    let mut out = match fs::OpenOptions::new().write(true).create_new(true).open(dest) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(CodexError::AlreadyExists(dest.to_path_buf()))
        }
        Err(e) => return Err(CodexError::Io { path: dest.to_path_buf(), source: e }),
    };
    let mut input = fs::File::open(src).at(src)?;
    let copied = std::io::copy(&mut input, &mut out).at(dest)?;
    out.sync_all().at(dest)?;
    Ok(copied)
}

/// Recursively copy the files of `src` into `dest`
///
/// Paths (relative to `src`) matching `exclude` are skipped; excluded
/// directories are not descended into. Existing files in `dest` are
/// overwritten. Returns the number of files copied.
pub fn copy_tree(src: &Path, dest: &Path, exclude: &ExcludeMatcher) -> Result<usize> {
    if !src.is_dir() {
        return Err(CodexError::Precondition(format!(
            "source directory does not exist: {}",
            src.display()
        )));
    }
    fs::create_dir_all(dest).at(dest)?;

    let mut copied = 0usize;
    let walker = WalkDir::new(src)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let rel = entry.path().strip_prefix(src).map(to_slash).unwrap_or_default();
            !exclude.is_excluded(&rel)
        });

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(src, e))?;
        let rel = entry.path().strip_prefix(src).map_err(|_| {
            CodexError::io_message(entry.path(), "walked outside source root")
        })?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).at(&target)?;
        } else if entry.file_type().is_file() {
            copy_file(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Relative `/`-separated paths of every regular file under `root`, sorted
///
/// A missing root yields an empty list.
pub fn list_files(root: &Path, exclude: &ExcludeMatcher) -> Result<Vec<String>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
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
        if entry.file_type().is_file() {
            if let Ok(rel) = entry.path().strip_prefix(root) {
                files.push(to_slash(rel));
            }
        }
    }
    Ok(files)
}

/// Remove a directory tree; a missing directory is not an error
pub fn remove_tree(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CodexError::Io { path: path.to_path_buf(), source: e }),
    }
}

/// Count regular files under a directory
pub fn count_files(dir: &Path) -> Result<usize> {
    let mut count = 0usize;
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        if entry.file_type().is_file() {
            count += 1;
        }
    }
    Ok(count)
}

/// Calculate directory size recursively
pub fn dir_size(dir: &Path) -> Result<u64> {
    let mut total = 0u64;
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        if entry.file_type().is_file() {
            total += entry.metadata().map_err(|e| walk_error(dir, e))?.len();
        }
    }
    Ok(total)
}

/// Convert a walkdir failure, naming cycles explicitly
pub(crate) fn walk_error(root: &Path, err: walkdir::Error) -> CodexError {
    let path = err.path().unwrap_or(root).to_path_buf();
    if let Some(ancestor) = err.loop_ancestor() {
        return CodexError::io_message(
            path,
            format!("filesystem cycle detected (loops back to {})", ancestor.display()),
        );
    }
    match err.into_io_error() {
        Some(source) => CodexError::Io { path, source },
        None => CodexError::io_message(path, "directory walk failed"),
    }
}
