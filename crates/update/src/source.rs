//! Template sources

use crate::registry::PackageInfo;
use codex_core::store::{copy_tree, CODEX_DIR, IDE_COMMAND_FILE};
use codex_core::{CodexError, ExcludeMatcher, IoResultExt, Result};
use std::path::{Path, PathBuf};

/// Supplies a template tree to install
///
/// Implementations only read their own content.
pub trait TemplateSource {
    /// Copy the template tree into `dest`, skipping excluded paths.
    /// Returns the number of files written.
    fn materialize(&self, dest: &Path, exclude: &ExcludeMatcher) -> Result<usize>;

    /// Content of the editor command file shipped beside the tree, if any
    fn ide_command(&self) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// A package directory laid out as published:
///
/// ```text
/// <package>/
///   package.json
///   .codex/
///   .claude/commands/codex.md   (optional)
/// ```
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(package_root: impl Into<PathBuf>) -> Self {
        Self {
            root: package_root.into(),
        }
    }

    /// Open a package directory, checking that it carries a template tree
    pub fn open(package_root: impl Into<PathBuf>) -> Result<Self> {
        let source = Self::new(package_root);
        if !source.template_dir().is_dir() {
            return Err(CodexError::Precondition(format!(
                "package template tree not found at {}",
                source.template_dir().display()
            )));
        }
        Ok(source)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn template_dir(&self) -> PathBuf {
        self.root.join(CODEX_DIR)
    }

    /// Version information from the package's `package.json`
    pub fn package_info(&self) -> Result<PackageInfo> {
        let path = self.root.join("package.json");
        let content = std::fs::read_to_string(&path).at(&path)?;
        PackageInfo::from_package_json(&content).map_err(|e| CodexError::Parse {
            path,
            message: e.to_string(),
        })
    }
}

impl TemplateSource for DirectorySource {
    fn materialize(&self, dest: &Path, exclude: &ExcludeMatcher) -> Result<usize> {
        copy_tree(&self.template_dir(), dest, exclude)
    }

    fn ide_command(&self) -> Result<Option<Vec<u8>>> {
        let path = self.root.join(IDE_COMMAND_FILE);
        match std::fs::read(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CodexError::Io { path, source }),
        }
    }
}
