//! Fresh installation and update availability

use crate::compat::parse_version;
use crate::registry::{PackageInfo, PackageRegistry};
use crate::source::TemplateSource;
use codex_core::store::{atomic_write, remove_tree};
use codex_core::{CodexError, ExcludeMatcher, IoResultExt, ProjectLayout, Result};
use codex_journal::{InstallManifest, ManifestOptions, ManifestStore};
use semver::Version;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Template directory only installed on request
pub const TEST_HARNESS_DIR: &str = "test-harness";

#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub default_workflow: String,
    pub include_test_harness: bool,
    pub ide_setup: BTreeSet<String>,
}

impl Default for InstallOptions {
    fn default() -> Self {
        let defaults = ManifestOptions::default();
        Self {
            default_workflow: defaults.default_workflow,
            include_test_harness: defaults.test_harness_included,
            ide_setup: defaults.ide_setup,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstallReport {
    pub files_copied: usize,
    pub manifest: InstallManifest,
    /// Editor command file written by this install
    pub ide_command: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Exclusions applied when copying a template into a project
pub(crate) fn template_exclude(include_test_harness: bool) -> ExcludeMatcher {
    if include_test_harness {
        ExcludeMatcher::empty()
    } else {
        ExcludeMatcher::new([TEST_HARNESS_DIR])
    }
}

/// Write the source's editor command file into the project
///
/// Returns `None` when the source ships none, or when the file already exists
/// and `overwrite` is false.
pub(crate) fn write_ide_command(
    layout: &ProjectLayout,
    source: &dyn TemplateSource,
    overwrite: bool,
) -> Result<Option<PathBuf>> {
    let Some(content) = source.ide_command()? else {
        debug!("Template ships no editor command file");
        return Ok(None);
    };
    let target = layout.ide_command_path();
    if !overwrite && target.exists() {
        debug!("Keeping existing {}", target.display());
        return Ok(None);
    }
    atomic_write(&target, &content)?;
    Ok(Some(target))
}

fn validate_target(project_root: &Path) -> Result<()> {
    let meta = fs::metadata(project_root).map_err(|_| {
        CodexError::Precondition(format!(
            "target directory does not exist: {}",
            project_root.display()
        ))
    })?;
    if !meta.is_dir() {
        return Err(CodexError::Precondition(format!(
            "target path is not a directory: {}",
            project_root.display()
        )));
    }

    let layout = ProjectLayout::new(project_root);
    if layout.codex_dir().exists() {
        return Err(CodexError::Precondition(
            "CODEX already installed (.codex directory exists); use update instead".to_string(),
        ));
    }

    let probe = project_root.join(".codex-install-test");
    fs::write(&probe, b"test").at(&probe)?;
    fs::remove_file(&probe).at(&probe)?;
    Ok(())
}

/// Copy a template into a project that has no installation yet and record it
///
/// A partially copied tree is removed if the copy fails.
pub fn install(
    project_root: &Path,
    source: &dyn TemplateSource,
    package: &PackageInfo,
    options: &InstallOptions,
) -> Result<InstallReport> {
    validate_target(project_root)?;

    let layout = ProjectLayout::new(project_root);
    let codex_dir = layout.codex_dir();
    let files_copied =
        match source.materialize(&codex_dir, &template_exclude(options.include_test_harness)) {
            Ok(count) => count,
            Err(e) => {
                if let Err(cleanup) = remove_tree(&codex_dir) {
                    warn!("Failed to remove partial installation: {cleanup}");
                }
                return Err(e);
            }
        };
    info!("Installed {files_copied} template files");

    let mut warnings = Vec::new();
    let ide_command = match write_ide_command(&layout, source, false) {
        Ok(path) => path,
        Err(e) => {
            warn!("Editor command setup failed: {e}");
            warnings.push(format!("Editor command setup failed (non-critical): {e}"));
            None
        }
    };

    let manifest = ManifestStore::new(project_root).create(&ManifestOptions {
        codex_version: package.version.clone(),
        schema_version: package.schema_version.unwrap_or(1),
        default_workflow: options.default_workflow.clone(),
        test_harness_included: options.include_test_harness,
        ide_setup: options.ide_setup.clone(),
    })?;

    Ok(InstallReport {
        files_copied,
        manifest,
        ide_command,
        warnings,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseType {
    Major,
    Minor,
    Patch,
    Prerelease,
}

impl ReleaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::Prerelease => "prerelease",
        }
    }

    fn between(from: &Version, to: &Version) -> Self {
        if from.major != to.major {
            Self::Major
        } else if from.minor != to.minor {
            Self::Minor
        } else if from.patch != to.patch {
            Self::Patch
        } else {
            Self::Prerelease
        }
    }
}

/// Result of asking the registry for a newer release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheck {
    pub update_available: bool,
    pub current_version: String,
    pub latest_version: Option<String>,
    pub release_type: Option<ReleaseType>,
    /// Set when no reliable answer was available
    pub error: Option<String>,
}

/// Compare the installed version with the registry's `latest`
///
/// Never fails: lookup and version problems are reported in `error`.
pub fn check_for_updates(
    current_version: &str,
    registry: &dyn PackageRegistry,
    package_name: &str,
) -> UpdateCheck {
    let mut check = UpdateCheck {
        update_available: false,
        current_version: current_version.to_string(),
        latest_version: None,
        release_type: None,
        error: None,
    };

    let latest = match registry.fetch_package_info(package_name, "latest") {
        Ok(info) => info.version,
        Err(e) => {
            check.error = Some(e.to_string());
            return check;
        }
    };
    check.latest_version = Some(latest.clone());

    let Some(current) = parse_version(current_version) else {
        check.error = Some("invalid current version format".to_string());
        return check;
    };
    let Some(newest) = parse_version(&latest) else {
        check.error = Some("invalid latest version format".to_string());
        return check;
    };

    if newest > current {
        check.update_available = true;
        check.release_type = Some(ReleaseType::between(&current, &newest));
    }
    check
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticRegistry;
    use crate::source::DirectorySource;

    fn package(root: &Path) -> DirectorySource {
        fs::create_dir_all(root.join(".codex/agents")).unwrap();
        fs::create_dir_all(root.join(".codex/test-harness")).unwrap();
        fs::write(root.join(".codex/agents/dev.md"), "# Dev").unwrap();
        fs::write(root.join(".codex/test-harness/suite.md"), "suite").unwrap();
        DirectorySource::new(root)
    }

    fn info(version: &str) -> PackageInfo {
        PackageInfo {
            version: version.into(),
            schema_version: Some(1),
        }
    }

    #[test]
    fn test_install_excludes_test_harness_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let source = package(&dir.path().join("pkg"));
        let project = dir.path().join("project");
        fs::create_dir_all(&project).unwrap();

        let report = install(&project, &source, &info("0.1.0"), &InstallOptions::default()).unwrap();
        assert_eq!(report.files_copied, 1);
        assert_eq!(report.manifest.codex_version, "0.1.0");
        assert!(!report.manifest.test_harness_included);
        assert!(!project.join(".codex/test-harness").exists());
        assert!(!project.join(".codex-install-test").exists());
        assert!(ManifestStore::new(&project).verify().valid);
        assert!(report.ide_command.is_none());
        assert!(!project.join(".claude").exists());
    }

    #[test]
    fn test_install_writes_ide_command() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("pkg");
        let source = package(&pkg);
        fs::create_dir_all(pkg.join(".claude/commands")).unwrap();
        fs::write(pkg.join(".claude/commands/codex.md"), "# /codex v1").unwrap();
        let project = dir.path().join("project");
        fs::create_dir_all(&project).unwrap();

        let report = install(&project, &source, &info("0.1.0"), &InstallOptions::default()).unwrap();
        let command = project.join(".claude/commands/codex.md");
        assert_eq!(report.ide_command.as_deref(), Some(command.as_path()));
        assert_eq!(fs::read_to_string(&command).unwrap(), "# /codex v1");
        assert!(report.warnings.is_empty());
        // Lives outside the template tree, so it is not tracked
        assert!(!report.manifest.contains(".claude/commands/codex.md"));
    }

    #[test]
    fn test_install_keeps_existing_ide_command() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("pkg");
        let source = package(&pkg);
        fs::create_dir_all(pkg.join(".claude/commands")).unwrap();
        fs::write(pkg.join(".claude/commands/codex.md"), "# /codex v1").unwrap();
        let project = dir.path().join("project");
        fs::create_dir_all(project.join(".claude/commands")).unwrap();
        fs::write(project.join(".claude/commands/codex.md"), "# mine").unwrap();

        let report = install(&project, &source, &info("0.1.0"), &InstallOptions::default()).unwrap();
        assert!(report.ide_command.is_none());
        assert_eq!(
            fs::read_to_string(project.join(".claude/commands/codex.md")).unwrap(),
            "# mine"
        );
    }

    /// Reading the command file fails after the tree was copied
    struct UnreadableCommand(DirectorySource);

    impl TemplateSource for UnreadableCommand {
        fn materialize(&self, dest: &Path, exclude: &ExcludeMatcher) -> Result<usize> {
            self.0.materialize(dest, exclude)
        }

        fn ide_command(&self) -> Result<Option<Vec<u8>>> {
            Err(CodexError::io_message("codex.md", "unreadable"))
        }
    }

    #[test]
    fn test_install_survives_ide_command_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = UnreadableCommand(package(&dir.path().join("pkg")));
        let project = dir.path().join("project");
        fs::create_dir_all(&project).unwrap();

        let report = install(&project, &source, &info("0.1.0"), &InstallOptions::default()).unwrap();
        assert!(report.ide_command.is_none());
        assert_eq!(report.warnings.len(), 1);
        assert!(project.join(".codex/install-manifest.yaml").is_file());
    }

    #[test]
    fn test_install_with_test_harness() {
        let dir = tempfile::tempdir().unwrap();
        let source = package(&dir.path().join("pkg"));
        let project = dir.path().join("project");
        fs::create_dir_all(&project).unwrap();

        let options = InstallOptions {
            include_test_harness: true,
            ..InstallOptions::default()
        };
        let report = install(&project, &source, &info("0.1.0"), &options).unwrap();
        assert_eq!(report.files_copied, 2);
        assert!(report.manifest.contains(".codex/test-harness/suite.md"));
    }

    #[test]
    fn test_install_refuses_existing_installation() {
        let dir = tempfile::tempdir().unwrap();
        let source = package(&dir.path().join("pkg"));
        let project = dir.path().join("project");
        fs::create_dir_all(project.join(".codex")).unwrap();

        let err = install(&project, &source, &info("0.1.0"), &InstallOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "precondition");
    }

    #[test]
    fn test_install_requires_target_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = package(&dir.path().join("pkg"));
        let err = install(&dir.path().join("missing"), &source, &info("0.1.0"), &InstallOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), "precondition");
    }

    #[test]
    fn test_check_for_updates() {
        let registry = StaticRegistry::single(info("1.3.0"));
        let check = check_for_updates("1.2.5", &registry, "create-codex-project");
        assert!(check.update_available);
        assert_eq!(check.latest_version.as_deref(), Some("1.3.0"));
        assert_eq!(check.release_type, Some(ReleaseType::Minor));

        let current = check_for_updates("1.3.0", &registry, "create-codex-project");
        assert!(!current.update_available);
        assert!(current.error.is_none());

        let invalid = check_for_updates("not-a-version", &registry, "create-codex-project");
        assert!(!invalid.update_available);
        assert!(invalid.error.is_some());
    }

    #[test]
    fn test_check_for_updates_soft_fails_offline() {
        let check = check_for_updates("1.0.0", &StaticRegistry::new(), "create-codex-project");
        assert!(!check.update_available);
        assert!(check.latest_version.is_none());
        assert!(check.error.is_some());
    }
}
