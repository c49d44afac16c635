//! Scratch projects and template packages for integration tests

use super::cli::CodexCommand;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const CONFIG_PATH: &str = ".codex/config/codex-config.yaml";
pub const COMMAND_PATH: &str = ".claude/commands/codex.md";

/// A template package as it would be published
pub struct TemplatePackage {
    pub version: &'static str,
    pub schema: u32,
    pub agent: &'static str,
    pub config: &'static str,
    pub command: &'static str,
}

impl TemplatePackage {
    pub fn write(&self, root: &Path) {
        let codex = root.join(".codex");
        fs::create_dir_all(codex.join("agents")).unwrap();
        fs::create_dir_all(codex.join("config")).unwrap();
        fs::create_dir_all(codex.join("test-harness")).unwrap();
        fs::write(codex.join("agents/dev.md"), self.agent).unwrap();
        fs::write(codex.join("config/codex-config.yaml"), self.config).unwrap();
        fs::write(codex.join("test-harness/suite.md"), "# Suite").unwrap();
        fs::create_dir_all(root.join(".claude/commands")).unwrap();
        fs::write(root.join(COMMAND_PATH), self.command).unwrap();
        fs::write(
            root.join("package.json"),
            format!(
                r#"{{"name":"create-codex-project","version":"{}","codex":{{"schemaVersion":{}}}}}"#,
                self.version, self.schema
            ),
        )
        .unwrap();
    }
}

pub const V1: TemplatePackage = TemplatePackage {
    version: "0.1.0",
    schema: 1,
    agent: "# Dev agent v1\n",
    config: "project_name: demo\nlog_level: info\n",
    command: "# /codex v1\n",
};

pub const V2: TemplatePackage = TemplatePackage {
    version: "0.2.0",
    schema: 1,
    agent: "# Dev agent v2\n",
    config: "project_name: demo\nlog_level: debug\n",
    command: "# /codex v2\n",
};

pub const V3_SCHEMA_2: TemplatePackage = TemplatePackage {
    version: "1.0.0",
    schema: 2,
    agent: "# Dev agent v3\n",
    config: "project_name: demo\nlog_level: debug\nmode: strict\n",
    command: "# /codex v3\n",
};

/// An empty project directory next to three template packages, with the user
/// config pointed at a scratch location
pub struct TestProject {
    temp: TempDir,
    pub root: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("project");
        fs::create_dir_all(&root).unwrap();
        V1.write(&temp.path().join("pkg-v1"));
        V2.write(&temp.path().join("pkg-v2"));
        V3_SCHEMA_2.write(&temp.path().join("pkg-v3"));
        Self { temp, root }
    }

    pub fn package(&self, name: &str) -> String {
        self.temp.path().join(name).display().to_string()
    }

    pub fn config_file(&self) -> PathBuf {
        self.temp.path().join("user-config.toml")
    }

    pub fn codex(&self, args: &[&str]) -> CodexCommand {
        let mut cmd = CodexCommand::new(&self.root);
        cmd.args(args)
            .env("CODEX_CONFIG", &self.config_file().display().to_string());
        cmd
    }

    /// Project with v0.1.0 installed
    pub fn installed() -> Self {
        let project = Self::new();
        let pkg = project.package("pkg-v1");
        project
            .codex(&["install", "--template", &pkg])
            .assert_success()
            .unwrap();
        project
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    /// Names of the backup directories in the project root
    pub fn backups(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.root)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|n| n.starts_with(".codex-backup-"))
            .collect();
        names.sort();
        names
    }
}
