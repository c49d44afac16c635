//! Package registry interface

use codex_core::{CodexError, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// Registry package that ships the template tree
pub const DEFAULT_PACKAGE: &str = "create-codex-project";

/// What the updater needs to know about a published version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub version: String,
    pub schema_version: Option<u32>,
}

/// The subset of a published `package.json` that carries [`PackageInfo`]
#[derive(Debug, Clone, Deserialize)]
pub struct PackageJson {
    pub version: String,
    #[serde(default)]
    pub codex: Option<CodexSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodexSection {
    #[serde(default)]
    pub schema_version: Option<u32>,
}

impl From<PackageJson> for PackageInfo {
    fn from(json: PackageJson) -> Self {
        Self {
            version: json.version,
            schema_version: json.codex.and_then(|c| c.schema_version),
        }
    }
}

impl PackageInfo {
    /// Parse a `package.json` document
    pub fn from_package_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str::<PackageJson>(content).map(Into::into)
    }
}

/// Looks up published versions of a package
///
/// `version_or_tag` is a concrete version or a dist-tag such as `latest`.
/// Any failure is reported as `CodexError::Network`.
pub trait PackageRegistry {
    fn fetch_package_info(&self, name: &str, version_or_tag: &str) -> Result<PackageInfo>;
}

/// In-memory registry
///
/// Serves a fixed set of releases; used for offline operation and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    releases: HashMap<String, PackageInfo>,
    tags: HashMap<String, String>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding a single release, also tagged `latest`
    pub fn single(info: PackageInfo) -> Self {
        let version = info.version.clone();
        Self::new().with_release(info).with_tag("latest", version)
    }

    pub fn with_release(mut self, info: PackageInfo) -> Self {
        self.releases.insert(info.version.clone(), info);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>, version: impl Into<String>) -> Self {
        self.tags.insert(tag.into(), version.into());
        self
    }
}

impl PackageRegistry for StaticRegistry {
    fn fetch_package_info(&self, name: &str, version_or_tag: &str) -> Result<PackageInfo> {
        let version = self
            .tags
            .get(version_or_tag)
            .map(String::as_str)
            .unwrap_or(version_or_tag);
        self.releases.get(version).cloned().ok_or_else(|| {
            CodexError::Network(format!("package {name}@{version_or_tag} not found in registry"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_json() {
        let info = PackageInfo::from_package_json(
            r#"{"name":"create-codex-project","version":"0.2.0","codex":{"schemaVersion":1}}"#,
        )
        .unwrap();
        assert_eq!(info.version, "0.2.0");
        assert_eq!(info.schema_version, Some(1));

        let bare = PackageInfo::from_package_json(r#"{"version":"0.2.0"}"#).unwrap();
        assert_eq!(bare.schema_version, None);
    }

    #[test]
    fn test_static_registry_resolves_tags() {
        let registry = StaticRegistry::single(PackageInfo {
            version: "0.2.0".into(),
            schema_version: Some(1),
        });
        assert_eq!(registry.fetch_package_info(DEFAULT_PACKAGE, "latest").unwrap().version, "0.2.0");
        assert_eq!(registry.fetch_package_info(DEFAULT_PACKAGE, "0.2.0").unwrap().version, "0.2.0");

        let err = registry.fetch_package_info(DEFAULT_PACKAGE, "9.9.9").unwrap_err();
        assert_eq!(err.kind(), "network");
    }
}
