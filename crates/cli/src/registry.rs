//! Package registry over HTTP

use anyhow::{Context, Result};
use codex_core::CodexError;
use codex_update::{PackageInfo, PackageRegistry};
use std::time::Duration;
use tracing::debug;

/// npm-style registry: `GET <base>/<package>/<version-or-tag>` returns the
/// package's `package.json`
pub struct HttpRegistry {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpRegistry {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("codex/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn package_url(&self, name: &str, version_or_tag: &str) -> String {
        // Scoped names keep their `@` but the separator must be escaped
        format!(
            "{}/{}/{}",
            self.base_url,
            name.replace('/', "%2f"),
            version_or_tag
        )
    }
}

impl PackageRegistry for HttpRegistry {
    fn fetch_package_info(
        &self,
        name: &str,
        version_or_tag: &str,
    ) -> codex_core::Result<PackageInfo> {
        let url = self.package_url(name, version_or_tag);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| CodexError::Network(format!("failed to reach {url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CodexError::Network(format!(
                "registry answered {status} for {name}@{version_or_tag}"
            )));
        }

        let body = response
            .text()
            .map_err(|e| CodexError::Network(format!("failed to read registry response: {e}")))?;
        PackageInfo::from_package_json(&body).map_err(|e| {
            CodexError::Network(format!(
                "invalid registry response for {name}@{version_or_tag}: {e}"
            ))
        })
    }
}
