//! Config comparison and merge strategies

use codex_core::CodexError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How to reconcile a user's config with the one shipped by a new template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Restore the user's previous config
    Keep,
    /// Use the config shipped by the new template
    Replace,
    /// Change nothing and report the differences for manual review
    #[default]
    Merge,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Replace => "replace",
            Self::Merge => "merge",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = CodexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep" => Ok(Self::Keep),
            "replace" => Ok(Self::Replace),
            "merge" => Ok(Self::Merge),
            other => Err(CodexError::Precondition(format!(
                "unknown merge strategy '{other}' (expected keep, replace or merge)"
            ))),
        }
    }
}

/// What a merge actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeResolution {
    Kept,
    Replaced,
    /// Differences left for the user
    Manual,
    /// The two configs do not differ
    NoChange,
}

impl MergeResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kept => "keep",
            Self::Replaced => "replace",
            Self::Manual => "manual",
            Self::NoChange => "no-change",
        }
    }
}

/// One differing config line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
    /// 1-based line number
    pub line: usize,
    /// Key before `:` on the new line, or `line N`
    pub section: String,
    pub old_value: String,
    pub new_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    pub applied: bool,
    pub resolution: MergeResolution,
    pub changes: Vec<ConfigChange>,
    /// Content the config file must end up with; `None` leaves it untouched
    pub resolved: Option<String>,
}

fn is_ignorable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Compare two configs line by line
///
/// Lines are paired by position. A pair is skipped when either side is blank
/// or a comment.
pub fn detect_config_changes(old: &str, new: &str) -> Vec<ConfigChange> {
    let old_lines: Vec<&str> = old.split('\n').collect();
    let new_lines: Vec<&str> = new.split('\n').collect();
    let max = old_lines.len().max(new_lines.len());

    (0..max)
        .filter_map(|i| {
            let old_line = old_lines.get(i).copied().unwrap_or("");
            let new_line = new_lines.get(i).copied().unwrap_or("");
            if is_ignorable(old_line) || is_ignorable(new_line) || old_line == new_line {
                return None;
            }

            let key = new_line.split(':').next().unwrap_or("").trim();
            let section = if key.is_empty() {
                format!("line {}", i + 1)
            } else {
                key.to_string()
            };
            Some(ConfigChange {
                line: i + 1,
                section,
                old_value: old_line.trim().to_string(),
                new_value: new_line.trim().to_string(),
            })
        })
        .collect()
}

/// Decide how the user's `old` config and the template's `new` config combine
///
/// `keep` resolves to the old content and `replace` to the new one. `merge`
/// resolves to nothing and only reports the differences. Pure: the caller
/// writes `resolved` when present.
pub fn merge_config(old: &str, new: &str, strategy: MergeStrategy) -> MergeResult {
    let changes = detect_config_changes(old, new);
    if changes.is_empty() {
        return MergeResult {
            applied: false,
            resolution: MergeResolution::NoChange,
            changes,
            resolved: None,
        };
    }

    match strategy {
        MergeStrategy::Keep => MergeResult {
            applied: true,
            resolution: MergeResolution::Kept,
            changes,
            resolved: Some(old.to_string()),
        },
        MergeStrategy::Replace => MergeResult {
            applied: true,
            resolution: MergeResolution::Replaced,
            changes,
            resolved: Some(new.to_string()),
        },
        MergeStrategy::Merge => MergeResult {
            applied: false,
            resolution: MergeResolution::Manual,
            changes,
            resolved: None,
        },
    }
}
