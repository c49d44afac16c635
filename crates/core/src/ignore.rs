//! Exclude rules for tree walks
//!
//! Patterns are compiled once and then evaluated per path in order of
//! specificity:
//! 1. Exact match (`config/codex-config.yaml`)
//! 2. Glob match (`*` stays within one segment, `**` crosses segments, `?` is one char)
//! 3. Directory prefix (`test-harness` excludes `test-harness/...`)

use regex::Regex;

/// Compiled set of exclude patterns
#[derive(Debug, Clone, Default)]
pub struct ExcludeMatcher {
    exact: Vec<String>,
    globs: Vec<Regex>,
    /// Directory prefixes, each ending in `/`
    prefixes: Vec<String>,
}

impl ExcludeMatcher {
    /// Compile a list of patterns
    ///
    /// Backslashes are normalized to `/` and trailing slashes are dropped.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matcher = Self::default();
        for raw in patterns {
            let pattern = normalize(raw.as_ref());
            if pattern.is_empty() {
                continue;
            }
            if pattern.contains('*') || pattern.contains('?') {
                match compile_glob(&pattern) {
                    Some(re) => matcher.globs.push(re),
                    None => {
                        tracing::warn!("Unusable exclude pattern {:?}, matching it literally", pattern);
                        matcher.exact.push(pattern);
                    }
                }
            } else {
                matcher.prefixes.push(format!("{pattern}/"));
                matcher.exact.push(pattern);
            }
        }
        matcher
    }

    /// Matcher that excludes nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when no patterns were compiled
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.globs.is_empty()
    }

    /// Check a relative path against the compiled rules
    pub fn is_excluded(&self, relative_path: &str) -> bool {
        let path = normalize(relative_path);
        self.exact.iter().any(|p| *p == path)
            || self.globs.iter().any(|re| re.is_match(&path))
            || self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let path = path.strip_prefix("./").unwrap_or(&path);
    path.trim_end_matches('/').to_string()
}

fn compile_glob(pattern: &str) -> Option<Regex> {
    let mut re = String::with_capacity(pattern.len() * 2 + 2);
    re.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                re.push_str(".*");
            }
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).ok()
}
