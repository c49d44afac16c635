//! Line diffs of config files

use owo_colors::OwoColorize;
use similar::{ChangeTag, TextDiff};

/// Render a colored unified diff between two texts
///
/// Returns an empty string when they are identical.
pub fn generate_unified_diff(
    old_text: &str,
    new_text: &str,
    old_label: &str,
    new_label: &str,
    context_lines: usize,
) -> String {
    let diff = TextDiff::from_lines(old_text, new_text);
    let mut output = String::new();

    let mut unified = diff.unified_diff();
    unified.context_radius(context_lines);
    for (hunk_idx, hunk) in unified.iter_hunks().enumerate() {
        if hunk_idx == 0 {
            output.push_str(&format!("    {}\n", format!("--- {old_label}").red()));
            output.push_str(&format!("    {}\n", format!("+++ {new_label}").green()));
        } else {
            output.push('\n');
        }
        output.push_str(&format!("    {}\n", hunk.header().to_string().cyan()));

        for change in hunk.iter_changes() {
            let line = change.value();
            match change.tag() {
                ChangeTag::Delete => output.push_str(&format!("    {}", format!("-{line}").red())),
                ChangeTag::Insert => {
                    output.push_str(&format!("    {}", format!("+{line}").green()))
                }
                ChangeTag::Equal => {
                    output.push_str(&format!("    {}", format!(" {line}").dimmed()))
                }
            }
            if !line.ends_with('\n') {
                output.push('\n');
            }
        }
    }

    output
}
