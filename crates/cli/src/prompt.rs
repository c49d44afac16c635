//! Interactive confirmations on stdin

use codex_update::{CompatibilityResult, Confirm, SchemaOverrideConfirm, OVERRIDE_TOKEN};
use indicatif::ProgressBar;
use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};
use tracing::warn;

/// Read one line from stdin. `None` on end of input or read failure.
fn read_answer(question: &str) -> Option<String> {
    print!("{question}");
    if let Err(e) = io::stdout().flush() {
        warn!("Failed to flush prompt: {e}");
    }

    let mut input = String::new();
    match io::stdin().lock().read_line(&mut input) {
        Ok(0) => None,
        Ok(_) => Some(input.trim().to_string()),
        Err(e) => {
            warn!("Failed to read answer: {e}");
            None
        }
    }
}

/// Ask a yes/no question; anything but `y`/`yes` declines
pub fn ask_yes_no(question: &str) -> bool {
    read_answer(&format!("{question} [y/N]: "))
        .map(|answer| matches!(answer.to_lowercase().as_str(), "y" | "yes"))
        .unwrap_or(false)
}

/// Prompts shown with a running spinner suspended
pub struct ConsolePrompt {
    spinner: ProgressBar,
}

impl ConsolePrompt {
    pub fn new(spinner: ProgressBar) -> Self {
        Self { spinner }
    }
}

impl Confirm for ConsolePrompt {
    fn confirm_update(&self, result: &CompatibilityResult) -> bool {
        self.spinner.suspend(|| {
            println!();
            println!("{} {}", "!".yellow().bold(), result.message);
            ask_yes_no("Continue with the update?")
        })
    }
}

impl SchemaOverrideConfirm for ConsolePrompt {
    fn request_override(&self, result: &CompatibilityResult) -> Option<String> {
        self.spinner.suspend(|| {
            println!();
            println!("{}", "SCHEMA OVERRIDE".red().bold());
            println!("{}", result.message);
            println!(
                "{}",
                "Applying a template with a different schema can leave your project unusable."
                    .yellow()
            );
            println!("A backup is taken first unless --no-backup was given.");
            read_answer(&format!("Type '{OVERRIDE_TOKEN}' to continue: "))
        })
    }
}
