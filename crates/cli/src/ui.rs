//! UI helpers for the Stratus CLI.
//!
//! Provides consistent formatting for console output.

use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", "═".repeat(60).bright_black());
    println!("{}", title.cyan().bold());
    println!("{}", "═".repeat(60).bright_black());
    println!();
}

/// Print a step indicator with message.
pub fn print_step(message: &str) {
    println!("{} {}", "▶".cyan(), message.bold());
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("{} {}", "✗".red().bold(), message.red());
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a key/value detail line.
pub fn print_detail(key: &str, value: &str) {
    println!("  {} {value}", format!("{key}:").bright_black());
}

/// Start a spinner around a long external run. Callers finish it with
/// [`finish_spinner`].
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner());
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Stop a spinner, leaving its final message in place.
pub fn finish_spinner(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(message.to_string());
}

/// Render a status word with lifecycle-appropriate color.
#[must_use]
pub fn colored_status(status: &str) -> String {
    match status {
        "deployed" | "installed" | "updated" => status.green().to_string(),
        s if s.starts_with("failed") => s.red().to_string(),
        "cancelled" | "destroyed" | "uninstalled" => status.yellow().to_string(),
        other => other.cyan().to_string(),
    }
}

/// Mask parameter values whose key looks secret-bearing.
#[must_use]
pub fn masked_param(key: &str, value: &str) -> String {
    let lowered = key.to_lowercase();
    if ["password", "secret", "token", "key"]
        .iter()
        .any(|s| lowered.contains(s))
    {
        "********".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masking() {
        assert_eq!(masked_param("admin_password", "hunter2"), "********");
        assert_eq!(masked_param("api_token", "tok"), "********");
        assert_eq!(masked_param("secret_access_key", "x"), "********");
        assert_eq!(masked_param("domain", "example.org"), "example.org");
    }
}
