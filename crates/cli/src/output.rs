//! Output formatting utilities

use colored::Colorize;

/// Print a success message to stderr
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Highlight a fallback estimate for terminals
pub fn describe_fallback(estimate: u64) -> String {
    format!("fallback estimate {}", estimate.to_string().yellow())
}
