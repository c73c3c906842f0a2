// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jobflow contributors

//! Terminal color utilities
//!
//! Provides consistent color schemes across the CLI.

use colored::{ColoredString, Colorize};

use crate::job::TaskStatus;

/// Style a task status
pub fn status(status: TaskStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        TaskStatus::Waiting => label.dimmed(),
        TaskStatus::Preparing => label.cyan(),
        TaskStatus::Running => label.blue().bold(),
        TaskStatus::Overdue => label.red().bold(),
        TaskStatus::Paused => label.yellow(),
        TaskStatus::Done => label.green(),
    }
}

/// Human readable duration, e.g. `3h 05m`
pub fn minutes(total: u64) -> String {
    let (hours, mins) = (total / 60, total % 60);
    if hours == 0 {
        format!("{}m", mins)
    } else {
        format!("{}h {:02}m", hours, mins)
    }
}

/// Countdown text for a running task
pub fn countdown(remaining: i64) -> ColoredString {
    if remaining < 0 {
        format!("{} late", minutes(remaining.unsigned_abs())).red()
    } else {
        format!("{} left", minutes(remaining as u64)).normal()
    }
}

/// Disable colors when NO_COLOR is set
pub fn apply_color_preference() {
    if std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }
}

/// Print a styled header
pub fn print_header(title: &str) {
    println!("{}", title.bold());
    println!("{}", "═".repeat(title.chars().count().max(40)));
}

/// Print a styled section
pub fn print_section(title: &str) {
    println!();
    println!("{}:", title.bold());
}

/// Print a success check
pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

/// Print an error cross
pub fn print_error(msg: &str) {
    println!("  {} {}", "✗".red(), msg);
}

/// Print a warning
pub fn print_warning(msg: &str) {
    println!("  {} {}", "⚠".yellow(), msg);
}

/// Print an info item
pub fn print_info(msg: &str) {
    println!("  {} {}", "→".blue(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_format() {
        assert_eq!(minutes(0), "0m");
        assert_eq!(minutes(45), "45m");
        assert_eq!(minutes(185), "3h 05m");
    }
}
