use std::fmt::Display;

use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    println!("{text}");
    Ok(())
}

pub fn print_success(msg: impl Display) {
    println!("{} {msg}", "✓".green().bold());
}

/// Errors go to stderr so `--json` output stays parseable.
pub fn print_error(msg: impl Display) {
    eprintln!("{} {msg}", "✗".red().bold());
}
