use colored::Colorize;

const LABEL_WIDTH: usize = 12;

/// Boxed title line used by `version`.
pub fn print_header(title: &str) {
    let rule = "─".repeat(title.chars().count() + 4);
    println!("  ┌{}┐", rule.dimmed());
    println!("  │  {}  │", title.bright_red().bold());
    println!("  └{}┘", rule.dimmed());
}

pub fn print_kv(label: &str, value: &str) {
    let label = format!("{:<width$}", label, width = LABEL_WIDTH);
    println!("  {} {}", label.dimmed(), value.bold());
}

pub fn print_dim(msg: &str) {
    println!("  {}", msg.dimmed());
}
