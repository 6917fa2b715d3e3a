//! Terminal styling utilities for stage output

use console::{measure_text_width, pad_str, style, Alignment, Emoji};
use std::path::Path;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static DATABASE: Emoji<'_, '_> = Emoji("🗄️  ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static MODEL: Emoji<'_, '_> = Emoji("🌲 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[x] ");

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("churnflow").cyan().bold(),
        style(format!("v{}", version)).dim()
    );
    println!(
        "    {}",
        style("Extract · Train · Predict customer churn").dim()
    );
    println!("    {}", style("━".repeat(50)).dim());
}

/// Print a configuration card: one `(label, value)` line per setting
pub fn print_config(title: &str, entries: &[(Emoji<'_, '_>, &str, String)]) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);

    println!("    ┌{}┐", line);
    let title = style(format!("⚙️  {}", title)).cyan().bold().to_string();
    println!(
        "    │ {}│",
        pad_str(&title, box_width - 3, Alignment::Left, None)
    );
    println!("    ├{}┤", line);
    for (icon, label, value) in entries {
        println!(
            "    │ {}│",
            config_entry(&icon.to_string(), label, value, box_width - 3)
        );
    }
    println!("    └{}┘", line);
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("    {} {}", WARN, style(message).yellow());
}

/// Print a failure message; errors go to stdout alongside the rest of the run log
pub fn print_failure(message: &str) {
    println!();
    println!("    {} {}", CROSS, style(message).red().bold());
}

/// Print a numbered troubleshooting list
pub fn print_hints(hints: &[&str]) {
    println!();
    println!("    {}", style("Troubleshooting:").yellow().bold());
    for (i, hint) in hints.iter().enumerate() {
        println!("      {}. {}", i + 1, hint);
    }
}

/// Print the final completion message
pub fn print_completion(stage: &str) {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style(format!("{} complete!", stage)).green().bold()
    );
    println!();
}

pub fn display_path(path: &Path) -> String {
    path.display().to_string()
}

/// One config card row padded to `width` terminal columns
fn config_entry(icon: &str, label: &str, value: &str, width: usize) -> String {
    let prefix = format!(" {}{:<8} ", icon, label);
    let room = width.saturating_sub(measure_text_width(&prefix)).max(4);
    let row = format!("{}{}", prefix, truncate_string(value, room));
    pad_str(&row, width, Alignment::Left, None).into_owned()
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}
