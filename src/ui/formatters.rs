use colored::*;
use humansize::{format_size, BINARY};

use crate::core::stats::StatSample;

/// Format a byte count in binary units (KiB, MiB, GiB)
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, BINARY)
}

/// Format elapsed seconds as `1d 2h 3m`, dropping leading zero units
pub fn format_duration(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", secs)
    }
}

/// Percentage colored by load: green below 50, yellow below 80, red above
pub fn format_percent(percent: f32) -> ColoredString {
    let text = format!("{:>5.1}%", percent);
    if percent >= 80.0 {
        text.red()
    } else if percent >= 50.0 {
        text.yellow()
    } else {
        text.green()
    }
}

/// Fixed-width text bar for a 0-100 value
pub fn progress_bar(percent: f32, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f32).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

/// Cut `text` to `max` characters, marking the cut with `…`
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

pub fn print_sample(sample: &StatSample) {
    let heading = match sample.percentage {
        Some(p) => format!("{} {}", sample.category.title().to_uppercase(), format_percent(p)),
        None => sample.category.title().to_uppercase(),
    };
    println!("\n{}", heading.bold().bright_cyan());
    if sample.title != sample.category.title() {
        println!("  {}", sample.title.dimmed());
    }
    println!("{}", "─".repeat(60));

    for entry in &sample.progress {
        let mut line = format!(
            "  {:<18} {} {}",
            truncate(&entry.label, 18),
            progress_bar(entry.percentage, 20),
            format_percent(entry.percentage)
        );
        if let Some(t) = entry.temperature_celsius {
            line.push_str(&format!("  {:.0}°C", t));
        }
        if let Some(w) = entry.power_watts {
            line.push_str(&format!("  {:.1} W", w));
        }
        println!("{}", line);
    }

    for detail in &sample.details {
        println!("  {:<22} {}", format!("{}:", detail.label).bold(), detail.value);
    }
}
