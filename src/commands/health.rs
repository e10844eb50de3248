use anyhow::Result;
use clap::ArgMatches;
use colored::*;

use super::stats::{interval_arg, poll};
use super::Output;
use crate::core::{Engine, HealthSnapshot, StatCategory};

pub fn execute(engine: &Engine, matches: &ArgMatches, out: Output) -> Result<()> {
    let count = matches.get_one::<usize>("count").copied().unwrap_or(0);

    if matches.get_flag("reset") {
        let response = engine.reset_monitor_health();
        if count == 0 {
            return out.respond(response);
        }
        log::info!("{}", response.message);
    }

    // Poll every category on this engine before reading the counters
    poll(engine, &StatCategory::ALL, interval_arg(matches), count, |_, _| Ok(()))?;

    let snapshot = engine.get_monitor_health();
    out.emit(&snapshot, print_health)
}

fn print_health(snapshot: &HealthSnapshot) {
    let overall = if snapshot.overall_healthy {
        "healthy".green().bold()
    } else {
        "degraded".red().bold()
    };
    println!("\nMonitor health: {}", overall);
    println!("{}", "─".repeat(40));

    for (category, health) in &snapshot.categories {
        let flag = if health.healthy { "ok".green() } else { "failing".red() };
        println!(
            "  {:<10} {:<8} {} errors",
            category.as_str(),
            flag,
            health.error_count
        );
    }
    println!(
        "\n{}",
        format!("Checked {}", snapshot.last_check.format("%Y-%m-%d %H:%M:%S UTC")).dimmed()
    );
}
