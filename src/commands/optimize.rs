use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::*;

use super::Output;
use crate::core::optimization::{catalog, OptimizationGroup, RiskLevel};
use crate::core::Engine;

pub fn execute(engine: &Engine, matches: &ArgMatches, out: Output) -> Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => {
            let groups = engine.get_available_optimizations();
            out.emit(&groups, |groups| print_groups(groups))
        }
        Some(("apply", sub_matches)) => {
            let id = id_arg(sub_matches)?;
            if catalog::builtin().iter().any(|o| o.id == id && o.is_process_scoped()) {
                log::warn!("'{}' lasts only while this rigtune process runs", id);
            }
            out.respond(engine.apply_optimization(id))
        }
        Some(("revert", sub_matches)) => {
            out.respond(engine.revert_optimization(id_arg(sub_matches)?))
        }
        _ => {
            println!("Use 'rigtune opt --help' for more information.");
            Ok(())
        }
    }
}

fn id_arg(matches: &ArgMatches) -> Result<&str> {
    matches
        .get_one::<String>("id")
        .map(String::as_str)
        .context("Optimization id is required")
}

fn print_groups(groups: &[OptimizationGroup]) {
    if groups.is_empty() {
        println!("{}", "No optimizations are available on this platform".yellow());
        return;
    }

    for group in groups {
        println!("\n{}", group.name.to_uppercase().bold().bright_cyan());
        println!("{}", "─".repeat(70));

        for item in &group.items {
            let state = if item.applied {
                "[applied]".green()
            } else {
                "[       ]".dimmed()
            };
            let risk = match item.risk_level {
                RiskLevel::Low => item.risk_level.to_string().green(),
                RiskLevel::Medium => item.risk_level.to_string().yellow(),
                RiskLevel::High => item.risk_level.to_string().red(),
            };

            let mut flags = Vec::new();
            if item.requires_admin {
                flags.push("admin");
            }
            if !item.is_reversible {
                flags.push("one-shot");
            }
            if item.needs_restart {
                flags.push("restart");
            }

            println!("  {} {} {}", state, item.name.bold(), format!("({})", item.id).dimmed());
            println!("            {}", item.description);
            if flags.is_empty() {
                println!("            risk: {}", risk);
            } else {
                println!("            risk: {}  {}", risk, flags.join(", ").dimmed());
            }
        }
    }
}
