use std::collections::BTreeSet;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::*;

use super::Output;
use crate::core::process::{CpuAffinityInfo, ProcessPage, ProcessSnapshot};
use crate::core::{Engine, ProcessFilter, SortKey, SortOrder};
use crate::platform::ProcessStatus;
use crate::ui::{format_bytes, format_duration, format_percent, truncate};

pub fn execute_list(engine: &Engine, matches: &ArgMatches, out: Output) -> Result<()> {
    let filter = filter_from_args(matches)?;
    let page = engine.list_processes(&filter)?;
    out.emit(&page, |page| print_page(page, &filter, engine.config().default_per_page))
}

fn filter_from_args(matches: &ArgMatches) -> Result<ProcessFilter> {
    let status = matches
        .get_one::<String>("status")
        .map(|s| s.parse::<ProcessStatus>())
        .transpose()
        .map_err(anyhow::Error::msg)?;
    let sort_by = matches
        .get_one::<String>("sort")
        .map(|s| s.parse::<SortKey>())
        .transpose()?;
    let sort_order = matches
        .get_one::<String>("order")
        .map(|s| s.parse::<SortOrder>())
        .transpose()?;

    Ok(ProcessFilter {
        search_query: matches.get_one::<String>("search").cloned(),
        status,
        min_cpu: matches.get_one::<f32>("min-cpu").copied(),
        min_memory: matches
            .get_one::<u64>("min-mem")
            .map(|mib| mib.saturating_mul(1024 * 1024)),
        sort_by,
        sort_order,
        page: matches.get_one::<usize>("page").copied().unwrap_or(0),
        per_page: matches.get_one::<usize>("per-page").copied(),
    })
}

fn print_page(page: &ProcessPage, filter: &ProcessFilter, default_per_page: usize) {
    println!(
        "{:>7}  {:<28} {:<10} {:>7}  {:>10}  {:>8}",
        "PID".bold(),
        "NAME".bold(),
        "STATUS".bold(),
        "CPU".bold(),
        "MEMORY".bold(),
        "UPTIME".bold()
    );
    println!("{}", "─".repeat(78));

    for p in &page.processes {
        let name = if p.affinity_set {
            format!("{} *", truncate(&p.name, 26))
        } else {
            truncate(&p.name, 28)
        };
        let status = match p.status {
            ProcessStatus::Running => p.status.to_string().green(),
            ProcessStatus::Suspended => p.status.to_string().yellow(),
            ProcessStatus::Stopped => p.status.to_string().red(),
            ProcessStatus::Sleeping => p.status.to_string().normal(),
        };
        println!(
            "{:>7}  {:<28} {:<10} {}  {:>10}  {:>8}",
            p.pid,
            name,
            status,
            format_percent(p.cpu_usage_percent),
            format_bytes(p.memory.working_set),
            format_duration(p.run_time_secs)
        );
    }

    let per_page = match filter.per_page {
        Some(n) if n > 0 => n,
        _ => default_per_page,
    };
    let pages = page.total_count.div_ceil(per_page.max(1));
    println!(
        "\n{}",
        format!(
            "{} matching processes, page {} of {}",
            page.total_count,
            filter.page + 1,
            pages.max(1)
        )
        .dimmed()
    );
}

pub fn execute_detail(engine: &Engine, matches: &ArgMatches, out: Output) -> Result<()> {
    let pid = pid_arg(matches)?;
    let snapshot = engine.process_detail(pid)?;
    out.emit(&snapshot, print_detail)
}

fn print_detail(p: &ProcessSnapshot) {
    println!("\n{} {}", p.name.bold().bright_cyan(), format!("(pid {})", p.pid).dimmed());
    println!("{}", "─".repeat(60));

    let parent = match (p.parent_pid, p.orphaned) {
        (Some(ppid), true) => format!("{} (exited)", ppid),
        (Some(ppid), false) => ppid.to_string(),
        (None, _) => "none".to_string(),
    };
    let path = if p.executable_path.is_empty() {
        "unavailable"
    } else {
        p.executable_path.as_str()
    };

    let rows = [
        ("Parent", parent),
        ("Path", path.to_string()),
        ("Status", p.status.to_string()),
        ("CPU", format!("{:.1}%", p.cpu_usage_percent)),
        ("Working set", format_bytes(p.memory.working_set)),
        ("Private", format_bytes(p.memory.private)),
        ("Virtual", format_bytes(p.memory.virtual_bytes)),
        ("Pagefile", format_bytes(p.memory.pagefile)),
        ("Threads", p.thread_count.to_string()),
        ("Handles", p.handle_count.to_string()),
        ("Session", p.session_id.to_string()),
        (
            "I/O read",
            format!("{} ({} ops)", format_bytes(p.io.read_bytes), p.io.read_ops),
        ),
        (
            "I/O write",
            format!("{} ({} ops)", format_bytes(p.io.write_bytes), p.io.write_ops),
        ),
        ("Running for", format_duration(p.run_time_secs)),
        ("Pinned", if p.affinity_set { "yes" } else { "no" }.to_string()),
    ];
    for (label, value) in rows {
        println!("  {:<14} {}", format!("{}:", label).bold(), value);
    }

    if !p.children.is_empty() {
        println!("\n  {}", "Children".bold());
        for child in &p.children {
            let marker = if child.is_suspended { " (suspended)" } else { "" };
            println!(
                "    {:>7}  {:<24} {:>6.1}%  {:>10}{}",
                child.pid,
                truncate(&child.name, 24),
                child.cpu_usage_percent,
                format_bytes(child.memory_bytes),
                marker.yellow()
            );
        }
    }
}

pub fn execute_kill(engine: &Engine, matches: &ArgMatches, out: Output) -> Result<()> {
    out.respond(engine.kill_process(pid_arg(matches)?))
}

pub fn execute_suspend(engine: &Engine, matches: &ArgMatches, out: Output) -> Result<()> {
    out.respond(engine.suspend_process(pid_arg(matches)?))
}

pub fn execute_resume(engine: &Engine, matches: &ArgMatches, out: Output) -> Result<()> {
    out.respond(engine.resume_process(pid_arg(matches)?))
}

pub fn execute_boost(engine: &Engine, matches: &ArgMatches, out: Output) -> Result<()> {
    out.respond(engine.boost_process_for_gaming(pid_arg(matches)?))
}

pub fn execute_affinity(engine: &Engine, matches: &ArgMatches, out: Output) -> Result<()> {
    let pid = pid_arg(matches)?;

    if let Some(list) = matches.get_one::<String>("set") {
        let cores = parse_core_list(list)?;
        return out.respond(engine.set_process_affinity(pid, &cores));
    }

    let info = engine.get_process_affinity(pid)?;
    out.emit(&info, |info| print_affinity(pid, info))
}

fn print_affinity(pid: u32, info: &CpuAffinityInfo) {
    let cores = info
        .current_mask
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",");
    println!(
        "Process {} may run on {} of {} cores: {}",
        pid,
        info.current_mask.len(),
        info.core_count,
        cores.bright_cyan()
    );
}

pub fn execute_cores(engine: &Engine, out: Output) -> Result<()> {
    let count = engine.get_cpu_core_count();
    out.emit(&count, |count| println!("{} logical cores", count))
}

fn pid_arg(matches: &ArgMatches) -> Result<u32> {
    matches
        .get_one::<u32>("pid")
        .copied()
        .context("PID argument is required")
}

/// Parse `0,2,4-7` into a set of core indices
pub fn parse_core_list(list: &str) -> Result<BTreeSet<usize>> {
    let mut cores = BTreeSet::new();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start: usize = start
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid core range '{}'", part))?;
                let end: usize = end
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid core range '{}'", part))?;
                cores.extend(start..=end);
            }
            None => {
                cores.insert(
                    part.parse()
                        .with_context(|| format!("Invalid core index '{}'", part))?,
                );
            }
        }
    }
    Ok(cores)
}
