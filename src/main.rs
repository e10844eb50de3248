use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};

use rigtune::commands::{self, Output};
use rigtune::core::{Engine, EngineConfig};

fn pid_arg() -> Arg {
    Arg::new("pid")
        .help("Process ID")
        .required(true)
        .index(1)
        .value_parser(value_parser!(u32))
}

fn interval_arg() -> Arg {
    Arg::new("interval")
        .long("interval")
        .value_name("MS")
        .help("Milliseconds between samples")
        .value_parser(value_parser!(u64))
        .default_value("1000")
}

fn count_arg(default: &'static str) -> Arg {
    Arg::new("count")
        .long("count")
        .short('n')
        .value_name("N")
        .help("Number of samples to take")
        .value_parser(value_parser!(usize))
        .default_value(default)
}

fn build_cli() -> Command {
    Command::new("rigtune")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Process control, telemetry and system tuning for gaming rigs")
        .disable_version_flag(true)
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .help("Print machine-readable JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .global(true)
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("ps")
                .about("List processes")
                .arg(
                    Arg::new("search")
                        .short('s')
                        .long("search")
                        .value_name("QUERY")
                        .help("Match name (case-insensitive) or exact PID"),
                )
                .arg(
                    Arg::new("status")
                        .long("status")
                        .value_parser(["running", "sleeping", "suspended", "stopped"])
                        .help("Only processes in this state"),
                )
                .arg(
                    Arg::new("min-cpu")
                        .long("min-cpu")
                        .value_name("PERCENT")
                        .value_parser(value_parser!(f32))
                        .help("Minimum CPU usage"),
                )
                .arg(
                    Arg::new("min-mem")
                        .long("min-mem")
                        .value_name("MIB")
                        .value_parser(value_parser!(u64))
                        .help("Minimum working set in MiB"),
                )
                .arg(
                    Arg::new("sort")
                        .long("sort")
                        .value_parser(["name", "cpu", "memory", "pid"])
                        .help("Sort key (default: cpu)"),
                )
                .arg(
                    Arg::new("order")
                        .long("order")
                        .value_parser(["asc", "desc"])
                        .help("Sort direction (default: desc)"),
                )
                .arg(
                    Arg::new("page")
                        .long("page")
                        .value_parser(value_parser!(usize))
                        .help("Zero-based page index"),
                )
                .arg(
                    Arg::new("per-page")
                        .long("per-page")
                        .value_parser(value_parser!(usize))
                        .help("Processes per page"),
                ),
        )
        .subcommand(
            Command::new("proc")
                .about("Show one process and its children")
                .arg(pid_arg()),
        )
        .subcommand(Command::new("kill").about("Terminate a process").arg(pid_arg()))
        .subcommand(Command::new("suspend").about("Suspend a process").arg(pid_arg()))
        .subcommand(Command::new("resume").about("Resume a suspended process").arg(pid_arg()))
        .subcommand(
            Command::new("affinity")
                .about("Show or set the cores a process may run on")
                .arg(pid_arg())
                .arg(
                    Arg::new("set")
                        .long("set")
                        .value_name("CORES")
                        .help("Core list to apply, e.g. 0,2 or 0-3"),
                ),
        )
        .subcommand(Command::new("cores").about("Print the logical core count"))
        .subcommand(
            Command::new("boost")
                .about("Raise a process to high priority and pin it to performance cores")
                .arg(pid_arg()),
        )
        .subcommand(
            Command::new("opt")
                .about("List, apply or revert optimizations")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("list").about("List optimizations for this platform"))
                .subcommand(
                    Command::new("apply")
                        .about("Apply an optimization")
                        .arg(Arg::new("id").required(true).index(1)),
                )
                .subcommand(
                    Command::new("revert")
                        .about("Revert an optimization")
                        .arg(Arg::new("id").required(true).index(1)),
                ),
        )
        .subcommand(Command::new("platform").about("Show OS, version and architecture"))
        .subcommand(
            Command::new("stats")
                .about("Sample resource telemetry")
                .arg(
                    Arg::new("category")
                        .index(1)
                        .value_parser([
                            "cpu", "memory", "storage", "network", "gpu", "system", "all",
                        ])
                        .default_value("all"),
                )
                .arg(interval_arg())
                .arg(count_arg("1")),
        )
        .subcommand(
            Command::new("health")
                .about("Show sampling health per category")
                .arg(
                    Arg::new("reset")
                        .long("reset")
                        .help("Zero the error counters")
                        .action(ArgAction::SetTrue),
                )
                .arg(interval_arg())
                .arg(count_arg("0")),
        )
        .subcommand(
            Command::new("open")
                .about("Reveal a file or directory in the file manager")
                .arg(Arg::new("path").required(true).index(1)),
        )
        .subcommand(Command::new("version").about("Shows version information"))
}

fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    rigtune::init_logging(matches.get_flag("verbose"));
    let out = Output::new(matches.get_flag("json"));

    if let Some(("version", _)) = matches.subcommand() {
        return commands::version::execute();
    }

    let config = EngineConfig::load()?;
    let engine = Engine::new(config);

    match matches.subcommand() {
        Some(("ps", sub_matches)) => commands::processes::execute_list(&engine, sub_matches, out),
        Some(("proc", sub_matches)) => {
            commands::processes::execute_detail(&engine, sub_matches, out)
        }
        Some(("kill", sub_matches)) => commands::processes::execute_kill(&engine, sub_matches, out),
        Some(("suspend", sub_matches)) => {
            commands::processes::execute_suspend(&engine, sub_matches, out)
        }
        Some(("resume", sub_matches)) => {
            commands::processes::execute_resume(&engine, sub_matches, out)
        }
        Some(("affinity", sub_matches)) => {
            commands::processes::execute_affinity(&engine, sub_matches, out)
        }
        Some(("cores", _)) => commands::processes::execute_cores(&engine, out),
        Some(("boost", sub_matches)) => {
            commands::processes::execute_boost(&engine, sub_matches, out)
        }
        Some(("opt", sub_matches)) => commands::optimize::execute(&engine, sub_matches, out),
        Some(("platform", _)) => commands::platform::execute_info(&engine, out),
        Some(("stats", sub_matches)) => commands::stats::execute(&engine, sub_matches, out),
        Some(("health", sub_matches)) => commands::health::execute(&engine, sub_matches, out),
        Some(("open", sub_matches)) => commands::platform::execute_open(&engine, sub_matches, out),
        _ => {
            println!("Welcome to rigtune!");
            println!("Use 'rigtune --help' for more information.");
            Ok(())
        }
    }
}
