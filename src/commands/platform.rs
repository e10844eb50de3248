use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::*;

use super::Output;
use crate::core::Engine;
use crate::platform::{is_elevated, PlatformInfo};

pub fn execute_info(engine: &Engine, out: Output) -> Result<()> {
    let info = engine.get_current_platform();
    out.emit(&info, print_info)
}

fn print_info(info: &PlatformInfo) {
    println!("{:<10} {}", "OS:".bold(), info.os);
    println!("{:<10} {}", "Version:".bold(), info.version);
    println!("{:<10} {}", "Arch:".bold(), info.arch);
    let elevated = if is_elevated() { "yes".green() } else { "no".yellow() };
    println!("{:<10} {}", "Elevated:".bold(), elevated);
}

pub fn execute_open(engine: &Engine, matches: &ArgMatches, out: Output) -> Result<()> {
    let path = matches
        .get_one::<String>("path")
        .map(PathBuf::from)
        .context("Path argument is required")?;
    out.respond(engine.open_file_location(&path))
}
