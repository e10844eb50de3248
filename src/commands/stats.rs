use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::ArgMatches;

use super::Output;
use crate::core::{Engine, StatCategory, StatSample};
use crate::ui::print_sample;

pub fn execute(engine: &Engine, matches: &ArgMatches, out: Output) -> Result<()> {
    let categories = match matches.get_one::<String>("category").map(String::as_str) {
        None | Some("all") => StatCategory::ALL.to_vec(),
        Some(name) => vec![name.parse::<StatCategory>()?],
    };
    let count = matches.get_one::<usize>("count").copied().unwrap_or(1);

    poll(engine, &categories, interval_arg(matches), count, |_, samples| {
        if let [only] = samples {
            return out.emit(only, print_sample);
        }
        out.emit(&samples.to_vec(), |samples| samples.iter().for_each(print_sample))
    })
}

/// Sample `categories` `count` times on one engine, `interval` apart.
///
/// Rates and health counters only mean something across rounds: the first
/// round of a fresh engine always reports zero throughput.
pub fn poll<F>(
    engine: &Engine,
    categories: &[StatCategory],
    interval: Duration,
    count: usize,
    mut on_round: F,
) -> Result<()>
where
    F: FnMut(usize, &[StatSample]) -> Result<()>,
{
    for round in 0..count {
        if round > 0 {
            thread::sleep(interval);
        }
        let samples: Vec<StatSample> = categories
            .iter()
            .map(|&category| engine.get_stats(category))
            .collect();
        log::debug!("Polled {} categories (round {})", samples.len(), round + 1);
        on_round(round, &samples)?;
    }
    Ok(())
}

pub fn interval_arg(matches: &ArgMatches) -> Duration {
    Duration::from_millis(matches.get_one::<u64>("interval").copied().unwrap_or(1000))
}
