use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use colored::*;
use log::info;

use osmtools::chunking::{ChunkSizes, Dataset, Optimizer};

/// Tunes the chunk size table of chunked storage files against a measured
/// size histogram, minimizing the total slack (allocated minus used bytes)
#[derive(Debug, Parser)]
#[clap(about, version, author)]
struct Args {
    /// Verbose mode (-v, -vv, -vvv, etc.)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Size histogram with tab-separated `size count` lines
    input: PathBuf,

    /// Maximum number of search iterations
    #[clap(long, default_value_t = 10_000_000)]
    max_iterations: u64,

    /// Report progress every N iterations
    #[clap(long, default_value_t = 1000)]
    report_every: u64,
}

fn run(args: Args) -> anyhow::Result<()> {
    let file = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let dataset = Dataset::from_reader(BufReader::new(file))?;
    info!("loaded {} size classes", dataset.len());

    let mut optimizer = Optimizer::new(dataset, ChunkSizes::seed());
    let outcome = optimizer.run(args.max_iterations, args.report_every, |progress| {
        println!("{}", progress);
    })?;
    info!(
        "finished after {} iterations: {:?}",
        optimizer.iteration(),
        outcome
    );
    Ok(())
}

fn main() {
    let args = Args::parse();
    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_module_path(false)
        .init();

    if let Err(e) = run(args) {
        eprintln!("{}: {:#}", "Error".red(), e);
        std::process::exit(1);
    }
}
