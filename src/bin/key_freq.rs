use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use colored::*;
use log::info;

use osmtools::histogram::{key_frequencies, IgnoreKeys, SEPARATOR};

/// Aggregates a key/value tag histogram into per-key totals, skipping
/// ignored keys, sorted by descending count
#[derive(Debug, Parser)]
#[clap(about, version, author)]
struct Args {
    /// Verbose mode (-v, -vv, -vvv, etc.)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Tag histogram produced by `sort | uniq -c`
    input: PathBuf,

    /// C source file listing the keys to ignore
    #[clap(long, default_value = "osm_tags.cc")]
    ignore_keys: PathBuf,
}

fn run(args: Args) -> anyhow::Result<()> {
    let ignore_file = File::open(&args.ignore_keys)
        .with_context(|| format!("failed to open {}", args.ignore_keys.display()))?;
    let ignore = IgnoreKeys::from_reader(BufReader::new(ignore_file))?;
    info!("ignoring {} keys", ignore.len());

    let input = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    for (count, key) in key_frequencies(BufReader::new(input), &ignore)? {
        println!("{}{}{}", count, SEPARATOR, key);
    }
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
