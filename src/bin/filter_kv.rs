use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use colored::*;
use log::info;

use osmtools::histogram::{filter_histogram, IgnoreKeys};

/// Filters a key/value tag histogram read from stdin, dropping entries
/// with ignored keys and emitting `count§key§value` lines
#[derive(Debug, Parser)]
#[clap(about, version, author)]
struct Args {
    /// Verbose mode (-v, -vv, -vvv, etc.)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// C source file listing the keys to ignore
    #[clap(long, default_value = "osm_tags.cc")]
    ignore_keys: PathBuf,
}

fn run(args: Args) -> anyhow::Result<()> {
    let ignore_file = File::open(&args.ignore_keys)
        .with_context(|| format!("failed to open {}", args.ignore_keys.display()))?;
    let ignore = IgnoreKeys::from_reader(BufReader::new(ignore_file))?;
    info!("ignoring {} keys", ignore.len());

    let stdin = io::stdin();
    let stdout = io::stdout();
    filter_histogram(stdin.lock(), &ignore, BufWriter::new(stdout.lock()))?;
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
