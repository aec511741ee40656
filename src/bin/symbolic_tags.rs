use std::io::{self, BufWriter};

use clap::Parser;
use colored::*;
use log::info;

use osmtools::symbolic::{collect_entries, write_symbolic_tags, DEFAULT_LIMIT};

/// Emits C string-table source for the most frequent key/value tags,
/// read as `count§key§value` lines from stdin
#[derive(Debug, Parser)]
#[clap(about, version, author)]
struct Args {
    /// Verbose mode (-v, -vv, -vvv, etc.)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of table slots to fill
    #[clap(long, default_value_t = DEFAULT_LIMIT)]
    limit: usize,
}

fn run(args: Args) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let entries = collect_entries(stdin.lock(), args.limit)?;
    info!("emitting {} symbolic tags", entries.len());

    let stdout = io::stdout();
    write_symbolic_tags(&entries, BufWriter::new(stdout.lock()))?;
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
