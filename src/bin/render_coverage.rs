use std::path::PathBuf;

use clap::Parser;
use colored::*;

use osmtools::quadtree::render_coverage_file;

/// Renders the tile files of an on-disk quad-tree into an SVG overview
/// image, coloring each tile outline by its depth
#[derive(Debug, Parser)]
#[clap(about, version, author)]
struct Args {
    /// Verbose mode (-v, -vv, -vvv, etc.)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Root tile file, e.g. `nodes/node`
    base: PathBuf,

    /// SVG file to write
    #[clap(default_value = "map.svg")]
    output: PathBuf,

    /// Deepest tree level to draw
    #[clap(long, default_value_t = 16)]
    max_depth: u32,

    /// Viewport pixels per degree
    #[clap(long, default_value_t = 10.0)]
    scale: f64,
}

fn run(args: Args) -> anyhow::Result<()> {
    render_coverage_file(&args.base, args.max_depth, args.scale, &args.output)?;
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
