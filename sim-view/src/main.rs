//! Application entry point for the space-colonization tree viewer.
//!
//! By default this opens an eframe/egui window and delegates all
//! interactive logic and rendering to [`Viewer`]. With `--headless` the
//! tree is fast-forwarded to its fully grown state and only the final
//! metrics are logged.

mod viewer;

use std::path::PathBuf;

use clap::Parser;
use sca_tree_core::{Config, Tree};
use tracing::info;
use tracing_subscriber::EnvFilter;
use viewer::Viewer;

#[derive(Parser, Debug)]
#[command(version, about = "Grow a 2D tree by space colonization")]
struct Args {
    /// TOML file overriding any subset of the growth parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for attraction point placement (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Grow to completion without opening a window
    #[arg(long)]
    headless: bool,

    /// Step limit for fast-forwarding
    #[arg(long, default_value_t = 100_000)]
    max_steps: usize,

    /// Log every simulation step
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose
    let default_filter = if args.verbose { "info,sca_tree_core=debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let mut cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if args.seed.is_some() {
        cfg.seed = args.seed;
    }

    if args.headless {
        return run_headless(cfg, args.max_steps);
    }

    let viewer = Viewer::new(cfg, args.max_steps)?;
    eframe::run_native(
        "2D SCA Tree",
        eframe::NativeOptions::default(),
        Box::new(|_cc| Ok(Box::new(viewer))),
    )?;
    Ok(())
}

/// Grows a tree to completion and logs its final shape.
fn run_headless(cfg: Config, max_steps: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut tree = Tree::new(cfg)?;
    let steps = tree.grow_to_completion(max_steps)?;
    let m = tree.metrics();
    let max_level = tree.branches().iter().map(|b| b.level).max().unwrap_or(1);

    info!(
        steps,
        branches = m.branches,
        segments = m.segments,
        attraction_points = m.attraction_points,
        max_level,
        seed = tree.seed(),
        "grown"
    );
    Ok(())
}
