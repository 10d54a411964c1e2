mod actor;
mod anim;
mod app;
mod config;
mod feeding;
mod game;
mod input;
mod model;
mod render;
mod selector;
mod stats;
mod timer;
mod waste;

use anyhow::{Context, Result};
use clap::Parser;
use std::{fs::File, path::Path, sync::Mutex};
use tracing_subscriber::EnvFilter;

/// A tiny emoji pet that lives in your terminal.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// fixed RNG seed for a reproducible session (0 = clock)
    #[arg(long)]
    seed: Option<u64>,

    /// frame rate cap
    #[arg(long)]
    fps: Option<u32>,

    /// monochrome output
    #[arg(long)]
    no_color: bool,

    /// ASCII stand-ins instead of emoji
    #[arg(long)]
    ascii: bool,
}

fn init_tracing(log_path: &Path) -> Result<()> {
    let file = File::create(log_path)
        .with_context(|| format!("could not open log file {}", log_path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .compact()
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let paths = config::project_paths()?;
    init_tracing(&paths.log_path)?;

    app::run(
        paths,
        app::Overrides {
            seed: args.seed,
            fps: args.fps,
            no_color: args.no_color,
            ascii: args.ascii,
        },
    )
}
