mod app;
mod blob;
mod bloom;
mod bounds;
mod canvas;
mod color;
mod config;
mod field;
mod input;
mod lamp;
mod lighting;
mod math;
mod particles;
mod population;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use std::{fs::File, path::Path, sync::Mutex};
use tracing_subscriber::EnvFilter;

/// Logs go to a file or nowhere; stdout belongs to the lamp.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("opening log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("installing log subscriber: {err}"))
}

fn main() -> Result<()> {
    let args = config::Args::parse();
    if let Some(path) = &args.log {
        init_logging(path)?;
    }
    app::run(args)
}
