use std::{fs::File, path::Path, sync::Arc};

use anyhow::Context;
use app::App;
use clap::Parser;
use config::Cli;
use tracing::info;
use tracing_subscriber::EnvFilter;
use twenty48::Session;

pub mod app;
pub mod board;
pub mod config;
pub mod history;
pub mod popup;

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let log_file =
        File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;
    info!(dim = %cli.dim, seed = ?cli.seed, "starting");

    let session = match cli.seed {
        Some(seed) => Session::new(cli.dim, seed),
        None => Session::from_entropy(cli.dim),
    };
    let terminal = ratatui::init();
    let result = App::new(session, cli.settings()).run(terminal);
    ratatui::restore();
    result.context("terminal error")
}
