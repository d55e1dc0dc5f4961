use std::{path::PathBuf, time::Duration};

use clap::Parser;
use twenty48::{Dim, REPLAYS_FOLDER};

#[derive(Debug, Parser)]
#[command(
    name = "twenty48",
    version,
    about = "Slide tiles, merge equal ones, reach the winning tile"
)]
pub struct Cli {
    /// Board size: 4, 5, 6 or 8
    #[arg(long, default_value = "4", value_parser = parse_dim)]
    pub dim: Dim,

    /// Seed for tile spawning, random when absent
    #[arg(long)]
    pub seed: Option<u64>,

    /// Folder holding saved replays
    #[arg(long, default_value = REPLAYS_FOLDER)]
    pub replays_dir: PathBuf,

    /// Pause between autoplay frames, in milliseconds
    #[arg(long, default_value_t = 750)]
    pub delay_ms: u64,

    /// Where log output goes; the terminal belongs to the game
    #[arg(long, default_value = "twenty48.log")]
    pub log_file: PathBuf,
}

/// What the front-end needs from the command line once the game is running.
#[derive(Debug, Clone)]
pub struct Settings {
    pub replays_dir: PathBuf,
    pub replay_delay: Duration,
}

impl Cli {
    #[must_use]
    pub fn settings(&self) -> Settings {
        Settings {
            replays_dir: self.replays_dir.clone(),
            replay_delay: Duration::from_millis(self.delay_ms),
        }
    }
}

fn parse_dim(arg: &str) -> Result<Dim, String> {
    let size: u8 = arg.parse().map_err(|e| format!("{arg}: {e}"))?;
    Dim::try_from(size).map_err(|e| e.to_string())
}
