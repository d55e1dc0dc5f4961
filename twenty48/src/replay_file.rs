//! Saving and loading recorded games.
//!
//! A replay file is a RON document holding the board size and every state of
//! the undo stack from the automatic first spawn up to the latest move.

use std::{fs, path::Path};

use itertools::Itertools;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use twenty48_types::Dim;

use crate::{
    error::{Error, Result},
    history::MovesHistory,
    stack::StateStack,
    state::GameState,
};

/// Folder replays are saved to unless told otherwise.
pub const REPLAYS_FOLDER: &str = "replays";
/// Extension of replay files, without the dot.
pub const REPLAY_EXTENSION: &str = "sav";

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SavedReplay {
    version: u32,
    dim: Dim,
    didundo: bool,
    states: Vec<GameState>,
}

impl SavedReplay {
    fn from_history(history: &MovesHistory) -> Result<Self> {
        let states = history.undo_stack().as_bottom_up().to_vec();
        let dim = states
            .last()
            .map(|gs| gs.board().dim())
            .ok_or_else(|| Error::invalid_argument("nothing recorded to save"))?;
        Ok(Self {
            version: FORMAT_VERSION,
            dim,
            didundo: history.didundo(),
            states,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(Error::corrupt(format!(
                "unknown format version {}",
                self.version
            )));
        }
        if self.states.is_empty() {
            return Err(Error::corrupt("no recorded states"));
        }
        for (idx, gs) in self.states.iter().enumerate() {
            if gs.board().dim() != self.dim {
                return Err(Error::corrupt(format!(
                    "state {idx} is {} on a {} replay",
                    gs.board().dim(),
                    self.dim
                )));
            }
            gs.board()
                .validate()
                .map_err(|err| Error::corrupt(format!("state {idx}: {}", err.kind())))?;
        }
        if let Some((idx, _)) = self
            .states
            .iter()
            .tuple_windows()
            .find_position(|(a, b)| b.score() < a.score())
        {
            return Err(Error::corrupt(format!("score drops after state {idx}")));
        }
        Ok(())
    }
}

impl MovesHistory {
    /// Writes the recorded game to `path`, creating its folder if needed.
    ///
    /// # Errors
    /// `InvalidArgument` with nothing recorded, `Io` or `Format` if writing
    /// fails.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let saved = SavedReplay::from_history(self)?;
        let text = ron::ser::to_string_pretty(&saved, PrettyConfig::new())?;
        if let Some(folder) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(folder)?;
        }
        fs::write(path, text)?;
        info!(states = saved.states.len(), "replay saved");
        Ok(())
    }

    /// Reads a recorded game into a new history.
    ///
    /// The returned history replaces the caller's one wholesale; on failure
    /// nothing the caller owns has been touched.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `Format` if it is not a replay,
    /// `CorruptReplay` if it does not describe a playable game.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<MovesHistory> {
        let text = fs::read_to_string(path.as_ref())?;
        let saved: SavedReplay = ron::from_str(&text)?;
        saved.validate()?;
        info!(states = saved.states.len(), dim = %saved.dim, "replay loaded");
        Ok(MovesHistory::from_parts(
            StateStack::from_bottom_up(saved.states),
            saved.didundo,
        ))
    }
}
