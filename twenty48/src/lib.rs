#![warn(clippy::pedantic)]
#![allow(clippy::missing_panics_doc, clippy::module_name_repetitions)]
pub mod board;
pub mod error;
pub mod history;
pub mod replay_file;
pub mod session;
pub mod slide;
pub mod stack;
pub mod state;

pub use board::Board;
pub use error::{Error, ErrorKind, Refusal, Result};
pub use history::{MovesHistory, ReplayCursor, DEFAULT_REPLAY_DELAY};
pub use replay_file::{REPLAYS_FOLDER, REPLAY_EXTENSION};
pub use session::{PlayOutcome, ReplayStep, Session, UndoOutcome};
pub use state::{GameState, SlideOutcome};
pub use twenty48_types::{Dim, Direction};
