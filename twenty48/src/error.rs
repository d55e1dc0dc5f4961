//! Error type shared by the engine.

use derive_more::{Display, Error};
use twenty48_types::UnsupportedDim;

pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ErrorKind {
    /// A caller handed over something the engine cannot work with.
    #[display("invalid argument: {_0}")]
    InvalidArgument(String),
    /// Reading or writing a replay file failed.
    #[display("i/o failure: {_0}")]
    Io(String),
    /// A replay could not be encoded or decoded.
    #[display("format error: {_0}")]
    Format(String),
    /// A replay decoded fine but does not describe a playable game.
    #[display("corrupt replay: {_0}")]
    CorruptReplay(String),
}

/// Engine error with the location it was raised from.
#[derive(Debug, Clone, Display, Error)]
#[display("{} at {}:{}", kind, file, line)]
pub struct Error {
    #[error(not(source))]
    pub kind: ErrorKind,
    pub line: u32,
    pub file: &'static str,
}

impl Error {
    #[track_caller]
    pub fn new(kind: ErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    #[track_caller]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(message.into()))
    }

    #[track_caller]
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CorruptReplay(message.into()))
    }

    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl From<std::io::Error> for Error {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io(err.to_string()))
    }
}

impl From<ron::Error> for Error {
    #[track_caller]
    fn from(err: ron::Error) -> Self {
        Self::new(ErrorKind::Format(err.to_string()))
    }
}

impl From<ron::error::SpannedError> for Error {
    #[track_caller]
    fn from(err: ron::error::SpannedError) -> Self {
        Self::new(ErrorKind::Format(err.to_string()))
    }
}

impl From<UnsupportedDim> for Error {
    #[track_caller]
    fn from(err: UnsupportedDim) -> Self {
        Self::invalid_argument(err.to_string())
    }
}

/// A boundary reached by undo, redo or replay navigation.
///
/// Not an error: the front-end reports it to the player (a bell) and carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Refusal {
    #[display("nothing to undo")]
    NothingToUndo,
    #[display("nothing to redo")]
    NothingToRedo,
    #[display("already at the first move")]
    ReplayAtStart,
    #[display("already at the last move")]
    ReplayAtEnd,
}
