use std::fmt::Display;

use derive_more::{Display as DisplayDerive, Error};
use serde::{Deserialize, Serialize};

pub const ALL_DIMS: [Dim; 4] = [Dim::Four, Dim::Five, Dim::Six, Dim::Eight];

/// Board size of a game variant.
///
/// Every variant carries its own rules: how many tiles spawn after a
/// successful move and which tile value wins the game.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Dim {
    #[default]
    Four,
    Five,
    Six,
    Eight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, DisplayDerive, Error)]
#[display("unsupported board dimension {_0}, expected one of 4, 5, 6, 8")]
pub struct UnsupportedDim(#[error(not(source))] pub u8);

impl Dim {
    /// Length of a row or column.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Dim::Four => 4,
            Dim::Five => 5,
            Dim::Six => 6,
            Dim::Eight => 8,
        }
    }

    /// Number of cells on the board.
    #[must_use]
    pub const fn cells(self) -> usize {
        self.size() * self.size()
    }

    /// Tiles spawned after every successful move.
    #[must_use]
    pub const fn nrandom(self) -> usize {
        match self {
            Dim::Four => 1,
            Dim::Five | Dim::Six => 2,
            Dim::Eight => 3,
        }
    }

    /// Tile value that wins the game when produced by a merge.
    #[must_use]
    pub const fn sentinel(self) -> u32 {
        match self {
            Dim::Four => 2048,
            Dim::Five => 4096,
            Dim::Six => 8192,
            Dim::Eight => 16384,
        }
    }

    /// Maps the size-select keys of the front-end.
    #[must_use]
    pub fn from_key(key: char) -> Option<Self> {
        let digit = key.to_digit(10)?;
        u8::try_from(digit).ok().and_then(|d| Self::try_from(d).ok())
    }
}

impl TryFrom<u8> for Dim {
    type Error = UnsupportedDim;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(Dim::Four),
            5 => Ok(Dim::Five),
            6 => Ok(Dim::Six),
            8 => Ok(Dim::Eight),
            other => Err(UnsupportedDim(other)),
        }
    }
}

impl TryFrom<usize> for Dim {
    type Error = UnsupportedDim;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| UnsupportedDim(u8::MAX))
            .and_then(Self::try_from)
    }
}

impl From<Dim> for u8 {
    #[allow(clippy::cast_possible_truncation)]
    fn from(dim: Dim) -> Self {
        // At most 8
        dim.size() as u8
    }
}

impl Display for Dim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{0}x{0}", self.size())
    }
}
