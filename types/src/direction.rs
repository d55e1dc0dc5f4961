use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The two ways a line can be laid over the grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Axis {
    /// Lines are rows, tiles travel along a row.
    Horizontal,
    /// Lines are columns, tiles travel along a column.
    Vertical,
}

impl Direction {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Direction::Left | Direction::Right => Axis::Horizontal,
            Direction::Up | Direction::Down => Axis::Vertical,
        }
    }

    /// Returns `true` if tiles travel toward the low index end of their line
    /// (column 0 for rows, row 0 for columns).
    #[must_use]
    pub const fn toward_start(self) -> bool {
        matches!(self, Direction::Up | Direction::Left)
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        write!(f, "{name}")
    }
}
