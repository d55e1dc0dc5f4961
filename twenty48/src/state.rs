use rand::Rng;
use serde::{Deserialize, Serialize};
use twenty48_types::{Dim, Direction};

use crate::board::Board;

/// What a single slide did to a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlideOutcome {
    pub moved: bool,
    pub won: bool,
    /// Points scored by merges during this slide.
    pub gained: u64,
}

/// A board together with the scores and the move that produced it.
///
/// Snapshots of this are what the history stacks store, every one of them an
/// independent copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    board: Board,
    score: u64,
    bestscore: u64,
    prevmove: Option<Direction>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Dim::default())
    }
}

impl GameState {
    #[must_use]
    pub fn new(dim: Dim) -> Self {
        Self {
            board: Board::new(dim),
            score: 0,
            bestscore: 0,
            prevmove: None,
        }
    }

    /// Starts a fresh game on a board of the same size.
    /// The best score survives.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.board.clear();
        self.board.generate_ntiles(rng, 2 * self.board.nrandom());
        self.score = 0;
        self.prevmove = None;
    }

    /// Starts a fresh game on a board of `dim`, replacing the board.
    pub fn switch_variant<R: Rng + ?Sized>(&mut self, dim: Dim, rng: &mut R) {
        let board = std::mem::take(&mut self.board);
        self.board = board.resize_and_reset(dim);
        self.board.generate_ntiles(rng, 2 * self.board.nrandom());
        self.score = 0;
        self.prevmove = None;
    }

    /// Slides the board and updates the scores.
    ///
    /// The best score follows the score unless `didundo` froze it.
    pub fn apply(&mut self, direction: Direction, didundo: bool) -> SlideOutcome {
        let before = self.score;
        let mut won = false;
        let moved = self.board.slide(direction, &mut self.score, &mut won);
        if !didundo && self.bestscore < self.score {
            self.bestscore = self.score;
        }
        if moved {
            self.prevmove = Some(direction);
        }
        SlideOutcome {
            moved,
            won,
            gained: self.score - before,
        }
    }

    /// Spawns the tiles that follow a successful move.
    pub fn spawn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let n = self.board.nrandom();
        self.board.generate_ntiles(rng, n)
    }

    /// Game over after a slide: the slide won, or nothing can move any more.
    #[must_use]
    pub fn is_over(&self, won: bool) -> bool {
        won || !(self.board.has_adjacent() || self.board.has_room())
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub fn bestscore(&self) -> u64 {
        self.bestscore
    }

    #[must_use]
    pub fn prevmove(&self) -> Option<Direction> {
        self.prevmove
    }

    /// Test and replay support: a state around an explicit board.
    #[must_use]
    pub fn with_board(board: Board, score: u64, bestscore: u64) -> Self {
        Self {
            board,
            score,
            bestscore,
            prevmove: None,
        }
    }
}
