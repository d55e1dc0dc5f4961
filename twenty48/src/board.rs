use std::fmt::Display;

use itertools::Itertools;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;
use twenty48_types::{is_valid_tile, Dim, Direction, EMPTY, SPAWN_WEIGHTS};

use crate::{
    error::{Error, Result},
    slide::{line_cells, slide_line, Line},
};

/// A `dim × dim` grid of tiles stored row-major.
///
/// Cells hold `0` when empty and a power of two otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    dim: Dim,
    tiles: Vec<u32>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(Dim::default())
    }
}

impl Board {
    #[must_use]
    pub fn new(dim: Dim) -> Self {
        Self {
            dim,
            tiles: vec![EMPTY; dim.cells()],
        }
    }

    /// Builds a board from explicit rows.
    ///
    /// # Errors
    /// `InvalidArgument` if the rows do not form a square of a supported size
    /// or a cell is neither empty nor a power of two.
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self> {
        let dim = Dim::try_from(rows.len())?;
        let mut tiles = Vec::with_capacity(dim.cells());
        for (idx, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != dim.size() {
                return Err(Error::invalid_argument(format!(
                    "row {idx} has {} cells, expected {}",
                    row.len(),
                    dim.size()
                )));
            }
            tiles.extend_from_slice(row);
        }
        let board = Self { dim, tiles };
        board.validate()?;
        Ok(board)
    }

    /// Checks the tile rules: known size, empty or power-of-two tiles no
    /// larger than the winning tile.
    ///
    /// # Errors
    /// `InvalidArgument` naming the first offending cell.
    pub fn validate(&self) -> Result<()> {
        if self.tiles.len() != self.dim.cells() {
            return Err(Error::invalid_argument(format!(
                "{} board holds {} cells",
                self.dim,
                self.tiles.len()
            )));
        }
        if let Some((idx, value)) = self.tiles.iter().find_position(|v| !is_valid_tile(**v)) {
            return Err(Error::invalid_argument(format!(
                "cell ({}, {}) holds {value}, which is not a tile value",
                idx / self.dim.size(),
                idx % self.dim.size()
            )));
        }
        let sentinel = self.sentinel();
        if let Some((idx, value)) = self.tiles.iter().find_position(|v| **v > sentinel) {
            return Err(Error::invalid_argument(format!(
                "cell ({}, {}) holds {value}, past the winning tile {sentinel}",
                idx / self.dim.size(),
                idx % self.dim.size()
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn dim(&self) -> Dim {
        self.dim
    }

    /// Tiles spawned after a successful move on this board.
    #[must_use]
    pub fn nrandom(&self) -> usize {
        self.dim.nrandom()
    }

    #[must_use]
    pub fn sentinel(&self) -> u32 {
        self.dim.sentinel()
    }

    /// # Panics
    /// If `row` or `col` is off the board.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        assert!(row < self.dim.size() && col < self.dim.size());
        self.tiles[row * self.dim.size() + col]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.tiles.chunks(self.dim.size())
    }

    #[must_use]
    pub fn tiles(&self) -> &[u32] {
        &self.tiles
    }

    #[must_use]
    pub fn tile_sum(&self) -> u64 {
        self.tiles.iter().copied().map(u64::from).sum()
    }

    #[must_use]
    pub fn highest_tile(&self) -> u32 {
        self.tiles.iter().copied().max().unwrap_or(EMPTY)
    }

    #[must_use]
    pub fn count_empty(&self) -> usize {
        self.tiles.iter().filter(|v| **v == EMPTY).count()
    }

    /// Slides and merges every line toward `direction`.
    ///
    /// Points earned by merges are added to `score` and `iswin` is set when a
    /// merge produces the sentinel value. Returns `true` if any tile moved.
    pub fn slide(&mut self, direction: Direction, score: &mut u64, iswin: &mut bool) -> bool {
        let sentinel = self.sentinel();
        let mut moved = false;
        for idx in 0..self.dim.size() {
            let cells: Line<usize> = line_cells(self.dim, direction, idx).collect();
            let mut line: Line<u32> = cells.iter().map(|c| self.tiles[*c]).collect();
            let outcome = slide_line(&mut line, sentinel);
            if outcome.changed {
                moved = true;
                for (cell, value) in cells.iter().zip(line.iter()) {
                    self.tiles[*cell] = *value;
                }
            }
            *score += outcome.gained;
            *iswin |= outcome.won;
        }
        moved
    }

    /// Spawns up to `n` tiles on random empty cells and returns how many were
    /// placed. A full board takes as many as fit, which may be none.
    pub fn generate_ntiles<R: Rng + ?Sized>(&mut self, rng: &mut R, n: usize) -> usize {
        let empty = self
            .tiles
            .iter()
            .positions(|v| *v == EMPTY)
            .collect_vec();
        let cells = empty.choose_multiple(rng, n).copied().collect_vec();
        if cells.len() < n {
            debug!(requested = n, placed = cells.len(), "board too full to spawn");
        }
        for cell in &cells {
            let value = SPAWN_WEIGHTS
                .choose_weighted(rng, |(_, weight)| *weight)
                .map_or(SPAWN_WEIGHTS[0].0, |(value, _)| *value);
            self.tiles[*cell] = value;
        }
        cells.len()
    }

    /// Returns `true` if two horizontally or vertically adjacent cells hold
    /// the same tile, i.e. a move is still possible on a full board.
    #[must_use]
    pub fn has_adjacent(&self) -> bool {
        [Direction::Left, Direction::Up].into_iter().any(|direction| {
            (0..self.dim.size()).any(|idx| {
                line_cells(self.dim, direction, idx)
                    .map(|c| self.tiles[c])
                    .tuple_windows()
                    .any(|(a, b)| a != EMPTY && a == b)
            })
        })
    }

    #[must_use]
    pub fn has_room(&self) -> bool {
        self.tiles.contains(&EMPTY)
    }

    /// Consumes the board and returns an empty one of `dim`.
    ///
    /// Anything holding on to the old board has to switch to the returned one.
    #[must_use]
    pub fn resize_and_reset(self, dim: Dim) -> Self {
        let mut tiles = self.tiles;
        tiles.clear();
        tiles.resize(dim.cells(), EMPTY);
        Self { dim, tiles }
    }

    /// Empties every cell keeping the dimension.
    pub fn clear(&mut self) {
        self.tiles.fill(EMPTY);
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self.highest_tile().max(2).to_string().len();
        for row in self.rows() {
            let line = row
                .iter()
                .map(|v| {
                    if *v == EMPTY {
                        format!("{:>width$}", ".")
                    } else {
                        format!("{v:>width$}")
                    }
                })
                .join(" ");
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    use twenty48_types::{ALL_DIMS, ALL_DIRECTIONS};

    use super::*;
    use crate::error::ErrorKind;

    fn board(rows: &[[u32; 4]]) -> Board {
        Board::from_rows(rows).unwrap()
    }

    /// Slides one line the long way: drop the gaps, then pair equal
    /// neighbours front to back.
    fn slide_by_hand(tiles: &[u32]) -> (Vec<u32>, u64) {
        let packed = tiles.iter().copied().filter(|t| *t != EMPTY).collect_vec();
        let mut out = Vec::with_capacity(tiles.len());
        let mut gained = 0;
        let mut rest = packed.as_slice();
        while let [first, tail @ ..] = rest {
            if tail.first() == Some(first) {
                out.push(first * 2);
                gained += u64::from(first * 2);
                rest = &tail[1..];
            } else {
                out.push(*first);
                rest = tail;
            }
        }
        out.resize(tiles.len(), EMPTY);
        (out, gained)
    }

    #[test]
    fn move_left_merges_pair() {
        let mut b = board(&[[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let mut score = 0;
        let mut iswin = false;
        assert!(b.slide(Direction::Left, &mut score, &mut iswin));
        assert_eq!(b.rows().next().unwrap(), [4, 0, 0, 0]);
        assert_eq!(score, 4);
        assert!(!iswin);
    }

    #[test]
    fn spawn_then_merge_from_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut b = Board::new(Dim::Four);
        assert_eq!(b.generate_ntiles(&mut rng, 2), 2);
        assert_eq!(b.count_empty(), 14);
        let mut b = board(&[[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let mut score = 0;
        let mut iswin = false;
        assert!(b.slide(Direction::Left, &mut score, &mut iswin));
        assert_eq!(b.get(0, 0), 4);
        assert_eq!(score, 4);
    }

    #[test]
    fn directions_mirror_each_other() {
        let start = board(&[[2, 0, 2, 4], [0, 4, 4, 0], [8, 8, 8, 0], [2, 4, 8, 16]]);
        let mut left = start.clone();
        let mut right = start.clone();
        let (mut s1, mut s2, mut w) = (0, 0, false);
        left.slide(Direction::Left, &mut s1, &mut w);
        right.slide(Direction::Right, &mut s2, &mut w);
        assert_eq!(s1, s2);
        for (l, r) in left.rows().zip(right.rows()) {
            // A mirrored line merges from the other end, so compare as multisets
            let l = l.iter().copied().filter(|v| *v != EMPTY).sorted().collect_vec();
            let r = r.iter().copied().filter(|v| *v != EMPTY).sorted().collect_vec();
            assert_eq!(l, r);
        }
        assert_eq!(left.rows().next().unwrap(), [4, 4, 0, 0]);
        assert_eq!(right.rows().next().unwrap(), [0, 0, 4, 4]);
        assert_eq!(left.rows().nth(2).unwrap(), [16, 8, 0, 0]);
        assert_eq!(right.rows().nth(2).unwrap(), [0, 0, 8, 16]);
    }

    #[test]
    fn vertical_matches_transposed_horizontal() {
        let start = board(&[[2, 0, 8, 2], [2, 4, 8, 0], [0, 4, 0, 2], [4, 0, 8, 2]]);
        let transposed = Board::from_rows(
            &(0..4)
                .map(|c| (0..4).map(|r| start.get(r, c)).collect_vec())
                .collect_vec(),
        )
        .unwrap();
        for (vertical, horizontal) in [
            (Direction::Up, Direction::Left),
            (Direction::Down, Direction::Right),
        ] {
            let mut v = start.clone();
            let mut h = transposed.clone();
            let (mut s1, mut s2, mut w) = (0, 0, false);
            v.slide(vertical, &mut s1, &mut w);
            h.slide(horizontal, &mut s2, &mut w);
            assert_eq!(s1, s2);
            for r in 0..4 {
                for c in 0..4 {
                    assert_eq!(v.get(r, c), h.get(c, r));
                }
            }
        }
    }

    #[test]
    fn up_then_down_on_single_row_is_noop() {
        let start = board(&[[2, 4, 8, 16], [0; 4], [0; 4], [0; 4]]);
        let mut b = start.clone();
        let (mut score, mut iswin) = (0, false);
        assert!(b.slide(Direction::Down, &mut score, &mut iswin));
        assert!(b.slide(Direction::Up, &mut score, &mut iswin));
        assert_eq!(b, start);
        assert_eq!(score, 0);
    }

    #[test]
    fn stuck_moves_are_idempotent() {
        let mut rng = StdRng::seed_from_u64(11);
        for dim in ALL_DIMS {
            let mut b = Board::new(dim);
            b.generate_ntiles(&mut rng, dim.cells() / 2);
            for direction in ALL_DIRECTIONS {
                let mut once = b.clone();
                let (mut score, mut iswin) = (0, false);
                while once.slide(direction, &mut score, &mut iswin) {}
                let settled = once.clone();
                let before = score;
                assert!(!once.slide(direction, &mut score, &mut iswin));
                assert_eq!(score, before);
                assert_eq!(once, settled);
            }
        }
    }

    #[test]
    fn merges_conserve_tile_sum() {
        let mut rng = StdRng::seed_from_u64(3);
        for dim in ALL_DIMS {
            let mut b = Board::new(dim);
            for step in 0..200 {
                b.generate_ntiles(&mut rng, dim.nrandom());
                let direction = ALL_DIRECTIONS[step % 4];
                let sum = b.tile_sum();
                let line_of = |b: &Board, idx| {
                    line_cells(dim, direction, idx)
                        .map(|c| b.tiles[c])
                        .collect_vec()
                };
                let expected = (0..dim.size())
                    .map(|idx| slide_by_hand(&line_of(&b, idx)))
                    .collect_vec();
                let (mut score, mut iswin) = (0, false);
                b.slide(direction, &mut score, &mut iswin);
                assert_eq!(b.tile_sum(), sum);
                // The score grows by exactly the values the merges produced
                assert_eq!(score, expected.iter().map(|(_, gained)| gained).sum::<u64>());
                for (idx, (line, _)) in expected.iter().enumerate() {
                    assert_eq!(&line_of(&b, idx), line);
                }
                if b.highest_tile() >= dim.sentinel() {
                    break;
                }
                assert!(b.validate().is_ok());
            }
        }
    }

    #[test]
    fn win_is_detected_with_room_left() {
        let mut b = board(&[[1024, 1024, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let (mut score, mut iswin) = (0, false);
        assert!(b.slide(Direction::Right, &mut score, &mut iswin));
        assert!(iswin);
        assert!(b.has_room());
        assert_eq!(score, 2048);
    }

    #[test]
    fn full_board_adjacency() {
        let stuck = board(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(!stuck.has_room());
        assert!(!stuck.has_adjacent());

        let horizontal = board(&[[2, 2, 8, 4], [4, 8, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(horizontal.has_adjacent());

        let vertical = board(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 8, 4], [4, 2, 8, 2]]);
        assert!(vertical.has_adjacent());

        assert!(!Board::new(Dim::Four).has_adjacent());
        assert!(Board::new(Dim::Four).has_room());
    }

    #[test]
    fn spawn_fills_at_most_the_empty_cells() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut b = board(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 0, 0]]);
        assert_eq!(b.generate_ntiles(&mut rng, 3), 2);
        assert!(!b.has_room());
        assert_eq!(b.generate_ntiles(&mut rng, 1), 0);
        assert!(b.tiles().iter().all(|v| *v == 2 || *v == 4));
    }

    #[test]
    fn spawn_distribution_favours_twos() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut twos = 0;
        let mut fours = 0;
        for _ in 0..2000 {
            let mut b = Board::new(Dim::Four);
            b.generate_ntiles(&mut rng, 1);
            match b.highest_tile() {
                2 => twos += 1,
                4 => fours += 1,
                other => panic!("unexpected spawn {other}"),
            }
        }
        assert!(twos > fours * 5, "{twos} twos vs {fours} fours");
        assert!(fours > 0);
    }

    #[test]
    fn resize_returns_empty_board() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut b = Board::new(Dim::Four);
        b.generate_ntiles(&mut rng, 4);
        let b = b.resize_and_reset(Dim::Eight);
        assert_eq!(b.dim(), Dim::Eight);
        assert_eq!(b.tiles().len(), 64);
        assert_eq!(b.count_empty(), 64);
        assert_eq!(b.nrandom(), Dim::Eight.nrandom());
    }

    #[test]
    fn rejects_malformed_rows() {
        let err = Board::from_rows(&[[2, 0, 0], [0, 0, 0], [0, 0, 0]]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument(_)));
        let err = Board::from_rows(&[[3, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument(m) if m.contains("(0, 0)")));
        let ragged: Vec<Vec<u32>> = vec![vec![0; 4], vec![0; 3], vec![0; 4], vec![0; 4]];
        assert!(Board::from_rows(&ragged).is_err());
    }

    #[test]
    fn tiles_past_the_winning_tile_are_rejected() {
        let err = Board::from_rows(&[[4096, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument(m) if m.contains("2048")));
        assert!(board(&[[2048, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).validate().is_ok());
        let five = [[4096, 0, 0, 0, 0], [0; 5], [0; 5], [0; 5], [0; 5]];
        assert!(Board::from_rows(&five).is_ok());
    }
}
