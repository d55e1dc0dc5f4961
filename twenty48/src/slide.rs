//! The slide-and-merge transform, written once for a single line and laid over
//! rows or columns depending on the direction.

use smallvec::SmallVec;
use twenty48_types::{Axis, Dim, Direction, EMPTY};

/// Longest line on any supported board.
pub(crate) const MAX_LINE: usize = 8;

pub(crate) type Line<T> = SmallVec<T, MAX_LINE>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineSlide {
    /// The line differs from what it was before the slide.
    pub changed: bool,
    /// Sum of the values produced by merges.
    pub gained: u64,
    /// A merge produced the sentinel value.
    pub won: bool,
}

/// Slides `line` toward index 0.
///
/// Tiles are first packed against the edge, then equal neighbours merge
/// scanning away from the edge with every tile merging at most once, then the
/// gaps left by merges are closed.
pub fn slide_line(line: &mut [u32], sentinel: u32) -> LineSlide {
    let before: Line<u32> = line.iter().copied().collect();
    compact(line);

    let mut gained = 0;
    let mut won = false;
    let mut idx = 0;
    while idx + 1 < line.len() {
        let merged = (line[idx] != EMPTY && line[idx] == line[idx + 1])
            .then(|| line[idx].checked_mul(2))
            .flatten();
        if let Some(merged) = merged {
            line[idx] = merged;
            line[idx + 1] = EMPTY;
            gained += u64::from(merged);
            won |= merged == sentinel;
            // The freshly merged tile and the emptied cell are both done
            idx += 2;
        } else {
            idx += 1;
        }
    }

    compact(line);
    LineSlide {
        changed: before.as_slice() != &line[..],
        gained,
        won,
    }
}

/// Packs every non-empty tile toward index 0 keeping their order.
fn compact(line: &mut [u32]) {
    let mut write = 0;
    for read in 0..line.len() {
        if line[read] != EMPTY {
            line.swap(write, read);
            write += 1;
        }
    }
}

/// Row-major cell indices of line `idx`, starting at the edge `direction`
/// slides toward.
pub(crate) fn line_cells(
    dim: Dim,
    direction: Direction,
    idx: usize,
) -> impl Iterator<Item = usize> {
    let size = dim.size();
    let toward_start = direction.toward_start();
    let axis = direction.axis();
    (0..size).map(move |step| {
        let along = if toward_start { step } else { size - 1 - step };
        match axis {
            Axis::Horizontal => idx * size + along,
            Axis::Vertical => along * size + idx,
        }
    })
}
