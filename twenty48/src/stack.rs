use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::state::GameState;

/// A stack of owned `GameState` snapshots.
///
/// Positions are counted from the bottom starting at 1, so the top of the
/// stack sits at `count()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateStack {
    nodes: Vec<GameState>,
}

impl StateStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a copy of `state`.
    pub fn push(&mut self, state: &GameState) {
        self.nodes.push(state.clone());
        trace!(count = self.nodes.len(), "push");
    }

    pub fn pop(&mut self) -> Option<GameState> {
        let state = self.nodes.pop();
        trace!(count = self.nodes.len(), popped = state.is_some(), "pop");
        state
    }

    #[must_use]
    pub fn peek(&self) -> Option<&GameState> {
        self.nodes.last()
    }

    /// Position of the top node, which is also the number of nodes.
    #[must_use]
    pub fn count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Snapshot at `position`, counted from the bottom starting at 1.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&GameState> {
        position.checked_sub(1).and_then(|idx| self.nodes.get(idx))
    }

    /// Walks the stack from the top down to the bottom.
    pub fn iter_from_top(&self) -> impl DoubleEndedIterator<Item = &GameState> + '_ {
        self.nodes.iter().rev()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub(crate) fn from_bottom_up(nodes: Vec<GameState>) -> Self {
        Self { nodes }
    }

    pub(crate) fn as_bottom_up(&self) -> &[GameState] {
        &self.nodes
    }
}
