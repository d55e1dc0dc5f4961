//! Undo, redo and replay bookkeeping.

use std::{ops::ControlFlow, time::Duration};

use tracing::{debug, warn};

use crate::{error::Refusal, stack::StateStack, state::GameState};

/// Pause between two frames of an automatic replay.
pub const DEFAULT_REPLAY_DELAY: Duration = Duration::from_millis(750);

/// Position inside the replay stack.
///
/// Only `MovesHistory` moves it around. It does not borrow the history, so a
/// cursor taken before the replay stack was rebuilt or the history replaced
/// simply resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayCursor {
    position: usize,
}

impl ReplayCursor {
    /// Position counted from the bottom of the replay stack, starting at 1.
    /// The bottom holds the latest move, the top the earliest.
    #[must_use]
    pub fn count(self) -> usize {
        self.position
    }
}

/// The three history stacks of a session.
///
/// `undo` records every state reached by play, oldest at the bottom. `redo`
/// collects undone states, most recently undone on top. `replay` is built on
/// demand as the reverse of `undo` and thrown away after playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovesHistory {
    undo: StateStack,
    redo: StateStack,
    replay: StateStack,
    didundo: bool,
    replay_nmoves: usize,
    replay_delay: Duration,
}

impl Default for MovesHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl MovesHistory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            undo: StateStack::new(),
            redo: StateStack::new(),
            replay: StateStack::new(),
            didundo: false,
            replay_nmoves: 0,
            replay_delay: DEFAULT_REPLAY_DELAY,
        }
    }

    pub(crate) fn from_parts(undo: StateStack, didundo: bool) -> Self {
        Self {
            undo,
            didundo,
            ..Self::new()
        }
    }

    /// Empties all three stacks and forgets any undo.
    pub fn reset(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.free_replay_stack();
        self.didundo = false;
    }

    #[must_use]
    pub fn didundo(&self) -> bool {
        self.didundo
    }

    pub fn set_didundo(&mut self, didundo: bool) {
        self.didundo = didundo;
    }

    pub fn push_undo(&mut self, state: &GameState) {
        self.undo.push(state);
    }

    pub fn pop_undo(&mut self) -> Option<GameState> {
        let popped = self.undo.pop();
        if popped.is_none() {
            warn!("pop from empty undo stack");
        }
        popped
    }

    #[must_use]
    pub fn peek_undo_state(&self) -> Option<&GameState> {
        self.undo.peek()
    }

    #[must_use]
    pub fn peek_undo_count(&self) -> usize {
        self.undo.count()
    }

    #[must_use]
    pub fn is_empty_undo(&self) -> bool {
        self.undo.is_empty()
    }

    pub fn push_redo(&mut self, state: &GameState) {
        self.redo.push(state);
    }

    pub fn pop_redo(&mut self) -> Option<GameState> {
        let popped = self.redo.pop();
        if popped.is_none() {
            warn!("pop from empty redo stack");
        }
        popped
    }

    #[must_use]
    pub fn peek_redo_state(&self) -> Option<&GameState> {
        self.redo.peek()
    }

    #[must_use]
    pub fn peek_redo_count(&self) -> usize {
        self.redo.count()
    }

    #[must_use]
    pub fn is_empty_redo(&self) -> bool {
        self.redo.is_empty()
    }

    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }

    #[must_use]
    pub fn undo_stack(&self) -> &StateStack {
        &self.undo
    }

    /// Rebuilds the replay stack from the undo stack.
    ///
    /// The undo stack is walked from its top down and every snapshot pushed in
    /// that order, so the earliest move ends up on top of the replay stack and
    /// the latest at its bottom. `delay` paces automatic playback. Returns the
    /// number of replay moves.
    pub fn new_replay_stack(&mut self, delay: Duration) -> usize {
        self.replay.clear();
        for state in self.undo.iter_from_top() {
            self.replay.push(state);
        }
        self.replay_nmoves = self.replay.count();
        self.replay_delay = delay;
        debug!(nmoves = self.replay_nmoves, ?delay, "replay stack built");
        self.replay_nmoves
    }

    pub fn free_replay_stack(&mut self) {
        self.replay.clear();
        self.replay_nmoves = 0;
    }

    #[must_use]
    pub fn replay_nmoves(&self) -> usize {
        self.replay_nmoves
    }

    #[must_use]
    pub fn replay_delay(&self) -> Duration {
        self.replay_delay
    }

    /// Earliest move of the replay.
    #[must_use]
    pub fn iter_top(&self) -> Option<ReplayCursor> {
        (self.replay_nmoves > 0).then_some(ReplayCursor {
            position: self.replay_nmoves,
        })
    }

    /// Latest move of the replay.
    #[must_use]
    pub fn iter_bottom(&self) -> Option<ReplayCursor> {
        (self.replay_nmoves > 0).then_some(ReplayCursor { position: 1 })
    }

    /// One move later.
    ///
    /// # Errors
    /// `ReplayAtEnd` if the cursor already shows the latest move.
    pub fn iter_down(&self, cursor: ReplayCursor) -> Result<ReplayCursor, Refusal> {
        if cursor.position <= 1 {
            return Err(Refusal::ReplayAtEnd);
        }
        Ok(ReplayCursor {
            position: cursor.position - 1,
        })
    }

    /// One move earlier.
    ///
    /// # Errors
    /// `ReplayAtStart` if the cursor already shows the earliest move.
    pub fn iter_up(&self, cursor: ReplayCursor) -> Result<ReplayCursor, Refusal> {
        if cursor.position >= self.replay_nmoves {
            return Err(Refusal::ReplayAtStart);
        }
        Ok(ReplayCursor {
            position: cursor.position + 1,
        })
    }

    #[must_use]
    pub fn replay_state(&self, cursor: ReplayCursor) -> Option<&GameState> {
        if cursor.position > self.replay_nmoves {
            return None;
        }
        self.replay.get(cursor.position)
    }

    /// Plays the replay forward from `cursor` up to the latest move.
    ///
    /// `frame` receives every state shown along with the pause it should take
    /// before the next one, and cancels playback by returning
    /// `ControlFlow::Break`. The cursor ends on the latest move either way.
    /// Returns the number of frames shown.
    ///
    /// # Errors
    /// `ReplayAtEnd` if the cursor already shows the latest move.
    pub fn autoplay<F>(&self, cursor: &mut ReplayCursor, mut frame: F) -> Result<usize, Refusal>
    where
        F: FnMut(&GameState, Duration) -> ControlFlow<()>,
    {
        if cursor.position <= 1 {
            return Err(Refusal::ReplayAtEnd);
        }
        let mut shown = 0;
        while let Ok(next) = self.iter_down(*cursor) {
            *cursor = next;
            let Some(state) = self.replay_state(next) else {
                break;
            };
            shown += 1;
            if frame(state, self.replay_delay).is_break() {
                debug!(shown, "autoplay cancelled");
                break;
            }
        }
        if let Some(bottom) = self.iter_bottom() {
            *cursor = bottom;
        }
        Ok(shown)
    }
}
