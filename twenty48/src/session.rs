//! The game driver: the live state, its history and the random source.

use std::{ops::ControlFlow, path::Path, result, time::Duration};

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, instrument, warn};
use twenty48_types::{Dim, Direction};

use crate::{
    error::{Error, Refusal, Result},
    history::{MovesHistory, ReplayCursor},
    state::GameState,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayOutcome {
    pub moved: bool,
    pub won: bool,
    pub game_over: bool,
    pub gained: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    Undone,
    /// The player was asked to give up best-score tracking and said no.
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayStep {
    /// One move later.
    Next,
    /// One move earlier.
    Prev,
    /// The first recorded state.
    Begin,
    /// The latest recorded state.
    End,
}

pub struct Session {
    state: GameState,
    history: MovesHistory,
    rng: StdRng,
}

impl Session {
    /// Starts a game on a board of `dim` with the initial tiles already on
    /// the undo stack.
    #[must_use]
    pub fn new(dim: Dim, seed: u64) -> Self {
        Self::with_rng(dim, StdRng::seed_from_u64(seed))
    }

    #[must_use]
    pub fn from_entropy(dim: Dim) -> Self {
        Self::with_rng(dim, StdRng::from_entropy())
    }

    fn with_rng(dim: Dim, rng: StdRng) -> Self {
        let mut s = Self {
            state: GameState::new(dim),
            history: MovesHistory::new(),
            rng,
        };
        s.reset_game();
        s
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn history(&self) -> &MovesHistory {
        &self.history
    }

    #[must_use]
    pub fn dim(&self) -> Dim {
        self.state.board().dim()
    }

    /// Plays one move.
    ///
    /// A board already holding the winning tile takes no further moves.
    /// A winning move is recorded as is, any other successful move spawns the
    /// board's `nrandom` tiles before being recorded. A fresh move discards
    /// whatever was waiting to be redone.
    #[instrument(skip(self))]
    pub fn play(&mut self, direction: Direction) -> PlayOutcome {
        let board = self.state.board();
        if board.highest_tile() >= board.sentinel() {
            debug!("game already won");
            return PlayOutcome {
                game_over: true,
                ..PlayOutcome::default()
            };
        }
        let slide = self.state.apply(direction, self.history.didundo());
        if slide.won {
            self.history.clear_redo();
            self.history.push_undo(&self.state);
            info!(score = self.state.score(), "winning move");
        } else if slide.moved {
            self.state.spawn(&mut self.rng);
            self.history.clear_redo();
            self.history.push_undo(&self.state);
        }
        let game_over = self.state.is_over(slide.won);
        if game_over {
            info!(score = self.state.score(), "game over");
        }
        PlayOutcome {
            moved: slide.moved,
            won: slide.won,
            game_over,
            gained: slide.gained,
        }
    }

    /// New game on the current board size.
    #[instrument(skip(self))]
    pub fn reset_game(&mut self) {
        self.state.reset(&mut self.rng);
        self.history.reset();
        self.history.push_undo(&self.state);
    }

    /// New game on a board of `dim`. Returns `false` without touching
    /// anything when `dim` is the current size.
    #[instrument(skip(self))]
    pub fn new_variant(&mut self, dim: Dim) -> bool {
        if dim == self.dim() {
            return false;
        }
        self.state.switch_variant(dim, &mut self.rng);
        self.history.reset();
        self.history.push_undo(&self.state);
        true
    }

    /// Steps back one move.
    ///
    /// The automatic first spawn can never be undone. The first undo of a
    /// session freezes best-score tracking, so it only happens if `confirm`
    /// agrees; later undos do not ask again.
    ///
    /// # Errors
    /// `NothingToUndo` when only the first spawn is recorded.
    #[instrument(skip(self, confirm))]
    pub fn undo<F>(&mut self, confirm: F) -> result::Result<UndoOutcome, Refusal>
    where
        F: FnOnce() -> bool,
    {
        if self.history.peek_undo_count() < 2 {
            warn!("undo refused");
            return Err(Refusal::NothingToUndo);
        }
        if !self.history.didundo() && !confirm() {
            return Ok(UndoOutcome::Declined);
        }
        self.history.set_didundo(true);
        self.history.push_redo(&self.state);
        self.history.pop_undo();
        if let Some(previous) = self.history.peek_undo_state() {
            self.state.clone_from(previous);
        }
        debug!(undo = self.history.peek_undo_count(), redo = self.history.peek_redo_count());
        Ok(UndoOutcome::Undone)
    }

    /// Replays the most recently undone move.
    ///
    /// # Errors
    /// `NothingToRedo` if nothing was undone or everything undone was redone.
    #[instrument(skip(self))]
    pub fn redo(&mut self) -> result::Result<(), Refusal> {
        if !self.history.didundo() {
            warn!("redo refused, no undo this session");
            return Err(Refusal::NothingToRedo);
        }
        let Some(next) = self.history.pop_redo() else {
            return Err(Refusal::NothingToRedo);
        };
        self.state = next;
        self.history.push_undo(&self.state);
        Ok(())
    }

    /// Builds the replay stack and shows the first recorded state.
    #[instrument(skip(self))]
    pub fn begin_replay(&mut self, delay: Duration) -> Option<ReplayCursor> {
        self.history.new_replay_stack(delay);
        let cursor = self.history.iter_top()?;
        self.show(cursor);
        Some(cursor)
    }

    /// Moves the replay cursor and shows the state under it.
    ///
    /// # Errors
    /// `ReplayAtStart` or `ReplayAtEnd` when the step would leave the replay;
    /// the cursor is left where it was.
    pub fn replay_step(
        &mut self,
        cursor: &mut ReplayCursor,
        step: ReplayStep,
    ) -> result::Result<(), Refusal> {
        let next = match step {
            ReplayStep::Next => self.history.iter_down(*cursor)?,
            ReplayStep::Prev => self.history.iter_up(*cursor)?,
            ReplayStep::Begin => self
                .history
                .iter_top()
                .filter(|top| *top != *cursor)
                .ok_or(Refusal::ReplayAtStart)?,
            ReplayStep::End => self
                .history
                .iter_bottom()
                .filter(|bottom| *bottom != *cursor)
                .ok_or(Refusal::ReplayAtEnd)?,
        };
        *cursor = next;
        self.show(next);
        Ok(())
    }

    /// Plays the replay forward, see [`MovesHistory::autoplay`]. The live
    /// state follows every frame.
    ///
    /// # Errors
    /// `ReplayAtEnd` if the cursor already shows the latest move.
    pub fn autoplay<F>(
        &mut self,
        cursor: &mut ReplayCursor,
        mut frame: F,
    ) -> result::Result<usize, Refusal>
    where
        F: FnMut(&GameState, Duration) -> ControlFlow<()>,
    {
        let history = &self.history;
        let state = &mut self.state;
        let shown = history.autoplay(cursor, |gs, delay| {
            state.clone_from(gs);
            frame(state, delay)
        })?;
        self.show(*cursor);
        Ok(shown)
    }

    /// Drops the replay stack and goes back to the latest recorded state.
    #[instrument(skip(self))]
    pub fn end_replay(&mut self) {
        self.history.free_replay_stack();
        if let Some(latest) = self.history.peek_undo_state() {
            self.state.clone_from(latest);
        }
    }

    /// # Errors
    /// See [`MovesHistory::save_to_file`].
    pub fn save_replay(&self, path: impl AsRef<Path>) -> Result<()> {
        self.history.save_to_file(path)
    }

    /// Replaces the history with a recorded game and opens it for replay at
    /// its first state. On failure the session is unchanged.
    ///
    /// # Errors
    /// See [`MovesHistory::load_from_file`].
    pub fn load_replay(&mut self, path: impl AsRef<Path>) -> Result<ReplayCursor> {
        let mut history = MovesHistory::load_from_file(path)?;
        history.new_replay_stack(self.history.replay_delay());
        let cursor = history
            .iter_top()
            .ok_or_else(|| Error::corrupt("no recorded states"))?;
        if let Some(first) = history.replay_state(cursor) {
            self.state.clone_from(first);
        }
        self.history = history;
        Ok(cursor)
    }

    fn show(&mut self, cursor: ReplayCursor) {
        if let Some(gs) = self.history.replay_state(cursor) {
            self.state.clone_from(gs);
        }
    }
}

#[cfg(test)]
mod tests {
    use twenty48_types::ALL_DIRECTIONS;

    use super::*;
    use crate::{board::Board, history::DEFAULT_REPLAY_DELAY};

    fn session_with_moves(moves: usize) -> Session {
        let mut session = Session::new(Dim::Four, 17);
        let mut step = 0;
        while session.history().peek_undo_count() < moves + 1 {
            let outcome = session.play(ALL_DIRECTIONS[step % 4]);
            step += 1;
            assert!(!outcome.game_over, "seeded game ended early");
        }
        session
    }

    #[test]
    fn won_board_takes_no_more_moves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("won.sav");
        let won = Board::from_rows(&[[2048, 2048, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let mut history = MovesHistory::new();
        history.push_undo(&GameState::with_board(won, 2048, 2048));
        history.save_to_file(&path).unwrap();

        let mut session = Session::new(Dim::Four, 5);
        session.load_replay(&path).unwrap();
        session.end_replay();
        let before = session.state().clone();
        let outcome = session.play(Direction::Left);
        assert!(outcome.game_over);
        assert!(!outcome.moved);
        assert_eq!(session.state(), &before);
        assert_eq!(session.history().peek_undo_count(), 1);
    }

    #[test]
    fn starts_with_initial_spawn_recorded() {
        let session = Session::new(Dim::Four, 1);
        assert_eq!(session.history().peek_undo_count(), 1);
        assert_eq!(session.history().peek_undo_state(), Some(session.state()));
        assert_eq!(session.state().board().count_empty(), 14);
    }

    #[test]
    fn undo_refused_on_initial_spawn() {
        let mut session = Session::new(Dim::Four, 1);
        let before = session.state().clone();
        assert_eq!(session.undo(|| true), Err(Refusal::NothingToUndo));
        assert_eq!(session.state(), &before);
        assert!(!session.history().didundo());
    }

    #[test]
    fn first_undo_needs_confirmation() {
        let mut session = session_with_moves(3);
        let before = session.state().clone();
        assert_eq!(session.undo(|| false), Ok(UndoOutcome::Declined));
        assert_eq!(session.state(), &before);
        assert!(!session.history().didundo());

        assert_eq!(session.undo(|| true), Ok(UndoOutcome::Undone));
        assert!(session.history().didundo());
        // Later undos never ask
        assert_eq!(
            session.undo(|| panic!("asked twice")),
            Ok(UndoOutcome::Undone)
        );
    }

    #[test]
    fn undo_then_redo_restores_state() {
        let mut session = session_with_moves(6);
        for _ in 0..3 {
            let before = session.state().clone();
            let count = session.history().peek_undo_count();
            session.undo(|| true).unwrap();
            assert_eq!(session.history().peek_undo_count(), count - 1);
            assert_eq!(session.history().peek_undo_state(), Some(session.state()));
            session.redo().unwrap();
            assert_eq!(session.state(), &before);
            assert_eq!(session.history().peek_undo_count(), count);
            session.play(ALL_DIRECTIONS[count % 4]);
        }
    }

    #[test]
    fn undo_all_then_redo_all() {
        let mut session = session_with_moves(5);
        let recorded: Vec<_> = session
            .history()
            .undo_stack()
            .iter_from_top()
            .cloned()
            .collect();
        while session.undo(|| true).is_ok() {}
        assert_eq!(session.history().peek_undo_count(), 1);
        assert_eq!(session.state(), recorded.last().unwrap());
        while session.redo().is_ok() {}
        assert_eq!(session.state(), &recorded[0]);
        assert_eq!(session.redo(), Err(Refusal::NothingToRedo));
    }

    #[test]
    fn redo_needs_an_undo() {
        let mut session = session_with_moves(2);
        assert_eq!(session.redo(), Err(Refusal::NothingToRedo));
    }

    #[test]
    fn fresh_move_discards_redo() {
        let mut session = session_with_moves(4);
        session.undo(|| true).unwrap();
        assert_eq!(session.history().peek_redo_count(), 1);
        let mut step = 0;
        while !session.play(ALL_DIRECTIONS[step % 4]).moved {
            step += 1;
        }
        assert!(session.history().is_empty_redo());
        assert_eq!(session.redo(), Err(Refusal::NothingToRedo));
    }

    #[test]
    fn best_score_frozen_after_undo() {
        let mut session = session_with_moves(8);
        session.undo(|| true).unwrap();
        let frozen = session.state().bestscore();
        for step in 0..30 {
            if session.play(ALL_DIRECTIONS[step % 4]).game_over {
                break;
            }
            assert_eq!(session.state().bestscore(), frozen);
        }
    }

    #[test]
    fn variant_switch_resets_history() {
        let mut session = session_with_moves(3);
        assert!(!session.new_variant(Dim::Four));
        assert_eq!(session.history().peek_undo_count(), 4);
        assert!(session.new_variant(Dim::Eight));
        assert_eq!(session.dim(), Dim::Eight);
        assert_eq!(session.state().score(), 0);
        assert_eq!(session.history().peek_undo_count(), 1);
        assert_eq!(
            session.state().board().count_empty(),
            64 - 2 * Dim::Eight.nrandom()
        );
    }

    #[test]
    fn replay_walks_recorded_states_in_order() {
        let mut session = session_with_moves(5);
        let mut recorded: Vec<_> = session
            .history()
            .undo_stack()
            .iter_from_top()
            .cloned()
            .collect();
        recorded.reverse();

        let mut cursor = session.begin_replay(DEFAULT_REPLAY_DELAY).unwrap();
        assert_eq!(session.history().replay_nmoves(), 6);
        assert_eq!(session.state(), &recorded[0]);
        assert_eq!(
            session.replay_step(&mut cursor, ReplayStep::Prev),
            Err(Refusal::ReplayAtStart)
        );
        assert_eq!(
            session.replay_step(&mut cursor, ReplayStep::Begin),
            Err(Refusal::ReplayAtStart)
        );
        for expected in &recorded[1..] {
            session.replay_step(&mut cursor, ReplayStep::Next).unwrap();
            assert_eq!(session.state(), expected);
        }
        assert_eq!(
            session.replay_step(&mut cursor, ReplayStep::Next),
            Err(Refusal::ReplayAtEnd)
        );
        session.replay_step(&mut cursor, ReplayStep::Begin).unwrap();
        assert_eq!(session.state(), &recorded[0]);
        session.replay_step(&mut cursor, ReplayStep::End).unwrap();
        assert_eq!(session.state(), recorded.last().unwrap());

        session.end_replay();
        assert_eq!(session.history().replay_nmoves(), 0);
        assert_eq!(session.state(), recorded.last().unwrap());
    }

    #[test]
    fn autoplay_updates_live_state() {
        let mut session = session_with_moves(4);
        let latest = session.state().clone();
        let mut cursor = session.begin_replay(Duration::ZERO).unwrap();
        let mut frames = Vec::new();
        let shown = session
            .autoplay(&mut cursor, |gs, _| {
                frames.push(gs.clone());
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(shown, 4);
        assert_eq!(frames.last(), Some(&latest));
        assert_eq!(session.state(), &latest);
    }

    #[test]
    fn load_replaces_history_and_opens_replay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.sav");
        let saved = session_with_moves(6);
        saved.save_replay(&path).unwrap();
        let first = saved.history().undo_stack().iter_from_top().last().cloned();

        let mut session = Session::new(Dim::Five, 3);
        let cursor = session.load_replay(&path).unwrap();
        assert_eq!(session.dim(), Dim::Four);
        assert_eq!(Some(session.state()), first.as_ref());
        assert_eq!(cursor.count(), 7);
        session.end_replay();
        assert_eq!(session.state(), saved.state());
    }

    #[test]
    fn failed_load_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with_moves(2);
        let state = session.state().clone();
        let history = session.history().clone();
        assert!(session.load_replay(dir.path().join("absent.sav")).is_err());
        assert_eq!(session.state(), &state);
        assert_eq!(session.history(), &history);
    }

    #[test]
    fn winning_move_is_recorded_without_spawn() {
        use crate::board::Board;
        let board = Board::from_rows(&[[1024, 1024, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let mut session = Session::new(Dim::Four, 0);
        session.state = GameState::with_board(board, 0, 0);
        let outcome = session.play(Direction::Left);
        assert!(outcome.won && outcome.game_over);
        assert_eq!(session.state().board().count_empty(), 15);
        assert_eq!(session.history().peek_undo_state(), Some(session.state()));
    }
}
