use std::{
    io::{self, Write},
    ops::ControlFlow,
    path::PathBuf,
    time::Duration,
};

use chrono::Local;
use ratatui::{
    crossterm::event::{self, Event, KeyCode, KeyEventKind},
    layout::{Constraint, Layout},
    style::Stylize,
    text::Line,
    widgets::{Block, Paragraph},
    DefaultTerminal, Frame,
};
use tracing::{debug, info, warn};
use twenty48::{GameState, Refusal, ReplayCursor, ReplayStep, Session, UndoOutcome};
use twenty48_types::{Dim, Direction};

use crate::{
    board::BoardView,
    config::Settings,
    history::{LoadReplay, SaveReplay},
    popup::Popup,
};

const PLAY_HELP: &str =
    "arrows move  r new  4/5/6/8 size  u undo  e redo  p replay  s skin  h hint  q quit";
const REPLAY_HELP: &str =
    "←/→ step  Home/End jump  p autoplay  s save  l load  b/Esc back";
const AUTOPLAY_HELP: &str = "autoplay, any key stops";

enum Mode {
    Play,
    Replay {
        cursor: ReplayCursor,
        /// Leaving goes on to the play-again question.
        after_game_over: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Question {
    NewGame,
    Variant(Dim),
    Undo,
    WatchReplay,
    PlayAgain,
}

impl Question {
    fn text(self) -> String {
        match self {
            Question::NewGame => String::from("Start a new game?"),
            Question::Variant(dim) => format!("Switch to a {dim} board? This game is lost."),
            Question::Undo => {
                String::from("After an undo the best score stops updating this game. Undo?")
            }
            Question::WatchReplay => String::from("Game over. Watch the replay?"),
            Question::PlayAgain => String::from("Play again? (n quits)"),
        }
    }
}

enum Prompt {
    Confirm(Question),
    Save(SaveReplay),
    Load(LoadReplay),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    Play(Direction),
    NewGame,
    Variant(Dim),
    Undo,
    Redo,
    Replay,
    CycleSkin,
    Hint,
    Answer(bool),
    Step(ReplayStep),
    Autoplay,
    OpenSave,
    OpenLoad,
    SaveReplay(PathBuf),
    LoadReplay(PathBuf),
    Cancel,
    Back,
}

fn lowercase(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

fn play_key(code: KeyCode) -> Option<Message> {
    let message = match lowercase(code) {
        KeyCode::Up => Message::Play(Direction::Up),
        KeyCode::Down => Message::Play(Direction::Down),
        KeyCode::Left => Message::Play(Direction::Left),
        KeyCode::Right => Message::Play(Direction::Right),
        KeyCode::Char('q') | KeyCode::Esc => Message::Quit,
        KeyCode::Char('r') => Message::NewGame,
        KeyCode::Char('u') => Message::Undo,
        KeyCode::Char('e') => Message::Redo,
        KeyCode::Char('p') => Message::Replay,
        KeyCode::Char('s') => Message::CycleSkin,
        KeyCode::Char('h') => Message::Hint,
        KeyCode::Char(c) => Message::Variant(Dim::from_key(c)?),
        _ => return None,
    };
    Some(message)
}

fn replay_key(code: KeyCode) -> Option<Message> {
    let message = match lowercase(code) {
        KeyCode::Right => Message::Step(ReplayStep::Next),
        KeyCode::Left => Message::Step(ReplayStep::Prev),
        KeyCode::Home => Message::Step(ReplayStep::Begin),
        KeyCode::End => Message::Step(ReplayStep::End),
        KeyCode::Char('p') => Message::Autoplay,
        KeyCode::Char('s') => Message::OpenSave,
        KeyCode::Char('l') => Message::OpenLoad,
        KeyCode::Char('b') | KeyCode::Esc => Message::Back,
        _ => return None,
    };
    Some(message)
}

fn confirm_key(code: KeyCode) -> Option<Message> {
    match lowercase(code) {
        KeyCode::Char('y') | KeyCode::Enter => Some(Message::Answer(true)),
        KeyCode::Char('n') | KeyCode::Esc => Some(Message::Answer(false)),
        _ => None,
    }
}

fn bell() {
    let mut stdout = io::stdout();
    let _ = stdout.write_all(b"\x07").and_then(|()| stdout.flush());
}

fn score_line(state: &GameState, frozen: bool) -> String {
    let last = state.prevmove().map_or(String::from("-"), |d| d.to_string());
    let best = if frozen { " (frozen)" } else { "" };
    format!(
        "Score {}   Best {}{best}   Last move {last}",
        state.score(),
        state.bestscore()
    )
}

fn draw_screen(frame: &mut Frame, board: &BoardView, header: &str, help: &str, status: &str) {
    let vertical = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(6),
        Constraint::Length(4),
    ]);
    let [top, middle, bottom] = vertical.areas(frame.area());
    frame.render_widget(
        Paragraph::new(header).block(Block::bordered().title("2048")),
        top,
    );
    frame.render_widget(board.draw(), middle);
    frame.render_widget(
        Paragraph::new(vec![Line::from(status).bold(), Line::from(help).dark_gray()])
            .block(Block::bordered()),
        bottom,
    );
}

pub struct App {
    session: Session,
    mode: Mode,
    prompt: Option<Prompt>,
    board_view: BoardView,
    settings: Settings,
    status: String,
}

impl App {
    #[must_use]
    pub fn new(session: Session, settings: Settings) -> Self {
        let board_view = BoardView::new(session.state());
        Self {
            session,
            mode: Mode::Play,
            prompt: None,
            board_view,
            settings,
            status: String::new(),
        }
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> io::Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if let Some(message) = self.update() {
                if self.handle(message, &mut terminal).is_break() {
                    break;
                }
                self.on_state_change();
            }
        }
        info!(score = self.session.state().score(), "quit");
        Ok(())
    }

    pub fn update(&mut self) -> Option<Message> {
        if !event::poll(Duration::from_millis(100)).ok()? {
            return None;
        }
        let event = event::read().ok()?;
        let Event::Key(key) = &event else {
            return None;
        };
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match &mut self.prompt {
            Some(Prompt::Confirm(_)) => confirm_key(key.code),
            Some(Prompt::Save(save)) => save.update(&event),
            Some(Prompt::Load(load)) => load.update(&event),
            None => match self.mode {
                Mode::Play => play_key(key.code),
                Mode::Replay { .. } => replay_key(key.code),
            },
        }
    }

    fn handle(&mut self, message: Message, terminal: &mut DefaultTerminal) -> ControlFlow<()> {
        match message {
            Message::Quit => return ControlFlow::Break(()),
            Message::Play(direction) => self.play(direction),
            Message::NewGame => self.ask(Question::NewGame),
            Message::Variant(dim) => {
                if dim != self.session.dim() {
                    self.ask(Question::Variant(dim));
                }
            }
            Message::Undo => self.undo(false),
            Message::Redo => match self.session.redo() {
                Ok(()) => self.status = String::from("Redone"),
                Err(refusal) => self.refuse(refusal),
            },
            Message::Replay => self.enter_replay(false),
            Message::CycleSkin => {
                let skin = self.board_view.cycle_skin();
                self.status = format!("Skin: {}", skin.name());
            }
            Message::Hint => self.status = String::from("Hint: not implemented yet"),
            Message::Answer(yes) => return self.answer(yes),
            Message::Step(step) => self.replay_step(step),
            Message::Autoplay => self.autoplay(terminal),
            Message::OpenSave => {
                let save = SaveReplay::new(&self.settings.replays_dir, &Local::now());
                self.prompt = Some(Prompt::Save(save));
            }
            Message::OpenLoad => {
                self.prompt = Some(Prompt::Load(LoadReplay::new(&self.settings.replays_dir)));
            }
            Message::SaveReplay(path) => {
                self.prompt = None;
                self.save(path);
            }
            Message::LoadReplay(path) => {
                self.prompt = None;
                self.load(path);
            }
            Message::Cancel => self.prompt = None,
            Message::Back => self.leave_replay(),
        }
        ControlFlow::Continue(())
    }

    fn on_state_change(&mut self) {
        self.board_view.on_state_change(self.session.state());
    }

    fn ask(&mut self, question: Question) {
        self.prompt = Some(Prompt::Confirm(question));
    }

    fn refuse(&mut self, refusal: Refusal) {
        debug!(%refusal, "refused");
        bell();
        self.status = refusal.to_string();
    }

    fn answer(&mut self, yes: bool) -> ControlFlow<()> {
        let Some(Prompt::Confirm(question)) = self.prompt.take() else {
            return ControlFlow::Continue(());
        };
        match (question, yes) {
            (Question::NewGame | Question::PlayAgain, true) => {
                self.session.reset_game();
                self.status = String::from("New game");
            }
            (Question::Variant(dim), true) => {
                if self.session.new_variant(dim) {
                    self.status = format!("New game on a {dim} board");
                }
            }
            (Question::Undo, true) => self.undo(true),
            (Question::WatchReplay, true) => self.enter_replay(true),
            (Question::WatchReplay, false) => self.ask(Question::PlayAgain),
            (Question::PlayAgain, false) => return ControlFlow::Break(()),
            (_, false) => {}
        }
        ControlFlow::Continue(())
    }

    fn play(&mut self, direction: Direction) {
        let outcome = self.session.play(direction);
        if !outcome.moved {
            self.status.clear();
            return;
        }
        self.status = if outcome.won {
            format!("You reached {}!", self.session.state().board().sentinel())
        } else if outcome.gained > 0 {
            format!("+{}", outcome.gained)
        } else {
            String::new()
        };
        if outcome.game_over {
            bell();
            self.ask(Question::WatchReplay);
        }
    }

    fn undo(&mut self, confirmed: bool) {
        match self.session.undo(|| confirmed) {
            Ok(UndoOutcome::Undone) => self.status = String::from("Undone"),
            Ok(UndoOutcome::Declined) => self.ask(Question::Undo),
            Err(refusal) => self.refuse(refusal),
        }
    }

    fn enter_replay(&mut self, after_game_over: bool) {
        match self.session.begin_replay(self.settings.replay_delay) {
            Some(cursor) => {
                self.mode = Mode::Replay {
                    cursor,
                    after_game_over,
                };
                self.status = String::from("Replay");
            }
            None => {
                bell();
                self.status = String::from("Nothing to replay");
            }
        }
    }

    fn leave_replay(&mut self) {
        let Mode::Replay {
            after_game_over, ..
        } = self.mode
        else {
            return;
        };
        self.session.end_replay();
        self.mode = Mode::Play;
        self.status.clear();
        if after_game_over {
            self.ask(Question::PlayAgain);
        }
    }

    fn replay_step(&mut self, step: ReplayStep) {
        let Mode::Replay { cursor, .. } = &mut self.mode else {
            return;
        };
        match self.session.replay_step(cursor, step) {
            Ok(()) => self.status.clear(),
            Err(refusal) => self.refuse(refusal),
        }
    }

    fn autoplay(&mut self, terminal: &mut DefaultTerminal) {
        let Mode::Replay { cursor, .. } = &mut self.mode else {
            return;
        };
        let frozen = self.session.history().didundo();
        let board_view = &mut self.board_view;
        let result = self.session.autoplay(cursor, |state, delay| {
            board_view.on_state_change(state);
            let view: &BoardView = board_view;
            let header = score_line(state, frozen);
            if terminal
                .draw(|frame| draw_screen(frame, view, &header, AUTOPLAY_HELP, ""))
                .is_err()
            {
                return ControlFlow::Break(());
            }
            match event::poll(delay) {
                Ok(false) => ControlFlow::Continue(()),
                Ok(true) => {
                    let _ = event::read();
                    ControlFlow::Break(())
                }
                Err(_) => ControlFlow::Break(()),
            }
        });
        match result {
            Ok(shown) => self.status = format!("Autoplay showed {shown} moves"),
            Err(refusal) => self.refuse(refusal),
        }
    }

    fn save(&mut self, path: PathBuf) {
        match self.session.save_replay(&path) {
            Ok(()) => {
                info!(path = %path.display(), "replay saved");
                self.status = format!("Saved {}", path.display());
            }
            Err(err) => {
                warn!(%err, "save failed");
                bell();
                self.status = format!("Save failed: {}", err.kind());
            }
        }
    }

    fn load(&mut self, path: PathBuf) {
        match self.session.load_replay(&path) {
            Ok(cursor) => {
                info!(path = %path.display(), "replay loaded");
                self.mode = Mode::Replay {
                    cursor,
                    after_game_over: false,
                };
                self.status = format!("Loaded {}", path.display());
            }
            Err(err) => {
                warn!(%err, "load failed");
                bell();
                self.status = format!("Load failed: {}", err.kind());
            }
        }
    }

    fn header(&self) -> String {
        let history = self.session.history();
        let scores = score_line(self.session.state(), history.didundo());
        match self.mode {
            Mode::Play => {
                let moves = history.peek_undo_count().saturating_sub(1);
                format!("{scores}   Moves {moves}")
            }
            Mode::Replay { cursor, .. } => {
                let nmoves = history.replay_nmoves();
                format!(
                    "{scores}   Replay {}/{}",
                    nmoves - cursor.count(),
                    nmoves.saturating_sub(1)
                )
            }
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let help = match self.mode {
            Mode::Play => PLAY_HELP,
            Mode::Replay { .. } => REPLAY_HELP,
        };
        draw_screen(frame, &self.board_view, &self.header(), help, &self.status);
        let Some(prompt) = &self.prompt else {
            return;
        };
        match prompt {
            Prompt::Confirm(question) => {
                let popup = Popup::default()
                    .title("Confirm (y/n)")
                    .content(question.text())
                    .warning();
                frame.render_widget(popup, Popup::area(frame.area(), 48, 5));
            }
            Prompt::Save(save) => {
                frame.render_widget(save.draw(), Popup::area(frame.area(), 48, 3));
            }
            Prompt::Load(load) => {
                let height = u16::try_from(load.len()).unwrap_or(u16::MAX).saturating_add(2);
                frame.render_widget(load.draw(), Popup::area(frame.area(), 48, height.max(3)));
            }
        }
    }
}
