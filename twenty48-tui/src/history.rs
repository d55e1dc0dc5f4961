use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use itertools::Itertools;
use ratatui::{
    crossterm::event::{Event, KeyCode},
    prelude::*,
};
use twenty48::REPLAY_EXTENSION;

use crate::{app::Message, popup::Popup};

/// Default replay file name for a game saved at `when`, shaped like
/// `Fri_Jul__4_213045_2014.sav`.
pub fn replay_file_name<Tz: TimeZone>(when: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let stamp = when.format("%a_%b_%e_%H%M%S_%Y").to_string().replace(' ', "_");
    format!("{stamp}.{REPLAY_EXTENSION}")
}

/// Replay files directly inside `dir`, sorted by name. A missing or
/// unreadable folder lists nothing.
pub fn list_replays(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let is_replay = path.is_file()
                && path.extension().is_some_and(|ext| ext == REPLAY_EXTENSION);
            is_replay.then_some(path)
        })
        .sorted()
        .collect_vec()
}

/// Name prompt shown before saving, prefilled with a timestamped name.
pub struct SaveReplay {
    dir: PathBuf,
    input: String,
}

impl SaveReplay {
    pub fn new<Tz: TimeZone>(dir: &Path, now: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            dir: dir.to_path_buf(),
            input: replay_file_name(now),
        }
    }

    pub fn update(&mut self, event: &Event) -> Option<Message> {
        if let Event::Key(key) = event {
            match key.code {
                KeyCode::Char(c) => {
                    if c.is_ascii_graphic() && c != '/' {
                        self.input.push(c);
                    }
                }
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Enter if !self.input.is_empty() => {
                    return Some(Message::SaveReplay(self.target()));
                }
                KeyCode::Esc => return Some(Message::Cancel),
                _ => {}
            }
        }
        None
    }

    fn target(&self) -> PathBuf {
        let path = self.dir.join(&self.input);
        if path.extension().is_some() {
            path
        } else {
            path.with_extension(REPLAY_EXTENSION)
        }
    }

    pub fn draw(&self) -> impl Widget + '_ {
        Popup::default()
            .title("Save replay as (Enter saves, Esc cancels)")
            .content(self.input.as_str())
    }
}

/// Picker over the replay files of a folder.
pub struct LoadReplay {
    files: Vec<PathBuf>,
    selected: usize,
}

impl LoadReplay {
    pub fn new(dir: &Path) -> Self {
        Self {
            files: list_replays(dir),
            selected: 0,
        }
    }

    pub fn update(&mut self, event: &Event) -> Option<Message> {
        if let Event::Key(key) = event {
            match key.code {
                KeyCode::Down | KeyCode::Char('j') => {
                    self.selected = (self.selected + 1).min(self.files.len().saturating_sub(1));
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.selected = self.selected.saturating_sub(1);
                }
                KeyCode::Enter => {
                    return Some(
                        self.files
                            .get(self.selected)
                            .map_or(Message::Cancel, |path| Message::LoadReplay(path.clone())),
                    );
                }
                KeyCode::Esc => return Some(Message::Cancel),
                _ => {}
            }
        }
        None
    }

    pub fn draw(&self) -> impl Widget + '_ {
        let content = if self.is_empty() {
            String::from("No saved replays")
        } else {
            self.files
                .iter()
                .enumerate()
                .map(|(idx, path)| {
                    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                    if idx == self.selected {
                        format!(">{name}")
                    } else {
                        format!(" {name}")
                    }
                })
                .join("\n")
        };
        Popup::default().title("Replays").content(content)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
