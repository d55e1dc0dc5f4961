use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Style, Stylize},
    widgets::{Block, Paragraph, Widget},
};
use twenty48::GameState;
use twenty48_types::{Dim, EMPTY};

/// Colour themes, cycled with a key.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Skin {
    #[default]
    Classic,
    Ocean,
    Mono,
}

impl Skin {
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Skin::Classic => Skin::Ocean,
            Skin::Ocean => Skin::Mono,
            Skin::Mono => Skin::Classic,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Skin::Classic => "classic",
            Skin::Ocean => "ocean",
            Skin::Mono => "mono",
        }
    }

    fn palette(self) -> &'static [Color] {
        const CLASSIC: [Color; 8] = [
            Color::Rgb(238, 228, 218),
            Color::Rgb(237, 224, 200),
            Color::Rgb(242, 177, 121),
            Color::Rgb(245, 149, 99),
            Color::Rgb(246, 124, 95),
            Color::Rgb(246, 94, 59),
            Color::Rgb(237, 207, 114),
            Color::Rgb(237, 194, 46),
        ];
        const OCEAN: [Color; 6] = [
            Color::LightCyan,
            Color::Cyan,
            Color::LightBlue,
            Color::Blue,
            Color::LightMagenta,
            Color::Magenta,
        ];
        const MONO: [Color; 4] = [Color::White, Color::Gray, Color::DarkGray, Color::Black];
        match self {
            Skin::Classic => &CLASSIC,
            Skin::Ocean => &OCEAN,
            Skin::Mono => &MONO,
        }
    }

    fn tile_style(self, value: u32) -> Style {
        if value == EMPTY {
            return Style::new().bg(Color::Reset).fg(Color::DarkGray);
        }
        let palette = self.palette();
        // 2 is the first colour, larger tiles walk the palette and stick to its end
        let idx = (value.trailing_zeros() as usize).saturating_sub(1).min(palette.len() - 1);
        let bg = palette[idx];
        let fg = if matches!(bg, Color::Black | Color::Blue | Color::Magenta | Color::DarkGray) {
            Color::White
        } else {
            Color::Black
        };
        Style::new().bg(bg).fg(fg)
    }
}

/// Terminal view of a board.
///
/// It keeps its own copy of the tiles, refreshed from the game state whenever
/// that changes. A state on a board of another size resizes the view.
pub struct BoardView {
    dim: Dim,
    cells: Vec<u32>,
    skin: Skin,
}

impl BoardView {
    #[must_use]
    pub fn new(state: &GameState) -> Self {
        let mut view = Self {
            dim: state.board().dim(),
            cells: Vec::new(),
            skin: Skin::default(),
        };
        view.on_state_change(state);
        view
    }

    /// Adapts the view to a board of `dim`, clearing what it shows.
    pub fn resize(&mut self, dim: Dim) {
        self.dim = dim;
        self.cells.clear();
        self.cells.resize(dim.cells(), EMPTY);
    }

    pub fn on_state_change(&mut self, state: &GameState) {
        let board = state.board();
        if board.dim() != self.dim || self.cells.len() != board.tiles().len() {
            self.resize(board.dim());
        }
        self.cells.copy_from_slice(board.tiles());
    }

    pub fn cycle_skin(&mut self) -> Skin {
        self.skin = self.skin.next();
        self.skin
    }

    #[must_use]
    pub fn dim(&self) -> Dim {
        self.dim
    }

    pub fn draw(&self) -> impl Widget + '_ {
        BoardWidget { view: self }
    }
}

struct BoardWidget<'a> {
    view: &'a BoardView,
}

impl Widget for BoardWidget<'_> {
    #[allow(clippy::cast_possible_truncation)]
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered().title(format!("Board {}", self.view.dim));
        let inner = block.inner(area);
        block.render(area, buf);

        // At most 8
        let size = self.view.dim.size() as u16;
        let cell_width = inner.width / size;
        let cell_height = inner.height / size;
        if cell_width == 0 || cell_height == 0 {
            return;
        }
        for (idx, value) in self.view.cells.iter().enumerate() {
            let (row, col) = (idx as u16 / size, idx as u16 % size);
            let cell = Rect {
                x: inner.x + col * cell_width,
                y: inner.y + row * cell_height,
                width: cell_width,
                height: cell_height,
            };
            let text = if *value == EMPTY {
                String::from("·")
            } else {
                value.to_string()
            };
            // Center the number vertically inside the cell
            let pad = "\n".repeat(usize::from(cell_height.saturating_sub(1) / 2));
            Paragraph::new(format!("{pad}{text}"))
                .alignment(Alignment::Center)
                .style(self.view.skin.tile_style(*value))
                .bold()
                .render(cell, buf);
        }
    }
}
