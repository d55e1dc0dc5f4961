use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

#[derive(Debug, Default)]
pub struct Popup<'a> {
    title: Line<'a>,
    content: Text<'a>,
    border_style: Style,
}

impl<'a> Popup<'a> {
    pub fn title(self, title: impl Into<Line<'a>>) -> Self {
        Self {
            title: title.into(),
            ..self
        }
    }

    pub fn content(self, content: impl Into<Text<'a>>) -> Self {
        Self {
            content: content.into(),
            ..self
        }
    }

    pub fn border_style(self, border_style: Style) -> Self {
        Self {
            border_style,
            ..self
        }
    }

    pub fn warning(self) -> Self {
        self.border_style(Style::new().yellow())
    }

    /// Centers a popup of `width` by `height` inside `area`.
    #[must_use]
    pub fn area(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width);
        let height = height.min(area.height);
        Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        }
    }
}

impl Widget for Popup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // ensure that all cells under the popup are cleared to avoid leaking content
        Clear.render(area, buf);
        let block = Block::new()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(self.border_style);
        Paragraph::new(self.content)
            .wrap(Wrap { trim: true })
            .left_aligned()
            .block(block)
            .render(area, buf);
    }
}
