//! Floating panel used by wizards, menus and dialogs.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear};

use crate::theme;

/// A `width` x `height` rectangle centered in `area`, shrunk to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width.saturating_sub(4));
    let h = height.min(area.height.saturating_sub(2));
    let x = area.width.saturating_sub(w) / 2;
    let y = area.height.saturating_sub(h) / 2;
    Rect::new(area.x + x, area.y + y, w, h)
}

/// Clear `panel`, draw a titled border and return the inner area.
pub fn render_panel(frame: &mut Frame, panel: Rect, title: &str) -> Rect {
    frame.render_widget(Clear, panel);
    frame.render_widget(
        Block::default().style(Style::default().bg(theme::BG_DARK)),
        panel,
    );

    let block = Block::default()
        .title(Line::from(vec![
            Span::raw(" "),
            Span::styled(
                title.to_owned(),
                Style::default()
                    .fg(theme::NEON_CYAN)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
        ]))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused());

    let inner = block.inner(panel);
    frame.render_widget(block, panel);
    inner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_panel_fits_small_terminals() {
        let area = Rect::new(0, 0, 40, 10);
        let panel = centered(area, 70, 24);
        assert_eq!(panel, Rect::new(2, 1, 36, 8));
    }
}
