use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, View};
use crate::util::unicode;

/// Render the one-row title bar: board name, view tabs, counts
pub fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let base = Style::default().fg(app.theme.dim).bg(bg);
    let active = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut spans = vec![
        Span::styled(" \u{25C9} ", Style::default().fg(app.theme.pin).bg(bg)),
        Span::styled(app.ws.config.board.name.clone(), active),
        Span::styled("  \u{2502} ", base),
        Span::styled(
            "board",
            if app.view == View::Board { active } else { base },
        ),
        Span::styled("  ", base),
        Span::styled(
            "globe",
            if app.view == View::Globe { active } else { base },
        ),
    ];

    let board = app.board();
    let counts = match app.view {
        View::Board => format!(
            "{} items  {} strings ",
            board.item_count(),
            board.connections().len()
        ),
        View::Globe => format!("{} markers ", board.markers.len()),
    };
    let used: usize = spans.iter().map(|s| unicode::display_width(&s.content)).sum();
    let width = area.width as usize;
    let counts_width = unicode::display_width(&counts);
    if used + counts_width < width {
        spans.push(Span::styled(" ".repeat(width - used - counts_width), base));
        spans.push(Span::styled(counts, base));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).style(base), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::ItemKind;
    use crate::tui::render::test_helpers::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_title_bar_board() {
        let (app, _tmp) = app_with_items(&[(ItemKind::Note, "a", 0.0, 0.0)]);
        let output = render_to_string(60, 1, |frame, area| {
            render_title_bar(frame, &app, area);
        });
        assert_eq!(
            output,
            " ◉ Test  │ board  globe                  1 items  0 strings"
        );
    }

    #[test]
    fn test_title_bar_globe() {
        let (mut app, _tmp) = app_with_items(&[]);
        app.view = View::Globe;
        let output = render_to_string(40, 1, |frame, area| {
            render_title_bar(frame, &app, area);
        });
        assert_eq!(
            output,
            " ◉ Test  │ board  globe       0 markers"
        );
    }
}
