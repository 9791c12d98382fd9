use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::{App, View};

const BOARD_KEYS: &[(&str, &str)] = &[
    (" Tab/S-Tab", "Focus next/previous item"),
    (" \u{2190}\u{2191}\u{2192}\u{2193}", "Nudge focused item"),
    (" hjkl", "Pan the board"),
    (" n", "Pin a new note"),
    (" e/Enter", "Edit focused item"),
    (" x", "Expand/collapse"),
    (" d", "Delete focused item"),
    (" c", "Run a string from focus"),
    (" /", "Search"),
    (" Esc", "Clear focus"),
];

const MOUSE_KEYS: &[(&str, &str)] = &[
    (" Drag", "Move item"),
    (" Drag \u{25E2}", "Resize item"),
    (" Shift+Drag", "Connect two items"),
    (" Click", "Select item"),
];

const GLOBE_KEYS: &[(&str, &str)] = &[
    (" h/l", "Rotate east/west"),
    (" j/k", "Tilt"),
    (" 0", "Reset rotation"),
];

const GLOBAL_KEYS: &[(&str, &str)] = &[
    (" g", "Toggle board/globe"),
    (" ?", "Toggle this help"),
    (" q", "Quit"),
    (" Ctrl+C", "Quit (immediate)"),
];

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Center the overlay, leaving some margin
    let overlay_area = centered_rect(60, 80, area);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let text_color = app.theme.text;
    let bright = app.theme.text_bright;
    let highlight = app.theme.highlight;
    let dim = app.theme.dim;

    let key_style = Style::default()
        .fg(highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(text_color).bg(bg);
    let header_style = Style::default()
        .fg(bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(" Key Bindings", header_style)));
    lines.push(Line::from(""));

    let sections: &[(&str, &[(&str, &str)])] = match app.view {
        View::Board => &[(" Board", BOARD_KEYS), (" Mouse", MOUSE_KEYS)],
        View::Globe => &[(" Globe", GLOBE_KEYS)],
    };
    for &(title, keys) in sections.iter().chain([&(" Global", GLOBAL_KEYS)]) {
        lines.push(Line::from(Span::styled(title, header_style)));
        for &(key, desc) in keys {
            add_binding(&mut lines, key, desc, key_style, desc_style);
        }
        lines.push(Line::from(""));
    }
    lines.pop();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(dim).bg(bg))
        .style(Style::default().bg(bg));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(bg));

    frame.render_widget(paragraph, overlay_area);
}

fn add_binding<'a>(
    lines: &mut Vec<Line<'a>>,
    key: &'a str,
    desc: &'a str,
    key_style: Style,
    desc_style: Style,
) {
    let key_width = 16;
    let padded_key = format!("{:<width$}", key, width = key_width);
    lines.push(Line::from(vec![
        Span::styled(padded_key, key_style),
        Span::styled(desc, desc_style),
    ]));
}

/// Create a centered rectangle of the given percentage of the parent
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn test_help_follows_view() {
        let (mut app, _tmp) = app_with_items(&[]);
        let board = render_to_string(TERM_W, TERM_H, |frame, area| {
            render_help_overlay(frame, &app, area);
        });
        assert!(board.contains("Pin a new note"));
        assert!(!board.contains("Tilt"));

        app.view = View::Globe;
        let globe = render_to_string(TERM_W, TERM_H, |frame, area| {
            render_help_overlay(frame, &app, area);
        });
        assert!(globe.contains("Tilt"));
        assert!(globe.contains("Toggle board/globe"));
    }

    #[test]
    fn test_centered_rect() {
        let r = centered_rect(50, 50, Rect::new(0, 0, 100, 40));
        assert_eq!(r, Rect::new(25, 10, 50, 20));
    }
}
