use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode, View};
use crate::util::unicode;

use super::board_view::short_title;

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let dim = Style::default().fg(app.theme.dim).bg(bg);
    let text = Style::default().fg(app.theme.text).bg(bg);
    let bright = Style::default().fg(app.theme.text_bright).bg(bg);
    let cursor = Style::default().fg(app.theme.highlight).bg(bg);

    let (spans, hint) = match app.mode {
        Mode::Navigate => {
            let spans = if let Some(msg) = &app.status {
                vec![Span::styled(format!(" {}", msg), text)]
            } else if let Some(item) = app.focused_item()
                && app.view == View::Board
            {
                vec![
                    Span::styled(format!(" {} ", item.id), bright),
                    Span::styled(short_title(item, 40), text),
                ]
            } else if let Some(pattern) = &app.last_search {
                vec![Span::styled(format!(" /{}", pattern), dim)]
            } else {
                Vec::new()
            };
            let hint = match app.view {
                View::Board => "? help",
                View::Globe => "hjkl rotate  g board",
            };
            (spans, hint)
        }
        Mode::Edit => {
            let id = app.focus.as_deref().unwrap_or("?");
            (
                vec![Span::styled(format!(" editing {}", id), bright)],
                "Enter save  Ctrl+J newline  Esc cancel",
            )
        }
        Mode::Connect => {
            let from = app.focus.as_deref().unwrap_or("?");
            let to = app.connect_target.as_deref().unwrap_or("…");
            (
                vec![Span::styled(format!(" connect {} \u{2192} {}", from, to), bright)],
                "Tab pick  Enter connect  Esc cancel",
            )
        }
        Mode::Search => (
            vec![
                Span::styled(format!(" /{}", app.search_input), bright),
                Span::styled("\u{258C}", cursor),
            ],
            "Enter search  Esc cancel",
        ),
    };

    let mut spans = spans;
    let content_width: usize = spans.iter().map(|s| unicode::display_width(&s.content)).sum();
    let hint_width = unicode::display_width(hint) + 1;
    if content_width + hint_width < width {
        spans.push(Span::styled(
            " ".repeat(width - content_width - hint_width),
            Style::default().bg(bg),
        ));
        spans.push(Span::styled(format!("{} ", hint), dim));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::ItemKind;
    use pretty_assertions::assert_eq;
    use crate::tui::render::test_helpers::*;

    fn status(app: &App, width: u16) -> String {
        render_to_string(width, 1, |frame, area| render_status_row(frame, app, area))
    }

    #[test]
    fn test_status_focus_and_hint() {
        let (mut app, _tmp) =
            app_with_items(&[(ItemKind::Evidence, "Bloody glove\nmore", 0.0, 0.0)]);
        app.focus = Some("EV-001".into());
        assert_eq!(
            status(&app, 40),
            format!(" EV-001 Bloody glove{}? help", " ".repeat(13))
        );
    }

    #[test]
    fn test_status_message_wins() {
        let (mut app, _tmp) = app_with_items(&[(ItemKind::Evidence, "Bloody glove", 0.0, 0.0)]);
        app.focus = Some("EV-001".into());
        app.status = Some("removed NT-002".into());
        assert!(status(&app, 40).starts_with(" removed NT-002"));
    }

    #[test]
    fn test_status_search_prompt() {
        let (mut app, _tmp) = app_with_items(&[]);
        app.mode = Mode::Search;
        app.search_input = "dock".into();
        let out = status(&app, 40);
        assert!(out.starts_with(" /dock\u{258C}"));
        assert!(out.ends_with("Enter search  Esc cancel"));
    }

    #[test]
    fn test_status_connect() {
        let (mut app, _tmp) = app_with_items(&[]);
        app.mode = Mode::Connect;
        app.focus = Some("PH-001".into());
        app.connect_target = Some("NT-002".into());
        assert!(status(&app, 60).starts_with(" connect PH-001 \u{2192} NT-002"));
    }

    #[test]
    fn test_status_narrow_drops_hint() {
        let (mut app, _tmp) = app_with_items(&[]);
        app.mode = Mode::Edit;
        app.focus = Some("NT-001".into());
        assert_eq!(status(&app, 20), " editing NT-001");
    }
}
