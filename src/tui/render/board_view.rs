use std::ops::Range;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use crate::model::connection::LineStyle;
use crate::model::geometry::{self, Point};
use crate::model::item::BoardItem;
use crate::ops::connection_line::{self, LineGeometry};
use crate::ops::drag::Preview;
use crate::tui::app::{App, Mode, Viewport};
use crate::util::unicode;

use super::push_highlighted_spans;

/// A straight stroke on the canvas, in board coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub from: Point,
    pub to: Point,
    pub color: Color,
}

/// Render the board: strings first, then cards bottom to top
pub fn render_board_view(frame: &mut Frame, app: &mut App, area: Rect) {
    app.canvas_area = area;
    let cork = app.theme.cork;
    frame.render_widget(Block::default().style(Style::default().bg(cork)), area);
    if area.width == 0 || area.height == 0 {
        return;
    }

    let vp = app.viewport;
    let strokes = collect_strokes(app);
    let labels = collect_labels(app);
    let x_bounds = [vp.pan_x, vp.pan_x + f64::from(area.width) * vp.scale_x];
    // Canvas y grows upward, board y grows downward
    let y_bounds = [
        -(vp.pan_y + f64::from(area.height) * vp.scale_y),
        -vp.pan_y,
    ];
    let canvas = Canvas::default()
        .background_color(cork)
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            for s in &strokes {
                ctx.draw(&CanvasLine {
                    x1: s.from.x,
                    y1: -s.from.y,
                    x2: s.to.x,
                    y2: -s.to.y,
                    color: s.color,
                });
            }
            for (at, text, color) in &labels {
                ctx.print(
                    at.x,
                    -at.y,
                    Line::styled(text.clone(), Style::default().fg(*color)),
                );
            }
        });
    frame.render_widget(canvas, area);

    for item in app.board().items() {
        render_card(frame, app, item, area);
    }

    if app.board().item_count() == 0 {
        let hint = Paragraph::new(Line::from(Span::styled(
            "empty board: press n to pin a note, ? for help",
            Style::default().fg(app.theme.dim).bg(cork),
        )));
        frame.render_widget(hint, Rect::new(area.x + 1, area.y, area.width.saturating_sub(1), 1));
    }
}

/// Where an item is drawn right now: its committed geometry, or the
/// candidate of a gesture in flight.
pub fn display_rect(app: &App, item: &BoardItem) -> geometry::Rect {
    match app.drag.preview(&item.id) {
        Some(Preview::Position(p)) => geometry::Rect::new(p, item.size),
        Some(Preview::Size(s)) => geometry::Rect::new(item.position, s),
        _ => item.rect(),
    }
}

/// Line segments for every string plus the rubber band of a connect gesture
fn collect_strokes(app: &App) -> Vec<Stroke> {
    let board = app.board();
    let min_len = app.ws.config.connections.min_line_length;
    let view = visible_board_rect(&app.viewport, app.canvas_area);
    let mut strokes = Vec::new();

    for conn in board.connections() {
        let (Some(a), Some(b)) = (board.item(&conn.a), board.item(&conn.b)) else {
            continue;
        };
        let line = connection_line::line_geometry(
            display_rect(app, a).center(),
            display_rect(app, b).center(),
            min_len,
        );
        let Some(span) = connection_line::visible_span(&line, view) else {
            continue;
        };
        let mut color = app.theme.string_color(&conn.style.color);
        if conn.style.animated && app.tick % 4 >= 2 {
            color = app.theme.highlight;
        }
        strokes.extend(
            styled_segments(&line, conn.style.line, conn.style.thickness, span)
                .into_iter()
                .map(|(from, to)| Stroke { from, to, color }),
        );
    }

    for item in board.items() {
        if let Some(Preview::Connect(cursor)) = app.drag.preview(&item.id) {
            strokes.push(Stroke {
                from: item.center(),
                to: cursor,
                color: app.theme.highlight,
            });
        }
    }

    if app.mode == Mode::Connect
        && let (Some(src), Some(dst)) = (
            app.focus.as_deref().and_then(|id| board.item(id)),
            app.connect_target.as_deref().and_then(|id| board.item(id)),
        )
    {
        strokes.push(Stroke {
            from: src.center(),
            to: dst.center(),
            color: app.theme.highlight,
        });
    }
    strokes
}

/// Board area shown in `area`, one cell of margin included
pub fn visible_board_rect(vp: &Viewport, area: Rect) -> geometry::Rect {
    geometry::Rect::new(
        Point::new(vp.pan_x - vp.scale_x, vp.pan_y - vp.scale_y),
        geometry::Size::new(
            (f64::from(area.width) + 2.0) * vp.scale_x,
            (f64::from(area.height) + 2.0) * vp.scale_y,
        ),
    )
}

/// Split the `span` of a line into the straight pieces its stroke style draws
pub fn styled_segments(
    line: &LineGeometry,
    style: LineStyle,
    thickness: f64,
    span: Range<f64>,
) -> Vec<(Point, Point)> {
    match style {
        LineStyle::Solid => vec![(line.point_at(span.start), line.point_at(span.end))],
        LineStyle::Dashed | LineStyle::Dotted => connection_line::dash_segments_in(
            line,
            &connection_line::stroke_pattern(style, thickness),
            span,
        ),
        LineStyle::Zigzag => connection_line::zigzag_for(line, thickness, span)
            .windows(2)
            .map(|w| (w[0], w[1]))
            .collect(),
    }
}

fn collect_labels(app: &App) -> Vec<(Point, String, Color)> {
    let board = app.board();
    board
        .connections()
        .iter()
        .filter_map(|conn| {
            let label = conn.style.label.as_ref()?;
            let a = display_rect(app, board.item(&conn.a)?).center();
            let b = display_rect(app, board.item(&conn.b)?).center();
            let mid = connection_line::line_geometry(a, b, 0.0).midpoint;
            Some((mid, label.clone(), app.theme.text))
        })
        .collect()
}

/// Terminal cells covered by a board rectangle, clipped to `area`
pub fn card_cells(
    vp: &Viewport,
    area: Rect,
    rect: geometry::Rect,
    collapsed: bool,
) -> Option<Rect> {
    let (cx, cy) = vp.board_to_cell(rect.origin);
    let w = (rect.size.width / vp.scale_x).round().max(3.0);
    let h = if collapsed {
        1.0
    } else {
        (rect.size.height / vp.scale_y).round().max(2.0)
    };
    let left = f64::from(area.x) + cx.floor();
    let top = f64::from(area.y) + cy.floor();
    let right = (left + w).min(f64::from(area.right()));
    let bottom = (top + h).min(f64::from(area.bottom()));
    let left = left.max(f64::from(area.x));
    let top = top.max(f64::from(area.y));
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::new(
        left as u16,
        top as u16,
        (right - left) as u16,
        (bottom - top) as u16,
    ))
}

/// Tilt in degrees, -3..=3, fixed per ID
pub fn tilt_degrees(id: &str) -> i8 {
    // FNV-1a
    let mut hash: u32 = 0x811c_9dc5;
    for b in id.bytes() {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    (hash % 7) as i8 - 3
}

fn render_card(frame: &mut Frame, app: &App, item: &BoardItem, area: Rect) {
    let rect = display_rect(app, item);
    let Some(cells) = card_cells(&app.viewport, area, rect, !item.expanded) else {
        return;
    };
    let theme = &app.theme;
    let fill = theme.card_color(item.kind);
    let is_focus = app.focus.as_deref() == Some(item.id.as_str());
    let is_target =
        app.mode == Mode::Connect && app.connect_target.as_deref() == Some(item.id.as_str());
    let border_color = if is_target {
        theme.highlight
    } else if item.selected || app.drag.is_active(&item.id) {
        theme.selected
    } else if is_focus {
        theme.highlight
    } else {
        theme.dim
    };
    let base = Style::default().fg(theme.text).bg(fill);
    let match_style = Style::default()
        .fg(theme.search_match_fg)
        .bg(theme.search_match_bg);
    let search_re = app.search_re();

    frame.render_widget(Clear, cells);

    if !item.expanded {
        let mut spans = vec![Span::styled(
            format!(" {} ", item.id),
            Style::default().fg(border_color).bg(fill),
        )];
        push_highlighted_spans(&mut spans, item.title(), base, match_style, search_re.as_ref());
        frame.render_widget(Paragraph::new(Line::from(spans)).style(base), cells);
        return;
    }

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(if item.kind.is_sticky() {
            BorderType::Rounded
        } else {
            BorderType::Plain
        })
        .border_style(Style::default().fg(border_color).bg(fill))
        .style(base)
        .title(Line::from(Span::styled(
            format!(" {} ", item.id),
            Style::default().fg(border_color).bg(fill),
        )));
    if let Some(importance) = item.metadata.as_ref().and_then(|m| m.importance) {
        block = block.title(
            Line::from(Span::styled(
                "!",
                Style::default()
                    .fg(theme.importance_color(importance))
                    .bg(fill)
                    .add_modifier(Modifier::BOLD),
            ))
            .right_aligned(),
        );
    }
    let inner = block.inner(cells);
    frame.render_widget(block, cells);

    let editing = app.mode == Mode::Edit && is_focus;
    let lines = if editing {
        edit_lines(app, base)
    } else {
        body_lines(app, item, base, match_style, search_re.as_ref())
    };
    frame.render_widget(Paragraph::new(lines).style(base), inner);

    // Pin on the top border, nudged by the card's tilt
    if cells.width >= 3 && rect.origin.y >= app.viewport.pan_y {
        let tilt = i32::from(tilt_degrees(&item.id).signum());
        let mid = i32::from(cells.x) + i32::from(cells.width) / 2 + tilt;
        let pin_x = mid.clamp(i32::from(cells.x) + 1, i32::from(cells.right()) - 2) as u16;
        frame.render_widget(
            Paragraph::new(Span::styled("●", Style::default().fg(theme.pin).bg(fill))),
            Rect::new(pin_x, cells.y, 1, 1),
        );
    }

    // Resize handle, when the real corner is on screen
    let (right_cell, bottom_cell) = app
        .viewport
        .board_to_cell(Point::new(rect.right(), rect.bottom()));
    if right_cell <= f64::from(area.width)
        && bottom_cell <= f64::from(area.height)
        && cells.height >= 2
    {
        frame.render_widget(
            Paragraph::new(Span::styled("◢", Style::default().fg(border_color).bg(fill))),
            Rect::new(cells.right() - 1, cells.bottom() - 1, 1, 1),
        );
    }
}

fn body_lines<'a>(
    app: &App,
    item: &BoardItem,
    base: Style,
    match_style: Style,
    search_re: Option<&regex::Regex>,
) -> Vec<Line<'a>> {
    let theme = &app.theme;
    let dim = base.fg(theme.dim);
    let mut lines = Vec::new();

    let mut content = item.content.lines();
    let mut title = Vec::new();
    push_highlighted_spans(
        &mut title,
        content.next().unwrap_or(""),
        base.fg(theme.text_bright).add_modifier(Modifier::BOLD),
        match_style,
        search_re,
    );
    lines.push(Line::from(title));
    for text in content {
        let mut spans = Vec::new();
        push_highlighted_spans(&mut spans, text, base, match_style, search_re);
        lines.push(Line::from(spans));
    }

    if let Some(meta) = &item.metadata {
        for (icon, value) in [
            ("@", meta.location.as_deref()),
            ("#", meta.date.as_deref()),
            ("~", meta.status.as_deref()),
        ] {
            if let Some(value) = value {
                let mut spans = vec![Span::styled(format!("{} ", icon), dim)];
                push_highlighted_spans(&mut spans, value, dim, match_style, search_re);
                lines.push(Line::from(spans));
            }
        }
    }
    if let Some(image) = &item.image {
        lines.push(Line::from(Span::styled(format!("[img] {}", image), dim)));
    }
    lines
}

/// The edit buffer with a block cursor; newlines split lines
fn edit_lines<'a>(app: &App, base: Style) -> Vec<Line<'a>> {
    let cursor_style = Style::default().fg(app.theme.highlight).bg(base.bg.unwrap_or(Color::Reset));
    let cursor = app.edit_cursor.min(app.edit_buffer.len());
    let (before, after) = app.edit_buffer.split_at(cursor);

    let mut lines: Vec<Line> = Vec::new();
    let mut current: Vec<Span> = Vec::new();
    for (i, part) in before.split('\n').enumerate() {
        if i > 0 {
            lines.push(Line::from(std::mem::take(&mut current)));
        }
        current.push(Span::styled(part.to_string(), base));
    }
    current.push(Span::styled("\u{258C}", cursor_style));
    for (i, part) in after.split('\n').enumerate() {
        if i > 0 {
            lines.push(Line::from(std::mem::take(&mut current)));
        }
        current.push(Span::styled(part.to_string(), base));
    }
    lines.push(Line::from(current));
    lines
}

/// Card title trimmed for one-line displays
pub fn short_title(item: &BoardItem, max_cells: usize) -> String {
    unicode::truncate_to_width(item.title(), max_cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::UiConfig;
    use crate::model::geometry::Size;
    use crate::model::item::ItemKind;
    use crate::ops::board_ops;
    use crate::tui::render::test_helpers::*;

    fn vp() -> Viewport {
        Viewport::new(&UiConfig::default())
    }

    #[test]
    fn test_card_cells_scale() {
        let area = Rect::new(0, 1, 80, 22);
        let rect = geometry::Rect::new(Point::new(100.0, 40.0), Size::new(220.0, 180.0));
        assert_eq!(card_cells(&vp(), area, rect, false), Some(Rect::new(10, 3, 22, 9)));
        assert_eq!(card_cells(&vp(), area, rect, true), Some(Rect::new(10, 3, 22, 1)));
    }

    #[test]
    fn test_card_cells_clipped_and_offscreen() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = geometry::Rect::new(Point::new(-50.0, 0.0), Size::new(200.0, 160.0));
        assert_eq!(card_cells(&vp(), area, rect, false), Some(Rect::new(0, 0, 15, 8)));
        let far = geometry::Rect::new(Point::new(5000.0, 0.0), Size::new(200.0, 160.0));
        assert_eq!(card_cells(&vp(), area, far, false), None);
    }

    #[test]
    fn test_tilt_is_stable_and_bounded() {
        for id in ["PH-001", "NT-002", "EV-013", "CL-100"] {
            let t = tilt_degrees(id);
            assert!((-3..=3).contains(&t));
            assert_eq!(t, tilt_degrees(id));
        }
    }

    #[test]
    fn test_styled_segments() {
        let line =
            connection_line::line_geometry(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 20.0);
        let full = 0.0..line.render_length;
        assert_eq!(styled_segments(&line, LineStyle::Solid, 2.0, full.clone()).len(), 1);
        // [8, 4] repeats every 12 units
        assert_eq!(styled_segments(&line, LineStyle::Dashed, 2.0, full.clone()).len(), 9);
        let zig = styled_segments(&line, LineStyle::Zigzag, 2.0, full);
        assert!(zig.len() > 2);
        assert_eq!(zig.first().unwrap().0, Point::new(0.0, 0.0));
        assert_eq!(zig.last().unwrap().1, Point::new(100.0, 0.0));
    }

    #[test]
    fn test_far_away_string_draws_only_what_is_visible() {
        let line =
            connection_line::line_geometry(Point::new(0.0, 50.0), Point::new(1e8, 50.0), 20.0);
        let view = visible_board_rect(&vp(), Rect::new(0, 0, 80, 20));
        let span = connection_line::visible_span(&line, view).unwrap();
        assert_eq!(span, 0.0..810.0);
        for style in [LineStyle::Dashed, LineStyle::Dotted, LineStyle::Zigzag] {
            let segs = styled_segments(&line, style, 2.0, span.clone());
            assert!(segs.len() <= 300, "{:?}: {}", style, segs.len());
            assert!(segs.iter().all(|(_, to)| to.x <= 830.0));
        }

        let off =
            connection_line::line_geometry(Point::new(0.0, 5000.0), Point::new(1e8, 5000.0), 20.0);
        assert!(connection_line::visible_span(&off, view).is_none());
    }

    #[test]
    fn test_render_cards_and_ids() {
        let (mut app, _tmp) = app_with_items(&[
            (ItemKind::Evidence, "Bloody glove\nfound under the pier", 0.0, 0.0),
            (ItemKind::Note, "Call the harbormaster", 300.0, 0.0),
        ]);
        let output = render_to_string(TERM_W, TERM_H, |frame, area| {
            render_board_view(frame, &mut app, area);
        });
        assert!(output.contains("EV-001"));
        assert!(output.contains("Bloody glove"));
        assert!(output.contains("found under the pier"));
        assert!(output.contains("NT-002"));
        assert!(output.contains("Call the"));
        assert!(output.contains("◢"));
    }

    #[test]
    fn test_render_collapsed_is_one_row() {
        let (mut app, _tmp) =
            app_with_items(&[(ItemKind::Evidence, "Bloody glove\nsecond", 0.0, 0.0)]);
        app.apply(|board| board_ops::set_expanded(board, "EV-001", false));
        let output = render_to_string(TERM_W, TERM_H, |frame, area| {
            render_board_view(frame, &mut app, area);
        });
        let first = output.lines().next().unwrap();
        assert!(first.contains("EV-001 Bloody glove"));
        assert!(!output.contains("second"));
    }

    #[test]
    fn test_render_empty_board_hint() {
        let (mut app, _tmp) = app_with_items(&[]);
        let output = render_to_string(TERM_W, TERM_H, |frame, area| {
            render_board_view(frame, &mut app, area);
        });
        assert!(output.contains("empty board"));
    }

    #[test]
    fn test_render_records_canvas_area() {
        let (mut app, _tmp) = app_with_items(&[]);
        render_to_string(40, 10, |frame, area| {
            render_board_view(frame, &mut app, area);
        });
        assert_eq!(app.canvas_area, Rect::new(0, 0, 40, 10));
    }

    #[test]
    fn test_edit_lines_place_cursor() {
        let (mut app, _tmp) = app_with_items(&[]);
        app.edit_buffer = "ab\ncd".into();
        app.edit_cursor = 4;
        let lines = edit_lines(&app, Style::default());
        let text: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert_eq!(text, vec!["ab".to_string(), "c\u{258C}d".to_string()]);
    }

    #[test]
    fn test_display_rect_follows_drag_preview() {
        let (mut app, _tmp) = app_with_items(&[(ItemKind::Photo, "A", 0.0, 0.0)]);
        let board = app.ws.board.clone();
        app.drag
            .pointer_down(&board, 0, Point::new(10.0, 10.0), Default::default());
        app.drag.pointer_move(0, Point::new(60.0, 30.0));
        let item = app.board().item("PH-001").unwrap().clone();
        assert_eq!(display_rect(&app, &item).origin, Point::new(50.0, 20.0));
        assert_eq!(item.position, Point::new(0.0, 0.0));
    }
}
