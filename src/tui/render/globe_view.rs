use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Line as CanvasLine, Points};
use ratatui::widgets::{Block, Paragraph};

use crate::ops::globe::{self, Vec3};
use crate::tui::app::App;
use crate::tui::theme::parse_hex_color;

/// Room around the sphere for lifted arcs
const MARGIN: f64 = 1.3;

/// Canvas half-extents `(x, y)` that keep the sphere round, given that a
/// terminal cell is about twice as tall as it is wide.
pub fn globe_bounds(area: Rect, radius: f64) -> (f64, f64) {
    let extent = radius * MARGIN;
    if area.width == 0 || area.height == 0 {
        return (extent, extent);
    }
    let aspect = f64::from(area.width) / (2.0 * f64::from(area.height));
    if aspect >= 1.0 {
        (extent * aspect, extent)
    } else {
        (extent, extent / aspect)
    }
}

/// Screen position of a sphere point under the current rotation, or None
/// when it faces away
pub fn to_screen(p: Vec3, yaw: f64, pitch: f64) -> Option<(f64, f64)> {
    globe::orthographic(globe::view_transform(p, yaw, pitch))
}

/// Render the globe: outline, star arcs from the primary marker, markers
pub fn render_globe_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    frame.render_widget(Block::default().style(Style::default().bg(bg)), area);

    let cfg = &app.ws.config.globe;
    let markers = &app.board().markers;
    let arcs = match globe::star_arcs(
        markers,
        cfg.primary.as_deref(),
        cfg.radius,
        cfg.arc_segments,
        cfg.arc_lift,
    ) {
        Ok(arcs) => arcs,
        Err(e) => {
            let msg = Paragraph::new(Line::from(Span::styled(
                format!("globe: {}", e),
                Style::default().fg(app.theme.red).bg(bg),
            )));
            frame.render_widget(msg, area);
            return;
        }
    };

    let (yaw, pitch) = (app.globe_yaw, app.globe_pitch);
    let mut segments: Vec<((f64, f64), (f64, f64))> = Vec::new();
    for arc in &arcs {
        for pair in arc.points.windows(2) {
            let ends = (to_screen(pair[0], yaw, pitch), to_screen(pair[1], yaw, pitch));
            if let (Some(a), Some(b)) = ends {
                segments.push((a, b));
            }
        }
    }

    let primary_idx = match &cfg.primary {
        Some(id) => markers.iter().position(|m| m.id.as_deref() == Some(id.as_str())),
        None => (!markers.is_empty()).then_some(0),
    };
    let mut dots: Vec<((f64, f64), Color, String, bool)> = Vec::new();
    for (idx, m) in markers.iter().enumerate() {
        let p = globe::project(m.lat, m.lon, cfg.radius);
        if let Some(xy) = to_screen(p, yaw, pitch) {
            let color = parse_hex_color(&m.color).unwrap_or(app.theme.highlight);
            dots.push((xy, color, m.display_name(), Some(idx) == primary_idx));
        }
    }

    let (rx, ry) = globe_bounds(area, cfg.radius);
    let radius = cfg.radius;
    let outline = app.theme.dim;
    let arc_color = app.theme.string;
    let label_color = app.theme.text;
    let primary_color = app.theme.highlight;
    let canvas = Canvas::default()
        .background_color(bg)
        .marker(Marker::Braille)
        .x_bounds([-rx, rx])
        .y_bounds([-ry, ry])
        .paint(|ctx| {
            ctx.draw(&Circle {
                x: 0.0,
                y: 0.0,
                radius,
                color: outline,
            });
            for (a, b) in &segments {
                ctx.draw(&CanvasLine {
                    x1: a.0,
                    y1: a.1,
                    x2: b.0,
                    y2: b.1,
                    color: arc_color,
                });
            }
            ctx.layer();
            for ((x, y), color, name, primary) in &dots {
                ctx.draw(&Points {
                    coords: &[(*x, *y)],
                    color: *color,
                });
                let style = Style::default().fg(if *primary { primary_color } else { label_color });
                let text = if *primary {
                    format!(" *{}", name)
                } else {
                    format!(" {}", name)
                };
                ctx.print(*x, *y, Line::styled(text, style));
            }
        });
    frame.render_widget(canvas, area);

    if markers.is_empty() {
        let hint = Paragraph::new(Line::from(Span::styled(
            "no markers: add some with `cb marker add <lat> <lon>`",
            Style::default().fg(app.theme.dim).bg(bg),
        )));
        frame.render_widget(hint, Rect::new(area.x + 1, area.y, area.width.saturating_sub(1), 1));
    }
}
