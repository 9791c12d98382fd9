//! Geometry for drawing a string between two points.
//!
//! Nothing here touches the board; `connection_geometry` only reads the
//! current item centres.

use std::ops::Range;

use serde::Serialize;

use crate::model::board::Board;
use crate::model::connection::{Connection, LineStyle};
use crate::model::geometry::{Point, Rect};

/// Zigzag offset and spacing at thickness 2; both scale with thickness
pub const ZIGZAG_AMPLITUDE: f64 = 6.0;
pub const ZIGZAG_STEP: f64 = 12.0;

/// Most zigzag vertices or dashes generated for one span. Longer spans get
/// a stretched pattern.
pub const MAX_PATTERN_STEPS: usize = 4096;

/// Computed line between two endpoints
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineGeometry {
    pub start: Point,
    pub end: Point,
    pub dx: f64,
    pub dy: f64,
    /// True distance between the endpoints
    pub length: f64,
    /// Length actually drawn, never below the configured minimum
    pub render_length: f64,
    pub angle_rad: f64,
    pub angle_deg: f64,
    pub midpoint: Point,
}

impl LineGeometry {
    /// Point `along` units from `start` in the line's direction
    pub fn point_at(&self, along: f64) -> Point {
        Point::new(
            self.start.x + along * self.angle_rad.cos(),
            self.start.y + along * self.angle_rad.sin(),
        )
    }

    /// Far end of the drawn segment: `start` plus `render_length` along the angle
    pub fn render_end(&self) -> Point {
        self.point_at(self.render_length)
    }
}

/// Line from `start` to `end`. Coincident endpoints give angle 0, so the
/// minimum-length segment is drawn horizontally.
pub fn line_geometry(start: Point, end: Point, min_length: f64) -> LineGeometry {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length = (dx * dx + dy * dy).sqrt();
    let angle_rad = dy.atan2(dx);
    LineGeometry {
        start,
        end,
        dx,
        dy,
        length,
        render_length: length.max(min_length),
        angle_rad,
        angle_deg: angle_rad.to_degrees(),
        midpoint: Point::new(start.x + dx / 2.0, start.y + dy / 2.0),
    }
}

/// Distances along the drawn segment that fall inside `view`, or None when
/// the segment misses it (Liang-Barsky).
pub fn visible_span(line: &LineGeometry, view: Rect) -> Option<Range<f64>> {
    let (ux, uy) = (line.angle_rad.cos(), line.angle_rad.sin());
    let (mut lo, mut hi) = (0.0_f64, line.render_length);
    for (p, q) in [
        (-ux, line.start.x - view.origin.x),
        (ux, view.right() - line.start.x),
        (-uy, line.start.y - view.origin.y),
        (uy, view.bottom() - line.start.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            lo = lo.max(q / p);
        } else {
            hi = hi.min(q / p);
        }
    }
    (lo <= hi).then_some(lo..hi)
}

/// Line between the centres of a connection's two items, or `None` if
/// either item is gone
pub fn connection_geometry(
    board: &Board,
    connection: &Connection,
    min_length: f64,
) -> Option<LineGeometry> {
    let a = board.item_center(&connection.a)?;
    let b = board.item_center(&connection.b)?;
    Some(line_geometry(a, b, min_length))
}

/// Dash pattern as alternating on/off lengths. Empty means a continuous
/// stroke. Zigzag strokes are continuous; their shape comes from
/// `zigzag_points`.
pub fn stroke_pattern(style: LineStyle, thickness: f64) -> Vec<f64> {
    let scale = thickness.max(1.0) / 2.0;
    match style {
        LineStyle::Solid | LineStyle::Zigzag => Vec::new(),
        LineStyle::Dashed => vec![8.0 * scale, 4.0 * scale],
        LineStyle::Dotted => vec![2.0 * scale, 4.0 * scale],
    }
}

/// Polyline along the drawn segment, alternating perpendicular offsets of
/// `amplitude` every `step` units. Always starts at `start` and ends at
/// `render_end()`.
pub fn zigzag_points(line: &LineGeometry, amplitude: f64, step: f64) -> Vec<Point> {
    zigzag_points_in(line, amplitude, step, 0.0..line.render_length)
}

/// The zigzag vertices covering `span`, plus one vertex either side so the
/// polyline reaches the span's ends. Vertex `k` sits `k * step` along the
/// line, so a clipped zigzag lines up with the full one.
pub fn zigzag_points_in(
    line: &LineGeometry,
    amplitude: f64,
    step: f64,
    span: Range<f64>,
) -> Vec<Point> {
    let end = line.render_end();
    let (from, to) = (span.start.max(0.0), span.end.min(line.render_length));
    if to < from {
        return Vec::new();
    }
    if step <= 0.0 || line.render_length <= step {
        return vec![line.start, end];
    }
    let step = step.max((to - from) / MAX_PATTERN_STEPS as f64);
    let (ux, uy) = (line.angle_rad.cos(), line.angle_rad.sin());
    // Perpendicular, rotated a quarter turn
    let (nx, ny) = (-uy, ux);

    let first = (from / step).floor() as u64;
    let last = (to / step).ceil() as u64;
    (first..=last)
        .map(|k| {
            let along = k as f64 * step;
            if k == 0 {
                line.start
            } else if along >= line.render_length {
                end
            } else {
                let side = if k % 2 == 1 { 1.0 } else { -1.0 };
                Point::new(
                    line.start.x + ux * along + nx * amplitude * side,
                    line.start.y + uy * along + ny * amplitude * side,
                )
            }
        })
        .collect()
}

/// Zigzag polyline over `span` using the default amplitude and step for
/// `thickness`
pub fn zigzag_for(line: &LineGeometry, thickness: f64, span: Range<f64>) -> Vec<Point> {
    let scale = thickness.max(1.0) / 2.0;
    zigzag_points_in(line, ZIGZAG_AMPLITUDE * scale, ZIGZAG_STEP * scale, span)
}

/// Split the drawn segment into the visible pieces of a dash pattern
pub fn dash_segments(line: &LineGeometry, pattern: &[f64]) -> Vec<(Point, Point)> {
    dash_segments_in(line, pattern, 0.0..line.render_length)
}

/// Dash pieces inside `span`. The pattern is phased from `start` so a
/// clipped line dashes the same as the full one.
pub fn dash_segments_in(
    line: &LineGeometry,
    pattern: &[f64],
    span: Range<f64>,
) -> Vec<(Point, Point)> {
    let at = |d: f64| line.point_at(d);
    let (from, to) = (span.start.max(0.0), span.end.min(line.render_length));
    if to <= from {
        return Vec::new();
    }
    let period: f64 = pattern.iter().map(|p| p.max(0.0)).sum();
    if period <= 0.0 {
        return vec![(at(from), at(to))];
    }

    let pieces = (to - from) / period * pattern.len() as f64;
    let stretch = (pieces / MAX_PATTERN_STEPS as f64).max(1.0);
    let mut along = (from / (period * stretch)).floor() * period * stretch;
    let mut segments = Vec::new();
    for (idx, len) in pattern.iter().map(|p| p.max(0.0) * stretch).cycle().enumerate() {
        if along >= to {
            break;
        }
        let stop = along + len;
        let (a, b) = (along.max(from), stop.min(to));
        if idx % 2 == 0 && b > a {
            segments.push((at(a), at(b)));
        }
        along = stop;
    }
    segments
}
