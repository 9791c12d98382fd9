use serde::Serialize;

use crate::model::board::Board;
use crate::model::connection::Connection;
use crate::model::geo::GeoMarker;
use crate::model::geometry::Point;
use crate::model::item::{BoardItem, ItemMetadata};
use crate::ops::connection_line::LineGeometry;
use crate::util::unicode::truncate_to_width;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ItemJson {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ItemMetadata>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<ConnectionJson>,
}

#[derive(Serialize)]
pub struct ConnectionJson {
    pub id: String,
    pub a: String,
    pub b: String,
    pub color: String,
    pub style: String,
    pub thickness: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub animated: bool,
}

#[derive(Serialize)]
pub struct LineJson {
    pub connection: String,
    #[serde(flatten)]
    pub geometry: LineGeometry,
    pub render_end: Point,
    /// Dash pattern, empty for continuous strokes
    pub pattern: Vec<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub zigzag: Vec<Point>,
}

#[derive(Serialize)]
pub struct SearchHitJson {
    pub id: String,
    pub field: String,
    pub text: String,
}

#[derive(Serialize)]
pub struct MarkerJson {
    pub index: usize,
    pub primary: bool,
    #[serde(flatten)]
    pub marker: GeoMarker,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn item_to_json(item: &BoardItem) -> ItemJson {
    ItemJson {
        id: item.id.clone(),
        kind: item.kind.to_string(),
        title: item.title().to_string(),
        content: item.content.clone(),
        image: item.image.clone(),
        x: item.position.x,
        y: item.position.y,
        width: item.size.width,
        height: item.size.height,
        expanded: item.expanded,
        metadata: item.metadata.clone(),
        connections: Vec::new(),
    }
}

pub fn connection_to_json(conn: &Connection) -> ConnectionJson {
    ConnectionJson {
        id: conn.id.clone(),
        a: conn.a.clone(),
        b: conn.b.clone(),
        color: conn.style.color.clone(),
        style: conn.style.line.to_string(),
        thickness: conn.style.thickness,
        label: conn.style.label.clone(),
        animated: conn.style.animated,
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// Format a number without a trailing `.0` for whole values
pub fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{:.1}", v)
    }
}

/// One-line summary: `EV-003 evidence  (120, 40) 220x180  Bloody glove`
pub fn format_item_line(item: &BoardItem) -> String {
    let collapsed = if item.expanded { "" } else { " [collapsed]" };
    format!(
        "{:<7} {:<9} ({}, {}) {}x{}  {}{}",
        item.id,
        item.kind,
        fmt_num(item.position.x),
        fmt_num(item.position.y),
        fmt_num(item.size.width),
        fmt_num(item.size.height),
        truncate_to_width(item.title(), 48),
        collapsed,
    )
}

/// Detailed item view including connections
pub fn format_item_detail(board: &Board, item: &BoardItem) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", item.id, item.kind)];
    lines.push(format!(
        "position: ({}, {})",
        fmt_num(item.position.x),
        fmt_num(item.position.y)
    ));
    lines.push(format!(
        "size: {}x{}",
        fmt_num(item.size.width),
        fmt_num(item.size.height)
    ));
    if !item.expanded {
        lines.push("collapsed".to_string());
    }
    if let Some(image) = &item.image {
        lines.push(format!("image: {}", image));
    }
    if let Some(meta) = &item.metadata {
        if let Some(location) = &meta.location {
            lines.push(format!("location: {}", location));
        }
        if let Some(date) = &meta.date {
            lines.push(format!("date: {}", date));
        }
        if let Some(importance) = meta.importance {
            lines.push(format!("importance: {}", importance));
        }
        if let Some(status) = &meta.status {
            lines.push(format!("status: {}", status));
        }
    }
    if !item.content.is_empty() {
        lines.push("content:".to_string());
        for line in item.content.lines() {
            lines.push(format!("  {}", line));
        }
    }

    let conns: Vec<&Connection> = board.connections_of(&item.id).collect();
    if !conns.is_empty() {
        lines.push("connections:".to_string());
        for c in conns {
            let other = c.other_end(&item.id).unwrap_or("?");
            let label = c
                .style
                .label
                .as_ref()
                .map(|l| format!(" \"{}\"", l))
                .unwrap_or_default();
            lines.push(format!("  {} -> {}{}", c.id, other, label));
        }
    }
    lines
}

/// `C-002 EV-001 -- PH-004 (dashed, #d32f2f) "seen together"`
pub fn format_connection_line(conn: &Connection) -> String {
    let label = conn
        .style
        .label
        .as_ref()
        .map(|l| format!(" \"{}\"", l))
        .unwrap_or_default();
    format!(
        "{} {} -- {} ({}, {}){}",
        conn.id, conn.a, conn.b, conn.style.line, conn.style.color, label
    )
}

pub fn format_marker_line(index: usize, marker: &GeoMarker, primary: bool) -> String {
    let star = if primary { "*" } else { " " };
    let id = marker.id.as_deref().unwrap_or("-");
    let label = marker
        .label
        .as_ref()
        .map(|l| format!("  {}", l))
        .unwrap_or_default();
    format!(
        "{}{:>3} {:<12} {:>9.4} {:>10.4}{}",
        star, index, id, marker.lat, marker.lon, label
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::connection::{ConnectionStyle, LineStyle};
    use crate::model::geometry::Size;
    use crate::model::item::ItemKind;

    fn sample_item() -> BoardItem {
        BoardItem {
            id: "EV-003".into(),
            kind: ItemKind::Evidence,
            content: "Bloody glove\nfound under the pier".into(),
            image: None,
            position: Point::new(120.0, -40.5),
            size: Size::new(220.0, 180.0),
            metadata: None,
            expanded: true,
            selected: false,
        }
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(120.0), "120");
        assert_eq!(fmt_num(-40.5), "-40.5");
        assert_eq!(fmt_num(2.34), "2.3");
    }

    #[test]
    fn test_format_item_line() {
        insta::assert_snapshot!(
            format_item_line(&sample_item()),
            @"EV-003  evidence  (120, -40.5) 220x180  Bloody glove"
        );
    }

    #[test]
    fn test_format_connection_line() {
        let conn = Connection {
            id: "C-002".into(),
            a: "EV-001".into(),
            b: "PH-004".into(),
            style: ConnectionStyle {
                line: LineStyle::Dashed,
                label: Some("seen together".into()),
                ..Default::default()
            },
        };
        insta::assert_snapshot!(
            format_connection_line(&conn),
            @r#"C-002 EV-001 -- PH-004 (dashed, #d32f2f) "seen together""#
        );
    }

    #[test]
    fn test_item_json_shape() {
        let json = serde_json::to_value(item_to_json(&sample_item())).unwrap();
        assert_eq!(json["title"], "Bloody glove");
        assert_eq!(json["kind"], "evidence");
        assert!(json.get("connections").is_none());
        assert!(json.get("image").is_none());
    }
}
