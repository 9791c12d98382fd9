use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::config::GeometryConfig;
use super::connection::Connection;
use super::geo::GeoMarker;
use super::geometry::{Point, Size};
use super::item::BoardItem;

/// Change notifications queued by every mutation, drained by the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoardEvent {
    ItemAdded { id: String },
    ItemRemoved { id: String },
    PositionChanged { id: String, position: Point },
    SizeChanged { id: String, size: Size },
    ContentChanged { id: String },
    ConnectionCreated { id: String, a: String, b: String },
    ConnectionRemoved { id: String, a: String, b: String },
    SelectionChanged { id: Option<String> },
    ExpandedChanged { id: String, expanded: bool },
    Reordered { id: String },
}

impl std::fmt::Display for BoardEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardEvent::ItemAdded { id } => write!(f, "item {} added", id),
            BoardEvent::ItemRemoved { id } => write!(f, "item {} removed", id),
            BoardEvent::PositionChanged { id, position } => {
                write!(f, "item {} moved to ({}, {})", id, position.x, position.y)
            }
            BoardEvent::SizeChanged { id, size } => {
                write!(f, "item {} resized to {}x{}", id, size.width, size.height)
            }
            BoardEvent::ContentChanged { id } => write!(f, "item {} content changed", id),
            BoardEvent::ConnectionCreated { id, a, b } => {
                write!(f, "connection {} created ({} - {})", id, a, b)
            }
            BoardEvent::ConnectionRemoved { id, a, b } => {
                write!(f, "connection {} removed ({} - {})", id, a, b)
            }
            BoardEvent::SelectionChanged { id: Some(id) } => write!(f, "item {} selected", id),
            BoardEvent::SelectionChanged { id: None } => write!(f, "selection cleared"),
            BoardEvent::ExpandedChanged { id, expanded } => {
                let state = if *expanded { "expanded" } else { "collapsed" };
                write!(f, "item {} {}", id, state)
            }
            BoardEvent::Reordered { id } => write!(f, "item {} brought to front", id),
        }
    }
}

/// Which part of an item a point falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle,
}

/// On-disk shape of a board (board.json). Items are stored bottom to top.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardDocument {
    #[serde(default)]
    pub items: Vec<BoardItem>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub markers: Vec<GeoMarker>,
    #[serde(default)]
    pub next_item_seq: usize,
    #[serde(default)]
    pub next_connection_seq: usize,
}

/// The authoritative set of items and connections.
///
/// Items and connections are only mutated through `ops::board_ops`, which
/// keeps the cascade invariant and queues a `BoardEvent` per change. The
/// item map's order is the z-order: later entries are drawn on top.
#[derive(Debug, Clone)]
pub struct Board {
    pub(crate) items: IndexMap<String, BoardItem>,
    pub(crate) connections: Vec<Connection>,
    /// Globe dataset, unrelated to items
    pub markers: Vec<GeoMarker>,
    pub(crate) next_item_seq: usize,
    pub(crate) next_connection_seq: usize,
    pub(crate) limits: GeometryConfig,
    pub(crate) events: Vec<BoardEvent>,
}

impl Default for Board {
    fn default() -> Self {
        Board::new(GeometryConfig::default())
    }
}

impl Board {
    pub fn new(limits: GeometryConfig) -> Self {
        Board {
            items: IndexMap::new(),
            connections: Vec::new(),
            markers: Vec::new(),
            next_item_seq: 1,
            next_connection_seq: 1,
            limits: limits.normalized(),
            events: Vec::new(),
        }
    }

    /// Rebuild a board from stored data.
    ///
    /// Connections are taken as-is, even if an endpoint is missing; use
    /// `board_ops::prune_dangling` to repair. Sequences are bumped past any
    /// numeric ID suffix already present so restored IDs are never reissued.
    pub fn from_document(doc: BoardDocument, limits: GeometryConfig) -> Self {
        let mut board = Board::new(limits);
        let max_item = doc.items.iter().filter_map(|i| id_number(&i.id)).max();
        let max_conn = doc.connections.iter().filter_map(|c| id_number(&c.id)).max();
        board.next_item_seq = doc.next_item_seq.max(max_item.map_or(1, |n| n + 1));
        board.next_connection_seq = doc
            .next_connection_seq
            .max(max_conn.map_or(1, |n| n + 1));
        for item in doc.items {
            board.items.insert(item.id.clone(), item);
        }
        board.connections = doc.connections;
        board.markers = doc.markers;
        board
    }

    pub fn to_document(&self) -> BoardDocument {
        BoardDocument {
            items: self.items.values().cloned().collect(),
            connections: self.connections.clone(),
            markers: self.markers.clone(),
            next_item_seq: self.next_item_seq,
            next_connection_seq: self.next_connection_seq,
        }
    }

    pub fn limits(&self) -> &GeometryConfig {
        &self.limits
    }

    pub fn item(&self, id: &str) -> Option<&BoardItem> {
        self.items.get(id)
    }

    pub fn contains_item(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Items bottom to top
    pub fn items(&self) -> impl Iterator<Item = &BoardItem> {
        self.items.values()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// Connections with `item_id` as an endpoint
    pub fn connections_of<'a>(&'a self, item_id: &'a str) -> impl Iterator<Item = &'a Connection> {
        self.connections.iter().filter(move |c| c.touches(item_id))
    }

    /// IDs of every item with the selected flag set
    pub fn selected_ids(&self) -> Vec<&str> {
        self.items
            .values()
            .filter(|i| i.selected)
            .map(|i| i.id.as_str())
            .collect()
    }

    /// Centre of the item's rectangle; connection lines attach here
    pub fn item_center(&self, id: &str) -> Option<Point> {
        self.items.get(id).map(BoardItem::center)
    }

    /// Topmost item under the point
    pub fn item_at(&self, p: Point) -> Option<&BoardItem> {
        self.items.values().rev().find(|item| item.rect().contains(p))
    }

    /// Topmost item under the point and which part of it was hit
    pub fn hit_test(&self, p: Point) -> Option<(&BoardItem, HitPart)> {
        let item = self.item_at(p)?;
        let rect = item.rect();
        let handle = self.limits.resize_handle;
        let part = if item.expanded && p.x >= rect.right() - handle && p.y >= rect.bottom() - handle
        {
            HitPart::ResizeHandle
        } else {
            HitPart::Body
        };
        Some((item, part))
    }

    /// Drain queued change events
    pub fn take_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub(crate) fn emit(&mut self, event: BoardEvent) {
        self.events.push(event);
    }
}

/// Numeric suffix of an ID like `EV-012` or `C-3`
fn id_number(id: &str) -> Option<usize> {
    id.rsplit('-').next()?.parse().ok()
}
