use serde::{Deserialize, Serialize};

use super::geometry::{Point, Rect, Size};

/// Smallest width an item can be resized to
pub const MIN_ITEM_WIDTH: f64 = 160.0;
/// Smallest height an item can be resized to
pub const MIN_ITEM_HEIGHT: f64 = 120.0;

/// What a board item represents. Only affects default size and presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Photo,
    Note,
    Document,
    Wanted,
    Evidence,
    Location,
    Clue,
}

impl ItemKind {
    pub const ALL: [ItemKind; 7] = [
        ItemKind::Photo,
        ItemKind::Note,
        ItemKind::Document,
        ItemKind::Wanted,
        ItemKind::Evidence,
        ItemKind::Location,
        ItemKind::Clue,
    ];

    /// Size used when an item is added without an explicit size
    pub fn default_size(self) -> Size {
        match self {
            ItemKind::Photo => Size::new(220.0, 180.0),
            ItemKind::Note => Size::new(200.0, 160.0),
            ItemKind::Document => Size::new(240.0, 200.0),
            ItemKind::Wanted => Size::new(220.0, 260.0),
            ItemKind::Evidence => Size::new(220.0, 180.0),
            ItemKind::Location => Size::new(200.0, 160.0),
            ItemKind::Clue => Size::new(180.0, 140.0),
        }
    }

    /// Prefix of generated item IDs (`EV-004`)
    pub fn id_prefix(self) -> &'static str {
        match self {
            ItemKind::Photo => "PH",
            ItemKind::Note => "NT",
            ItemKind::Document => "DC",
            ItemKind::Wanted => "WN",
            ItemKind::Evidence => "EV",
            ItemKind::Location => "LC",
            ItemKind::Clue => "CL",
        }
    }

    /// Notes and clues are drawn as sticky notes, everything else as a pinned card
    pub fn is_sticky(self) -> bool {
        matches!(self, ItemKind::Note | ItemKind::Clue)
    }

    pub fn parse_kind(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "photo" => Some(ItemKind::Photo),
            "note" => Some(ItemKind::Note),
            "document" | "doc" => Some(ItemKind::Document),
            "wanted" => Some(ItemKind::Wanted),
            "evidence" => Some(ItemKind::Evidence),
            "location" => Some(ItemKind::Location),
            "clue" => Some(ItemKind::Clue),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemKind::Photo => "photo",
            ItemKind::Note => "note",
            ItemKind::Document => "document",
            ItemKind::Wanted => "wanted",
            ItemKind::Evidence => "evidence",
            ItemKind::Location => "location",
            ItemKind::Clue => "clue",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    pub fn parse_importance(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Some(Importance::High),
            "medium" => Some(Importance::Medium),
            "low" => Some(Importance::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Importance::High => write!(f, "high"),
            Importance::Medium => write!(f, "medium"),
            Importance::Low => write!(f, "low"),
        }
    }
}

/// Free-form annotation shown on a card. Presentational only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<Importance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ItemMetadata {
    pub fn is_empty(&self) -> bool {
        self.location.is_none()
            && self.date.is_none()
            && self.importance.is_none()
            && self.status.is_none()
    }
}

/// A card or note placed on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardItem {
    pub id: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub position: Point,
    pub size: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ItemMetadata>,
    /// Collapsed items show only their title bar
    #[serde(default = "default_true")]
    pub expanded: bool,
    /// Transient UI flag, never persisted
    #[serde(skip)]
    pub selected: bool,
}

fn default_true() -> bool {
    true
}

impl BoardItem {
    pub fn rect(&self) -> Rect {
        Rect::new(self.position, self.size)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// First line of the content, used as the card title
    pub fn title(&self) -> &str {
        self.content.lines().next().unwrap_or("")
    }
}

/// Request to place a new item. The board assigns the ID.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub kind: ItemKind,
    pub content: String,
    pub image: Option<String>,
    pub position: Point,
    /// `None` uses the kind's default size
    pub size: Option<Size>,
    pub metadata: Option<ItemMetadata>,
}

impl NewItem {
    pub fn new(kind: ItemKind, content: impl Into<String>, position: Point) -> Self {
        NewItem {
            kind,
            content: content.into(),
            image: None,
            position,
            size: None,
            metadata: None,
        }
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_metadata(mut self, metadata: ItemMetadata) -> Self {
        self.metadata = if metadata.is_empty() {
            None
        } else {
            Some(metadata)
        };
        self
    }
}
