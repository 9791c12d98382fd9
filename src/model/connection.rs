use serde::{Deserialize, Serialize};

/// Stroke pattern of a connection. Never affects geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Zigzag,
}

impl LineStyle {
    pub fn parse_style(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "solid" => Some(LineStyle::Solid),
            "dashed" => Some(LineStyle::Dashed),
            "dotted" => Some(LineStyle::Dotted),
            "zigzag" => Some(LineStyle::Zigzag),
            _ => None,
        }
    }
}

impl std::fmt::Display for LineStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineStyle::Solid => write!(f, "solid"),
            LineStyle::Dashed => write!(f, "dashed"),
            LineStyle::Dotted => write!(f, "dotted"),
            LineStyle::Zigzag => write!(f, "zigzag"),
        }
    }
}

pub const DEFAULT_STRING_COLOR: &str = "#d32f2f";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStyle {
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub line: LineStyle,
    #[serde(default = "default_thickness")]
    pub thickness: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Pulsing highlight in the renderer; no other meaning
    #[serde(default)]
    pub animated: bool,
}

fn default_color() -> String {
    DEFAULT_STRING_COLOR.to_string()
}

fn default_thickness() -> f64 {
    2.0
}

impl Default for ConnectionStyle {
    fn default() -> Self {
        ConnectionStyle {
            color: default_color(),
            line: LineStyle::Solid,
            thickness: default_thickness(),
            label: None,
            animated: false,
        }
    }
}

/// An undirected link between two board items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub a: String,
    pub b: String,
    #[serde(flatten)]
    pub style: ConnectionStyle,
}

impl Connection {
    /// Does either endpoint reference `item_id`?
    pub fn touches(&self, item_id: &str) -> bool {
        self.a == item_id || self.b == item_id
    }

    /// Does this connection join `x` and `y`, in either order?
    pub fn joins(&self, x: &str, y: &str) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }

    /// The endpoint opposite `item_id`, if `item_id` is an endpoint
    pub fn other_end(&self, item_id: &str) -> Option<&str> {
        if self.a == item_id {
            Some(&self.b)
        } else if self.b == item_id {
            Some(&self.a)
        } else {
            None
        }
    }
}
