use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::connection::{ConnectionStyle, DEFAULT_STRING_COLOR, LineStyle};
use super::geometry::Size;
use super::item::{MIN_ITEM_HEIGHT, MIN_ITEM_WIDTH};

/// Configuration from board.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub board: BoardInfo,
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub connections: ConnectionConfig,
    #[serde(default)]
    pub globe: GlobeConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardInfo {
    pub name: String,
}

impl BoardConfig {
    pub fn named(name: &str) -> Self {
        BoardConfig {
            board: BoardInfo {
                name: name.to_string(),
            },
            geometry: GeometryConfig::default(),
            connections: ConnectionConfig::default(),
            globe: GlobeConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

/// Size floor and hit-test tolerances for items
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    #[serde(default = "default_min_width")]
    pub min_width: f64,
    #[serde(default = "default_min_height")]
    pub min_height: f64,
    /// Side of the square resize handle at an item's bottom-right corner
    #[serde(default = "default_resize_handle")]
    pub resize_handle: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        GeometryConfig {
            min_width: default_min_width(),
            min_height: default_min_height(),
            resize_handle: default_resize_handle(),
        }
    }
}

impl GeometryConfig {
    /// The size floor in force. board.toml can raise it above 160x120 but
    /// never lower it; non-finite values fall back to the built-in floor.
    pub fn min_size(&self) -> Size {
        Size::new(
            raise_floor(self.min_width, MIN_ITEM_WIDTH),
            raise_floor(self.min_height, MIN_ITEM_HEIGHT),
        )
    }

    /// Copy with the minimums replaced by `min_size` and a usable handle
    pub fn normalized(self) -> Self {
        let min = self.min_size();
        GeometryConfig {
            min_width: min.width,
            min_height: min.height,
            resize_handle: if self.resize_handle.is_finite() && self.resize_handle > 0.0 {
                self.resize_handle
            } else {
                default_resize_handle()
            },
        }
    }
}

fn raise_floor(value: f64, floor: f64) -> f64 {
    if value.is_finite() {
        value.max(floor)
    } else {
        floor
    }
}

fn default_min_width() -> f64 {
    MIN_ITEM_WIDTH
}

fn default_min_height() -> f64 {
    MIN_ITEM_HEIGHT
}

fn default_resize_handle() -> f64 {
    16.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Shortest segment the renderer draws, even for coincident endpoints
    #[serde(default = "default_min_line_length")]
    pub min_line_length: f64,
    #[serde(default = "default_string_color")]
    pub color: String,
    #[serde(default)]
    pub style: LineStyle,
    #[serde(default = "default_thickness")]
    pub thickness: f64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            min_line_length: default_min_line_length(),
            color: default_string_color(),
            style: LineStyle::Solid,
            thickness: default_thickness(),
        }
    }
}

impl ConnectionConfig {
    /// Style for new connections that don't specify their own
    pub fn default_style(&self) -> ConnectionStyle {
        ConnectionStyle {
            color: self.color.clone(),
            line: self.style,
            thickness: self.thickness,
            label: None,
            animated: false,
        }
    }
}

fn default_min_line_length() -> f64 {
    20.0
}

fn default_string_color() -> String {
    DEFAULT_STRING_COLOR.to_string()
}

fn default_thickness() -> f64 {
    2.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobeConfig {
    #[serde(default = "default_radius")]
    pub radius: f64,
    /// How far above the surface arc midpoints are lifted (1.15 = 15%)
    #[serde(default = "default_arc_lift")]
    pub arc_lift: f64,
    #[serde(default = "default_arc_segments")]
    pub arc_segments: usize,
    /// Marker ID that arcs fan out from. First marker when unset.
    #[serde(default)]
    pub primary: Option<String>,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        GlobeConfig {
            radius: default_radius(),
            arc_lift: default_arc_lift(),
            arc_segments: default_arc_segments(),
            primary: None,
        }
    }
}

fn default_radius() -> f64 {
    1.0
}

fn default_arc_lift() -> f64 {
    1.15
}

fn default_arc_segments() -> usize {
    64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Board units per terminal column
    #[serde(default = "default_scale_x")]
    pub scale_x: f64,
    /// Board units per terminal row
    #[serde(default = "default_scale_y")]
    pub scale_y: f64,
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            scale_x: default_scale_x(),
            scale_y: default_scale_y(),
            colors: HashMap::new(),
        }
    }
}

fn default_scale_x() -> f64 {
    10.0
}

fn default_scale_y() -> f64 {
    20.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config: BoardConfig = toml::from_str("[board]\nname = \"Case 42\"\n").unwrap();
        assert_eq!(config.board.name, "Case 42");
        assert_eq!(config.geometry, GeometryConfig::default());
        assert_eq!(config.connections.min_line_length, 20.0);
        assert_eq!(config.globe.arc_segments, 64);
        assert_eq!(config.globe.arc_lift, 1.15);
        assert!(config.globe.primary.is_none());
        assert_eq!(config.ui.scale_x, 10.0);
    }

    #[test]
    fn test_partial_sections() {
        let config: BoardConfig = toml::from_str(
            r##"
[board]
name = "x"

[connections]
style = "dashed"
color = "#00ff00"

[globe]
primary = "hq"
"##,
        )
        .unwrap();
        let style = config.connections.default_style();
        assert_eq!(style.line, LineStyle::Dashed);
        assert_eq!(style.color, "#00ff00");
        assert_eq!(style.thickness, 2.0);
        assert_eq!(config.globe.primary.as_deref(), Some("hq"));
        assert_eq!(config.globe.radius, 1.0);
    }

    #[test]
    fn test_configured_floor_only_raises() {
        let config: BoardConfig = toml::from_str(
            r#"
[board]
name = "x"

[geometry]
min_width = nan
min_height = 10.0
resize_handle = -4.0
"#,
        )
        .unwrap();
        assert_eq!(config.geometry.min_size(), Size::new(160.0, 120.0));
        let geometry = config.geometry.normalized();
        assert_eq!(
            (geometry.min_width, geometry.min_height, geometry.resize_handle),
            (160.0, 120.0, 16.0)
        );

        let raised = GeometryConfig {
            min_width: 200.0,
            min_height: f64::INFINITY,
            resize_handle: 16.0,
        };
        assert_eq!(raised.min_size(), Size::new(200.0, 120.0));
    }
}
