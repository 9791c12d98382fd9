use ratatui::style::Color;

use crate::model::UiConfig;
use crate::model::item::{Importance, ItemKind};

/// Parsed color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    /// Board surface
    pub cork: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    /// Fallback for strings whose color doesn't parse
    pub string: Color,
    pub selected: Color,
    pub card: Color,
    pub sticky: Color,
    pub pin: Color,
    pub red: Color,
    pub yellow: Color,
    pub green: Color,
    pub search_match_bg: Color,
    pub search_match_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::Rgb(0x2B, 0x1D, 0x0E),
            cork: Color::Rgb(0x3E, 0x2A, 0x16),
            text: Color::Rgb(0xF5, 0xE6, 0xC8),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0xFF, 0xD5, 0x4F),
            dim: Color::Rgb(0x8B, 0x73, 0x55),
            string: Color::Rgb(0xD3, 0x2F, 0x2F),
            selected: Color::Rgb(0x4F, 0xC3, 0xF7),
            card: Color::Rgb(0x4A, 0x40, 0x38),
            sticky: Color::Rgb(0x6B, 0x5B, 0x1E),
            pin: Color::Rgb(0xE5, 0x39, 0x35),
            red: Color::Rgb(0xFF, 0x44, 0x44),
            yellow: Color::Rgb(0xFF, 0xD7, 0x00),
            green: Color::Rgb(0x44, 0xFF, 0x88),
            search_match_bg: Color::Rgb(0x40, 0xE0, 0xD0),
            search_match_fg: Color::Rgb(0x2B, 0x1D, 0x0E),
        }
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

impl Theme {
    /// Create a theme from board UI config, falling back to defaults
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut theme = Theme::default();

        for (key, value) in &ui.colors {
            if let Some(color) = parse_hex_color(value) {
                match key.as_str() {
                    "background" => theme.background = color,
                    "cork" => theme.cork = color,
                    "text" => theme.text = color,
                    "text_bright" => theme.text_bright = color,
                    "highlight" => theme.highlight = color,
                    "dim" => theme.dim = color,
                    "string" => theme.string = color,
                    "selected" => theme.selected = color,
                    "card" => theme.card = color,
                    "sticky" => theme.sticky = color,
                    "pin" => theme.pin = color,
                    "search_match_bg" => theme.search_match_bg = color,
                    "search_match_fg" => theme.search_match_fg = color,
                    _ => {}
                }
            }
        }

        theme
    }

    /// Color for a connection, falling back to the theme's string color
    pub fn string_color(&self, hex: &str) -> Color {
        parse_hex_color(hex).unwrap_or(self.string)
    }

    /// Card fill by kind: notes and clues are sticky notes
    pub fn card_color(&self, kind: ItemKind) -> Color {
        if kind.is_sticky() {
            self.sticky
        } else {
            self.card
        }
    }

    pub fn importance_color(&self, importance: Importance) -> Color {
        match importance {
            Importance::High => self.red,
            Importance::Medium => self.yellow,
            Importance::Low => self.green,
        }
    }
}
