use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GeoError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("no marker with id {0}")]
    UnknownMarker(String),
}

/// A geographic point shown on the globe. Independent of board items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoMarker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Degrees, north positive
    pub lat: f64,
    /// Degrees, east positive
    pub lon: f64,
    #[serde(default = "default_marker_color")]
    pub color: String,
    #[serde(default = "default_marker_size")]
    pub size: f64,
}

fn default_marker_color() -> String {
    "#ffb300".to_string()
}

fn default_marker_size() -> f64 {
    1.0
}

impl GeoMarker {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoMarker {
            id: None,
            label: None,
            lat,
            lon,
            color: default_marker_color(),
            size: default_marker_size(),
        }
    }

    /// Range check done by the host before a marker is stored.
    /// NaN fails both comparisons and is rejected too.
    pub fn validate(&self) -> Result<(), GeoError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(GeoError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(GeoError::LongitudeOutOfRange(self.lon));
        }
        Ok(())
    }

    /// Label, falling back to ID, falling back to coordinates
    pub fn display_name(&self) -> String {
        self.label
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| format!("{:.2},{:.2}", self.lat, self.lon))
    }
}
