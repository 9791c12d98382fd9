use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Persisted TUI state (written to .state.json)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UiState {
    /// Which view is showing ("board" or "globe")
    pub view: String,
    /// Board coordinate at the top-left of the viewport
    #[serde(default)]
    pub pan_x: f64,
    #[serde(default)]
    pub pan_y: f64,
    /// Items selected when the TUI last exited
    #[serde(default)]
    pub selected: Vec<String>,
    #[serde(default)]
    pub last_search: Option<String>,
    /// Globe rotation in radians
    #[serde(default)]
    pub globe_yaw: f64,
    #[serde(default)]
    pub globe_pitch: f64,
}

/// Read .state.json from the board directory
pub fn read_ui_state(board_dir: &Path) -> Option<UiState> {
    let content = fs::read_to_string(board_dir.join(".state.json")).ok()?;
    serde_json::from_str(&content).ok()
}

/// Write .state.json to the board directory
pub fn write_ui_state(board_dir: &Path, state: &UiState) -> Result<(), std::io::Error> {
    let content = serde_json::to_string_pretty(state)?;
    fs::write(board_dir.join(".state.json"), content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let state = UiState {
            view: "globe".into(),
            pan_x: -120.0,
            pan_y: 40.0,
            selected: vec!["EV-003".into()],
            last_search: Some("docks".into()),
            globe_yaw: 0.5,
            globe_pitch: -0.25,
        };
        write_ui_state(dir.path(), &state).unwrap();
        assert_eq!(read_ui_state(dir.path()), Some(state));
    }

    #[test]
    fn read_missing_or_malformed_returns_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_ui_state(dir.path()).is_none());
        fs::write(dir.path().join(".state.json"), "not json {{{").unwrap();
        assert!(read_ui_state(dir.path()).is_none());
    }

    #[test]
    fn serde_defaults_on_minimal_object() {
        let state: UiState = serde_json::from_str(r#"{"view":"board"}"#).unwrap();
        assert_eq!(state.view, "board");
        assert_eq!(state.pan_x, 0.0);
        assert!(state.selected.is_empty());
        assert!(state.last_search.is_none());
    }
}
