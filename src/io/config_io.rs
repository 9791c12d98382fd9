use std::fs;
use std::path::Path;

use crate::io::board_io::BoardIoError;
use crate::model::config::BoardConfig;

/// Read board.toml, returning both the parsed config and the raw
/// toml_edit document for edits that keep the user's formatting.
pub fn read_config_doc(
    board_dir: &Path,
) -> Result<(BoardConfig, toml_edit::DocumentMut), BoardIoError> {
    let path = board_dir.join("board.toml");
    let text = fs::read_to_string(&path).map_err(|e| BoardIoError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    let config: BoardConfig = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(board_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), BoardIoError> {
    let path = board_dir.join("board.toml");
    fs::write(&path, doc.to_string()).map_err(|e| BoardIoError::WriteError { path, source: e })
}

/// Set `[globe] primary`, creating the table if needed
pub fn set_globe_primary(doc: &mut toml_edit::DocumentMut, marker_id: &str) {
    if !doc.contains_key("globe") {
        doc["globe"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["globe"]["primary"] = toml_edit::value(marker_id);
}
