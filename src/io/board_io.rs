use std::fs;
use std::path::{Path, PathBuf};

use crate::io::journal::{self, JournalCategory, JournalEntry};
use crate::model::board::{Board, BoardDocument, BoardEvent};
use crate::model::config::BoardConfig;

/// Name of the directory holding a board's files
pub const BOARD_DIR: &str = "corkboard";

#[derive(Debug, thiserror::Error)]
pub enum BoardIoError {
    #[error("not a corkboard: no corkboard/ directory found")]
    NotABoard,
    #[error("a board already exists at {0}")]
    AlreadyExists(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse board.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit board.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("could not parse {path}: {source}")]
    DataParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize board: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A board loaded from disk together with its configuration
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Directory containing `corkboard/`
    pub root: PathBuf,
    pub board_dir: PathBuf,
    pub config: BoardConfig,
    pub board: Board,
}

impl Workspace {
    /// Drain pending events, write board.json, and journal the events.
    ///
    /// Events are journaled only once the write succeeded; on failure the
    /// unsaved board is kept in the journal instead.
    pub fn save(&mut self) -> Result<Vec<BoardEvent>, BoardIoError> {
        let events = self.board.take_events();
        save_board(&self.board_dir, &self.board)?;
        journal::log_events(&self.board_dir, &events);
        Ok(events)
    }
}

/// Walk up from `start` looking for a `corkboard/` directory with a board.toml.
pub fn discover_board(start: &Path) -> Result<PathBuf, BoardIoError> {
    let mut current = start.to_path_buf();
    loop {
        let board_dir = current.join(BOARD_DIR);
        if board_dir.is_dir() && board_dir.join("board.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(BoardIoError::NotABoard);
        }
    }
}

/// Create `corkboard/` under `root` with the given config text and an
/// empty board. Returns the board directory.
pub fn init_board(root: &Path, config_text: &str) -> Result<PathBuf, BoardIoError> {
    let board_dir = root.join(BOARD_DIR);
    if board_dir.join("board.toml").exists() {
        return Err(BoardIoError::AlreadyExists(board_dir));
    }
    fs::create_dir_all(&board_dir)?;
    fs::write(board_dir.join("board.toml"), config_text)?;
    save_board(&board_dir, &Board::default())?;
    Ok(board_dir)
}

pub fn read_config(board_dir: &Path) -> Result<BoardConfig, BoardIoError> {
    let path = board_dir.join("board.toml");
    let text = fs::read_to_string(&path).map_err(|e| BoardIoError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    let mut config: BoardConfig = toml::from_str(&text)?;
    config.geometry = config.geometry.normalized();
    Ok(config)
}

/// Load config and board from the workspace root.
///
/// A missing board.json is an empty board. An unparseable one is copied
/// into the journal before the error is returned.
pub fn load_workspace(root: &Path) -> Result<Workspace, BoardIoError> {
    let board_dir = root.join(BOARD_DIR);
    if !board_dir.is_dir() {
        return Err(BoardIoError::NotABoard);
    }
    let config = read_config(&board_dir)?;
    let doc = read_document(&board_dir)?;
    let board = Board::from_document(doc, config.geometry);

    Ok(Workspace {
        root: root.to_path_buf(),
        board_dir,
        config,
        board,
    })
}

/// Raw board.json contents, before duplicate IDs collapse into a `Board`
pub fn read_document(board_dir: &Path) -> Result<BoardDocument, BoardIoError> {
    let path = board_dir.join("board.json");
    if !path.exists() {
        return Ok(BoardDocument::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| BoardIoError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| {
        journal::log_entry(
            board_dir,
            JournalEntry::new(JournalCategory::Parser, "board.json unreadable")
                .field("Source", "board.json")
                .field("Error", e.to_string())
                .body(text.clone()),
        );
        BoardIoError::DataParseError { path, source: e }
    })
}

/// Write board.json atomically. On failure the serialized board goes to
/// the journal so nothing is lost.
pub fn save_board(board_dir: &Path, board: &Board) -> Result<(), BoardIoError> {
    let path = board_dir.join("board.json");
    let mut content = serde_json::to_string_pretty(&board.to_document())?;
    content.push('\n');
    if let Err(e) = journal::atomic_write(&path, content.as_bytes()) {
        journal::log_entry(
            board_dir,
            JournalEntry::new(JournalCategory::Write, "board write failed")
                .field("Target", "board.json")
                .field("Error", e.to_string())
                .body(content),
        );
        return Err(BoardIoError::WriteError { path, source: e });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::connection::ConnectionStyle;
    use crate::model::geometry::Point;
    use crate::model::item::{ItemKind, NewItem};
    use crate::ops::board_ops;
    use tempfile::TempDir;

    const CONFIG: &str = "[board]\nname = \"Test\"\n";

    #[test]
    fn test_discover_board() {
        let tmp = TempDir::new().unwrap();
        init_board(tmp.path(), CONFIG).unwrap();

        assert_eq!(discover_board(tmp.path()).unwrap(), tmp.path());
        let sub = tmp.path().join("corkboard");
        assert_eq!(discover_board(&sub).unwrap(), tmp.path());
    }

    #[test]
    fn test_discover_board_not_found() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            discover_board(tmp.path()),
            Err(BoardIoError::NotABoard)
        ));
    }

    #[test]
    fn test_init_twice_fails() {
        let tmp = TempDir::new().unwrap();
        init_board(tmp.path(), CONFIG).unwrap();
        assert!(matches!(
            init_board(tmp.path(), CONFIG),
            Err(BoardIoError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = TempDir::new().unwrap();
        init_board(tmp.path(), CONFIG).unwrap();
        let mut ws = load_workspace(tmp.path()).unwrap();
        assert_eq!(ws.config.board.name, "Test");
        assert_eq!(ws.board.item_count(), 0);

        let a = board_ops::add_item(
            &mut ws.board,
            NewItem::new(ItemKind::Wanted, "Vic Rattlehead", Point::new(10.0, 20.0)),
        )
        .unwrap();
        let b = board_ops::add_item(
            &mut ws.board,
            NewItem::new(ItemKind::Clue, "Torn ticket", Point::new(400.0, 20.0)),
        )
        .unwrap();
        board_ops::connect(&mut ws.board, &a, &b, ConnectionStyle::default()).unwrap();
        board_ops::select(&mut ws.board, Some(&a)).unwrap();
        let events = ws.save().unwrap();
        assert_eq!(events.len(), 4);

        let reloaded = load_workspace(tmp.path()).unwrap();
        assert_eq!(reloaded.board.item_count(), 2);
        assert_eq!(reloaded.board.connections().len(), 1);
        // Selection is transient
        assert!(reloaded.board.selected_ids().is_empty());

        let logged = journal::read_entries(&ws.board_dir, None, Some(JournalCategory::Event));
        assert_eq!(logged.len(), 4);
    }

    #[test]
    fn test_ids_not_reused_across_reload() {
        let tmp = TempDir::new().unwrap();
        init_board(tmp.path(), CONFIG).unwrap();
        let mut ws = load_workspace(tmp.path()).unwrap();
        let a = board_ops::add_item(
            &mut ws.board,
            NewItem::new(ItemKind::Note, "a", Point::new(0.0, 0.0)),
        )
        .unwrap();
        board_ops::remove_item(&mut ws.board, &a).unwrap();
        ws.save().unwrap();

        let mut ws = load_workspace(tmp.path()).unwrap();
        let b = board_ops::add_item(
            &mut ws.board,
            NewItem::new(ItemKind::Note, "b", Point::new(0.0, 0.0)),
        )
        .unwrap();
        assert_eq!(a, "NT-001");
        assert_eq!(b, "NT-002");
    }

    #[test]
    fn test_unparseable_board_goes_to_journal() {
        let tmp = TempDir::new().unwrap();
        let board_dir = init_board(tmp.path(), CONFIG).unwrap();
        fs::write(board_dir.join("board.json"), "{ not json").unwrap();

        assert!(matches!(
            load_workspace(tmp.path()),
            Err(BoardIoError::DataParseError { .. })
        ));
        let entries = journal::read_entries(&board_dir, None, Some(JournalCategory::Parser));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].body, "{ not json");
    }

    #[test]
    fn test_missing_board_json_is_empty() {
        let tmp = TempDir::new().unwrap();
        let board_dir = init_board(tmp.path(), CONFIG).unwrap();
        fs::remove_file(board_dir.join("board.json")).unwrap();
        let ws = load_workspace(tmp.path()).unwrap();
        assert_eq!(ws.board.item_count(), 0);
    }
}
