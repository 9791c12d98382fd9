use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Events sent from the file watcher to the TUI event loop.
#[derive(Debug)]
pub enum FileEvent {
    /// board.json or board.toml changed on disk.
    Changed(Vec<PathBuf>),
}

/// Watches a board directory for edits made by other processes (usually `cb`).
pub struct BoardWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileEvent>,
}

impl BoardWatcher {
    /// Start watching the board directory. Call `poll()` each tick.
    pub fn start(board_dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }

                let relevant: Vec<PathBuf> =
                    event.paths.into_iter().filter(|p| is_board_file(p)).collect();
                if !relevant.is_empty() {
                    let _ = tx.send(FileEvent::Changed(relevant));
                }
            },
            Config::default(),
        )?;

        watcher.watch(board_dir, RecursiveMode::NonRecursive)?;
        Ok(BoardWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll for pending file events (may be empty).
    pub fn poll(&self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

/// Only the board data and config matter; the journal, lock and UI state
/// churn on every save.
fn is_board_file(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some("board.json") | Some("board.toml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_board_file() {
        assert!(is_board_file(Path::new("/x/corkboard/board.json")));
        assert!(is_board_file(Path::new("corkboard/board.toml")));
        assert!(!is_board_file(Path::new("corkboard/.journal.log")));
        assert!(!is_board_file(Path::new("corkboard/.state.json")));
        assert!(!is_board_file(Path::new("corkboard/.lock")));
    }
}
