use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use tempfile::TempDir;

use crate::io::board_io;
use crate::model::geometry::Point;
use crate::model::item::{ItemKind, NewItem};
use crate::ops::board_ops;
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// Build an App over a fresh on-disk board named "Test" holding the given
/// items at their kind's default size. The TempDir must outlive the App.
pub fn app_with_items(items: &[(ItemKind, &str, f64, f64)]) -> (App, TempDir) {
    let tmp = TempDir::new().unwrap();
    board_io::init_board(tmp.path(), "[board]\nname = \"Test\"\n").unwrap();
    let mut ws = board_io::load_workspace(tmp.path()).unwrap();
    for (kind, content, x, y) in items {
        board_ops::add_item(
            &mut ws.board,
            NewItem::new(*kind, *content, Point::new(*x, *y)),
        )
        .unwrap();
    }
    ws.save().unwrap();
    (App::new(ws), tmp)
}
