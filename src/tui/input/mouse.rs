use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::ops::board_ops::{self, BoardError};
use crate::ops::drag::{self, Commit, Modifiers, PointerId};
use crate::tui::app::{App, Mode, View};

use super::connect;

/// A terminal has exactly one pointer
const POINTER: PointerId = 0;

/// Rows panned per wheel notch
const SCROLL_ROWS: i32 = 2;

/// Handle a mouse event on the board canvas
pub fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.show_help || app.view != View::Board {
        return;
    }
    if !matches!(app.mode, Mode::Navigate | Mode::Connect) {
        return;
    }

    let at = app
        .viewport
        .cell_to_board(app.canvas_area, mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.viewport.pan_cells(0, -SCROLL_ROWS),
        MouseEventKind::ScrollDown => app.viewport.pan_cells(0, SCROLL_ROWS),
        MouseEventKind::ScrollLeft => app.viewport.pan_cells(-SCROLL_ROWS * 2, 0),
        MouseEventKind::ScrollRight => app.viewport.pan_cells(SCROLL_ROWS * 2, 0),

        MouseEventKind::Down(MouseButton::Left) => {
            let Some(at) = at else {
                return;
            };
            app.status = None;
            if app.mode == Mode::Connect {
                let target = app.board().item_at(at).map(|i| i.id.clone());
                if let Some(target) = target
                    && app.focus.as_deref() != Some(target.as_str())
                {
                    connect::connect_to(app, &target);
                }
                return;
            }
            let modifiers = Modifiers {
                shift: mouse.modifiers.contains(KeyModifiers::SHIFT),
                ctrl: mouse.modifiers.contains(KeyModifiers::CONTROL),
                alt: mouse.modifiers.contains(KeyModifiers::ALT),
            };
            match app.drag.pointer_down(&app.ws.board, POINTER, at, modifiers) {
                Some(id) => {
                    app.apply(|board| board_ops::bring_to_front(board, &id));
                }
                None if app.board().item_at(at).is_none() => app.clear_focus(),
                None => {}
            }
        }

        MouseEventKind::Drag(MouseButton::Left) => {
            if let Some(at) = at {
                app.drag.pointer_move(POINTER, at);
            }
        }

        MouseEventKind::Up(MouseButton::Left) => {
            let Some(at) = at else {
                // Released outside the canvas
                app.drag.cancel_all();
                app.flush_pending_reload();
                return;
            };
            let commit = app.drag.pointer_up(&app.ws.board, POINTER, at);
            let clicked = match &commit {
                Some(Commit::Position { id, .. } | Commit::Size { id, .. }) => Some(id.clone()),
                Some(Commit::Connect { a, .. }) => Some(a.clone()),
                None => app.board().item_at(at).map(|i| i.id.clone()),
            };
            if let Some(commit) = commit {
                let style = app.ws.config.connections.default_style();
                app.apply(|board| match drag::apply_commit(board, commit, style) {
                    // Deleted mid-gesture
                    Err(BoardError::NotFound(_)) => Ok(()),
                    other => other,
                });
            }
            // Terminals report no separate click; the release stands in for it
            if let Some(id) = clicked
                && app.drag.click(&id)
                && app.board().contains_item(&id)
            {
                app.select_only(&id);
            }
            app.flush_pending_reload();
        }
        _ => {}
    }
}
