use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::board_ops;
use crate::tui::app::{App, Mode};

/// Enter Connect mode from the focused item, proposing the next item as
/// the far end
pub(super) fn begin_connect(app: &mut App) {
    let Some(from) = app.focus.clone() else {
        app.status = Some("focus an item first (Tab)".to_string());
        return;
    };
    match app.cycle_from(Some(&from), 1, Some(&from)) {
        Some(target) => {
            app.connect_target = Some(target);
            app.mode = Mode::Connect;
        }
        None => app.status = Some("nothing to connect to".to_string()),
    }
}

pub(super) fn handle_connect(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => leave(app),
        KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => cycle_target(app, 1),
        KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left => cycle_target(app, -1),
        KeyCode::Enter => {
            if let Some(target) = app.connect_target.clone() {
                connect_to(app, &target);
            }
        }
        _ => {}
    }
}

fn cycle_target(app: &mut App, direction: i32) {
    let from = app.focus.clone();
    if let Some(next) = app.cycle_from(app.connect_target.as_deref(), direction, from.as_deref()) {
        app.reveal(&next);
        app.connect_target = Some(next);
    }
}

/// Run a string from the focused item to `target` with the board's default
/// style and leave Connect mode
pub(super) fn connect_to(app: &mut App, target: &str) {
    let Some(from) = app.focus.clone() else {
        leave(app);
        return;
    };
    let style = app.ws.config.connections.default_style();
    if let Some(id) = app.apply(|board| board_ops::connect(board, &from, target, style)) {
        app.status = Some(format!("{}: {} \u{2192} {}", id, from, target));
    }
    leave(app);
}

fn leave(app: &mut App) {
    app.connect_target = None;
    app.mode = Mode::Navigate;
}
