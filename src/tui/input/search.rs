use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::search;
use crate::tui::app::{App, Mode};

pub(super) fn begin_search(app: &mut App) {
    app.search_input.clear();
    app.mode = Mode::Search;
}

pub(super) fn handle_search(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.search_input.clear();
            app.mode = Mode::Navigate;
        }
        KeyCode::Enter => {
            let pattern = std::mem::take(&mut app.search_input);
            app.mode = Mode::Navigate;
            if pattern.is_empty() {
                app.last_search = None;
                return;
            }
            app.last_search = Some(pattern);
            jump_to_match(app, 1);
        }
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => app.search_input.push(c),
        _ => {}
    }
}

/// Focus the next (or previous) item matching the last search, wrapping
pub(super) fn jump_to_match(app: &mut App, direction: i32) {
    let Some(re) = app.search_re() else {
        return;
    };
    let hits = search::search_board(app.board(), &re);
    let ids = search::matching_item_ids(app.board(), &hits);
    if ids.is_empty() {
        app.status = Some(format!(
            "no matches for /{}",
            app.last_search.as_deref().unwrap_or_default()
        ));
        return;
    }
    let len = ids.len() as i32;
    let idx = match app.focus.as_deref().and_then(|f| ids.iter().position(|id| id == f)) {
        Some(i) => (i as i32 + direction).rem_euclid(len),
        None if direction < 0 => len - 1,
        None => 0,
    } as usize;
    let Some(id) = ids.get(idx).cloned() else {
        return;
    };
    app.select_only(&id);
    app.reveal(&id);
    app.status = Some(format!("match {}/{}", idx + 1, ids.len()));
}
