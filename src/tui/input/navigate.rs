use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::geometry::Point;
use crate::model::item::{ItemKind, NewItem};
use crate::ops::board_ops;
use crate::tui::app::{App, View};

use super::{connect, edit, search};

/// Cells panned per h/j/k/l press
const PAN_STEP: i32 = 4;

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    app.status = None;
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('g') => {
            app.drag.cancel_all();
            app.view = View::Globe;
        }
        KeyCode::Tab => cycle_focus(app, 1),
        KeyCode::BackTab => cycle_focus(app, -1),
        KeyCode::Esc => app.clear_focus(),

        KeyCode::Left => nudge_focused(app, -1, 0, shift),
        KeyCode::Right => nudge_focused(app, 1, 0, shift),
        KeyCode::Up => nudge_focused(app, 0, -1, shift),
        KeyCode::Down => nudge_focused(app, 0, 1, shift),

        KeyCode::Char('h') => app.viewport.pan_cells(-PAN_STEP, 0),
        KeyCode::Char('l') => app.viewport.pan_cells(PAN_STEP, 0),
        KeyCode::Char('k') => app.viewport.pan_cells(0, -PAN_STEP / 2),
        KeyCode::Char('j') => app.viewport.pan_cells(0, PAN_STEP / 2),

        KeyCode::Char('n') => new_note(app),
        KeyCode::Char('e') | KeyCode::Enter => edit::begin_edit(app, false),
        KeyCode::Char('x') => toggle_expanded(app),
        KeyCode::Char('d') | KeyCode::Delete => app.delete_focused(),
        KeyCode::Char('c') => connect::begin_connect(app),
        KeyCode::Char('/') => search::begin_search(app),
        KeyCode::Char(']') => search::jump_to_match(app, 1),
        KeyCode::Char('[') => search::jump_to_match(app, -1),
        _ => {}
    }
}

fn cycle_focus(app: &mut App, direction: i32) {
    if let Some(id) = app.cycle_from(app.focus.as_deref(), direction, None) {
        app.select_only(&id);
        app.reveal(&id);
    }
}

/// Move the focused item by one cell, or five with Shift
fn nudge_focused(app: &mut App, dx: i32, dy: i32, fast: bool) {
    let Some(item) = app.focused_item() else {
        return;
    };
    let id = item.id.clone();
    let step = if fast { 5.0 } else { 1.0 };
    let to = Point::new(
        item.position.x + f64::from(dx) * step * app.viewport.scale_x,
        item.position.y + f64::from(dy) * step * app.viewport.scale_y,
    );
    app.apply(|board| board_ops::update_item_position(board, &id, to));
    app.reveal(&id);
}

/// Pin an empty note in the middle of the view and start editing it
fn new_note(app: &mut App) {
    let size = ItemKind::Note.default_size();
    let center = app.viewport.center(app.canvas_area);
    let at = Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0);
    let note = NewItem::new(ItemKind::Note, "", at);
    if let Some(id) = app.apply(|board| board_ops::add_item(board, note)) {
        app.select_only(&id);
        edit::begin_edit(app, true);
    }
}

fn toggle_expanded(app: &mut App) {
    let Some(item) = app.focused_item() else {
        return;
    };
    let (id, expanded) = (item.id.clone(), item.expanded);
    app.apply(|board| board_ops::set_expanded(board, &id, !expanded));
}
