use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ops::board_ops;
use crate::tui::app::{App, Mode};
use crate::util::unicode;

/// Start editing the focused item's content with the cursor at the end
pub(super) fn begin_edit(app: &mut App, is_new: bool) {
    let Some(item) = app.focused_item() else {
        return;
    };
    app.edit_buffer = item.content.clone();
    app.edit_cursor = app.edit_buffer.len();
    app.editing_new = is_new;
    app.mode = Mode::Edit;
}

pub(super) fn handle_edit(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let buf = &app.edit_buffer;
    let cursor = app.edit_cursor;

    match key.code {
        KeyCode::Esc => cancel_edit(app),
        KeyCode::Enter if alt => insert(app, "\n"),
        KeyCode::Enter => confirm_edit(app),
        KeyCode::Char('j') if ctrl => insert(app, "\n"),

        KeyCode::Left if alt || ctrl => app.edit_cursor = unicode::word_boundary_left(buf, cursor),
        KeyCode::Right if alt || ctrl => {
            app.edit_cursor = unicode::word_boundary_right(buf, cursor)
        }
        KeyCode::Left => {
            if let Some(prev) = unicode::prev_grapheme_boundary(buf, cursor) {
                app.edit_cursor = prev;
            }
        }
        KeyCode::Right => {
            if let Some(next) = unicode::next_grapheme_boundary(buf, cursor) {
                app.edit_cursor = next;
            }
        }
        KeyCode::Up => app.edit_cursor = vertical_move(buf, cursor, -1),
        KeyCode::Down => app.edit_cursor = vertical_move(buf, cursor, 1),
        KeyCode::Home => app.edit_cursor = line_bounds(buf, cursor).0,
        KeyCode::Char('a') if ctrl => app.edit_cursor = line_bounds(buf, cursor).0,
        KeyCode::End => app.edit_cursor = line_bounds(buf, cursor).1,
        KeyCode::Char('e') if ctrl => app.edit_cursor = line_bounds(buf, cursor).1,

        KeyCode::Backspace if alt => {
            let start = unicode::word_boundary_left(buf, cursor);
            delete_range(app, start, cursor);
        }
        KeyCode::Char('w') if ctrl => {
            let start = unicode::word_boundary_left(buf, cursor);
            delete_range(app, start, cursor);
        }
        KeyCode::Char('u') if ctrl => {
            let start = line_bounds(buf, cursor).0;
            delete_range(app, start, cursor);
        }
        KeyCode::Backspace => {
            if let Some(prev) = unicode::prev_grapheme_boundary(buf, cursor) {
                delete_range(app, prev, cursor);
            }
        }
        KeyCode::Delete => {
            if let Some(next) = unicode::next_grapheme_boundary(buf, cursor) {
                delete_range(app, cursor, next);
            }
        }
        KeyCode::Char(c) if !ctrl => {
            let mut tmp = [0u8; 4];
            insert(app, c.encode_utf8(&mut tmp));
        }
        _ => {}
    }
}

fn insert(app: &mut App, text: &str) {
    app.edit_buffer.insert_str(app.edit_cursor, text);
    app.edit_cursor += text.len();
}

fn delete_range(app: &mut App, start: usize, end: usize) {
    if start < end {
        app.edit_buffer.replace_range(start..end, "");
        app.edit_cursor = start;
    }
}

/// Byte range `(start, end)` of the line holding `cursor`, newline excluded
fn line_bounds(s: &str, cursor: usize) -> (usize, usize) {
    let start = s[..cursor].rfind('\n').map_or(0, |i| i + 1);
    let end = s[cursor..].find('\n').map_or(s.len(), |i| cursor + i);
    (start, end)
}

/// Cursor on the line above or below at the same display column, clamped
/// to that line's end
fn vertical_move(s: &str, cursor: usize, direction: i32) -> usize {
    let (start, end) = line_bounds(s, cursor);
    let col = unicode::byte_offset_to_display_col(&s[start..end], cursor - start);
    let (target_start, target_end) = if direction < 0 {
        if start == 0 {
            return cursor;
        }
        line_bounds(s, start - 1)
    } else {
        if end == s.len() {
            return cursor;
        }
        line_bounds(s, end + 1)
    };
    target_start + unicode::display_col_to_byte_offset(&s[target_start..target_end], col)
}

fn confirm_edit(app: &mut App) {
    let text = std::mem::take(&mut app.edit_buffer);
    app.edit_cursor = 0;
    app.editing_new = false;
    app.mode = Mode::Navigate;
    let Some(id) = app.focus.clone() else {
        return;
    };
    if app.board().item(&id).is_some_and(|item| item.content == text) {
        return;
    }
    app.apply(|board| board_ops::update_item_content(board, &id, text));
}

/// Drop the edit. A note created for this edit goes away with it.
fn cancel_edit(app: &mut App) {
    app.edit_buffer.clear();
    app.edit_cursor = 0;
    app.mode = Mode::Navigate;
    if std::mem::take(&mut app.editing_new)
        && let Some(id) = app.focus.take()
    {
        app.apply(|board| board_ops::remove_item(board, &id));
    }
}
