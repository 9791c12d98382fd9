use std::f64::consts::{FRAC_PI_2, TAU};

use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, View};

/// Radians per rotation key press
const ROTATE_STEP: f64 = 0.15;

pub(super) fn handle_globe(app: &mut App, key: KeyEvent) {
    app.status = None;
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('g') | KeyCode::Esc => app.view = View::Board,
        KeyCode::Char('h') | KeyCode::Left => rotate(app, -ROTATE_STEP, 0.0),
        KeyCode::Char('l') | KeyCode::Right => rotate(app, ROTATE_STEP, 0.0),
        KeyCode::Char('k') | KeyCode::Up => rotate(app, 0.0, -ROTATE_STEP),
        KeyCode::Char('j') | KeyCode::Down => rotate(app, 0.0, ROTATE_STEP),
        KeyCode::Char('0') => {
            app.globe_yaw = 0.0;
            app.globe_pitch = 0.0;
        }
        _ => {}
    }
}

/// Yaw wraps around; pitch stops at the poles
fn rotate(app: &mut App, yaw: f64, pitch: f64) {
    app.globe_yaw = (app.globe_yaw + yaw).rem_euclid(TAU);
    app.globe_pitch = (app.globe_pitch + pitch).clamp(-FRAC_PI_2, FRAC_PI_2);
}
