use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use regex::Regex;

use crate::io::board_io::{self, Workspace};
use crate::io::journal;
use crate::io::lock::BoardLock;
use crate::io::watcher::{BoardWatcher, FileEvent};
use crate::model::board::Board;
use crate::model::config::UiConfig;
use crate::model::geometry::Point;
use crate::model::item::BoardItem;
use crate::ops::board_ops::{self, BoardError};
use crate::ops::drag::DragController;

use super::input;
use super::render;
use super::theme::Theme;

/// Which view is currently displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Board,
    Globe,
}

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Inline editing of the focused item's content
    Edit,
    /// Picking the far end of a new string from the keyboard
    Connect,
    Search,
}

/// Maps terminal cells to board coordinates. One cell covers
/// `scale_x` by `scale_y` board units; `pan` is the board point at the
/// top-left cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub pan_x: f64,
    pub pan_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Viewport {
    pub fn new(ui: &UiConfig) -> Self {
        Viewport {
            pan_x: 0.0,
            pan_y: 0.0,
            scale_x: if ui.scale_x > 0.0 { ui.scale_x } else { 10.0 },
            scale_y: if ui.scale_y > 0.0 { ui.scale_y } else { 20.0 },
        }
    }

    /// Board point at the top-left corner of a cell, or None outside `area`
    pub fn cell_to_board(&self, area: Rect, col: u16, row: u16) -> Option<Point> {
        if col < area.x || row < area.y || col >= area.right() || row >= area.bottom() {
            return None;
        }
        Some(Point::new(
            self.pan_x + f64::from(col - area.x) * self.scale_x,
            self.pan_y + f64::from(row - area.y) * self.scale_y,
        ))
    }

    /// Fractional cell offset of a board point relative to the area origin
    pub fn board_to_cell(&self, p: Point) -> (f64, f64) {
        (
            (p.x - self.pan_x) / self.scale_x,
            (p.y - self.pan_y) / self.scale_y,
        )
    }

    /// Pan by whole cells
    pub fn pan_cells(&mut self, cols: i32, rows: i32) {
        self.pan_x += f64::from(cols) * self.scale_x;
        self.pan_y += f64::from(rows) * self.scale_y;
    }

    /// Board point at the middle of the area
    pub fn center(&self, area: Rect) -> Point {
        Point::new(
            self.pan_x + f64::from(area.width) * self.scale_x / 2.0,
            self.pan_y + f64::from(area.height) * self.scale_y / 2.0,
        )
    }
}

/// Main application state
pub struct App {
    pub ws: Workspace,
    pub view: View,
    pub mode: Mode,
    pub should_quit: bool,
    pub theme: Theme,
    pub viewport: Viewport,
    pub drag: DragController,
    /// Keyboard focus; also the source item in Connect mode
    pub focus: Option<String>,
    /// Candidate far end while in Connect mode
    pub connect_target: Option<String>,
    pub edit_buffer: String,
    /// Byte offset into edit_buffer
    pub edit_cursor: usize,
    /// The item under edit was just created; cancelling removes it
    pub editing_new: bool,
    pub search_input: String,
    pub last_search: Option<String>,
    /// One-line message for the status row
    pub status: Option<String>,
    pub show_help: bool,
    pub globe_yaw: f64,
    pub globe_pitch: f64,
    /// Canvas area from the last draw, for mapping mouse cells to board points
    pub canvas_area: Rect,
    /// Advanced on every idle poll; drives animated strings
    pub tick: u64,
    /// board.json stamp after our own last write
    last_saved: Option<FileStamp>,
    /// An outside change arrived mid-gesture; reload once the pointer is up
    pending_reload: bool,
}

impl App {
    pub fn new(ws: Workspace) -> Self {
        let theme = Theme::from_config(&ws.config.ui);
        let viewport = Viewport::new(&ws.config.ui);
        let drag = DragController::new(ws.config.geometry);
        let last_saved = board_stamp(&ws.board_dir);
        App {
            ws,
            view: View::Board,
            mode: Mode::Navigate,
            should_quit: false,
            theme,
            viewport,
            drag,
            focus: None,
            connect_target: None,
            edit_buffer: String::new(),
            edit_cursor: 0,
            editing_new: false,
            search_input: String::new(),
            last_search: None,
            status: None,
            show_help: false,
            globe_yaw: 0.0,
            globe_pitch: 0.0,
            canvas_area: Rect::default(),
            tick: 0,
            last_saved,
            pending_reload: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.ws.board
    }

    /// Run a board mutation as one load-modify-save under the board lock.
    /// When another process wrote board.json since our last save, the board
    /// is reloaded first so the mutation lands on top of that write. Errors
    /// go to the status row.
    pub fn apply<T>(&mut self, f: impl FnOnce(&mut Board) -> Result<T, BoardError>) -> Option<T> {
        let lock = match BoardLock::acquire_default(&self.ws.board_dir) {
            Ok(lock) => Some(lock),
            Err(e) => {
                self.status = Some(format!("save failed: {}", e));
                None
            }
        };
        if lock.is_some() && board_stamp(&self.ws.board_dir) != self.last_saved {
            self.reload();
        }

        let result = f(&mut self.ws.board);
        // Earlier steps of a compound op may have queued events even on error
        if lock.is_some() {
            self.save();
        }
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.status = Some(e.to_string());
                None
            }
        }
    }

    /// Save and journal pending events. The caller holds the board lock.
    fn save(&mut self) {
        if !self.ws.board.has_pending_events() {
            return;
        }
        match self.ws.save() {
            Ok(_) => self.last_saved = board_stamp(&self.ws.board_dir),
            Err(e) => self.status = Some(format!("save failed: {}", e)),
        }
    }

    pub fn focused_item(&self) -> Option<&BoardItem> {
        self.focus.as_deref().and_then(|id| self.ws.board.item(id))
    }

    /// Make `id` the only selected item and give it keyboard focus
    pub fn select_only(&mut self, id: &str) {
        self.apply(|board| {
            board_ops::clear_selection(board);
            board_ops::select(board, Some(id))
        });
        self.focus = Some(id.to_string());
    }

    pub fn clear_focus(&mut self) {
        self.apply(|board| {
            board_ops::clear_selection(board);
            Ok(())
        });
        self.focus = None;
    }

    /// Item IDs in z-order, bottom first
    pub fn item_ids(&self) -> Vec<String> {
        self.ws.board.items().map(|i| i.id.clone()).collect()
    }

    /// Next (or previous) item after `from` in z-order, wrapping
    pub fn cycle_from(
        &self,
        from: Option<&str>,
        direction: i32,
        skip: Option<&str>,
    ) -> Option<String> {
        let ids: Vec<String> = self
            .item_ids()
            .into_iter()
            .filter(|id| Some(id.as_str()) != skip)
            .collect();
        if ids.is_empty() {
            return None;
        }
        let len = ids.len() as i32;
        let next = match from.and_then(|f| ids.iter().position(|id| id == f)) {
            Some(idx) => (idx as i32 + direction).rem_euclid(len),
            None if direction < 0 => len - 1,
            None => 0,
        };
        ids.get(next as usize).cloned()
    }

    /// Active search regex for highlighting, case-insensitive. Falls back to
    /// a literal match when the input isn't a valid regex.
    pub fn search_re(&self) -> Option<Regex> {
        let pattern = match self.mode {
            Mode::Search if !self.search_input.is_empty() => &self.search_input,
            Mode::Search => return None,
            _ => self.last_search.as_deref()?,
        };
        Regex::new(&format!("(?i){}", pattern))
            .or_else(|_| Regex::new(&format!("(?i){}", regex::escape(pattern))))
            .ok()
    }

    /// Scroll so the item is inside the canvas
    pub fn reveal(&mut self, id: &str) {
        let Some(item) = self.ws.board.item(id) else {
            return;
        };
        let area = self.canvas_area;
        if area.width == 0 || area.height == 0 {
            return;
        }
        let rect = item.rect();
        let vw = f64::from(area.width) * self.viewport.scale_x;
        let vh = f64::from(area.height) * self.viewport.scale_y;
        if rect.origin.x < self.viewport.pan_x || rect.right() > self.viewport.pan_x + vw {
            self.viewport.pan_x = rect.origin.x - self.viewport.scale_x;
        }
        if rect.origin.y < self.viewport.pan_y || rect.bottom() > self.viewport.pan_y + vh {
            self.viewport.pan_y = rect.origin.y - self.viewport.scale_y;
        }
    }

    /// React to board files changing on disk
    pub fn handle_file_events(&mut self, events: Vec<FileEvent>) {
        if events.is_empty() {
            return;
        }
        if self.drag.any_active() {
            self.pending_reload = true;
            return;
        }
        let config_changed = events.iter().any(|FileEvent::Changed(paths)| {
            paths
                .iter()
                .any(|p| p.file_name().is_some_and(|n| n == "board.toml"))
        });
        if !config_changed && board_stamp(&self.ws.board_dir) == self.last_saved {
            // Our own write
            return;
        }
        self.reload();
    }

    /// Reload after the last pointer is released, if a reload was deferred
    pub fn flush_pending_reload(&mut self) {
        if self.pending_reload && !self.drag.any_active() {
            self.pending_reload = false;
            self.reload();
        }
    }

    /// Replace the in-memory board with what's on disk, keeping focus and
    /// selection where the items still exist.
    pub fn reload(&mut self) {
        let selected: Vec<String> = self
            .ws
            .board
            .selected_ids()
            .into_iter()
            .map(String::from)
            .collect();
        match board_io::load_workspace(&self.ws.root) {
            Ok(ws) => {
                self.pending_reload = false;
                self.theme = Theme::from_config(&ws.config.ui);
                self.ws = ws;
                for id in &selected {
                    // Ignore items that vanished
                    let _ = board_ops::select(&mut self.ws.board, Some(id));
                }
                // Selection events aren't news
                self.ws.board.take_events();
                self.drag.retain_items(&self.ws.board);
                if let Some(id) = &self.focus
                    && !self.ws.board.contains_item(id)
                {
                    self.focus = None;
                }
                self.last_saved = board_stamp(&self.ws.board_dir);
                self.status = Some("reloaded from disk".to_string());
            }
            Err(e) => self.status = Some(format!("reload failed: {}", e)),
        }
    }

    /// Remove the focused item and journal what was lost
    pub fn delete_focused(&mut self) {
        let Some(id) = self.focus.clone() else {
            return;
        };
        let removed = self.apply(|board| {
            let cascaded = board.connections_of(&id).count();
            board_ops::remove_item(board, &id).map(|item| (item, cascaded))
        });
        if let Some((item, cascaded)) = removed {
            journal::log_item_deletion(&self.ws.board_dir, &item, cascaded);
            self.drag.retain_items(&self.ws.board);
            self.focus = None;
            self.status = Some(match cascaded {
                0 => format!("removed {}", id),
                1 => format!("removed {} and 1 string", id),
                n => format!("removed {} and {} strings", id, n),
            });
        }
    }
}

/// Modification time and length of a file. Length catches a second write
/// inside the filesystem's timestamp granularity.
type FileStamp = (SystemTime, u64);

fn board_stamp(board_dir: &Path) -> Option<FileStamp> {
    let meta = std::fs::metadata(board_dir.join("board.json")).ok()?;
    Some((meta.modified().ok()?, meta.len()))
}

/// Restore UI state from .state.json
pub fn restore_ui_state(app: &mut App) {
    use crate::io::state::read_ui_state;

    let Some(ui_state) = read_ui_state(&app.ws.board_dir) else {
        return;
    };

    app.view = match ui_state.view.as_str() {
        "globe" => View::Globe,
        _ => View::Board,
    };
    if ui_state.pan_x.is_finite() && ui_state.pan_y.is_finite() {
        app.viewport.pan_x = ui_state.pan_x;
        app.viewport.pan_y = ui_state.pan_y;
    }
    for id in &ui_state.selected {
        let _ = board_ops::select(&mut app.ws.board, Some(id));
    }
    app.ws.board.take_events();
    app.focus = ui_state
        .selected
        .iter()
        .find(|id| app.ws.board.contains_item(id))
        .cloned();
    app.last_search = ui_state.last_search;
    app.globe_yaw = ui_state.globe_yaw;
    app.globe_pitch = ui_state.globe_pitch;
}

/// Save UI state to .state.json
pub fn save_ui_state(app: &App) {
    use crate::io::state::{UiState, write_ui_state};

    let ui_state = UiState {
        view: match app.view {
            View::Board => "board".to_string(),
            View::Globe => "globe".to_string(),
        },
        pan_x: app.viewport.pan_x,
        pan_y: app.viewport.pan_y,
        selected: app
            .ws
            .board
            .selected_ids()
            .into_iter()
            .map(String::from)
            .collect(),
        last_search: app.last_search.clone(),
        globe_yaw: app.globe_yaw,
        globe_pitch: app.globe_pitch,
    };

    let _ = write_ui_state(&app.ws.board_dir, &ui_state);
}

/// Run the TUI application
pub fn run(board_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let start = match board_dir {
        Some(dir) => std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        None => std::env::current_dir()?,
    };
    let root: PathBuf = board_io::discover_board(&start)?;
    let ws = board_io::load_workspace(&root)?;

    let mut app = App::new(ws);
    restore_ui_state(&mut app);

    let watcher = match BoardWatcher::start(&app.ws.board_dir) {
        Ok(w) => Some(w),
        Err(e) => {
            app.status = Some(format!("not watching for changes: {}", e));
            None
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref());

    save_ui_state(&app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&BoardWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut save_counter = 0u32;
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(150))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    input::handle_key(app, key);
                    // Debounced state save: every ~5 key presses
                    save_counter += 1;
                    if save_counter >= 5 {
                        save_ui_state(app);
                        save_counter = 0;
                    }
                }
                Event::Mouse(mouse) => input::handle_mouse(app, mouse),
                _ => {}
            }
        } else {
            app.tick = app.tick.wrapping_add(1);
        }

        if let Some(watcher) = watcher {
            app.handle_file_events(watcher.poll());
        }
        app.flush_pending_reload();

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
