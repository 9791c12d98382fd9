//! Pointer-driven move, resize and connect gestures.
//!
//! Each item runs its own small state machine (`ItemInteraction`). While a
//! gesture is in flight only an ephemeral candidate is kept here; the board is
//! touched once, on release, through `apply_commit`. `DragController` routes
//! pointer IDs to items so independent pointers can drive independent items.

use std::collections::HashMap;

use crate::model::board::{Board, HitPart};
use crate::model::config::GeometryConfig;
use crate::model::connection::ConnectionStyle;
use crate::model::geometry::{Point, Size};
use crate::model::item::BoardItem;
use crate::ops::board_ops::{self, BoardError};

pub type PointerId = u64;

/// Keyboard modifiers held at pointer-down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
    };

    pub fn is_empty(self) -> bool {
        !self.shift && !self.ctrl && !self.alt
    }

    /// Shift alone starts a connect gesture instead of a drag
    fn is_connect(self) -> bool {
        self.shift && !self.ctrl && !self.alt
    }
}

/// Gesture state of a single item
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Idle,
    Dragging {
        pointer: PointerId,
        start_pointer: Point,
        start_position: Point,
        candidate: Point,
    },
    Resizing {
        pointer: PointerId,
        start_pointer: Point,
        start_size: Size,
        candidate: Size,
    },
    Connecting {
        pointer: PointerId,
        cursor: Point,
    },
}

/// Ephemeral geometry to draw while a gesture is in flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Preview {
    Position(Point),
    Size(Size),
    /// Rubber-band line from the source item to the cursor
    Connect(Point),
}

/// A finished gesture, ready to be written to the board
#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    Position { id: String, position: Point },
    Size { id: String, size: Size },
    Connect { a: String, b: String },
}

/// Per-item gesture state machine
#[derive(Debug, Clone)]
pub struct ItemInteraction {
    item_id: String,
    state: Interaction,
    /// Set after a drag/resize that moved; eats the click that follows the release
    suppress_click: bool,
}

impl ItemInteraction {
    pub fn new(item_id: impl Into<String>) -> Self {
        ItemInteraction {
            item_id: item_id.into(),
            state: Interaction::Idle,
            suppress_click: false,
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn state(&self) -> &Interaction {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == Interaction::Idle
    }

    /// Start a gesture. Returns false (and changes nothing) if the item is
    /// already mid-gesture or the modifier combination starts nothing.
    pub fn pointer_down(
        &mut self,
        pointer: PointerId,
        at: Point,
        part: HitPart,
        modifiers: Modifiers,
        item: &BoardItem,
    ) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.suppress_click = false;
        self.state = match part {
            HitPart::ResizeHandle if modifiers.is_empty() => Interaction::Resizing {
                pointer,
                start_pointer: at,
                start_size: item.size,
                candidate: item.size,
            },
            HitPart::Body if modifiers.is_empty() => Interaction::Dragging {
                pointer,
                start_pointer: at,
                start_position: item.position,
                candidate: item.position,
            },
            HitPart::Body | HitPart::ResizeHandle if modifiers.is_connect() => {
                Interaction::Connecting { pointer, cursor: at }
            }
            _ => return false,
        };
        true
    }

    /// Recompute the candidate. Moves from other pointers are ignored.
    pub fn pointer_move(
        &mut self,
        pointer: PointerId,
        at: Point,
        limits: &GeometryConfig,
    ) -> Option<Preview> {
        match &mut self.state {
            Interaction::Idle => None,
            Interaction::Dragging {
                pointer: p,
                start_pointer,
                start_position,
                candidate,
            } => {
                if *p != pointer {
                    return None;
                }
                *candidate = start_position.offset_by(*start_pointer, at);
                Some(Preview::Position(*candidate))
            }
            Interaction::Resizing {
                pointer: p,
                start_pointer,
                start_size,
                candidate,
            } => {
                if *p != pointer {
                    return None;
                }
                *candidate = resized(*start_size, *start_pointer, at, limits);
                Some(Preview::Size(*candidate))
            }
            Interaction::Connecting { pointer: p, cursor } => {
                if *p != pointer {
                    return None;
                }
                *cursor = at;
                Some(Preview::Connect(at))
            }
        }
    }

    /// Finish the gesture and return to idle.
    ///
    /// Returns a commit only when something changed: a drag or resize that
    /// ends where it started commits nothing, and a connect gesture needs a
    /// drop target other than this item.
    pub fn pointer_up(
        &mut self,
        pointer: PointerId,
        at: Point,
        drop_target: Option<&str>,
        limits: &GeometryConfig,
    ) -> Option<Commit> {
        if self.active_pointer() != Some(pointer) {
            return None;
        }
        self.pointer_move(pointer, at, limits);
        let finished = std::mem::replace(&mut self.state, Interaction::Idle);
        match finished {
            Interaction::Idle => None,
            Interaction::Dragging {
                start_position,
                candidate,
                ..
            } => {
                if candidate == start_position {
                    return None;
                }
                self.suppress_click = true;
                Some(Commit::Position {
                    id: self.item_id.clone(),
                    position: candidate,
                })
            }
            Interaction::Resizing {
                start_size,
                candidate,
                ..
            } => {
                if candidate == start_size {
                    return None;
                }
                self.suppress_click = true;
                Some(Commit::Size {
                    id: self.item_id.clone(),
                    size: candidate,
                })
            }
            Interaction::Connecting { .. } => match drop_target {
                Some(target) if target != self.item_id => Some(Commit::Connect {
                    a: self.item_id.clone(),
                    b: target.to_string(),
                }),
                _ => None,
            },
        }
    }

    /// A click landed on this item. Returns whether it should select.
    /// The first click after a drag-release is swallowed.
    pub fn click(&mut self) -> bool {
        if self.suppress_click {
            self.suppress_click = false;
            return false;
        }
        true
    }

    /// Abandon the current gesture without committing
    pub fn cancel(&mut self) {
        self.state = Interaction::Idle;
    }

    pub fn preview(&self) -> Option<Preview> {
        match &self.state {
            Interaction::Idle => None,
            Interaction::Dragging { candidate, .. } => Some(Preview::Position(*candidate)),
            Interaction::Resizing { candidate, .. } => Some(Preview::Size(*candidate)),
            Interaction::Connecting { cursor, .. } => Some(Preview::Connect(*cursor)),
        }
    }

    fn active_pointer(&self) -> Option<PointerId> {
        match &self.state {
            Interaction::Idle => None,
            Interaction::Dragging { pointer, .. }
            | Interaction::Resizing { pointer, .. }
            | Interaction::Connecting { pointer, .. } => Some(*pointer),
        }
    }
}

/// `{max(minW, startW + dx), max(minH, startH + dy)}`
fn resized(start: Size, start_pointer: Point, at: Point, limits: &GeometryConfig) -> Size {
    let min = limits.min_size();
    Size::new(
        start.width + (at.x - start_pointer.x),
        start.height + (at.y - start_pointer.y),
    )
    .clamp_min(min.width, min.height)
}

/// Routes pointer events to per-item state machines
#[derive(Debug, Clone, Default)]
pub struct DragController {
    limits: GeometryConfig,
    items: HashMap<String, ItemInteraction>,
    pointers: HashMap<PointerId, String>,
}

impl DragController {
    pub fn new(limits: GeometryConfig) -> Self {
        DragController {
            limits,
            items: HashMap::new(),
            pointers: HashMap::new(),
        }
    }

    /// Hit-test the board and start a gesture on the item under the pointer.
    /// Returns the engaged item's ID.
    pub fn pointer_down(
        &mut self,
        board: &Board,
        pointer: PointerId,
        at: Point,
        modifiers: Modifiers,
    ) -> Option<String> {
        // A pointer that never saw its release: drop the stale gesture
        if let Some(stale) = self.pointers.remove(&pointer)
            && let Some(interaction) = self.items.get_mut(&stale)
        {
            interaction.cancel();
        }

        let (item, part) = board.hit_test(at)?;
        let interaction = self
            .items
            .entry(item.id.clone())
            .or_insert_with(|| ItemInteraction::new(item.id.clone()));
        if !interaction.pointer_down(pointer, at, part, modifiers, item) {
            return None;
        }
        self.pointers.insert(pointer, item.id.clone());
        Some(item.id.clone())
    }

    pub fn pointer_move(&mut self, pointer: PointerId, at: Point) -> Option<(String, Preview)> {
        let id = self.pointers.get(&pointer)?;
        let interaction = self.items.get_mut(id)?;
        let preview = interaction.pointer_move(pointer, at, &self.limits)?;
        Some((id.clone(), preview))
    }

    /// Release the pointer. For connect gestures the drop target is the
    /// topmost item under the release point.
    pub fn pointer_up(&mut self, board: &Board, pointer: PointerId, at: Point) -> Option<Commit> {
        let id = self.pointers.remove(&pointer)?;
        let drop_target = board.item_at(at).map(|i| i.id.as_str());
        let interaction = self.items.get_mut(&id)?;
        interaction.pointer_up(pointer, at, drop_target, &self.limits)
    }

    /// Whether a click on the item should change the selection
    pub fn click(&mut self, item_id: &str) -> bool {
        match self.items.get_mut(item_id) {
            Some(interaction) => interaction.click(),
            None => true,
        }
    }

    pub fn preview(&self, item_id: &str) -> Option<Preview> {
        self.items.get(item_id).and_then(ItemInteraction::preview)
    }

    pub fn is_active(&self, item_id: &str) -> bool {
        self.items.get(item_id).is_some_and(|i| !i.is_idle())
    }

    pub fn any_active(&self) -> bool {
        !self.pointers.is_empty()
    }

    /// Cancel every gesture in flight
    pub fn cancel_all(&mut self) {
        for interaction in self.items.values_mut() {
            interaction.cancel();
        }
        self.pointers.clear();
    }

    /// Forget state for items that no longer exist
    pub fn retain_items(&mut self, board: &Board) {
        self.items.retain(|id, _| board.contains_item(id));
        self.pointers.retain(|_, id| board.contains_item(id));
    }
}

/// Write a finished gesture to the board.
///
/// A commit for an item deleted mid-gesture yields `NotFound`; callers
/// normally ignore it.
pub fn apply_commit(
    board: &mut Board,
    commit: Commit,
    style: ConnectionStyle,
) -> Result<(), BoardError> {
    match commit {
        Commit::Position { id, position } => board_ops::update_item_position(board, &id, position),
        Commit::Size { id, size } => board_ops::update_item_size(board, &id, size),
        Commit::Connect { a, b } => board_ops::connect(board, &a, &b, style).map(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::{ItemKind, NewItem};
    use crate::ops::board_ops::{add_item, remove_item};

    fn setup() -> (Board, String, String) {
        let mut board = Board::default();
        let a = add_item(
            &mut board,
            NewItem::new(ItemKind::Photo, "A", Point::new(0.0, 0.0))
                .with_size(Size::new(220.0, 180.0)),
        )
        .unwrap();
        let b = add_item(
            &mut board,
            NewItem::new(ItemKind::Note, "B", Point::new(300.0, 0.0)),
        )
        .unwrap();
        board.take_events();
        (board, a, b)
    }

    #[test]
    fn test_drag_candidate_is_ephemeral_until_release() {
        let (mut board, a, _) = setup();
        let mut drag = DragController::new(GeometryConfig::default());

        assert_eq!(
            drag.pointer_down(&board, 1, Point::new(10.0, 10.0), Modifiers::NONE),
            Some(a.clone())
        );
        let (_, preview) = drag.pointer_move(1, Point::new(60.0, 35.0)).unwrap();
        assert_eq!(preview, Preview::Position(Point::new(50.0, 25.0)));
        assert_eq!(board.item(&a).unwrap().position, Point::new(0.0, 0.0));

        let commit = drag.pointer_up(&board, 1, Point::new(60.0, 60.0)).unwrap();
        assert_eq!(
            commit,
            Commit::Position {
                id: a.clone(),
                position: Point::new(50.0, 50.0)
            }
        );
        apply_commit(&mut board, commit, ConnectionStyle::default()).unwrap();
        assert_eq!(board.item(&a).unwrap().position, Point::new(50.0, 50.0));
        assert!(!drag.is_active(&a));
    }

    #[test]
    fn test_resize_respects_floor() {
        let (board, a, _) = setup();
        let mut drag = DragController::new(GeometryConfig::default());
        // Bottom-right corner of A is the resize handle
        drag.pointer_down(&board, 1, Point::new(215.0, 175.0), Modifiers::NONE)
            .unwrap();
        let (_, preview) = drag.pointer_move(1, Point::new(-900.0, -900.0)).unwrap();
        assert_eq!(preview, Preview::Size(Size::new(160.0, 120.0)));

        let commit = drag.pointer_up(&board, 1, Point::new(235.0, 165.0)).unwrap();
        assert_eq!(
            commit,
            Commit::Size {
                id: a,
                size: Size::new(240.0, 170.0)
            }
        );
    }

    #[test]
    fn test_resize_floor_ignores_lower_configured_minimum() {
        let (board, _, _) = setup();
        let mut drag = DragController::new(GeometryConfig {
            min_width: f64::NAN,
            min_height: -20.0,
            resize_handle: 16.0,
        });
        drag.pointer_down(&board, 1, Point::new(215.0, 175.0), Modifiers::NONE)
            .unwrap();
        let (_, preview) = drag.pointer_move(1, Point::new(-900.0, -900.0)).unwrap();
        assert_eq!(preview, Preview::Size(Size::new(160.0, 120.0)));
    }

    #[test]
    fn test_release_without_movement_commits_nothing() {
        let (board, a, _) = setup();
        let mut drag = DragController::new(GeometryConfig::default());
        drag.pointer_down(&board, 1, Point::new(10.0, 10.0), Modifiers::NONE);
        assert_eq!(drag.pointer_up(&board, 1, Point::new(10.0, 10.0)), None);
        // A plain click still selects
        assert!(drag.click(&a));
    }

    #[test]
    fn test_click_after_drag_is_suppressed_once() {
        let (board, a, _) = setup();
        let mut drag = DragController::new(GeometryConfig::default());
        drag.pointer_down(&board, 1, Point::new(10.0, 10.0), Modifiers::NONE);
        drag.pointer_up(&board, 1, Point::new(40.0, 10.0)).unwrap();
        assert!(!drag.click(&a));
        assert!(drag.click(&a));
    }

    #[test]
    fn test_new_press_clears_stale_suppression() {
        let (board, a, _) = setup();
        let mut drag = DragController::new(GeometryConfig::default());
        drag.pointer_down(&board, 1, Point::new(10.0, 10.0), Modifiers::NONE);
        drag.pointer_up(&board, 1, Point::new(40.0, 10.0)).unwrap();
        // No click arrived; the next press starts fresh
        drag.pointer_down(&board, 2, Point::new(40.0, 10.0), Modifiers::NONE);
        drag.pointer_up(&board, 2, Point::new(40.0, 10.0));
        assert!(drag.click(&a));
    }

    #[test]
    fn test_malformed_sequences_are_ignored() {
        let (board, _, _) = setup();
        let mut drag = DragController::new(GeometryConfig::default());
        assert_eq!(drag.pointer_up(&board, 7, Point::new(1.0, 1.0)), None);
        assert_eq!(drag.pointer_move(7, Point::new(1.0, 1.0)), None);
        // Pressing empty board engages nothing
        assert_eq!(
            drag.pointer_down(&board, 1, Point::new(-50.0, -50.0), Modifiers::NONE),
            None
        );
        assert!(!drag.any_active());
    }

    #[test]
    fn test_drag_and_resize_exclusive_per_item() {
        let (board, a, _) = setup();
        let mut drag = DragController::new(GeometryConfig::default());
        drag.pointer_down(&board, 1, Point::new(10.0, 10.0), Modifiers::NONE)
            .unwrap();
        // Second pointer on A's resize handle while A is dragging
        assert_eq!(
            drag.pointer_down(&board, 2, Point::new(215.0, 175.0), Modifiers::NONE),
            None
        );
        assert!(matches!(drag.preview(&a), Some(Preview::Position(_))));
    }

    #[test]
    fn test_independent_items_multi_touch() {
        let (board, a, b) = setup();
        let mut drag = DragController::new(GeometryConfig::default());
        drag.pointer_down(&board, 1, Point::new(10.0, 10.0), Modifiers::NONE);
        drag.pointer_down(&board, 2, Point::new(310.0, 10.0), Modifiers::NONE);
        drag.pointer_move(1, Point::new(20.0, 10.0));
        drag.pointer_move(2, Point::new(310.0, 30.0));

        let cb = drag.pointer_up(&board, 2, Point::new(310.0, 30.0)).unwrap();
        let ca = drag.pointer_up(&board, 1, Point::new(20.0, 10.0)).unwrap();
        assert_eq!(
            ca,
            Commit::Position {
                id: a,
                position: Point::new(10.0, 0.0)
            }
        );
        assert_eq!(
            cb,
            Commit::Position {
                id: b,
                position: Point::new(300.0, 20.0)
            }
        );
    }

    #[test]
    fn test_connect_gesture_drops_on_other_item() {
        let (mut board, a, b) = setup();
        let mut drag = DragController::new(GeometryConfig::default());
        drag.pointer_down(&board, 1, Point::new(10.0, 10.0), Modifiers::SHIFT)
            .unwrap();
        assert_eq!(
            drag.pointer_move(1, Point::new(200.0, 50.0)),
            Some((a.clone(), Preview::Connect(Point::new(200.0, 50.0))))
        );
        let commit = drag.pointer_up(&board, 1, Point::new(350.0, 50.0)).unwrap();
        assert_eq!(
            commit,
            Commit::Connect {
                a: a.clone(),
                b: b.clone()
            }
        );
        apply_commit(&mut board, commit, ConnectionStyle::default()).unwrap();
        assert!(board.connections()[0].joins(&a, &b));
        // Geometry untouched by a connect gesture
        assert_eq!(board.item(&a).unwrap().position, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_connect_gesture_onto_self_or_empty_cancels() {
        let (board, _, _) = setup();
        let mut drag = DragController::new(GeometryConfig::default());
        drag.pointer_down(&board, 1, Point::new(10.0, 10.0), Modifiers::SHIFT);
        assert_eq!(drag.pointer_up(&board, 1, Point::new(20.0, 20.0)), None);
        drag.pointer_down(&board, 1, Point::new(10.0, 10.0), Modifiers::SHIFT);
        assert_eq!(drag.pointer_up(&board, 1, Point::new(1000.0, 1000.0)), None);
    }

    #[test]
    fn test_other_modifiers_start_nothing() {
        let (board, _, _) = setup();
        let mut drag = DragController::new(GeometryConfig::default());
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        assert_eq!(drag.pointer_down(&board, 1, Point::new(10.0, 10.0), ctrl), None);
    }

    #[test]
    fn test_commit_after_delete_is_not_found() {
        let (mut board, a, _) = setup();
        let mut drag = DragController::new(GeometryConfig::default());
        drag.pointer_down(&board, 1, Point::new(10.0, 10.0), Modifiers::NONE);
        let commit = drag.pointer_up(&board, 1, Point::new(30.0, 30.0)).unwrap();
        remove_item(&mut board, &a).unwrap();
        assert_eq!(
            apply_commit(&mut board, commit, ConnectionStyle::default()),
            Err(BoardError::NotFound(a))
        );
    }

    #[test]
    fn test_stale_pointer_is_cancelled_on_reuse() {
        let (board, a, b) = setup();
        let mut drag = DragController::new(GeometryConfig::default());
        drag.pointer_down(&board, 1, Point::new(10.0, 10.0), Modifiers::NONE);
        // The up for pointer 1 was lost; it presses again elsewhere
        drag.pointer_down(&board, 1, Point::new(310.0, 10.0), Modifiers::NONE);
        assert!(!drag.is_active(&a));
        assert!(drag.is_active(&b));
    }

    #[test]
    fn test_item_interaction_ignores_foreign_pointer() {
        let (board, a, _) = setup();
        let item = board.item(&a).unwrap();
        let mut interaction = ItemInteraction::new(&a);
        let limits = GeometryConfig::default();
        assert!(interaction.pointer_down(
            1,
            Point::new(5.0, 5.0),
            HitPart::Body,
            Modifiers::NONE,
            item
        ));
        assert_eq!(interaction.pointer_move(2, Point::new(50.0, 50.0), &limits), None);
        assert_eq!(interaction.pointer_up(2, Point::new(50.0, 50.0), None, &limits), None);
        assert!(!interaction.is_idle());
    }
}
