use crate::model::board::{Board, BoardEvent};
use crate::model::connection::{Connection, ConnectionStyle};
use crate::model::geometry::{Point, Size};
use crate::model::item::{BoardItem, NewItem};

/// Error type for board operations
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BoardError {
    #[error("item not found: {0}")]
    NotFound(String),
    #[error("cannot connect {a} to {b}: {reason}")]
    InvalidConnection { a: String, b: String, reason: String },
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Place a new item on top of the board. Returns the assigned ID.
///
/// Size defaults to the kind's default and is raised to the board minimum.
pub fn add_item(board: &mut Board, new: NewItem) -> Result<String, BoardError> {
    if !new.position.is_finite() {
        return Err(BoardError::DegenerateGeometry(format!(
            "position ({}, {}) is not finite",
            new.position.x, new.position.y
        )));
    }
    if let Some(size) = new.size
        && !size.is_finite()
    {
        return Err(BoardError::DegenerateGeometry(format!(
            "size {}x{} is not finite",
            size.width, size.height
        )));
    }

    let size = clamp_size(board, new.size.unwrap_or_else(|| new.kind.default_size()));
    let id = format!("{}-{:03}", new.kind.id_prefix(), board.next_item_seq);
    board.next_item_seq += 1;

    let item = BoardItem {
        id: id.clone(),
        kind: new.kind,
        content: new.content,
        image: new.image,
        position: new.position,
        size,
        metadata: new.metadata,
        expanded: true,
        selected: false,
    };
    board.items.insert(id.clone(), item);
    board.emit(BoardEvent::ItemAdded { id: id.clone() });
    Ok(id)
}

/// Replace an item's position. The board is unbounded, so no clamping.
pub fn update_item_position(
    board: &mut Board,
    id: &str,
    position: Point,
) -> Result<(), BoardError> {
    if !position.is_finite() {
        return Err(BoardError::DegenerateGeometry(format!(
            "position ({}, {}) is not finite",
            position.x, position.y
        )));
    }
    let item = find_item_mut(board, id)?;
    item.position = position;
    board.emit(BoardEvent::PositionChanged {
        id: id.to_string(),
        position,
    });
    Ok(())
}

/// Replace an item's size, raised to the board minimum
pub fn update_item_size(board: &mut Board, id: &str, size: Size) -> Result<(), BoardError> {
    if !size.is_finite() {
        return Err(BoardError::DegenerateGeometry(format!(
            "size {}x{} is not finite",
            size.width, size.height
        )));
    }
    let size = clamp_size(board, size);
    let item = find_item_mut(board, id)?;
    item.size = size;
    board.emit(BoardEvent::SizeChanged {
        id: id.to_string(),
        size,
    });
    Ok(())
}

pub fn update_item_content(board: &mut Board, id: &str, text: String) -> Result<(), BoardError> {
    let item = find_item_mut(board, id)?;
    item.content = text;
    board.emit(BoardEvent::ContentChanged { id: id.to_string() });
    Ok(())
}

/// Remove an item and every connection that references it.
/// Returns the removed item.
pub fn remove_item(board: &mut Board, id: &str) -> Result<BoardItem, BoardError> {
    let item = board
        .items
        .shift_remove(id)
        .ok_or_else(|| BoardError::NotFound(id.to_string()))?;

    let (dropped, kept): (Vec<Connection>, Vec<Connection>) = std::mem::take(&mut board.connections)
        .into_iter()
        .partition(|c| c.touches(id));
    board.connections = kept;
    for c in dropped {
        board.emit(BoardEvent::ConnectionRemoved {
            id: c.id,
            a: c.a,
            b: c.b,
        });
    }

    board.emit(BoardEvent::ItemRemoved { id: id.to_string() });
    Ok(item)
}

pub fn set_expanded(board: &mut Board, id: &str, expanded: bool) -> Result<(), BoardError> {
    let item = find_item_mut(board, id)?;
    if item.expanded == expanded {
        return Ok(());
    }
    item.expanded = expanded;
    board.emit(BoardEvent::ExpandedChanged {
        id: id.to_string(),
        expanded,
    });
    Ok(())
}

/// Move an item to the top of the z-order
pub fn bring_to_front(board: &mut Board, id: &str) -> Result<(), BoardError> {
    let index = board
        .items
        .get_index_of(id)
        .ok_or_else(|| BoardError::NotFound(id.to_string()))?;
    let last = board.items.len() - 1;
    if index == last {
        return Ok(());
    }
    board.items.move_index(index, last);
    board.emit(BoardEvent::Reordered { id: id.to_string() });
    Ok(())
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Mark an item selected, or pass `None` to clear every selection flag.
///
/// Other items keep their flags: exclusivity is up to the host
/// (see `clear_selection`).
pub fn select(board: &mut Board, id: Option<&str>) -> Result<(), BoardError> {
    match id {
        Some(id) => {
            let item = find_item_mut(board, id)?;
            item.selected = true;
            board.emit(BoardEvent::SelectionChanged {
                id: Some(id.to_string()),
            });
        }
        None => {
            clear_selection(board);
            board.emit(BoardEvent::SelectionChanged { id: None });
        }
    }
    Ok(())
}

/// Clear the selected flag on every item. Emits nothing on its own.
pub fn clear_selection(board: &mut Board) {
    for item in board.items.values_mut() {
        item.selected = false;
    }
}

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

/// Link two distinct existing items. Duplicates between the same pair are allowed.
pub fn connect(
    board: &mut Board,
    a: &str,
    b: &str,
    style: ConnectionStyle,
) -> Result<String, BoardError> {
    let invalid = |reason: &str| BoardError::InvalidConnection {
        a: a.to_string(),
        b: b.to_string(),
        reason: reason.to_string(),
    };
    if a == b {
        return Err(invalid("an item cannot be connected to itself"));
    }
    if !board.contains_item(a) {
        return Err(invalid(&format!("unknown item {}", a)));
    }
    if !board.contains_item(b) {
        return Err(invalid(&format!("unknown item {}", b)));
    }

    let id = format!("C-{:03}", board.next_connection_seq);
    board.next_connection_seq += 1;
    board.connections.push(Connection {
        id: id.clone(),
        a: a.to_string(),
        b: b.to_string(),
        style,
    });
    board.emit(BoardEvent::ConnectionCreated {
        id: id.clone(),
        a: a.to_string(),
        b: b.to_string(),
    });
    Ok(id)
}

/// Remove a single connection by its ID
pub fn disconnect(board: &mut Board, connection_id: &str) -> Result<Connection, BoardError> {
    let index = board
        .connections
        .iter()
        .position(|c| c.id == connection_id)
        .ok_or_else(|| BoardError::NotFound(connection_id.to_string()))?;
    let removed = board.connections.remove(index);
    board.emit(BoardEvent::ConnectionRemoved {
        id: removed.id.clone(),
        a: removed.a.clone(),
        b: removed.b.clone(),
    });
    Ok(removed)
}

/// Drop connections whose endpoints no longer exist (only possible for
/// restored data). Returns the removed connections.
pub fn prune_dangling(board: &mut Board) -> Vec<Connection> {
    let items = &board.items;
    let (dangling, kept): (Vec<Connection>, Vec<Connection>) =
        std::mem::take(&mut board.connections)
            .into_iter()
            .partition(|c| !items.contains_key(&c.a) || !items.contains_key(&c.b));
    board.connections = kept;
    for c in &dangling {
        board.emit(BoardEvent::ConnectionRemoved {
            id: c.id.clone(),
            a: c.a.clone(),
            b: c.b.clone(),
        });
    }
    dangling
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn clamp_size(board: &Board, size: Size) -> Size {
    let min = board.limits.min_size();
    size.clamp_min(min.width, min.height)
}

fn find_item_mut<'a>(board: &'a mut Board, id: &str) -> Result<&'a mut BoardItem, BoardError> {
    board
        .items
        .get_mut(id)
        .ok_or_else(|| BoardError::NotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::board::BoardDocument;
    use crate::model::config::GeometryConfig;
    use crate::model::item::ItemKind;
    use pretty_assertions::assert_eq;

    fn board_with_two() -> (Board, String, String) {
        let mut board = Board::default();
        let a = add_item(
            &mut board,
            NewItem::new(ItemKind::Photo, "Suspect", Point::new(0.0, 0.0))
                .with_size(Size::new(220.0, 180.0)),
        )
        .unwrap();
        let b = add_item(
            &mut board,
            NewItem::new(ItemKind::Evidence, "Knife", Point::new(300.0, 0.0)),
        )
        .unwrap();
        board.take_events();
        (board, a, b)
    }

    #[test]
    fn test_add_item_assigns_prefixed_ids() {
        let (board, a, b) = board_with_two();
        assert_eq!(a, "PH-001");
        assert_eq!(b, "EV-002");
        assert_eq!(board.item(&b).unwrap().size, ItemKind::Evidence.default_size());
    }

    #[test]
    fn test_add_item_rejects_non_finite() {
        let mut board = Board::default();
        let err = add_item(
            &mut board,
            NewItem::new(ItemKind::Note, "x", Point::new(f64::NAN, 0.0)),
        )
        .unwrap_err();
        assert!(matches!(err, BoardError::DegenerateGeometry(_)));

        let err = add_item(
            &mut board,
            NewItem::new(ItemKind::Note, "x", Point::new(0.0, 0.0))
                .with_size(Size::new(f64::INFINITY, 10.0)),
        )
        .unwrap_err();
        assert!(matches!(err, BoardError::DegenerateGeometry(_)));
        assert_eq!(board.item_count(), 0);
        assert!(!board.has_pending_events());
    }

    #[test]
    fn test_add_item_clamps_small_size() {
        let mut board = Board::default();
        let id = add_item(
            &mut board,
            NewItem::new(ItemKind::Note, "x", Point::default()).with_size(Size::new(10.0, 500.0)),
        )
        .unwrap();
        assert_eq!(board.item(&id).unwrap().size, Size::new(160.0, 500.0));
    }

    #[test]
    fn test_ids_not_reused_after_remove() {
        let (mut board, _a, b) = board_with_two();
        remove_item(&mut board, &b).unwrap();
        let c = add_item(
            &mut board,
            NewItem::new(ItemKind::Evidence, "Glove", Point::default()),
        )
        .unwrap();
        assert_eq!(c, "EV-003");
    }

    #[test]
    fn test_update_position_no_clamping() {
        let (mut board, a, _) = board_with_two();
        update_item_position(&mut board, &a, Point::new(-5000.0, 1e6)).unwrap();
        assert_eq!(board.item(&a).unwrap().position, Point::new(-5000.0, 1e6));
        assert_eq!(
            board.take_events(),
            vec![BoardEvent::PositionChanged {
                id: a.clone(),
                position: Point::new(-5000.0, 1e6)
            }]
        );
    }

    #[test]
    fn test_update_unknown_is_not_found() {
        let mut board = Board::default();
        assert_eq!(
            update_item_position(&mut board, "PH-404", Point::default()),
            Err(BoardError::NotFound("PH-404".into()))
        );
        assert_eq!(
            update_item_size(&mut board, "PH-404", Size::new(300.0, 300.0)),
            Err(BoardError::NotFound("PH-404".into()))
        );
        assert_eq!(
            update_item_content(&mut board, "PH-404", "x".into()),
            Err(BoardError::NotFound("PH-404".into()))
        );
        assert!(remove_item(&mut board, "PH-404").is_err());
        assert!(select(&mut board, Some("PH-404")).is_err());
    }

    #[test]
    fn test_update_size_clamps_to_floor() {
        let (mut board, a, _) = board_with_two();
        update_item_size(&mut board, &a, Size::new(-400.0, 5.0)).unwrap();
        assert_eq!(board.item(&a).unwrap().size, Size::new(160.0, 120.0));
    }

    #[test]
    fn test_update_size_uses_board_limits() {
        let mut board = Board::new(GeometryConfig {
            min_width: 200.0,
            min_height: 150.0,
            resize_handle: 16.0,
        });
        let id = add_item(&mut board, NewItem::new(ItemKind::Clue, "x", Point::default())).unwrap();
        assert_eq!(board.item(&id).unwrap().size, Size::new(200.0, 150.0));
    }

    #[test]
    fn test_configured_limits_never_lower_the_floor() {
        let config: crate::model::config::BoardConfig = toml::from_str(
            "[board]\nname = \"x\"\n\n[geometry]\nmin_width = nan\nmin_height = 10.0\n",
        )
        .unwrap();
        let mut board = Board::new(config.geometry);
        let id = add_item(&mut board, NewItem::new(ItemKind::Clue, "x", Point::default())).unwrap();
        update_item_size(&mut board, &id, Size::new(-500.0, 5.0)).unwrap();
        assert_eq!(board.item(&id).unwrap().size, Size::new(160.0, 120.0));
    }

    #[test]
    fn test_update_content_accepts_empty() {
        let (mut board, a, _) = board_with_two();
        update_item_content(&mut board, &a, String::new()).unwrap();
        assert_eq!(board.item(&a).unwrap().content, "");
    }

    #[test]
    fn test_remove_cascades_connections() {
        let (mut board, a, b) = board_with_two();
        let c = add_item(&mut board, NewItem::new(ItemKind::Note, "n", Point::default())).unwrap();
        connect(&mut board, &a, &b, ConnectionStyle::default()).unwrap();
        connect(&mut board, &b, &a, ConnectionStyle::default()).unwrap();
        let keep = connect(&mut board, &b, &c, ConnectionStyle::default()).unwrap();
        board.take_events();

        remove_item(&mut board, &a).unwrap();
        assert!(board.connections().iter().all(|conn| !conn.touches(&a)));
        assert_eq!(board.connections().len(), 1);
        assert_eq!(board.connections()[0].id, keep);

        let events = board.take_events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2], BoardEvent::ItemRemoved { id: a });
    }

    #[test]
    fn test_connect_rejects_self_loop() {
        let (mut board, a, b) = board_with_two();
        connect(&mut board, &a, &b, ConnectionStyle::default()).unwrap();
        let before = board.connections().to_vec();
        let err = connect(&mut board, &a, &a, ConnectionStyle::default()).unwrap_err();
        assert!(matches!(err, BoardError::InvalidConnection { .. }));
        assert_eq!(board.connections(), before.as_slice());
    }

    #[test]
    fn test_connect_rejects_unknown() {
        let (mut board, a, _) = board_with_two();
        let err = connect(&mut board, &a, "NT-999", ConnectionStyle::default()).unwrap_err();
        assert!(matches!(err, BoardError::InvalidConnection { .. }));
        assert!(board.connections().is_empty());
    }

    #[test]
    fn test_connect_allows_duplicates() {
        let (mut board, a, b) = board_with_two();
        let c1 = connect(&mut board, &a, &b, ConnectionStyle::default()).unwrap();
        let c2 = connect(&mut board, &a, &b, ConnectionStyle::default()).unwrap();
        assert_ne!(c1, c2);
        assert_eq!(board.connections().len(), 2);
    }

    #[test]
    fn test_disconnect() {
        let (mut board, a, b) = board_with_two();
        let c = connect(&mut board, &a, &b, ConnectionStyle::default()).unwrap();
        let removed = disconnect(&mut board, &c).unwrap();
        assert_eq!(removed.id, c);
        assert!(board.connections().is_empty());
        assert_eq!(
            disconnect(&mut board, &c),
            Err(BoardError::NotFound(c.clone()))
        );
    }

    #[test]
    fn test_select_is_not_exclusive() {
        let (mut board, a, b) = board_with_two();
        select(&mut board, Some(&a)).unwrap();
        select(&mut board, Some(&b)).unwrap();
        assert_eq!(board.selected_ids(), vec![a.as_str(), b.as_str()]);

        select(&mut board, None).unwrap();
        assert!(board.selected_ids().is_empty());
    }

    #[test]
    fn test_select_leaves_geometry_and_order() {
        let (mut board, a, b) = board_with_two();
        let before: Vec<_> = board.items().map(|i| (i.id.clone(), i.position, i.size)).collect();
        select(&mut board, Some(&a)).unwrap();
        let after: Vec<_> = board.items().map(|i| (i.id.clone(), i.position, i.size)).collect();
        assert_eq!(before, after);
        assert_eq!(board.items().last().unwrap().id, b);
    }

    #[test]
    fn test_bring_to_front() {
        let (mut board, a, b) = board_with_two();
        bring_to_front(&mut board, &a).unwrap();
        let order: Vec<&str> = board.items().map(|i| i.id.as_str()).collect();
        assert_eq!(order, vec![b.as_str(), a.as_str()]);

        board.take_events();
        bring_to_front(&mut board, &a).unwrap();
        assert!(!board.has_pending_events());
    }

    #[test]
    fn test_set_expanded_emits_once() {
        let (mut board, a, _) = board_with_two();
        set_expanded(&mut board, &a, false).unwrap();
        set_expanded(&mut board, &a, false).unwrap();
        assert!(!board.item(&a).unwrap().expanded);
        assert_eq!(board.take_events().len(), 1);
    }

    #[test]
    fn test_prune_dangling_after_restore() {
        let (board, a, b) = board_with_two();
        let mut doc = board.to_document();
        doc.connections.push(Connection {
            id: "C-010".into(),
            a: a.clone(),
            b: "NT-404".into(),
            style: ConnectionStyle::default(),
        });
        doc.connections.push(Connection {
            id: "C-011".into(),
            a: a.clone(),
            b: b.clone(),
            style: ConnectionStyle::default(),
        });
        let mut restored = Board::from_document(doc, GeometryConfig::default());
        let pruned = prune_dangling(&mut restored);
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].id, "C-010");
        assert_eq!(restored.connections().len(), 1);
    }

    #[test]
    fn test_restored_document_round_trip() {
        let (mut board, a, b) = board_with_two();
        connect(&mut board, &a, &b, ConnectionStyle::default()).unwrap();
        let json = serde_json::to_string(&board.to_document()).unwrap();
        let doc: BoardDocument = serde_json::from_str(&json).unwrap();
        let restored = Board::from_document(doc, GeometryConfig::default());
        assert_eq!(restored.item(&a), board.item(&a));
        assert_eq!(restored.connections(), board.connections());
    }
}
