mod init;
pub use init::cmd_init;

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

/// Global override for the board directory (set by -C flag)
static BOARD_DIR_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::board_io::{self, BOARD_DIR, BoardIoError, Workspace};
use crate::io::config_io;
use crate::io::journal::{self, JournalCategory};
use crate::io::lock::BoardLock;
use crate::model::connection::LineStyle;
use crate::model::geo::GeoMarker;
use crate::model::geometry::{Point, Size};
use crate::model::item::{Importance, ItemKind, ItemMetadata, NewItem};
use crate::ops::{board_ops, check, connection_line, globe, search};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;

    if let Some(ref dir) = cli.board_dir {
        let abs = std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        let _ = BOARD_DIR_OVERRIDE.set(abs);
    }

    match cli.command {
        // No subcommand launches the TUI from main.rs
        None => Ok(()),
        Some(cmd) => match cmd {
            Commands::Init(args) => cmd_init(args),

            // Read commands
            Commands::List(args) => cmd_list(args, json),
            Commands::Show(args) => cmd_show(args, json),
            Commands::Connections => cmd_connections(json),
            Commands::Line(args) => cmd_line(args, json),
            Commands::Search(args) => cmd_search(args, json),
            Commands::Check(args) => cmd_check(args, json),
            Commands::Globe(args) => cmd_globe(args, json),
            Commands::Log(args) => cmd_log(args, json),

            // Write commands
            Commands::Add(args) => cmd_add(args, json),
            Commands::Move(args) => cmd_move(args),
            Commands::Resize(args) => cmd_resize(args),
            Commands::Edit(args) => cmd_edit(args),
            Commands::Rm(args) => cmd_rm(args),
            Commands::Connect(args) => cmd_connect(args),
            Commands::Disconnect(args) => cmd_disconnect(args),
            Commands::Marker(args) => cmd_marker(args, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn workspace_root() -> Result<PathBuf, BoardIoError> {
    let start = match BOARD_DIR_OVERRIDE.get() {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    board_io::discover_board(&start)
}

fn load_workspace_cwd() -> Result<Workspace, BoardIoError> {
    board_io::load_workspace(&workspace_root()?)
}

/// Lock the board, load it, apply `f`, then save and journal the events.
fn with_board<T>(
    f: impl FnOnce(&mut Workspace) -> Result<T, Box<dyn std::error::Error>>,
) -> Result<T, Box<dyn std::error::Error>> {
    let root = workspace_root()?;
    let _lock = BoardLock::acquire_default(&root.join(BOARD_DIR))?;
    let mut ws = board_io::load_workspace(&root)?;
    let out = f(&mut ws)?;
    ws.save()?;
    Ok(out)
}

fn parse_kind(s: &str) -> Result<ItemKind, String> {
    ItemKind::parse_kind(s).ok_or_else(|| {
        let kinds: Vec<String> = ItemKind::ALL.iter().map(|k| k.to_string()).collect();
        format!("unknown kind '{}' (expected one of: {})", s, kinds.join(", "))
    })
}

fn parse_line_style(s: &str) -> Result<LineStyle, String> {
    LineStyle::parse_style(s)
        .ok_or_else(|| format!("unknown style '{}' (solid, dashed, dotted, zigzag)", s))
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, json: bool) -> CmdResult {
    let ws = load_workspace_cwd()?;
    let kind = args.kind.as_deref().map(parse_kind).transpose()?;
    let items: Vec<_> = ws
        .board
        .items()
        .filter(|i| kind.is_none_or(|k| i.kind == k))
        .collect();

    if json {
        let out: Vec<ItemJson> = items.iter().map(|i| item_to_json(i)).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for item in items {
            println!("{}", format_item_line(item));
        }
    }
    Ok(())
}

fn cmd_show(args: IdArg, json: bool) -> CmdResult {
    let ws = load_workspace_cwd()?;
    let item = ws
        .board
        .item(&args.id)
        .ok_or_else(|| format!("item not found: {}", args.id))?;

    if json {
        let mut ij = item_to_json(item);
        ij.connections = ws
            .board
            .connections_of(&item.id)
            .map(connection_to_json)
            .collect();
        println!("{}", serde_json::to_string_pretty(&ij)?);
    } else {
        for line in format_item_detail(&ws.board, item) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_connections(json: bool) -> CmdResult {
    let ws = load_workspace_cwd()?;
    if json {
        let out: Vec<ConnectionJson> =
            ws.board.connections().iter().map(connection_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for conn in ws.board.connections() {
            println!("{}", format_connection_line(conn));
        }
    }
    Ok(())
}

fn cmd_line(args: IdArg, json: bool) -> CmdResult {
    let ws = load_workspace_cwd()?;
    let conn = ws
        .board
        .connection(&args.id)
        .ok_or_else(|| format!("connection not found: {}", args.id))?;
    let geometry = connection_line::connection_geometry(
        &ws.board,
        conn,
        ws.config.connections.min_line_length,
    )
    .ok_or_else(|| {
        format!("connection {} has a missing endpoint (try `cb check --fix`)", conn.id)
    })?;
    let pattern = connection_line::stroke_pattern(conn.style.line, conn.style.thickness);
    let zigzag = if conn.style.line == LineStyle::Zigzag {
        connection_line::zigzag_for(&geometry, conn.style.thickness, 0.0..geometry.render_length)
    } else {
        Vec::new()
    };

    if json {
        let out = LineJson {
            connection: conn.id.clone(),
            geometry,
            render_end: geometry.render_end(),
            pattern,
            zigzag,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{} {} ({}, {}) -> {} ({}, {})",
        conn.id,
        conn.a,
        fmt_num(geometry.start.x),
        fmt_num(geometry.start.y),
        conn.b,
        fmt_num(geometry.end.x),
        fmt_num(geometry.end.y),
    );
    println!(
        "length {}  drawn {}  angle {}°",
        fmt_num(geometry.length),
        fmt_num(geometry.render_length),
        fmt_num(geometry.angle_deg)
    );
    println!(
        "midpoint ({}, {})",
        fmt_num(geometry.midpoint.x),
        fmt_num(geometry.midpoint.y)
    );
    if pattern.is_empty() {
        println!("stroke {}", conn.style.line);
    } else {
        let dashes: Vec<String> = pattern.iter().map(|p| fmt_num(*p)).collect();
        println!("stroke {} [{}]", conn.style.line, dashes.join(", "));
    }
    Ok(())
}

fn cmd_search(args: SearchArgs, json: bool) -> CmdResult {
    let ws = load_workspace_cwd()?;
    let re = Regex::new(&args.pattern)?;
    let hits = search::search_board(&ws.board, &re);

    if json {
        let out: Vec<SearchHitJson> = hits
            .iter()
            .map(|h| SearchHitJson {
                id: h.id.clone(),
                field: h.field.as_str().to_string(),
                text: matched_text(&ws, h),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for id in search::matching_item_ids(&ws.board, &hits) {
        if let Some(item) = ws.board.item(&id) {
            println!("{}", format_item_line(item));
        }
    }
    for hit in hits.iter().filter(|h| h.field == search::MatchField::Label) {
        if let Some(conn) = ws.board.connection(&hit.id) {
            println!("{}", format_connection_line(conn));
        }
    }
    Ok(())
}

/// The full text of the field a hit landed in
fn matched_text(ws: &Workspace, hit: &search::SearchHit) -> String {
    use search::MatchField;
    if hit.field == MatchField::Label {
        return ws
            .board
            .connection(&hit.id)
            .and_then(|c| c.style.label.clone())
            .unwrap_or_default();
    }
    let Some(item) = ws.board.item(&hit.id) else {
        return String::new();
    };
    let meta = item.metadata.as_ref();
    match hit.field {
        MatchField::Id => item.id.clone(),
        MatchField::Content => item.content.clone(),
        MatchField::Location => meta.and_then(|m| m.location.clone()).unwrap_or_default(),
        MatchField::Date => meta.and_then(|m| m.date.clone()).unwrap_or_default(),
        MatchField::Status => meta.and_then(|m| m.status.clone()).unwrap_or_default(),
        MatchField::Label => String::new(),
    }
}

fn cmd_check(args: CheckArgs, json: bool) -> CmdResult {
    let root = workspace_root()?;
    let board_dir = root.join(BOARD_DIR);

    if args.fix {
        let report = with_board(|ws| Ok(check::fix_board(&mut ws.board)))?;
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else if report.is_empty() {
            println!("nothing to fix");
        } else {
            for id in &report.pruned {
                println!("pruned dangling connection {}", id);
            }
            for id in &report.self_loops {
                println!("removed self-loop {}", id);
            }
            for id in &report.resized {
                println!("resized {} to the minimum size", id);
            }
        }
        return Ok(());
    }

    let config = board_io::read_config(&board_dir)?;
    let doc = board_io::read_document(&board_dir)?;
    let result = check::check_document(
        &doc,
        &root,
        &config.geometry,
        config.globe.primary.as_deref(),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if !result.errors.is_empty() {
        println!("Errors:");
        for err in &result.errors {
            match err {
                check::CheckError::DanglingConnection {
                    connection_id,
                    missing,
                } => println!("  {} references missing item {}", connection_id, missing),
                check::CheckError::SelfLoop { connection_id } => {
                    println!("  {} connects an item to itself", connection_id)
                }
                check::CheckError::DuplicateItemId { id, count } => {
                    println!("  item {} appears {} times", id, count)
                }
                check::CheckError::DuplicateConnectionId { id, count } => {
                    println!("  connection {} appears {} times", id, count)
                }
                check::CheckError::NonFiniteGeometry { id } => {
                    println!("  {} has a non-finite position or size", id)
                }
                check::CheckError::MarkerOutOfRange { index, detail } => {
                    println!("  marker {}: {}", index, detail)
                }
            }
        }
    }
    if !result.warnings.is_empty() {
        if !result.errors.is_empty() {
            println!();
        }
        println!("Warnings:");
        for warn in &result.warnings {
            match warn {
                check::CheckWarning::UndersizedItem { id, width, height } => println!(
                    "  {} is {}x{}, below the minimum size",
                    id,
                    fmt_num(*width),
                    fmt_num(*height)
                ),
                check::CheckWarning::RepeatedConnection { a, b, ids } => {
                    println!("  {} and {} are connected {} times", a, b, ids.len())
                }
                check::CheckWarning::MissingImage { id, path } => {
                    println!("  {} image not found: {}", id, path)
                }
                check::CheckWarning::UnknownPrimaryMarker { id } => {
                    println!("  globe.primary '{}' matches no marker", id)
                }
            }
        }
    }
    if result.valid {
        println!("✓ board is valid");
    } else {
        println!("✗ board has errors (some can be repaired with `cb check --fix`)");
    }
    Ok(())
}

fn cmd_globe(args: GlobeArgs, json: bool) -> CmdResult {
    let ws = load_workspace_cwd()?;
    let primary = args.primary.or_else(|| ws.config.globe.primary.clone());
    let segments = args.segments.unwrap_or(ws.config.globe.arc_segments);
    let arcs = globe::star_arcs(
        &ws.board.markers,
        primary.as_deref(),
        ws.config.globe.radius,
        segments,
        ws.config.globe.arc_lift,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&arcs)?);
        return Ok(());
    }

    if arcs.is_empty() {
        println!("no arcs (add at least two markers with `cb marker add`)");
        return Ok(());
    }
    for arc in &arcs {
        let apex = arc
            .points
            .iter()
            .map(|p| p.length())
            .fold(0.0_f64, f64::max);
        println!(
            "{} -> {}  {} points, apex {:.3}",
            arc.from,
            arc.to,
            arc.points.len(),
            apex
        );
    }
    Ok(())
}

fn cmd_log(args: LogArgs, json: bool) -> CmdResult {
    let root = workspace_root()?;
    let category = match args.category.as_deref() {
        Some(c) => Some(
            JournalCategory::parse_category(c)
                .ok_or_else(|| format!("unknown category '{}' (event, write, delete, parser)", c))?,
        ),
        None => None,
    };
    let entries = journal::read_entries(&root.join(BOARD_DIR), Some(args.limit), category);

    if json {
        let out: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    for entry in &entries {
        println!(
            "{} {:<6} {}",
            entry
                .timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            entry.category.to_string(),
            entry.description
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, json: bool) -> CmdResult {
    let kind = parse_kind(&args.kind)?;
    let importance = args
        .importance
        .as_deref()
        .map(|s| {
            Importance::parse_importance(s)
                .ok_or_else(|| format!("unknown importance '{}' (high, medium, low)", s))
        })
        .transpose()?;

    let mut new = NewItem::new(kind, args.content, Point::new(args.x, args.y)).with_metadata(
        ItemMetadata {
            location: args.location,
            date: args.date,
            importance,
            status: args.status,
        },
    );
    if args.width.is_some() || args.height.is_some() {
        let default = kind.default_size();
        new = new.with_size(Size::new(
            args.width.unwrap_or(default.width),
            args.height.unwrap_or(default.height),
        ));
    }
    if let Some(image) = args.image {
        new = new.with_image(image);
    }

    let item = with_board(|ws| {
        let id = board_ops::add_item(&mut ws.board, new)?;
        Ok(ws.board.item(&id).map(item_to_json))
    })?
    .ok_or("item vanished after add")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        println!("{}", item.id);
    }
    Ok(())
}

fn cmd_move(args: MoveArgs) -> CmdResult {
    with_board(|ws| {
        board_ops::update_item_position(&mut ws.board, &args.id, Point::new(args.x, args.y))?;
        Ok(())
    })
}

fn cmd_resize(args: ResizeArgs) -> CmdResult {
    let requested = Size::new(args.width, args.height);
    let actual = with_board(|ws| {
        board_ops::update_item_size(&mut ws.board, &args.id, requested)?;
        Ok(ws.board.item(&args.id).map(|i| i.size))
    })?;
    if let Some(size) = actual
        && size != requested
    {
        eprintln!(
            "note: clamped to {}x{}",
            fmt_num(size.width),
            fmt_num(size.height)
        );
    }
    Ok(())
}

fn cmd_edit(args: EditArgs) -> CmdResult {
    with_board(|ws| {
        board_ops::update_item_content(&mut ws.board, &args.id, args.text)?;
        Ok(())
    })
}

fn cmd_rm(args: IdArg) -> CmdResult {
    let cascaded = with_board(|ws| {
        let cascaded = ws.board.connections_of(&args.id).count();
        let item = board_ops::remove_item(&mut ws.board, &args.id)?;
        journal::log_item_deletion(&ws.board_dir, &item, cascaded);
        Ok(cascaded)
    })?;
    match cascaded {
        0 => println!("removed {}", args.id),
        1 => println!("removed {} and 1 connection", args.id),
        n => println!("removed {} and {} connections", args.id, n),
    }
    Ok(())
}

fn cmd_connect(args: ConnectArgs) -> CmdResult {
    let id = with_board(|ws| {
        let mut style = ws.config.connections.default_style();
        if let Some(color) = args.color {
            style.color = color;
        }
        if let Some(s) = args.style.as_deref() {
            style.line = parse_line_style(s)?;
        }
        if let Some(thickness) = args.thickness {
            style.thickness = thickness;
        }
        style.label = args.label;
        style.animated = args.animated;
        Ok(board_ops::connect(&mut ws.board, &args.a, &args.b, style)?)
    })?;
    println!("{}", id);
    Ok(())
}

fn cmd_disconnect(args: IdArg) -> CmdResult {
    with_board(|ws| {
        board_ops::disconnect(&mut ws.board, &args.id)?;
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

fn cmd_marker(args: MarkerCmd, json: bool) -> CmdResult {
    match args.action {
        MarkerAction::Add(add) => cmd_marker_add(add),
        MarkerAction::List => cmd_marker_list(json),
        MarkerAction::Primary(id) => cmd_marker_primary(id),
    }
}

fn cmd_marker_add(args: MarkerAddArgs) -> CmdResult {
    let mut marker = GeoMarker::new(args.lat, args.lon);
    marker.id = args.id;
    marker.label = args.label;
    if let Some(color) = args.color {
        marker.color = color;
    }
    if let Some(size) = args.size {
        marker.size = size;
    }
    marker.validate()?;

    let index = with_board(|ws| {
        if let Some(id) = &marker.id
            && ws.board.markers.iter().any(|m| m.id.as_ref() == Some(id))
        {
            return Err(format!("marker id already in use: {}", id).into());
        }
        ws.board.markers.push(marker);
        Ok(ws.board.markers.len() - 1)
    })?;
    println!("{}", index);
    Ok(())
}

fn cmd_marker_list(json: bool) -> CmdResult {
    let ws = load_workspace_cwd()?;
    let primary = primary_index(&ws);

    if json {
        let out: Vec<MarkerJson> = ws
            .board
            .markers
            .iter()
            .enumerate()
            .map(|(index, m)| MarkerJson {
                index,
                primary: Some(index) == primary,
                marker: m.clone(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for (index, m) in ws.board.markers.iter().enumerate() {
            println!("{}", format_marker_line(index, m, Some(index) == primary));
        }
    }
    Ok(())
}

/// Index of the marker arcs fan out from, if any
fn primary_index(ws: &Workspace) -> Option<usize> {
    match &ws.config.globe.primary {
        Some(id) => ws
            .board
            .markers
            .iter()
            .position(|m| m.id.as_deref() == Some(id.as_str())),
        None if ws.board.markers.is_empty() => None,
        None => Some(0),
    }
}

fn cmd_marker_primary(args: IdArg) -> CmdResult {
    let root = workspace_root()?;
    let board_dir = root.join(BOARD_DIR);
    let _lock = BoardLock::acquire_default(&board_dir)?;

    let doc = board_io::read_document(&board_dir)?;
    if !doc.markers.iter().any(|m| m.id.as_deref() == Some(args.id.as_str())) {
        return Err(format!("no marker with id {}", args.id).into());
    }

    let (_config, mut toml_doc) = config_io::read_config_doc(&board_dir)?;
    config_io::set_globe_primary(&mut toml_doc, &args.id);
    config_io::write_config(&board_dir, &toml_doc)?;
    Ok(())
}
