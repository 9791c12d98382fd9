use std::collections::{HashMap, HashSet};
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::board::{Board, BoardDocument};
use crate::model::config::GeometryConfig;
use crate::ops::board_ops;

/// Structured result from `cb check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A validation error (something that should be fixed).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckError {
    /// A connection endpoint references an item that doesn't exist
    DanglingConnection {
        connection_id: String,
        missing: String,
    },
    /// A connection from an item to itself
    SelfLoop { connection_id: String },
    /// The same item ID appears more than once
    DuplicateItemId { id: String, count: usize },
    DuplicateConnectionId { id: String, count: usize },
    /// Position or size contains NaN or infinity
    NonFiniteGeometry { id: String },
    /// Marker coordinates outside [-90, 90] / [-180, 180]
    MarkerOutOfRange { index: usize, detail: String },
}

/// A validation warning (non-critical issue).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckWarning {
    /// Stored size is below the configured minimum
    UndersizedItem { id: String, width: f64, height: f64 },
    /// More than one connection joins the same pair of items
    RepeatedConnection { a: String, b: String, ids: Vec<String> },
    /// Local image path that doesn't exist on disk
    MissingImage { id: String, path: String },
    /// Configured primary marker ID matches no marker
    UnknownPrimaryMarker { id: String },
}

/// Validate stored board data and return structured results.
///
/// Works on the raw document rather than a `Board` because duplicate IDs
/// collapse once loaded. Read-only.
///
/// Checks performed:
/// 1. Every connection endpoint resolves to an item
/// 2. No self-loops
/// 3. No duplicate item or connection IDs
/// 4. All positions and sizes are finite
/// 5. Marker coordinates are in range
/// 6. Warnings for undersized items, repeated connections, missing images,
///    and an unknown primary marker
pub fn check_document(
    doc: &BoardDocument,
    board_root: &Path,
    limits: &GeometryConfig,
    primary_marker: Option<&str>,
) -> CheckResult {
    let mut result = CheckResult::default();
    let min = limits.min_size();

    let item_ids: HashSet<&str> = doc.items.iter().map(|i| i.id.as_str()).collect();

    for (id, count) in find_duplicates(doc.items.iter().map(|i| i.id.as_str())) {
        result.errors.push(CheckError::DuplicateItemId { id, count });
    }
    for (id, count) in find_duplicates(doc.connections.iter().map(|c| c.id.as_str())) {
        result
            .errors
            .push(CheckError::DuplicateConnectionId { id, count });
    }

    for item in &doc.items {
        if !item.position.is_finite() || !item.size.is_finite() {
            result.errors.push(CheckError::NonFiniteGeometry {
                id: item.id.clone(),
            });
        } else if item.size.width < min.width || item.size.height < min.height {
            result.warnings.push(CheckWarning::UndersizedItem {
                id: item.id.clone(),
                width: item.size.width,
                height: item.size.height,
            });
        }

        if let Some(image) = &item.image
            && is_local_path(image)
            && !board_root.join(image).exists()
        {
            result.warnings.push(CheckWarning::MissingImage {
                id: item.id.clone(),
                path: image.clone(),
            });
        }
    }

    // pair (sorted) -> connection ids
    let mut pairs: HashMap<(&str, &str), Vec<String>> = HashMap::new();
    for conn in &doc.connections {
        for end in [&conn.a, &conn.b] {
            if !item_ids.contains(end.as_str()) {
                result.errors.push(CheckError::DanglingConnection {
                    connection_id: conn.id.clone(),
                    missing: end.clone(),
                });
            }
        }
        if conn.a == conn.b {
            result.errors.push(CheckError::SelfLoop {
                connection_id: conn.id.clone(),
            });
            continue;
        }
        let key = if conn.a <= conn.b {
            (conn.a.as_str(), conn.b.as_str())
        } else {
            (conn.b.as_str(), conn.a.as_str())
        };
        pairs.entry(key).or_default().push(conn.id.clone());
    }
    let mut repeated: Vec<_> = pairs.into_iter().filter(|(_, ids)| ids.len() > 1).collect();
    repeated.sort();
    for ((a, b), ids) in repeated {
        result.warnings.push(CheckWarning::RepeatedConnection {
            a: a.to_string(),
            b: b.to_string(),
            ids,
        });
    }

    for (index, marker) in doc.markers.iter().enumerate() {
        if let Err(e) = marker.validate() {
            result.errors.push(CheckError::MarkerOutOfRange {
                index,
                detail: e.to_string(),
            });
        }
    }

    if let Some(primary) = primary_marker
        && !doc.markers.iter().any(|m| m.id.as_deref() == Some(primary))
    {
        result.warnings.push(CheckWarning::UnknownPrimaryMarker {
            id: primary.to_string(),
        });
    }

    result.valid = result.errors.is_empty();
    result
}

/// What `cb check --fix` changed
#[derive(Debug, Default, Serialize)]
pub struct FixReport {
    pub pruned: Vec<String>,
    pub self_loops: Vec<String>,
    pub resized: Vec<String>,
}

impl FixReport {
    pub fn is_empty(&self) -> bool {
        self.pruned.is_empty() && self.self_loops.is_empty() && self.resized.is_empty()
    }
}

/// Repair what can be repaired on a loaded board: drop dangling connections
/// and self-loops, and grow undersized items to the minimum.
pub fn fix_board(board: &mut Board) -> FixReport {
    let mut report = FixReport {
        pruned: board_ops::prune_dangling(board)
            .into_iter()
            .map(|c| c.id)
            .collect(),
        ..Default::default()
    };

    let loops: Vec<String> = board
        .connections()
        .iter()
        .filter(|c| c.a == c.b)
        .map(|c| c.id.clone())
        .collect();
    for id in loops {
        if board_ops::disconnect(board, &id).is_ok() {
            report.self_loops.push(id);
        }
    }

    let min = board.limits().min_size();
    let undersized: Vec<(String, crate::model::geometry::Size)> = board
        .items()
        .filter(|i| i.size.is_finite())
        .filter(|i| i.size.width < min.width || i.size.height < min.height)
        .map(|i| (i.id.clone(), i.size))
        .collect();
    for (id, size) in undersized {
        if board_ops::update_item_size(board, &id, size).is_ok() {
            report.resized.push(id);
        }
    }

    report
}

fn is_local_path(s: &str) -> bool {
    !(s.starts_with("http://") || s.starts_with("https://") || s.starts_with("data:"))
}

/// IDs that appear more than once, with their counts, in first-seen order
fn find_duplicates<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for id in ids {
        *counts.entry(id).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(id, n)| (id.to_string(), n))
        .collect()
}
