use std::ops::Range;

use regex::Regex;

use crate::model::board::Board;
use crate::model::item::BoardItem;

/// Which field of an item or connection matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    Id,
    Content,
    Location,
    Date,
    Status,
    /// Connection label
    Label,
}

impl MatchField {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchField::Id => "id",
            MatchField::Content => "content",
            MatchField::Location => "location",
            MatchField::Date => "date",
            MatchField::Status => "status",
            MatchField::Label => "label",
        }
    }
}

/// A search hit on a board item or connection
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Item ID, or connection ID for `MatchField::Label`
    pub id: String,
    pub field: MatchField,
    pub spans: Vec<Range<usize>>,
}

/// Collect all non-overlapping match byte-ranges for a regex in the given text.
fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text).map(|m| m.start()..m.end()).collect()
}

fn push_hit(hits: &mut Vec<SearchHit>, re: &Regex, id: &str, field: MatchField, text: &str) {
    let spans = find_matches(re, text);
    if !spans.is_empty() {
        hits.push(SearchHit {
            id: id.to_string(),
            field,
            spans,
        });
    }
}

/// Search every item (top of the z-order last) and then connection labels.
pub fn search_board(board: &Board, re: &Regex) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    for item in board.items() {
        search_item(re, item, &mut hits);
    }
    for conn in board.connections() {
        if let Some(label) = &conn.style.label {
            push_hit(&mut hits, re, &conn.id, MatchField::Label, label);
        }
    }
    hits
}

fn search_item(re: &Regex, item: &BoardItem, hits: &mut Vec<SearchHit>) {
    push_hit(hits, re, &item.id, MatchField::Id, &item.id);
    push_hit(hits, re, &item.id, MatchField::Content, &item.content);

    let Some(meta) = &item.metadata else {
        return;
    };
    if let Some(location) = &meta.location {
        push_hit(hits, re, &item.id, MatchField::Location, location);
    }
    if let Some(date) = &meta.date {
        push_hit(hits, re, &item.id, MatchField::Date, date);
    }
    if let Some(status) = &meta.status {
        push_hit(hits, re, &item.id, MatchField::Status, status);
    }
}

/// Distinct item IDs among the hits, in hit order
pub fn matching_item_ids(board: &Board, hits: &[SearchHit]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for hit in hits {
        if board.contains_item(&hit.id) && !ids.contains(&hit.id) {
            ids.push(hit.id.clone());
        }
    }
    ids
}
