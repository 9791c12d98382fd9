use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::model::board::BoardEvent;
use crate::model::item::BoardItem;

/// Size above which old entries are trimmed on the next append (1 MB).
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Entries older than this are dropped when the journal is trimmed.
pub const PRUNE_AGE_DAYS: i64 = 30;

const FILE_HEADER: &str = "\
<!-- corkboard journal: append-only activity and recovery log
     Board events, failed saves and deleted items are recorded here.
     If something went missing, check here.
     View with: cb log
     Safe to delete. -->

---
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalCategory {
    /// A drained board event
    Event,
    /// board.json could not be written; body holds the unsaved board
    Write,
    /// An item was removed; body holds its JSON
    Delete,
    /// A board file could not be parsed
    Parser,
}

impl fmt::Display for JournalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JournalCategory::Event => write!(f, "event"),
            JournalCategory::Write => write!(f, "write"),
            JournalCategory::Delete => write!(f, "delete"),
            JournalCategory::Parser => write!(f, "parser"),
        }
    }
}

impl JournalCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "event" => Some(JournalCategory::Event),
            "write" => Some(JournalCategory::Write),
            "delete" => Some(JournalCategory::Delete),
            "parser" => Some(JournalCategory::Parser),
            _ => None,
        }
    }
}

/// A single entry in the journal.
#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub timestamp: DateTime<Utc>,
    pub category: JournalCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

impl JournalEntry {
    pub fn new(category: JournalCategory, description: impl Into<String>) -> Self {
        JournalEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: String::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Markdown block as stored in the journal
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} {}: {}\n\n",
            self.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.description,
        );

        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }

        if !self.body.is_empty() {
            out.push_str("\n```text\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }

        out.push_str("\n---\n");
        out
    }

    /// JSON value for `cb log --json`
    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();

        serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "category": self.category.to_string(),
            "description": self.description,
            "fields": fields,
            "body": self.body,
        })
    }
}

pub fn journal_path(board_dir: &Path) -> PathBuf {
    board_dir.join(".journal.log")
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Append an entry. Errors are swallowed and printed to stderr.
pub fn log_entry(board_dir: &Path, entry: JournalEntry) {
    if let Err(e) = log_entry_inner(board_dir, &entry) {
        eprintln!("warning: could not write to journal: {}", e);
    }
}

fn log_entry_inner(board_dir: &Path, entry: &JournalEntry) -> io::Result<()> {
    let path = journal_path(board_dir);

    if let Ok(meta) = std::fs::metadata(&path)
        && meta.len() > MAX_LOG_SIZE
    {
        try_inline_trim(&path);
    }

    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())?;
    Ok(())
}

/// One `event` entry per drained board event
pub fn log_events(board_dir: &Path, events: &[BoardEvent]) {
    for event in events {
        let kind = serde_json::to_value(event)
            .ok()
            .and_then(|v| v.get("event").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_default();
        log_entry(
            board_dir,
            JournalEntry::new(JournalCategory::Event, event.to_string()).field("Event", kind),
        );
    }
}

/// Keep a copy of a removed item so it can be recovered by hand
pub fn log_item_deletion(board_dir: &Path, item: &BoardItem, cascaded: usize) {
    let body = serde_json::to_string_pretty(item).unwrap_or_default();
    log_entry(
        board_dir,
        JournalEntry::new(JournalCategory::Delete, format!("item {} deleted", item.id))
            .field("Item", item.id.clone())
            .field("Kind", item.kind.to_string())
            .field("Connections", cascaded.to_string())
            .body(body),
    );
}

/// Trim entries older than the prune age. Skipped if another process holds
/// the file.
fn try_inline_trim(path: &Path) {
    let Ok(file) = OpenOptions::new().read(true).write(true).open(path) else {
        return;
    };
    if crate::io::lock::try_flock(&file).is_err() {
        return;
    }

    let mut content = String::new();
    if io::BufReader::new(&file).read_to_string(&mut content).is_err() {
        return;
    }

    let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
    let trimmed = prune_entries_before(&content, &cutoff);
    if trimmed.len() < content.len()
        && let Ok(mut f) = File::create(path)
    {
        let _ = f.write_all(trimmed.as_bytes());
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read journal entries, most recent first.
pub fn read_entries(
    board_dir: &Path,
    limit: Option<usize>,
    category: Option<JournalCategory>,
) -> Vec<JournalEntry> {
    let Ok(content) = std::fs::read_to_string(journal_path(board_dir)) else {
        return Vec::new();
    };

    let mut entries = parse_entries(&content);
    if let Some(cat) = category {
        entries.retain(|e| e.category == cat);
    }
    if let Some(n) = limit {
        let skip = entries.len().saturating_sub(n);
        entries.drain(..skip);
    }
    entries.reverse();
    entries
}

fn parse_entries(content: &str) -> Vec<JournalEntry> {
    let mut entries = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let Some(header) = line.strip_prefix("## ") else {
            continue;
        };
        let Some((timestamp, category, description)) = parse_entry_header(header) else {
            continue;
        };

        let mut fields = Vec::new();
        let mut body = String::new();
        let mut in_code_block = false;

        for line in lines.by_ref() {
            if in_code_block {
                if line == "```" {
                    in_code_block = false;
                } else {
                    if !body.is_empty() {
                        body.push('\n');
                    }
                    body.push_str(line);
                }
                continue;
            }
            if line == "---" {
                break;
            }
            if line.starts_with("```") {
                in_code_block = true;
                continue;
            }
            if let Some((key, value)) = line.trim().split_once(": ") {
                fields.push((key.to_string(), value.to_string()));
            }
        }

        entries.push(JournalEntry {
            timestamp,
            category,
            description,
            fields,
            body,
        });
    }

    entries
}

/// `<timestamp> <category>: <description>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, JournalCategory, String)> {
    let (timestamp, rest) = header.split_once(' ')?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .ok()?
        .with_timezone(&Utc);
    let (category, description) = rest.split_once(": ")?;
    let category = JournalCategory::parse_category(category)?;
    Some((timestamp, category, description.to_string()))
}

/// Remove entries with timestamps before `cutoff`. Keeps the file header.
fn prune_entries_before(content: &str, cutoff: &DateTime<Utc>) -> String {
    let mut result = String::new();
    let mut current_entry = String::new();
    let mut current_timestamp: Option<DateTime<Utc>> = None;
    let mut in_header = true;

    for line in content.lines() {
        if in_header {
            result.push_str(line);
            result.push('\n');
            if line == "---" {
                in_header = false;
            }
            continue;
        }

        if let Some(stripped) = line.strip_prefix("## ") {
            if let Some(ts) = current_timestamp
                && ts >= *cutoff
            {
                result.push_str(&current_entry);
            }
            current_entry.clear();
            current_timestamp = parse_entry_header(stripped).map(|(ts, _, _)| ts);
        }
        current_entry.push_str(line);
        current_entry.push('\n');
    }

    if let Some(ts) = current_timestamp
        && ts >= *cutoff
    {
        result.push_str(&current_entry);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geometry::Point;
    use tempfile::TempDir;

    #[test]
    fn test_entry_formatting() {
        let entry = JournalEntry::new(JournalCategory::Write, "board write failed")
            .field("Target", "board.json")
            .body("{}");
        let md = entry.to_markdown();
        assert!(md.starts_with("## "));
        assert!(md.contains(" write: board write failed\n"));
        assert!(md.contains("Target: board.json\n"));
        assert!(md.contains("```text\n{}\n```\n"));
        assert!(md.ends_with("---\n"));
    }

    #[test]
    fn test_log_and_read_round_trip() {
        let tmp = TempDir::new().unwrap();
        log_entry(
            tmp.path(),
            JournalEntry::new(JournalCategory::Parser, "board.json unreadable")
                .field("Source", "board.json")
                .field("Error", "expected value at line 1")
                .body("not json\n---\nstill body"),
        );
        log_entry(tmp.path(), JournalEntry::new(JournalCategory::Event, "item PH-001 added"));

        let content = std::fs::read_to_string(journal_path(tmp.path())).unwrap();
        assert!(content.starts_with("<!-- corkboard journal"));

        let entries = read_entries(tmp.path(), None, None);
        assert_eq!(entries.len(), 2);
        // Most recent first
        assert_eq!(entries[0].category, JournalCategory::Event);
        assert_eq!(entries[1].description, "board.json unreadable");
        assert_eq!(
            entries[1].fields,
            vec![
                ("Source".to_string(), "board.json".to_string()),
                ("Error".to_string(), "expected value at line 1".to_string()),
            ]
        );
        assert_eq!(entries[1].body, "not json\n---\nstill body");
    }

    #[test]
    fn test_read_with_limit_and_category() {
        let tmp = TempDir::new().unwrap();
        for i in 0..5 {
            log_entry(
                tmp.path(),
                JournalEntry::new(JournalCategory::Event, format!("event {}", i)),
            );
        }
        log_entry(tmp.path(), JournalEntry::new(JournalCategory::Delete, "item gone"));

        let entries = read_entries(tmp.path(), Some(2), None);
        let descs: Vec<&str> = entries.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descs, vec!["item gone", "event 4"]);

        let deletes = read_entries(tmp.path(), None, Some(JournalCategory::Delete));
        assert_eq!(deletes.len(), 1);
    }

    #[test]
    fn test_log_events() {
        let tmp = TempDir::new().unwrap();
        log_events(
            tmp.path(),
            &[
                BoardEvent::ItemAdded { id: "PH-001".into() },
                BoardEvent::PositionChanged {
                    id: "PH-001".into(),
                    position: Point::new(5.0, 6.0),
                },
            ],
        );
        let entries = read_entries(tmp.path(), None, None);
        assert_eq!(entries[0].description, "item PH-001 moved to (5, 6)");
        assert_eq!(
            entries[0].fields,
            vec![("Event".to_string(), "position_changed".to_string())]
        );
        assert_eq!(entries[1].fields[0].1, "item_added");
    }

    #[test]
    fn test_prune_entries_before_keeps_header_and_recent() {
        let old = JournalEntry {
            timestamp: Utc::now() - chrono::Duration::days(60),
            ..JournalEntry::new(JournalCategory::Event, "old")
        };
        let new = JournalEntry::new(JournalCategory::Event, "new");
        let content = format!("{}{}{}", FILE_HEADER, old.to_markdown(), new.to_markdown());

        let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
        let trimmed = prune_entries_before(&content, &cutoff);
        assert!(trimmed.starts_with(FILE_HEADER));
        let entries = parse_entries(&trimmed);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "new");
    }

    #[test]
    fn test_parse_entry_header() {
        let (ts, cat, desc) =
            parse_entry_header("2026-03-01T10:00:00Z delete: item EV-003 deleted").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-03-01T10:00:00+00:00");
        assert_eq!(cat, JournalCategory::Delete);
        assert_eq!(desc, "item EV-003 deleted");

        assert!(parse_entry_header("yesterday event: nope").is_none());
        assert!(parse_entry_header("2026-03-01T10:00:00Z bogus: nope").is_none());
    }

    #[test]
    fn test_read_missing_journal_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(read_entries(tmp.path(), None, None).is_empty());
    }

    #[test]
    fn test_atomic_write_replaces() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("board.json");
        atomic_write(&path, b"one").unwrap();
        atomic_write(&path, b"two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
    }

    #[test]
    fn test_entry_to_json() {
        let json = JournalEntry::new(JournalCategory::Delete, "item NT-002 deleted")
            .field("Item", "NT-002")
            .to_json();
        assert_eq!(json["category"], "delete");
        assert_eq!(json["fields"]["Item"], "NT-002");
    }
}
