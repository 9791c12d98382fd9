//! Grapheme-aware width and cursor helpers for card text and the inline
//! editor. Offsets are byte offsets that always sit on grapheme boundaries.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Cells a tab occupies on a card
const TAB_WIDTH: usize = 4;

fn grapheme_width(g: &str) -> usize {
    if g == "\t" {
        TAB_WIDTH
    } else {
        UnicodeWidthStr::width(g)
    }
}

fn is_space(g: &str) -> bool {
    g.chars().all(char::is_whitespace)
}

/// Display width in terminal cells
pub fn display_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_width).sum()
}

/// Cut `s` to at most `max_cells`, ending in `…` when anything was dropped.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells == 0 {
        return String::new();
    }
    let budget = max_cells - 1;
    let mut used = 0;
    let mut out = String::new();
    for g in s.graphemes(true) {
        let w = grapheme_width(g);
        if used + w > budget {
            break;
        }
        used += w;
        out.push_str(g);
    }
    out.push('\u{2026}');
    out
}

/// Boundary after the grapheme at `byte_offset`, or None at the end
pub fn next_grapheme_boundary(s: &str, byte_offset: usize) -> Option<usize> {
    let g = s.get(byte_offset..)?.graphemes(true).next()?;
    Some(byte_offset + g.len())
}

/// Boundary before `byte_offset`, or None at the start
pub fn prev_grapheme_boundary(s: &str, byte_offset: usize) -> Option<usize> {
    s.get(..byte_offset)?
        .grapheme_indices(true)
        .next_back()
        .map(|(i, _)| i)
}

pub fn byte_offset_to_display_col(s: &str, byte_offset: usize) -> usize {
    display_width(&s[..byte_offset.min(s.len())])
}

/// Byte offset of the grapheme covering `col`. A column inside a wide
/// grapheme snaps to its start; past the end gives `s.len()`.
pub fn display_col_to_byte_offset(s: &str, col: usize) -> usize {
    let mut used = 0;
    for (i, g) in s.grapheme_indices(true) {
        used += grapheme_width(g);
        if used > col {
            return i;
        }
    }
    s.len()
}

/// Start of the word before `byte_offset`, skipping whitespace first
pub fn word_boundary_left(s: &str, byte_offset: usize) -> usize {
    let mut graphemes = s[..byte_offset].grapheme_indices(true).rev().peekable();
    while graphemes.next_if(|(_, g)| is_space(g)).is_some() {}
    let mut start = byte_offset;
    while let Some((i, _)) = graphemes.next_if(|(_, g)| !is_space(g)) {
        start = i;
    }
    if start == byte_offset {
        // Only whitespace before the cursor
        0
    } else {
        start
    }
}

/// Start of the next word after `byte_offset`, or the end of the text
pub fn word_boundary_right(s: &str, byte_offset: usize) -> usize {
    let mut graphemes = s[byte_offset..].grapheme_indices(true).peekable();
    while graphemes.next_if(|(_, g)| !is_space(g)).is_some() {}
    while graphemes.next_if(|(_, g)| is_space(g)).is_some() {}
    graphemes.peek().map_or(s.len(), |(i, _)| byte_offset + i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_width() {
        assert_eq!(display_width("Bloody glove"), 12);
        assert_eq!(display_width("東京"), 4);
        assert_eq!(display_width("e\u{301}"), 1);
        assert_eq!(display_width("a\tb"), 6);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate_to_width("Harbour", 7), "Harbour");
        assert_eq!(truncate_to_width("Harbour at dusk", 8), "Harbour\u{2026}");
        // A wide grapheme that won't fit is dropped whole
        assert_eq!(truncate_to_width("東京駅", 4), "東\u{2026}");
        assert_eq!(truncate_to_width("abc", 1), "\u{2026}");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn test_grapheme_steps() {
        let s = "ne\u{301}e";
        assert_eq!(next_grapheme_boundary(s, 1), Some(4));
        assert_eq!(prev_grapheme_boundary(s, 4), Some(1));
        assert_eq!(next_grapheme_boundary(s, s.len()), None);
        assert_eq!(prev_grapheme_boundary(s, 0), None);

        let family = "👨\u{200D}👩\u{200D}👧";
        assert_eq!(next_grapheme_boundary(family, 0), Some(family.len()));
    }

    #[test]
    fn test_column_conversion() {
        let s = "a東b";
        assert_eq!(byte_offset_to_display_col(s, 4), 3);
        assert_eq!(display_col_to_byte_offset(s, 3), 4);
        // Inside the wide char snaps to its start
        assert_eq!(display_col_to_byte_offset(s, 2), 1);
        assert_eq!(display_col_to_byte_offset(s, 10), s.len());
    }

    #[test]
    fn test_word_boundaries() {
        let s = "seen at  the docks";
        assert_eq!(word_boundary_left(s, s.len()), 13);
        assert_eq!(word_boundary_left(s, 13), 9);
        assert_eq!(word_boundary_left(s, 2), 0);
        assert_eq!(word_boundary_left("   ", 3), 0);
        assert_eq!(word_boundary_right(s, 0), 5);
        assert_eq!(word_boundary_right(s, 5), 9);
        assert_eq!(word_boundary_right(s, 14), s.len());
    }
}
