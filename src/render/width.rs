//! Onscreen width accounting for fixed-width and double-width glyphs.
//!
//! Every glyph occupies one column except East Asian wide glyphs, which take
//! two. Zero-width and control characters are counted as one column so that a
//! cursor always advances.

use unicode_width::UnicodeWidthChar;

/// Columns taken by a single glyph: 2 for wide glyphs, 1 otherwise.
#[inline]
pub fn char_width(ch: char) -> i32 {
    match UnicodeWidthChar::width(ch) {
        Some(2) => 2,
        _ => 1,
    }
}

/// Total onscreen width of `text`.
pub fn onscreen_width(text: &str) -> i32 {
    text.chars().map(char_width).sum()
}

/// Walk `text` until `max_cols` columns are filled.
///
/// Returns the byte index just past the last glyph that fits and the width
/// consumed. A glyph that would straddle the limit is not taken. A
/// non-positive `max_cols` means "no limit".
pub fn width_to_index(text: &str, max_cols: i32) -> (usize, i32) {
    if max_cols <= 0 {
        return (text.len(), onscreen_width(text));
    }
    let mut used = 0;
    for (idx, ch) in text.char_indices() {
        let w = char_width(ch);
        if used + w > max_cols {
            return (idx, used);
        }
        used += w;
    }
    (text.len(), used)
}

/// Truncate `text` to at most `max_cols` columns.
pub fn truncate(text: &str, max_cols: i32) -> &str {
    if max_cols <= 0 {
        return "";
    }
    let (end, _) = width_to_index(text, max_cols);
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_one_column() {
        assert_eq!(onscreen_width("hello"), 5);
    }

    #[test]
    fn wide_glyphs_are_two_columns() {
        assert_eq!(char_width('漢'), 2);
        assert_eq!(onscreen_width("a漢b"), 4);
    }

    #[test]
    fn width_to_index_stops_before_straddling_glyph() {
        // "a" + wide glyph needs 3 columns; only 2 available.
        assert_eq!(width_to_index("a漢", 2), (1, 1));
        assert_eq!(width_to_index("a漢", 3), ("a漢".len(), 3));
    }

    #[test]
    fn unlimited_budget_takes_everything() {
        assert_eq!(width_to_index("abc", 0), (3, 3));
        assert_eq!(width_to_index("abc", -4), (3, 3));
    }

    #[test]
    fn truncate_respects_columns() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("abc", 10), "abc");
        assert_eq!(truncate("abc", 0), "");
    }
}
