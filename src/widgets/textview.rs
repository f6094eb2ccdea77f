//! TextView: an append-only buffer of styled text, wrapped to the view width.
//!
//! Text is kept in one `String`; each displayed line is a list of segments
//! (byte ranges into that buffer plus a format). Lines are created by line
//! terminators (*hard* lines) or by wrapping (*soft* lines). The view shows
//! the newest lines at the bottom; `scroll` counts the lines below the
//! bottom of the view.
//!
//! Wrapping budget: `width - 1` columns while the rightmost column is
//! reserved for the scrollbar, `width` with [`TextViewFlags::NO_SCROLL`].
//! A line that reaches the budget exactly sends the next run of text to a
//! new soft line.

use std::any::Any;
use std::ops::BitOr;

use crate::event::binding::ClassRegistry;
use crate::event::input::{MouseEvent, KEY_DOWN, KEY_PGDOWN, KEY_PGUP, KEY_UP};
use crate::render::canvas::Canvas;
use crate::render::cell::{Attr, ColorPair, TextFormat};
use crate::render::width::{onscreen_width, width_to_index};
use crate::screen::Screen;
use crate::widget::node::{WidgetBase, WidgetFlags, WidgetId};
use crate::widget::traits::{Widget, WidgetCtx};
use crate::widget::WIDGET_CLASS;

pub const CLASS: &str = "TextView";

/// Size given to a view that was never sized explicitly.
const DEFAULT_SIZE: (i32, i32) = (64, 20);

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextViewFlags(u8);

impl TextViewFlags {
    pub const NONE: TextViewFlags = TextViewFlags(0);
    /// Wrap at any character instead of backing up to a space.
    pub const WRAP_CHAR: TextViewFlags = TextViewFlags(1 << 0);
    /// Do not reserve the rightmost column for a scrollbar.
    pub const NO_SCROLL: TextViewFlags = TextViewFlags(1 << 1);
    /// With fewer lines than rows, start at the top instead of the bottom.
    pub const TOP_ALIGN: TextViewFlags = TextViewFlags(1 << 2);

    pub fn contains(self, other: TextViewFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TextViewFlags {
    type Output = TextViewFlags;
    fn bitor(self, rhs: Self) -> Self::Output {
        TextViewFlags(self.0 | rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Lines and segments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    start: usize,
    /// One past the last byte.
    end: usize,
    format: TextFormat,
    attr: Attr,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Line {
    segments: Vec<Segment>,
    /// Onscreen width so far.
    length: i32,
    /// Continuation of the previous hard line.
    soft: bool,
}

impl Line {
    fn new(soft: bool) -> Self {
        Self {
            soft,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// TextView
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TextView {
    buffer: String,
    /// Oldest first.
    lines: Vec<Line>,
    /// Lines below the bottom of the view.
    scroll: usize,
    flags: TextViewFlags,
}

impl Default for TextView {
    fn default() -> Self {
        Self::new()
    }
}

impl TextView {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            lines: vec![Line::new(false)],
            scroll: 0,
            flags: TextViewFlags::NONE,
        }
    }

    pub fn with_flags(mut self, flags: TextViewFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn flags(&self) -> TextViewFlags {
        self.flags
    }

    pub fn set_flag(&mut self, flag: TextViewFlags) {
        self.flags = self.flags | flag;
    }

    fn has_scroll(&self) -> bool {
        !self.flags.contains(TextViewFlags::NO_SCROLL)
    }

    /// Everything appended so far.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line `index` counted from the newest (0) and whether it is soft.
    pub fn line(&self, index: usize) -> Option<(String, bool)> {
        let line = self.newest_first(index)?;
        let text = line.segments.iter().map(|s| &self.buffer[s.start..s.end]).collect();
        Some((text, line.soft))
    }

    /// All lines, newest first.
    pub fn lines(&self) -> Vec<(String, bool)> {
        (0..self.lines.len()).filter_map(|i| self.line(i)).collect()
    }

    fn newest_first(&self, index: usize) -> Option<&Line> {
        let len = self.lines.len();
        index.checked_add(1).filter(|&i| i <= len).map(|i| &self.lines[len - i])
    }

    fn head_mut(&mut self) -> &mut Line {
        if self.lines.is_empty() {
            self.lines.push(Line::new(false));
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    /// Add a line. The view keeps showing the same lines.
    fn push_line(&mut self, soft: bool) {
        self.lines.push(Line::new(soft));
        self.scroll += 1;
    }

    /// Start a new hard line.
    pub fn next_line(&mut self) {
        self.push_line(false);
    }

    /// Append `text` wrapped to a view `width` columns wide. A non-positive
    /// width disables wrapping.
    pub fn append(&mut self, text: &str, format: TextFormat, width: i32) {
        if text.is_empty() {
            return;
        }
        let budget = width - self.has_scroll() as i32;
        let wrap_word = !self.flags.contains(TextViewFlags::WRAP_CHAR);
        let attr = format.to_attr();
        let mut start = self.buffer.len();
        self.buffer.push_str(text);

        while start < self.buffer.len() {
            let rest = &self.buffer[start..];
            if rest.starts_with("\r\n") {
                start += 2;
                self.push_line(false);
                continue;
            }
            if rest.starts_with(['\r', '\n']) {
                start += 1;
                self.push_line(false);
                continue;
            }
            let run_end = rest.find(['\r', '\n']).map_or(self.buffer.len(), |i| start + i);
            if budget > 0 && self.head_mut().length == budget {
                self.push_line(true);
            }

            let line_len = self.head_mut().length;
            let run = &self.buffer[start..run_end];
            let remaining = budget - line_len;
            let (mut end, mut len) = if budget <= 0 || onscreen_width(run) <= remaining {
                (run_end, onscreen_width(run))
            } else if remaining <= 0 {
                (start, 0)
            } else {
                let (idx, used) = width_to_index(run, remaining);
                (start + idx, used)
            };

            if end == start {
                if line_len > 0 {
                    self.push_line(true);
                    continue;
                }
                // Not even one glyph fits an empty line: take it anyway.
                let first = run.chars().next().map_or(1, char::len_utf8);
                end = start + first;
                len = onscreen_width(&run[..first]);
            }

            let wrapped = end < run_end;
            if wrapped && wrap_word {
                // A space sitting exactly at the cut starts the next line.
                let window = &self.buffer[start..end];
                match window.rfind(|c: char| c.is_ascii_whitespace()) {
                    Some(0) if line_len == 0 => {}
                    Some(space) => {
                        end = start + space + 1;
                        len = onscreen_width(&self.buffer[start..end]);
                    }
                    None => {}
                }
            }

            let head = self.head_mut();
            match head.segments.last_mut() {
                Some(seg) if seg.format == format && seg.end == start => seg.end = end,
                _ => head.segments.push(Segment { start, end, format, attr }),
            }
            head.length += len;
            start = end;

            if wrapped && wrap_word {
                self.push_line(true);
            }
        }
    }

    /// Re-wrap everything for a new `width`, keeping the same number of
    /// hard lines below the view.
    pub fn reflow(&mut self, width: i32) {
        let below = self.hard_lines_below();
        let old_lines = std::mem::take(&mut self.lines);
        let old_buffer = std::mem::take(&mut self.buffer);
        self.lines.push(Line::new(false));
        self.buffer.reserve(old_buffer.len());

        for (idx, line) in old_lines.iter().enumerate() {
            if idx > 0 && !line.soft {
                self.append("\n", TextFormat::NORMAL, width);
            }
            for seg in &line.segments {
                self.append(&old_buffer[seg.start..seg.end], seg.format, width);
            }
        }

        let mut seen = 0;
        self.scroll = 0;
        for idx in 1..self.lines.len() {
            if seen == below {
                break;
            }
            if self.newest_first(idx).is_some_and(|l| !l.soft) {
                seen += 1;
                self.scroll = idx;
            }
        }
    }

    /// Hard lines strictly between the newest line and the bottom of the
    /// view, the bottom line included.
    pub fn hard_lines_below(&self) -> usize {
        (1..=self.scroll)
            .filter(|&i| self.newest_first(i).is_some_and(|l| !l.soft))
            .count()
    }

    /// Move the view: `0` jumps to the newest line, positive moves toward
    /// newer lines, negative toward older ones.
    pub fn scroll(&mut self, count: i32) {
        let oldest = self.lines.len().saturating_sub(1);
        self.scroll = match count {
            0 => 0,
            c if c > 0 => self.scroll.saturating_sub(c as usize),
            c => (self.scroll + c.unsigned_abs() as usize).min(oldest),
        };
    }

    pub fn lines_below(&self) -> usize {
        self.scroll
    }

    /// Lines hidden above a view `height` rows high.
    pub fn lines_above(&self, height: i32) -> usize {
        self.lines.len().saturating_sub(self.scroll + height.max(0) as usize)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.lines = vec![Line::new(false)];
        self.scroll = 0;
    }

    fn draw_scrollbar(&self, canvas: &mut Canvas, ctx: &WidgetCtx, view: usize, undrawn: usize) {
        let (width, height) = (ctx.width(), ctx.height());
        let scroll_col = width - 1;
        let rows = height - 2;
        let thumb = Attr::new(ColorPair::HighlightD);
        let total_lines = self.lines.len() as i32;
        let up = total_lines - undrawn as i32;
        let has_newer = view > 0;

        if rows > 0 {
            let showing = (rows * rows / total_lines.max(1) + 1).min(rows);
            let down = total_lines - rows - up;
            let mut position = (rows - showing) * up / (up + down).max(1);
            position = position.max(i32::from(up > 0));
            if showing + position > rows {
                position = rows - showing;
            }
            if showing + position == rows && has_newer {
                position = (rows - 1 - showing).max(1);
            } else if showing + position < rows && !has_newer {
                position = rows - showing;
            }
            canvas.vline(scroll_col, position + 1, ctx.glyphs.checkerboard, thumb, showing);
        }

        let up_glyph = if up > 0 { ctx.glyphs.up_arrow } else { ' ' };
        canvas.put_char(scroll_col, 0, up_glyph, thumb);
        let down_glyph = if has_newer { ctx.glyphs.down_arrow } else { ' ' };
        canvas.put_char(scroll_col, height - 1, down_glyph, thumb);
    }
}

impl Widget for TextView {
    fn class_name(&self) -> &'static str {
        CLASS
    }

    fn init(&mut self, base: &mut WidgetBase) {
        base.flags.insert(WidgetFlags::NO_BORDER | WidgetFlags::NO_SHADOW | WidgetFlags::GROW_X | WidgetFlags::GROW_Y);
        base.min_width = 5;
        base.min_height = 2;
    }

    fn size_request(&mut self, ctx: &mut WidgetCtx) {
        if ctx.is_mapped() || (ctx.width() > 0 && ctx.height() > 0) {
            return;
        }
        (ctx.base.width, ctx.base.height) = DEFAULT_SIZE;
        if !self.buffer.is_empty() {
            self.reflow(ctx.width());
        }
    }

    fn size_changed(&mut self, ctx: &mut WidgetCtx, old_width: i32, _old_height: i32) {
        if ctx.width() != old_width && !self.buffer.is_empty() {
            self.reflow(ctx.width());
        }
    }

    fn draw(&mut self, ctx: &mut WidgetCtx, canvas: &mut Canvas) {
        let (width, height) = (ctx.width(), ctx.height());
        let has_scroll = self.has_scroll() as i32;
        canvas.set_background(Attr::new(ColorPair::Normal));
        canvas.erase();

        let count = self.lines.len();
        let mut view = self.scroll;
        let mut comp = 0;
        let from_view = count - view.min(count);
        if self.flags.contains(TextViewFlags::TOP_ALIGN) && (from_view as i32) < height {
            let missing = (height - from_view as i32) as usize;
            if view >= missing {
                view -= missing;
            } else {
                view = 0;
                comp = height - count as i32;
            }
        }

        let mut drawn = 0;
        while (drawn as i32) < height {
            let Some(line) = self.newest_first(view + drawn) else {
                break;
            };
            let y = height - 1 - drawn as i32 - comp;
            let mut x = 0;
            for seg in &line.segments {
                x += canvas.put_str(x, y, &self.buffer[seg.start..seg.end], seg.attr);
            }
            let mut pad = line.segments.last().map_or(Attr::new(ColorPair::Normal), |s| s.attr);
            pad.underline = false;
            pad.blink = false;
            pad.reverse = false;
            canvas.hline(x, y, ' ', pad, width - line.length - has_scroll);
            drawn += 1;
        }

        if has_scroll == 1 {
            self.draw_scrollbar(canvas, ctx, view, view + drawn);
        }
    }

    fn clicked(&mut self, ctx: &mut WidgetCtx, event: MouseEvent, _x: i32, _y: i32) -> bool {
        match event {
            MouseEvent::ScrollUp => self.scroll(-1),
            MouseEvent::ScrollDown => self.scroll(1),
            _ => return false,
        }
        ctx.queue_draw();
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Screen operations
// ---------------------------------------------------------------------------

impl Screen {
    fn textview_width(&self, id: WidgetId) -> i32 {
        self.widgets.base(id).map_or(0, |b| b.width)
    }

    /// Append text. If the view was showing the newest line it keeps
    /// following the end of the text.
    pub fn textview_append(&mut self, id: WidgetId, text: &str, format: TextFormat) {
        let width = self.textview_width(id);
        self.modify_leaf::<TextView, _>(id, |view| {
            let follow = view.lines_below() == 0;
            view.append(text, format, width);
            if follow {
                view.scroll(0);
            }
        });
    }

    pub fn textview_next_line(&mut self, id: WidgetId) {
        self.modify_leaf::<TextView, _>(id, TextView::next_line);
    }

    pub fn textview_scroll(&mut self, id: WidgetId, count: i32) {
        self.modify_leaf::<TextView, _>(id, |view| view.scroll(count));
    }

    pub fn textview_clear(&mut self, id: WidgetId) {
        self.modify_leaf::<TextView, _>(id, TextView::clear);
    }

    pub fn textview_set_flag(&mut self, id: WidgetId, flag: TextViewFlags) {
        self.modify_leaf::<TextView, _>(id, |view| view.set_flag(flag));
    }

    pub fn textview_lines_above(&self, id: WidgetId) -> usize {
        let height = self.widgets.base(id).map_or(0, |b| b.height);
        self.leaf::<TextView>(id).map_or(0, |view| view.lines_above(height))
    }

    /// Let Up, Down, PageUp and PageDown pressed in `widget` scroll `view`.
    pub fn attach_scroll_widget(&mut self, view: WidgetId, widget: WidgetId) {
        self.scroll_attachments.insert(widget, view);
    }

    /// Scroll `view` for a navigation key pressed elsewhere.
    pub(crate) fn scroll_attached(&mut self, view: WidgetId, keys: &str) -> bool {
        let page = self.widgets.base(view).map_or(0, |b| b.height) - 2;
        let count = match keys {
            KEY_PGUP => -page,
            KEY_PGDOWN => page,
            KEY_DOWN => 1,
            KEY_UP => -1,
            _ => return false,
        };
        self.textview_scroll(view, count);
        true
    }
}

pub fn register_class(classes: &mut ClassRegistry<Screen>) {
    classes.class_init(CLASS, Some(WIDGET_CLASS), |_| {});
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::ToolkitConfig;

    fn lines(view: &TextView) -> Vec<(String, bool)> {
        view.lines()
    }

    fn owned(expected: &[(&str, bool)]) -> Vec<(String, bool)> {
        expected.iter().map(|&(text, soft)| (text.to_string(), soft)).collect()
    }

    #[test]
    fn wrap_reserves_scroll_column() {
        let mut view = TextView::new();
        view.append("abcdefghijk", TextFormat::NORMAL, 10);
        assert_eq!(lines(&view), owned(&[("jk", true), ("abcdefghi", false)]));
    }

    #[test]
    fn wrap_without_scroll_column() {
        let mut view = TextView::new().with_flags(TextViewFlags::NO_SCROLL);
        view.append("abcdefghijk", TextFormat::NORMAL, 10);
        assert_eq!(lines(&view), owned(&[("k", true), ("abcdefghij", false)]));
    }

    #[test]
    fn exact_fit_defers_wrap_to_next_run() {
        let mut view = TextView::new().with_flags(TextViewFlags::NO_SCROLL);
        view.append("abcdefghij", TextFormat::NORMAL, 10);
        assert_eq!(view.line_count(), 1);
        view.append("k", TextFormat::NORMAL, 10);
        assert_eq!(lines(&view), owned(&[("k", true), ("abcdefghij", false)]));
    }

    #[test]
    fn word_wrap_backs_up_to_space() {
        let mut view = TextView::new().with_flags(TextViewFlags::NO_SCROLL);
        view.append("hello big world", TextFormat::NORMAL, 10);
        assert_eq!(lines(&view), owned(&[("world", true), ("hello big ", false)]));
    }

    #[test]
    fn word_wrap_never_overflows_at_boundary_space() {
        let mut view = TextView::new().with_flags(TextViewFlags::NO_SCROLL);
        view.append("abcdefghij klm", TextFormat::NORMAL, 10);
        assert_eq!(lines(&view), owned(&[(" klm", true), ("abcdefghij", false)]));
        let mut view = TextView::new().with_flags(TextViewFlags::NO_SCROLL);
        view.append("one two three four five six seven", TextFormat::NORMAL, 10);
        for (text, _) in lines(&view) {
            assert!(onscreen_width(&text) <= 10, "{text:?} is wider than the view");
        }
    }

    #[test]
    fn char_wrap_cuts_words() {
        let mut view = TextView::new().with_flags(TextViewFlags::NO_SCROLL | TextViewFlags::WRAP_CHAR);
        view.append("hello big world", TextFormat::NORMAL, 10);
        assert_eq!(lines(&view), owned(&[("world", true), ("hello big ", false)]));
        let mut view = TextView::new().with_flags(TextViewFlags::NO_SCROLL | TextViewFlags::WRAP_CHAR);
        view.append("hello bigworld", TextFormat::NORMAL, 10);
        assert_eq!(lines(&view), owned(&[("orld", true), ("hello bigw", false)]));
    }

    #[test]
    fn wide_glyphs_count_two_columns() {
        let mut view = TextView::new().with_flags(TextViewFlags::NO_SCROLL | TextViewFlags::WRAP_CHAR);
        view.append("ab漢字漢", TextFormat::NORMAL, 7);
        assert_eq!(lines(&view), owned(&[("漢", true), ("ab漢字", false)]));
    }

    #[test]
    fn wide_glyph_never_loops_on_narrow_view() {
        let mut view = TextView::new().with_flags(TextViewFlags::NO_SCROLL);
        view.append("漢字", TextFormat::NORMAL, 1);
        assert_eq!(lines(&view), owned(&[("字", true), ("漢", false)]));
    }

    #[test]
    fn newlines_start_hard_lines() {
        let mut view = TextView::new();
        view.append("one\ntwo\r\n\nthree", TextFormat::NORMAL, 20);
        assert_eq!(lines(&view), owned(&[("three", false), ("", false), ("two", false), ("one", false)]));
        assert_eq!(view.text(), "one\ntwo\r\n\nthree");
    }

    #[test]
    fn same_format_segments_merge() {
        let mut view = TextView::new();
        view.append("ab", TextFormat::BOLD, 20);
        view.append("cd", TextFormat::BOLD, 20);
        view.append("ef", TextFormat::NORMAL, 20);
        let head = view.newest_first(0).unwrap();
        assert_eq!(head.segments.len(), 2);
        assert_eq!(head.length, 6);
    }

    #[test]
    fn appending_keeps_view_in_place() {
        let mut view = TextView::new();
        view.append("a\nb", TextFormat::NORMAL, 20);
        assert_eq!(view.lines_below(), 1);
        view.scroll(0);
        assert_eq!(view.lines_below(), 0);
    }

    #[test]
    fn scroll_clamps_both_ways() {
        let mut view = TextView::new();
        view.append("1\n2\n3\n4", TextFormat::NORMAL, 20);
        view.scroll(0);
        view.scroll(-2);
        assert_eq!(view.lines_below(), 2);
        view.scroll(-10);
        assert_eq!(view.lines_below(), 3);
        view.scroll(1);
        assert_eq!(view.lines_below(), 2);
        view.scroll(10);
        assert_eq!(view.lines_below(), 0);
    }

    #[test]
    fn lines_above_counts_hidden_older_lines() {
        let mut view = TextView::new();
        view.append("1\n2\n3\n4\n5", TextFormat::NORMAL, 20);
        view.scroll(0);
        assert_eq!(view.lines_above(2), 3);
        assert_eq!(view.lines_above(10), 0);
    }

    #[test]
    fn reflow_rewraps_for_new_width() {
        let mut view = TextView::new().with_flags(TextViewFlags::NO_SCROLL);
        view.append("abcdefghijk\nxy", TextFormat::BOLD, 5);
        view.scroll(0);
        assert_eq!(view.line_count(), 4);
        view.reflow(20);
        assert_eq!(lines(&view), owned(&[("xy", false), ("abcdefghijk", false)]));
        assert_eq!(view.newest_first(1).unwrap().segments[0].format, TextFormat::BOLD);
    }

    #[test]
    fn reflow_is_idempotent_and_keeps_offset() {
        let mut view = TextView::new();
        view.append("the quick brown fox\njumps over\nthe lazy dog again", TextFormat::NORMAL, 8);
        view.scroll(0);
        view.scroll(-3);
        let below = view.hard_lines_below();

        view.reflow(8);
        let once = view.lines();
        let scroll_once = view.lines_below();
        assert_eq!(view.hard_lines_below(), below);

        view.reflow(8);
        assert_eq!(view.lines(), once);
        assert_eq!(view.lines_below(), scroll_once);
        assert_eq!(view.hard_lines_below(), below);
    }

    #[test]
    fn clear_resets_everything() {
        let mut view = TextView::new();
        view.append("a\nb\nc", TextFormat::NORMAL, 20);
        view.clear();
        assert_eq!(view.line_count(), 1);
        assert_eq!(view.lines_below(), 0);
        assert!(view.text().is_empty());
    }

    fn drawn(s: &mut Screen, id: WidgetId) -> Vec<String> {
        s.draw(id);
        let canvas = s.canvas_of(id).unwrap();
        (0..canvas.height()).map(|y| canvas.row_text(y)).collect()
    }

    #[test]
    fn draws_newest_at_bottom_with_scrollbar() {
        let mut s = Screen::new(40, 12, ToolkitConfig::default());
        let id = s.add_widget(TextView::new());
        s.set_size(id, 8, 4);
        s.textview_append(id, "one\ntwo\nthree\nfour\nfive", TextFormat::NORMAL);
        let rows = drawn(&mut s, id);
        assert_eq!(rows[3], "five    ");
        assert_eq!(rows[2].trim_end_matches([' ', '▒']), "four");
        assert!(rows[0].ends_with('↑'));
        assert_eq!(rows[0].trim_end_matches(['↑', '▒']), "two    ");
    }

    #[test]
    fn top_align_fills_from_top() {
        let mut s = Screen::new(40, 12, ToolkitConfig::default());
        let id = s.add_widget(TextView::new().with_flags(TextViewFlags::TOP_ALIGN | TextViewFlags::NO_SCROLL));
        s.set_size(id, 6, 4);
        s.textview_append(id, "a\nb", TextFormat::NORMAL);
        let rows = drawn(&mut s, id);
        assert_eq!(rows, vec!["a     ", "b     ", "      ", "      "]);
    }

    #[test]
    fn resize_reflows() {
        let mut s = Screen::new(40, 12, ToolkitConfig::default());
        let id = s.add_widget(TextView::new().with_flags(TextViewFlags::NO_SCROLL));
        s.set_size(id, 5, 4);
        s.textview_append(id, "abcdefgh", TextFormat::NORMAL);
        assert_eq!(s.leaf::<TextView>(id).unwrap().line_count(), 2);
        s.set_size(id, 10, 4);
        assert_eq!(s.leaf::<TextView>(id).unwrap().line_count(), 1);
    }

    #[test]
    fn attached_widget_scrolls_view() {
        let mut s = Screen::new(40, 12, ToolkitConfig::default());
        let view = s.add_widget(TextView::new());
        let source = s.add_widget(crate::widgets::button::Button::new("x"));
        s.set_size(view, 10, 4);
        s.textview_append(view, "1\n2\n3\n4\n5\n6", TextFormat::NORMAL);
        s.attach_scroll_widget(view, source);
        assert!(s.key_pressed(source, KEY_UP));
        assert_eq!(s.leaf::<TextView>(view).unwrap().lines_below(), 1);
        assert!(s.key_pressed(source, KEY_PGUP));
        assert_eq!(s.leaf::<TextView>(view).unwrap().lines_below(), 3);
        assert!(s.key_pressed(source, KEY_PGDOWN));
        assert_eq!(s.leaf::<TextView>(view).unwrap().lines_below(), 1);
        assert_eq!(s.textview_lines_above(view), 1);
    }
}
