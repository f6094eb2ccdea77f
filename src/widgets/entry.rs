//! Entry: a one-line text field.
//!
//! Supports cursor movement, deletion, a maximum length, input filters,
//! masking, a bounded history (Ctrl-Up / Ctrl-Down) and a completion
//! dropdown fed from a list of suggestions (Tab).

use std::any::Any;
use std::collections::VecDeque;
use std::ops::BitOr;

use tracing::{trace, warn};

use crate::event::binding::{ActionParam, ClassRegistry};
use crate::event::input::{
    ctrl, KEY_BACKSPACE, KEY_CTRL_DOWN, KEY_CTRL_UP, KEY_DEL, KEY_DOWN, KEY_END, KEY_ENTER, KEY_ESC, KEY_HOME,
    KEY_LEFT, KEY_RIGHT, KEY_TAB, KEY_UP,
};
use crate::event::signal::{Signal, SignalKind};
use crate::render::canvas::Canvas;
use crate::render::cell::{Attr, ColorPair};
use crate::render::width::onscreen_width;
use crate::screen::Screen;
use crate::widget::node::{WidgetBase, WidgetFlags, WidgetId};
use crate::widget::traits::{Widget, WidgetCtx};
use crate::widget::WIDGET_CLASS;
use crate::widgets::tree::Tree;

pub const CLASS: &str = "Entry";

/// Fills the unused part of the field.
const FILL_CHAR: char = '_';
const DEFAULT_WIDTH: i32 = 20;
/// Most suggestions shown at once.
const SUGGEST_ROWS: i32 = 10;

// ---------------------------------------------------------------------------
// EntryFlags
// ---------------------------------------------------------------------------

/// Which characters an entry accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryFlags(u8);

impl EntryFlags {
    pub const ALPHA: EntryFlags = EntryFlags(1 << 0);
    pub const INT: EntryFlags = EntryFlags(1 << 1);
    pub const NO_SPACE: EntryFlags = EntryFlags(1 << 2);
    pub const NO_PUNCT: EntryFlags = EntryFlags(1 << 3);
    pub const ALL: EntryFlags = EntryFlags(Self::ALPHA.0 | Self::INT.0);

    pub fn contains(self, other: EntryFlags) -> bool {
        self.0 & other.0 == other.0
    }

    fn accepts(self, ch: char) -> bool {
        if ch.is_ascii_punctuation() {
            return !self.contains(Self::NO_PUNCT);
        }
        if ch.is_whitespace() {
            return !self.contains(Self::NO_SPACE);
        }
        if ch.is_ascii_digit() {
            return self.contains(Self::INT);
        }
        if ch.is_alphabetic() {
            return self.contains(Self::ALPHA);
        }
        true
    }
}

impl Default for EntryFlags {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for EntryFlags {
    type Output = EntryFlags;
    fn bitor(self, rhs: Self) -> Self::Output {
        EntryFlags(self.0 | rhs.0)
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Previously submitted texts, newest first.
#[derive(Debug, Clone, Default)]
struct History {
    items: VecDeque<String>,
    limit: usize,
    /// Index of the item being shown, `None` while editing a fresh text.
    position: Option<usize>,
    /// The fresh text, saved when stepping back into the history.
    draft: String,
}

/// The open completion dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dropdown {
    window: WidgetId,
    tree: WidgetId,
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// A single-line text field.
///
/// Cursor and scroll positions are byte offsets into the text, always on a
/// char boundary.
///
/// # Examples
///
/// ```ignore
/// let name = screen.add_widget(Entry::new("").with_max(32));
/// screen.on(name, SignalKind::Activate, |screen, id, _| {
///     let text = screen.leaf::<Entry>(id).map(|e| e.text().to_owned());
/// });
/// ```
#[derive(Debug, Clone)]
pub struct Entry {
    text: String,
    cursor: usize,
    /// First byte shown.
    scroll: usize,
    /// Maximum length in characters, 0 for none.
    max: usize,
    flags: EntryFlags,
    masked: bool,
    history: History,
    suggests: Vec<String>,
    /// Complete only the word before the cursor instead of the whole text.
    word: bool,
    dropdown: Option<Dropdown>,
    observing: bool,
    /// Bumped on every text change.
    revision: u64,
}

impl Entry {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            cursor: text.len(),
            text,
            scroll: 0,
            max: 0,
            flags: EntryFlags::ALL,
            masked: false,
            history: History::default(),
            suggests: Vec::new(),
            word: true,
            dropdown: None,
            observing: false,
            revision: 0,
        }
    }

    pub fn with_max(mut self, max: usize) -> Self {
        self.max = max;
        self
    }

    pub fn with_flags(mut self, flags: EntryFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Draw every character as a bullet (builder pattern).
    pub fn masked(mut self, masked: bool) -> Self {
        self.masked = masked;
        self
    }

    pub fn with_history_length(mut self, length: usize) -> Self {
        self.set_history_length(length);
        self
    }

    // ── Text ─────────────────────────────────────────────────────────

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text and put the cursor at its end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
        self.scroll = 0;
        self.revision += 1;
    }

    /// Byte offset of the cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_max(&mut self, max: usize) {
        self.max = max;
    }

    pub fn set_flags(&mut self, flags: EntryFlags) {
        self.flags = flags;
    }

    pub fn set_masked(&mut self, masked: bool) {
        self.masked = masked;
    }

    pub fn is_masked(&self) -> bool {
        self.masked
    }

    /// Insert `input` at the cursor, dropping characters the flags reject
    /// and anything past the maximum length. Line breaks become spaces.
    /// Returns whether anything was inserted.
    pub fn insert(&mut self, input: &str) -> bool {
        let mut count = self.text.chars().count();
        let mut inserted = false;
        for ch in input.chars() {
            let ch = if ch == '\r' || ch == '\n' { ' ' } else { ch };
            if ch.is_control() || !self.flags.accepts(ch) {
                continue;
            }
            if self.max > 0 && count >= self.max {
                break;
            }
            self.text.insert(self.cursor, ch);
            self.cursor += ch.len_utf8();
            count += 1;
            inserted = true;
        }
        if inserted {
            self.revision += 1;
        }
        inserted
    }

    fn prev_boundary(&self, pos: usize) -> usize {
        self.text[..pos].chars().next_back().map_or(0, |c| pos - c.len_utf8())
    }

    fn next_boundary(&self, pos: usize) -> usize {
        self.text[pos..].chars().next().map_or(pos, |c| pos + c.len_utf8())
    }

    pub fn move_back(&mut self) {
        self.cursor = self.prev_boundary(self.cursor);
    }

    pub fn move_forward(&mut self) {
        self.cursor = self.next_boundary(self.cursor);
    }

    pub fn move_start(&mut self) {
        self.cursor = 0;
        self.scroll = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.len();
    }

    /// Delete the character before the cursor. The view slides back by one
    /// character so the field stays filled.
    pub fn delete_prev(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = self.prev_boundary(self.cursor);
        self.text.drain(prev..self.cursor);
        self.cursor = prev;
        if self.scroll > 0 {
            self.scroll = self.prev_boundary(self.scroll.min(self.text.len()));
        }
        self.revision += 1;
        true
    }

    /// Delete the character under the cursor.
    pub fn delete_next(&mut self) -> bool {
        if self.cursor >= self.text.len() {
            return false;
        }
        let next = self.next_boundary(self.cursor);
        self.text.drain(self.cursor..next);
        self.revision += 1;
        true
    }

    /// Delete from the start of the text up to the cursor.
    pub fn delete_to_start(&mut self) {
        if self.cursor > 0 {
            self.text.drain(..self.cursor);
            self.revision += 1;
        }
        self.cursor = 0;
        self.scroll = 0;
    }

    /// Delete from the cursor to the end of the text.
    pub fn delete_to_end(&mut self) {
        if self.cursor < self.text.len() {
            self.text.truncate(self.cursor);
            self.revision += 1;
        }
    }

    // ── History ──────────────────────────────────────────────────────

    /// Keep at most `length` texts. 0 disables the history.
    pub fn set_history_length(&mut self, length: usize) {
        let history = &mut self.history;
        history.limit = length;
        history.items.truncate(length);
        if history.position.is_some_and(|p| p >= history.items.len()) {
            history.position = history.items.len().checked_sub(1);
        }
    }

    pub fn history_length(&self) -> usize {
        self.history.limit
    }

    /// Remember `text` as the newest history item and return to a fresh
    /// draft. The oldest item is dropped when the history is full.
    pub fn add_to_history(&mut self, text: impl Into<String>) {
        let history = &mut self.history;
        if history.limit == 0 {
            warn!("history is disabled; set a history length first");
            return;
        }
        history.items.push_front(text.into());
        history.items.truncate(history.limit);
        history.position = None;
        history.draft.clear();
    }

    /// Step to an older history item. The text being edited is kept and
    /// comes back when stepping past the newest item.
    pub fn history_prev(&mut self) -> bool {
        let next = self.history.position.map_or(0, |p| p + 1);
        let Some(item) = self.history.items.get(next).cloned() else {
            return false;
        };
        if self.history.position.is_none() {
            self.history.draft = self.text.clone();
        }
        self.history.position = Some(next);
        self.set_text(item);
        true
    }

    /// Step to a newer history item, or back to the saved draft.
    pub fn history_next(&mut self) -> bool {
        let text = match self.history.position {
            None => return false,
            Some(0) => {
                self.history.position = None;
                std::mem::take(&mut self.history.draft)
            }
            Some(p) => {
                self.history.position = Some(p - 1);
                self.history.items[p - 1].clone()
            }
        };
        self.set_text(text);
        true
    }

    // ── Suggestions ──────────────────────────────────────────────────

    /// Offer `text` for completion. Empty and duplicate texts are ignored.
    pub fn add_suggest(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() && !self.suggests.contains(&text) {
            self.suggests.push(text);
        }
    }

    pub fn remove_suggest(&mut self, text: &str) {
        self.suggests.retain(|s| s != text);
    }

    pub fn suggests(&self) -> &[String] {
        &self.suggests
    }

    /// Complete only the word before the cursor (the default), or the
    /// whole text.
    pub fn set_word_suggest(&mut self, word: bool) {
        self.word = word;
    }

    pub fn has_dropdown(&self) -> bool {
        self.dropdown.is_some()
    }

    /// Start of the run of ASCII letters ending at the cursor.
    fn word_start(&self) -> usize {
        let before = &self.text[..self.cursor];
        before
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_alphabetic())
            .last()
            .map_or(self.cursor, |(i, _)| i)
    }

    /// Where the completed part starts, and the sorted suggestions that
    /// extend it (compared case-insensitively).
    fn completions(&self) -> (usize, Vec<String>) {
        let (start, prefix) = if self.word {
            let start = self.word_start();
            (start, &self.text[start..self.cursor])
        } else {
            (0, self.text.as_str())
        };
        let mut matches: Vec<String> = self
            .suggests
            .iter()
            .filter(|s| s.get(..prefix.len()).is_some_and(|head| head.eq_ignore_ascii_case(prefix)))
            .cloned()
            .collect();
        matches.sort();
        (start, matches)
    }

    /// Replace the completed part with `suggestion`.
    fn complete(&mut self, suggestion: &str) {
        if self.word {
            let start = self.word_start();
            self.text.replace_range(start..self.cursor, suggestion);
            self.cursor = start + suggestion.len();
            self.revision += 1;
        } else {
            self.set_text(suggestion);
        }
    }

    // ── Display ──────────────────────────────────────────────────────

    fn display_width(&self, text: &str) -> i32 {
        if self.masked {
            text.chars().count() as i32
        } else {
            onscreen_width(text)
        }
    }

    /// Slide the view so the cursor is inside a field `width` columns wide.
    fn scroll_to_cursor(&mut self, width: i32) {
        self.scroll = self.scroll.min(self.cursor);
        while self.scroll < self.cursor && self.display_width(&self.text[self.scroll..self.cursor]) >= width {
            self.scroll = self.next_boundary(self.scroll);
        }
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::new("")
    }
}

impl Widget for Entry {
    fn class_name(&self) -> &'static str {
        CLASS
    }

    fn init(&mut self, base: &mut WidgetBase) {
        base.flags.insert(
            WidgetFlags::NO_BORDER | WidgetFlags::NO_SHADOW | WidgetFlags::CAN_TAKE_FOCUS | WidgetFlags::GROW_X,
        );
        base.min_width = 3;
        base.min_height = 1;
    }

    fn size_request(&mut self, ctx: &mut WidgetCtx) {
        if ctx.base.width == 0 {
            ctx.base.width = DEFAULT_WIDTH;
        }
        ctx.base.height = 1;
    }

    fn draw(&mut self, ctx: &mut WidgetCtx, canvas: &mut Canvas) {
        let width = ctx.width();
        self.scroll_to_cursor(width);
        let pair = if ctx.focused { ColorPair::TextNormal } else { ColorPair::HighlightD };
        let attr = Attr::new(pair);

        let shown = &self.text[self.scroll..];
        let used = if self.masked {
            let n = (shown.chars().count() as i32).min(width);
            canvas.hline(0, 0, ctx.glyphs.bullet, attr, n);
            n
        } else {
            canvas.put_str(0, 0, shown, attr)
        };
        canvas.hline(used, 0, FILL_CHAR, attr, width - used);

        if ctx.focused {
            let x = self.display_width(&self.text[self.scroll..self.cursor]);
            canvas.set_reverse(x, 0, true);
        }
    }

    fn key_pressed(&mut self, ctx: &mut WidgetCtx, keys: &str) -> bool {
        if keys.chars().next().is_none_or(char::is_control) {
            return false;
        }
        if self.insert(keys) {
            ctx.emit(Signal::TextChanged);
            ctx.queue_draw();
        }
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
    /// Replace an entry's text, closing its dropdown.
    pub fn entry_set_text(&mut self, id: WidgetId, text: &str) {
        self.entry_hide_suggest(id);
        self.entry_edit(id, |entry| {
            entry.set_text(text);
            true
        });
    }

    pub fn entry_clear(&mut self, id: WidgetId) {
        self.entry_set_text(id, "");
    }

    /// Run `f` on an entry and redraw it; raises `text-changed` if the text
    /// was edited. Returns what `f` returned.
    fn entry_edit(&mut self, id: WidgetId, f: impl FnOnce(&mut Entry) -> bool) -> bool {
        let Some((handled, changed)) = self.modify_leaf::<Entry, _>(id, |entry| {
            let before = entry.revision;
            let handled = f(entry);
            (handled, entry.revision != before)
        }) else {
            return false;
        };
        if changed {
            self.emit(id, Signal::TextChanged);
        }
        handled
    }

    /// Open (or rebuild) the completion dropdown under an entry. Closes it
    /// and returns `false` when no suggestion matches.
    pub fn entry_show_suggest(&mut self, id: WidgetId) -> bool {
        let Some(entry) = self.leaf::<Entry>(id) else {
            return false;
        };
        let (start, matches) = entry.completions();
        let offset = if entry.scroll < start {
            entry.display_width(&entry.text[entry.scroll..start])
        } else {
            0
        };
        self.entry_hide_suggest(id);
        if matches.is_empty() {
            return false;
        }
        self.entry_observe(id);

        let window = self.new_vbox(false);
        self.set_flag(window, WidgetFlags::TRANSIENT, true);
        let tree = self.add_widget(Tree::new());
        self.box_add(window, tree);
        let width = matches.iter().map(|m| onscreen_width(m)).max().unwrap_or(1);
        let height = (matches.len() as i32).min(SUGGEST_ROWS) + 2;
        self.modify_leaf::<Tree, _>(tree, |t| {
            for text in &matches {
                t.add_row_last(text.as_str(), vec![text.clone()], None);
            }
            t.set_col_width(0, width);
        });
        self.set_size(tree, width + 3, height);

        let (x, y) = self.get_position(id);
        let mut y = y + 1;
        if y + height > self.rows() {
            y -= height + 1;
        }
        self.set_position(window, x + offset, y.max(0));
        self.with_leaf::<Entry, _>(id, |entry, _| entry.dropdown = Some(Dropdown { window, tree }));
        self.show(window);
        trace!(entry = ?id, count = matches.len(), "suggestions shown");
        true
    }

    /// Close the completion dropdown, if open.
    pub fn entry_hide_suggest(&mut self, id: WidgetId) -> bool {
        let dropdown = self.with_leaf::<Entry, _>(id, |entry, _| entry.dropdown.take()).flatten();
        match dropdown {
            Some(dropdown) => {
                self.destroy(dropdown.window);
                true
            }
            None => false,
        }
    }

    fn entry_dropdown(&self, id: WidgetId) -> Option<Dropdown> {
        self.leaf::<Entry>(id).and_then(|e| e.dropdown)
    }

    /// Complete with the selected suggestion and close the dropdown.
    fn entry_accept_suggest(&mut self, id: WidgetId) -> bool {
        let Some(dropdown) = self.entry_dropdown(id) else {
            return false;
        };
        let choice = self.leaf::<Tree>(dropdown.tree).and_then(Tree::selection).map(|k| k.as_str().to_owned());
        self.entry_hide_suggest(id);
        if let Some(choice) = choice {
            self.entry_edit(id, |entry| {
                entry.complete(&choice);
                true
            });
        }
        true
    }

    /// Keep an open dropdown in step with edits, and close it when the
    /// entry loses focus or goes away.
    fn entry_observe(&mut self, id: WidgetId) {
        let first = self
            .with_leaf::<Entry, _>(id, |entry, _| !std::mem::replace(&mut entry.observing, true))
            .unwrap_or(false);
        if !first {
            return;
        }
        self.on(id, SignalKind::TextChanged, |screen, id, _| {
            if screen.entry_dropdown(id).is_some() {
                screen.entry_show_suggest(id);
            }
        });
        self.on(id, SignalKind::LostFocus, |screen, id, _| {
            screen.entry_hide_suggest(id);
        });
        self.on(id, SignalKind::Destroy, |screen, id, _| {
            screen.entry_hide_suggest(id);
        });
    }
}

// ---------------------------------------------------------------------------
// Class
// ---------------------------------------------------------------------------

fn entry_action(screen: &mut Screen, id: Option<WidgetId>, f: impl FnOnce(&mut Entry) -> bool) -> bool {
    id.is_some_and(|id| screen.entry_edit(id, f))
}

fn edit_with(f: fn(&mut Entry)) -> impl Fn(&mut Screen, Option<WidgetId>, &[ActionParam]) -> bool {
    move |s, id, _| {
        entry_action(s, id, |entry| {
            f(entry);
            true
        })
    }
}

fn dropdown_action(screen: &mut Screen, id: Option<WidgetId>, action: &str) -> bool {
    let Some(dropdown) = id.and_then(|id| screen.entry_dropdown(id)) else {
        return false;
    };
    screen.perform_action_named(dropdown.tree, action, &[]);
    true
}

/// Register the "Entry" class: editing keys, history and completion.
pub fn register_class(classes: &mut ClassRegistry<Screen>) {
    classes.class_init(CLASS, Some(WIDGET_CLASS), |table| {
        table.register_action("cursor-home", edit_with(Entry::move_start), Some(KEY_HOME), vec![]);
        table.register_binding("cursor-home", &ctrl('a'), vec![]);
        table.register_action("cursor-end", edit_with(Entry::move_end), Some(KEY_END), vec![]);
        table.register_binding("cursor-end", &ctrl('e'), vec![]);
        table.register_action("cursor-prev", edit_with(Entry::move_back), Some(KEY_LEFT), vec![]);
        table.register_binding("cursor-prev", &ctrl('b'), vec![]);
        table.register_action("cursor-next", edit_with(Entry::move_forward), Some(KEY_RIGHT), vec![]);
        table.register_binding("cursor-next", &ctrl('f'), vec![]);
        table.register_action("delete-prev", |s, id, _| entry_action(s, id, Entry::delete_prev), Some(KEY_BACKSPACE), vec![]);
        table.register_action("delete-next", |s, id, _| entry_action(s, id, Entry::delete_next), Some(KEY_DEL), vec![]);
        table.register_binding("delete-next", &ctrl('d'), vec![]);
        table.register_action("delete-start", edit_with(Entry::delete_to_start), Some(&ctrl('u')), vec![]);
        table.register_action("delete-end", edit_with(Entry::delete_to_end), Some(&ctrl('k')), vec![]);
        table.register_action("history-prev", |s, id, _| entry_action(s, id, Entry::history_prev), Some(KEY_CTRL_UP), vec![]);
        table.register_action("history-next", |s, id, _| entry_action(s, id, Entry::history_next), Some(KEY_CTRL_DOWN), vec![]);
        table.register_action(
            "suggest-show",
            |s, id, _| {
                let Some(id) = id else {
                    return false;
                };
                // Tab on an open dropdown closes it and moves focus on.
                if s.entry_hide_suggest(id) {
                    return false;
                }
                s.entry_show_suggest(id)
            },
            Some(KEY_TAB),
            vec![],
        );
        table.register_action("suggest-next", |s, id, _| dropdown_action(s, id, "move-down"), Some(KEY_DOWN), vec![]);
        table.register_action("suggest-prev", |s, id, _| dropdown_action(s, id, "move-up"), Some(KEY_UP), vec![]);
        table.register_action("suggest-hide", |s, id, _| id.is_some_and(|id| s.entry_hide_suggest(id)), Some(KEY_ESC), vec![]);
        table.register_action(
            "activate",
            |s, id, _| {
                let Some(id) = id else {
                    return false;
                };
                if !s.entry_accept_suggest(id) {
                    s.activate(id);
                }
                true
            },
            Some(KEY_ENTER),
            vec![],
        );
    });
}

// ===========================================================================
// Tests
// ===========================================================================
