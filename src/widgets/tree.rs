//! Tree: a scrollable list of rows with optional nesting and columns.
//!
//! Rows are identified by caller-chosen [`RowKey`]s and linked into a tree
//! (parent / first child / siblings). Traversal is pre-order and skips the
//! children of collapsed rows; while an incremental search is active it also
//! skips rows whose first column does not contain the query.
//!
//! The widget keeps four cursors: `root` (first row), `top` (first row on
//! screen), `bottom` (last row on screen, as of the last draw) and
//! `current` (the selection).

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use slotmap::{new_key_type, Key, SlotMap};
use tracing::warn;

use crate::event::binding::ClassRegistry;
use crate::event::input::{MouseEvent, KEY_BACKSPACE, KEY_DOWN, KEY_ENTER, KEY_ESC, KEY_PGDOWN, KEY_PGUP, KEY_SPACE, KEY_UP};
use crate::event::signal::Signal;
use crate::render::canvas::Canvas;
use crate::render::cell::{Attr, ColorPair, TextFormat};
use crate::render::width::{onscreen_width, truncate};
use crate::screen::Screen;
use crate::widget::node::{WidgetBase, WidgetFlags, WidgetId};
use crate::widget::traits::{default_confirm_size, Widget, WidgetCtx};
use crate::widget::WIDGET_CLASS;

pub const CLASS: &str = "Tree";

/// Indentation per nesting level.
const TAB_SIZE: i32 = 3;

/// Default width of a column created by [`Tree::with_columns`].
const DEFAULT_COLUMN_WIDTH: i32 = 15;

// ---------------------------------------------------------------------------
// RowKey
// ---------------------------------------------------------------------------

/// Caller-supplied identity of a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(String);

impl RowKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// A key naming a widget, used by the window list.
    pub fn from_widget(id: WidgetId) -> Self {
        Self(format!("widget:{}", id.data().as_ffi()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RowKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

impl From<String> for RowKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Rows and columns
// ---------------------------------------------------------------------------

new_key_type! {
    struct RowId;
}

#[derive(Debug, Clone)]
struct Row {
    key: RowKey,
    columns: Vec<String>,
    collapsed: bool,
    choice: bool,
    selected: bool,
    flags: TextFormat,
    parent: Option<RowId>,
    child: Option<RowId>,
    next: Option<RowId>,
    prev: Option<RowId>,
}

/// Per-column layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub width: i32,
    pub title: Option<String>,
    pub visible: bool,
}

impl Default for Column {
    fn default() -> Self {
        Self { width: DEFAULT_COLUMN_WIDTH, title: None, visible: true }
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Tree {
    rows: SlotMap<RowId, Row>,
    index: HashMap<RowKey, RowId>,
    root: Option<RowId>,
    top: Option<RowId>,
    bottom: Option<RowId>,
    current: Option<RowId>,
    columns: Vec<Column>,
    show_title: bool,
    show_separator: bool,
    /// Minimum height once titles have been toggled.
    title_min_height: Option<i32>,
    search: Option<String>,
    ascii_ellipsis: bool,
    signals: Vec<Signal>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// A single-column tree.
    pub fn new() -> Self {
        Self::with_columns(1)
    }

    pub fn with_columns(count: usize) -> Self {
        Self {
            rows: SlotMap::with_key(),
            index: HashMap::new(),
            root: None,
            top: None,
            bottom: None,
            current: None,
            columns: vec![Column::default(); count.max(1)],
            show_title: false,
            show_separator: true,
            title_min_height: None,
            search: None,
            ascii_ellipsis: false,
            signals: Vec::new(),
        }
    }

    // ── Row insertion ────────────────────────────────────────────────

    /// Insert a row after `bigbro`, or as the first child of `parent`, or at
    /// the end of the top level. Returns `false` if `key` already exists or
    /// the row would become the child of a choice row.
    pub fn add_row_after(
        &mut self,
        key: impl Into<RowKey>,
        columns: Vec<String>,
        parent: Option<&RowKey>,
        bigbro: Option<&RowKey>,
    ) -> bool {
        self.insert_row(key.into(), columns, parent, bigbro, false)
    }

    fn insert_row(
        &mut self,
        key: RowKey,
        columns: Vec<String>,
        parent: Option<&RowKey>,
        bigbro: Option<&RowKey>,
        choice: bool,
    ) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let parent = parent.and_then(|k| self.index.get(k).copied());
        let bigbro = bigbro.and_then(|k| self.index.get(k).copied());
        let resolved = match bigbro {
            Some(bro) => self.rows[bro].parent,
            None => parent,
        };
        if resolved.is_some_and(|p| self.rows[p].choice) {
            warn!(key = key.as_str(), "choice rows cannot have children");
            return false;
        }
        let id = self.rows.insert(Row {
            key: key.clone(),
            columns,
            collapsed: false,
            choice,
            selected: false,
            flags: TextFormat::NORMAL,
            parent: None,
            child: None,
            next: None,
            prev: None,
        });
        self.index.insert(key, id);

        if let Some(bro) = bigbro {
            let (bro_parent, bro_next) = (self.rows[bro].parent, self.rows[bro].next);
            let row = &mut self.rows[id];
            row.parent = bro_parent;
            row.prev = Some(bro);
            row.next = bro_next;
            if let Some(n) = bro_next {
                self.rows[n].prev = Some(id);
            }
            self.rows[bro].next = Some(id);
        } else if let Some(p) = parent {
            let first = self.rows[p].child;
            let row = &mut self.rows[id];
            row.parent = Some(p);
            row.next = first;
            if let Some(f) = first {
                self.rows[f].prev = Some(id);
            }
            self.rows[p].child = Some(id);
        } else if let Some(root) = self.root {
            let last = self.last_sibling(root);
            self.rows[last].next = Some(id);
            self.rows[id].prev = Some(last);
        } else {
            self.root = Some(id);
        }
        true
    }

    /// Insert a row as the last child of `parent` (or last top-level row).
    pub fn add_row_last(&mut self, key: impl Into<RowKey>, columns: Vec<String>, parent: Option<&RowKey>) -> bool {
        let parent_id = parent.and_then(|k| self.index.get(k).copied());
        let first = match parent_id {
            Some(p) => self.rows[p].child,
            None => self.root,
        };
        let bigbro = first.map(|f| self.rows[self.last_sibling(f)].key.clone());
        self.add_row_after(key, columns, parent, bigbro.as_ref())
    }

    /// Insert a row rendered with a check box. A choice row is always a
    /// leaf: later inserts under it are refused.
    pub fn add_choice(
        &mut self,
        key: impl Into<RowKey>,
        columns: Vec<String>,
        parent: Option<&RowKey>,
        bigbro: Option<&RowKey>,
    ) -> bool {
        self.insert_row(key.into(), columns, parent, bigbro, true)
    }

    // ── Row removal ──────────────────────────────────────────────────

    /// Remove a row and its children. Returns whether the row existed.
    pub fn remove(&mut self, key: &RowKey) -> bool {
        let Some(&id) = self.index.get(key) else {
            return false;
        };
        self.remove_row(id);
        true
    }

    fn remove_row(&mut self, id: RowId) {
        while let Some(child) = self.rows[id].child {
            self.remove_row(child);
        }
        let row = &self.rows[id];
        let (parent, prev, next) = (row.parent, row.prev, row.next);

        if self.root == Some(id) {
            self.root = self.next_of(id);
        }
        if self.current == Some(id) {
            let old = self.current;
            self.current = self.next_of(id).or_else(|| self.prev_of(id));
            if self.current.is_none() && self.root.is_some() {
                self.current = self.root;
            }
            self.selection_changed(old);
        }
        if self.top == Some(id) {
            self.top = self.prev_of(id).or_else(|| self.next_of(id));
        }
        if self.bottom == Some(id) {
            self.bottom = self.prev_of(id);
        }

        if let Some(p) = prev {
            self.rows[p].next = next;
        } else if let Some(par) = parent {
            self.rows[par].child = next;
        }
        if let Some(n) = next {
            self.rows[n].prev = prev;
        }
        if let Some(removed) = self.rows.remove(id) {
            self.index.remove(&removed.key);
        }
        if self.rows.is_empty() {
            self.root = None;
            self.top = None;
            self.bottom = None;
            self.current = None;
        }
    }

    /// Drop every row.
    pub fn remove_all(&mut self) {
        self.rows.clear();
        self.index.clear();
        self.root = None;
        self.top = None;
        self.bottom = None;
        self.current = None;
    }

    // ── Row state ────────────────────────────────────────────────────

    pub fn contains(&self, key: &RowKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Replace the text of one column.
    pub fn change_text(&mut self, key: &RowKey, column: usize, text: impl Into<String>) -> bool {
        let Some(&id) = self.index.get(key) else {
            return false;
        };
        let columns = &mut self.rows[id].columns;
        if column >= columns.len() {
            columns.resize(column + 1, String::new());
        }
        columns[column] = text.into();
        true
    }

    /// Text of one column of a row.
    pub fn row_text(&self, key: &RowKey, column: usize) -> Option<&str> {
        let id = *self.index.get(key)?;
        self.rows[id].columns.get(column).map(String::as_str)
    }

    pub fn set_choice(&mut self, key: &RowKey, set: bool) {
        if let Some(&id) = self.index.get(key) {
            if self.rows[id].choice {
                self.rows[id].selected = set;
            }
        }
    }

    pub fn get_choice(&self, key: &RowKey) -> bool {
        self.index.get(key).is_some_and(|&id| self.rows[id].choice && self.rows[id].selected)
    }

    pub fn set_row_flags(&mut self, key: &RowKey, flags: TextFormat) {
        if let Some(&id) = self.index.get(key) {
            self.rows[id].flags = flags;
        }
    }

    pub fn row_flags(&self, key: &RowKey) -> Option<TextFormat> {
        self.index.get(key).map(|&id| self.rows[id].flags)
    }

    /// Expand or collapse a row's children.
    pub fn set_expanded(&mut self, key: &RowKey, expanded: bool) {
        if let Some(&id) = self.index.get(key) {
            self.rows[id].collapsed = !expanded;
        }
    }

    pub fn is_expanded(&self, key: &RowKey) -> bool {
        self.index.get(key).is_some_and(|&id| !self.rows[id].collapsed)
    }

    /// Parent of a row, if nested.
    pub fn parent_key(&self, key: &RowKey) -> Option<&RowKey> {
        let id = *self.index.get(key)?;
        self.rows[id].parent.map(|p| &self.rows[p].key)
    }

    // ── Selection ────────────────────────────────────────────────────

    pub fn selection(&self) -> Option<&RowKey> {
        self.current.map(|id| &self.rows[id].key)
    }

    /// Text of the first column of the selected row.
    pub fn selection_text(&self) -> Option<&str> {
        self.current
            .and_then(|id| self.rows[id].columns.first())
            .map(String::as_str)
    }

    /// All column texts of the selected row.
    pub fn selection_text_list(&self) -> Vec<String> {
        self.current
            .map(|id| self.rows[id].columns.clone())
            .unwrap_or_default()
    }

    /// Select a row, scrolling it into view.
    pub fn set_selected(&mut self, key: &RowKey) {
        let Some(&id) = self.index.get(key) else {
            return;
        };
        let old = self.current;
        match (self.bottom, self.top) {
            (Some(bottom), _) if self.distance(id, bottom) < 0 => {
                let dist = self.distance(bottom, id);
                self.scroll(dist);
            }
            (_, Some(top)) if self.distance(top, id) < 0 => {
                let dist = self.distance(top, id);
                self.scroll(dist);
            }
            _ => {}
        }
        self.current = Some(id);
        self.selection_changed(old);
    }

    fn selection_changed(&mut self, old: Option<RowId>) {
        if old == self.current {
            return;
        }
        let key = |id: Option<RowId>| id.and_then(|i| self.rows.get(i)).map(|r| r.key.clone());
        let signal = Signal::SelectionChanged { old: key(old), current: key(self.current) };
        self.signals.push(signal);
    }

    // ── Columns ──────────────────────────────────────────────────────

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn set_col_width(&mut self, column: usize, width: i32) {
        if let Some(col) = self.columns.get_mut(column) {
            col.width = width;
        }
    }

    pub fn set_column_titles(&mut self, titles: &[&str]) {
        for (col, title) in self.columns.iter_mut().zip(titles) {
            col.title = Some((*title).to_owned());
        }
    }

    pub fn set_column_visible(&mut self, column: usize, visible: bool) {
        if let Some(col) = self.columns.get_mut(column) {
            col.visible = visible;
        }
    }

    /// Show the column titles above the rows.
    pub fn set_show_title(&mut self, show: bool) {
        self.show_title = show;
        self.title_min_height = Some(if show { 6 } else { 4 });
    }

    pub fn set_show_separator(&mut self, show: bool) {
        self.show_separator = show;
    }

    pub fn set_ascii_ellipsis(&mut self, ascii: bool) {
        self.ascii_ellipsis = ascii;
    }

    // ── Search ───────────────────────────────────────────────────────

    /// The active search query, if searching.
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn start_search(&mut self) -> bool {
        if self.search.is_some() {
            return false;
        }
        self.search = Some(String::new());
        true
    }

    pub fn end_search(&mut self) -> bool {
        self.search.take().is_some()
    }

    fn matches_search(&self, id: RowId) -> bool {
        let Some(query) = self.search.as_deref().filter(|q| !q.is_empty()) else {
            return true;
        };
        self.rows[id]
            .columns
            .first()
            .is_some_and(|text| text.to_lowercase().contains(&query.to_lowercase()))
    }

    // ── Traversal ────────────────────────────────────────────────────

    fn last_sibling(&self, mut id: RowId) -> RowId {
        while let Some(n) = self.rows[id].next {
            id = n;
        }
        id
    }

    fn step_next(&self, id: RowId, godeep: bool) -> Option<RowId> {
        let row = &self.rows[id];
        if godeep && !row.collapsed {
            if let Some(child) = row.child {
                return Some(child);
            }
        }
        if let Some(next) = row.next {
            return Some(next);
        }
        row.parent.and_then(|p| self.step_next(p, false))
    }

    /// The row after `id` in display order.
    fn next_of(&self, id: RowId) -> Option<RowId> {
        let mut row = self.step_next(id, true);
        while let Some(r) = row {
            if self.matches_search(r) {
                break;
            }
            row = self.step_next(r, true);
        }
        row
    }

    fn last_visible_child(&self, mut id: RowId) -> RowId {
        loop {
            let row = &self.rows[id];
            match row.child {
                Some(child) if !row.collapsed => id = self.last_sibling(child),
                _ => return id,
            }
        }
    }

    /// The row before `id` in display order.
    fn prev_of(&self, id: RowId) -> Option<RowId> {
        let mut row = Some(id);
        while let Some(r) = row {
            let found = match self.rows[r].prev {
                Some(p) => Some(self.last_visible_child(p)),
                None => self.rows[r].parent,
            };
            row = found;
            match found {
                Some(f) if self.matches_search(f) => return Some(f),
                Some(_) => {}
                None => return None,
            }
        }
        None
    }

    /// Advance `n` rows, stopping early at the end. Returns the row reached
    /// and the number of steps actually taken.
    fn next_n_opt(&self, id: Option<RowId>, n: i32) -> (Option<RowId>, i32) {
        let Some(mut row) = id else {
            return (None, 0);
        };
        let mut taken = 0;
        while taken < n {
            match self.next_of(row) {
                Some(next) => row = next,
                None => break,
            }
            taken += 1;
        }
        (Some(row), taken)
    }

    fn next_n(&self, id: Option<RowId>, n: i32) -> Option<RowId> {
        self.next_n_opt(id, n).0
    }

    fn prev_n(&self, id: Option<RowId>, n: i32) -> Option<RowId> {
        let mut row = id;
        for _ in 0..n {
            match row.and_then(|r| self.prev_of(r)) {
                Some(p) => row = Some(p),
                None => break,
            }
        }
        row
    }

    /// Rows above `id` in display order.
    fn root_distance(&self, id: RowId) -> i32 {
        let mut distance = 0;
        let mut row = id;
        while let Some(p) = self.prev_of(row) {
            row = p;
            distance += 1;
        }
        distance
    }

    /// Signed display distance from `a` to `b`.
    fn distance(&self, a: RowId, b: RowId) -> i32 {
        self.root_distance(b) - self.root_distance(a)
    }

    fn depth(&self, id: RowId) -> i32 {
        let mut depth = 0;
        let mut row = self.rows[id].parent;
        while let Some(p) = row {
            depth += 1;
            row = self.rows[p].parent;
        }
        depth
    }

    /// Keys in display order (collapsed children and search misses skipped).
    pub fn visible_keys(&self) -> Vec<&RowKey> {
        let mut keys = Vec::new();
        let mut row = self.root.filter(|&r| self.matches_search(r)).or_else(|| self.root.and_then(|r| self.next_of(r)));
        while let Some(r) = row {
            keys.push(&self.rows[r].key);
            row = self.next_of(r);
        }
        keys
    }

    pub fn next_key(&self, key: &RowKey) -> Option<&RowKey> {
        let id = *self.index.get(key)?;
        self.next_of(id).map(|n| &self.rows[n].key)
    }

    pub fn prev_key(&self, key: &RowKey) -> Option<&RowKey> {
        let id = *self.index.get(key)?;
        self.prev_of(id).map(|p| &self.rows[p].key)
    }

    /// Signed display distance between two rows.
    pub fn key_distance(&self, a: &RowKey, b: &RowKey) -> Option<i32> {
        Some(self.distance(*self.index.get(a)?, *self.index.get(b)?))
    }

    pub fn top(&self) -> Option<&RowKey> {
        self.top.map(|id| &self.rows[id].key)
    }

    pub fn bottom(&self) -> Option<&RowKey> {
        self.bottom.map(|id| &self.rows[id].key)
    }

    // ── Scrolling ────────────────────────────────────────────────────

    /// Shift the view by `count` rows. Returns the adjustment actually
    /// applied (0 when already at the edge).
    pub fn scroll(&mut self, count: i32) -> i32 {
        let mut count = count;
        if count < 0 {
            let Some(top) = self.top else {
                return 0;
            };
            if self.root_distance(top) == 0 {
                return 0;
            }
            let moved = self.prev_n(Some(top), -count);
            count = moved.map_or(0, |m| -self.distance(m, top));
            self.top = moved.or(self.root);
        } else if count > 0 {
            let (_, possible) = self.next_n_opt(self.bottom, count);
            count = possible;
            self.top = self.next_n(self.top, count);
        }
        if count != 0 {
            self.signals.push(Signal::Scrolled(count));
        }
        count
    }

    // ── Rendering helpers ────────────────────────────────────────────

    /// Display text of one row fitted to `width` columns.
    fn display_text(&self, id: RowId, width: i32) -> String {
        let row = &self.rows[id];
        let ncol = self.columns.len();
        let last_visible = (0..ncol).rev().find(|&i| self.columns[i].visible).unwrap_or(0);
        let ellipsis = if self.ascii_ellipsis { '~' } else { '…' };
        let mut out = String::new();
        let mut not_first = false;

        for (i, col) in self.columns.iter().enumerate() {
            if !col.visible {
                continue;
            }
            let text = row.columns.get(i).map(String::as_str).unwrap_or("");
            let mut len = onscreen_width(text);
            let mut prefix_len = 0;
            let col_width = if i == last_visible { width - onscreen_width(&out) } else { col.width };

            if i == 0 {
                if row.choice {
                    out.push_str(if row.selected { "[X] " } else { "[ ] " });
                    prefix_len = 4;
                } else if row.parent.is_none() && row.child.is_some() {
                    out.push_str(if row.collapsed { "+ " } else { "- " });
                    prefix_len = 2;
                } else {
                    prefix_len = TAB_SIZE * self.depth(id);
                    out.extend(std::iter::repeat_n(' ', prefix_len as usize));
                }
                len += prefix_len;
            } else if not_first {
                out.push(if self.show_separator { '|' } else { ' ' });
            } else {
                out.push(' ');
            }
            not_first = true;

            let mut cut = false;
            if len > col_width {
                len = (col_width - 1).max(prefix_len);
                cut = true;
            }
            out.push_str(truncate(text, len - prefix_len));
            if cut {
                out.push(ellipsis);
                len += 1;
            }
            if len < col.width && i + 1 < ncol {
                out.extend(std::iter::repeat_n(' ', (col.width - len) as usize));
            }
        }
        out
    }

    fn mark_columns(&self, canvas: &mut Canvas, pos: i32, y: i32, ch: char) {
        let mut x = pos;
        let mut not_first = false;
        for i in 0..self.columns.len().saturating_sub(1) {
            if self.columns[i].visible {
                not_first = true;
                x += self.columns[i].width + i32::from(i > 0);
            }
            if self.columns[i + 1].visible && not_first {
                canvas.put_char(x, y, ch, Attr::new(ColorPair::Normal));
            }
        }
    }

    /// Move the selection to `to`, keeping it on screen.
    fn move_selection(&mut self, to: Option<RowId>) -> bool {
        let Some(to) = to else {
            return false;
        };
        let old = self.current;
        self.current = Some(to);
        if let Some(bottom) = self.bottom {
            let dist = self.distance(to, bottom);
            if dist < 0 {
                self.scroll(-dist);
            }
        }
        if let Some(top) = self.top {
            let dist = self.distance(top, to);
            if dist < 0 {
                self.scroll(dist);
            }
        }
        self.selection_changed(old);
        old != self.current
    }

    // ── Actions ──────────────────────────────────────────────────────

    pub fn move_down(&mut self) -> bool {
        let next = self.current.and_then(|c| self.next_of(c));
        self.move_selection(next)
    }

    pub fn move_up(&mut self) -> bool {
        let prev = self.current.and_then(|c| self.prev_of(c));
        self.move_selection(prev)
    }

    pub fn move_parent(&mut self) -> bool {
        let parent = self.current.and_then(|c| self.rows[c].parent);
        self.move_selection(parent)
    }

    pub fn page_down(&mut self, _base: &WidgetBase) -> bool {
        let old = self.current;
        let dist = match (self.top, self.current) {
            (Some(t), Some(c)) => self.distance(t, c),
            _ => 0,
        };
        if let Some(after) = self.bottom.and_then(|b| self.next_of(b)) {
            self.top = Some(after);
            self.current = self.next_n_opt(self.top, dist).0;
        } else {
            self.current = self.bottom;
        }
        self.selection_changed(old);
        old != self.current
    }

    pub fn page_up(&mut self, base: &WidgetBase) -> bool {
        let old = self.current;
        if self.top.is_some() && self.top != self.root {
            let dist = match (self.top, self.current) {
                (Some(t), Some(c)) => self.distance(t, c),
                _ => 0,
            };
            let border = base.has_border() as i32;
            let page = base.height - 1 - 2 * i32::from(self.show_title) - 2 * border;
            let top = self.prev_n(self.top, page);
            self.top = top.or(self.root);
            self.current = self.next_n_opt(self.top, dist).0;
        } else {
            self.current = self.top;
        }
        self.selection_changed(old);
        old != self.current
    }

    /// Flip the selected row: a choice toggles its check box, a parent row
    /// toggles collapse.
    fn toggle_current(&mut self) -> bool {
        let Some(id) = self.current else {
            return false;
        };
        let row = &mut self.rows[id];
        if row.choice {
            row.selected = !row.selected;
            let key = row.key.clone();
            self.signals.push(Signal::Toggled(key));
            true
        } else if row.child.is_some() {
            row.collapsed = !row.collapsed;
            let signal = Signal::CollapseToggled { key: row.key.clone(), collapsed: row.collapsed };
            self.signals.push(signal);
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Widget impl
// ---------------------------------------------------------------------------

impl Widget for Tree {
    fn class_name(&self) -> &'static str {
        CLASS
    }

    fn init(&mut self, base: &mut WidgetBase) {
        base.flags |= WidgetFlags::GROW_X | WidgetFlags::GROW_Y | WidgetFlags::NO_SHADOW | WidgetFlags::CAN_TAKE_FOCUS;
        base.min_width = 4;
        base.min_height = 1;
        base.width = self.columns.iter().map(|c| c.width).sum();
    }

    fn map(&mut self, ctx: &mut WidgetCtx) {
        if ctx.base.width == 0 || ctx.base.height == 0 {
            self.size_request(ctx);
        }
        self.top = self.root;
        self.current = self.root;
    }

    fn size_request(&mut self, ctx: &mut WidgetCtx) {
        if ctx.base.height == 0 {
            ctx.base.height = 10;
        }
        if ctx.base.width == 0 {
            ctx.base.width = self.columns.iter().filter(|c| c.visible).map(|c| c.width + 1).sum();
        }
    }

    fn confirm_size(&self, base: &WidgetBase, width: i32, height: i32) -> bool {
        height >= self.title_min_height.unwrap_or(0) && default_confirm_size(base, width, height)
    }

    fn size_changed(&mut self, ctx: &mut WidgetCtx, old_width: i32, _old_height: i32) {
        if ctx.base.width == old_width || self.columns.is_empty() {
            return;
        }
        let border = if ctx.base.has_border() { 2 } else { 0 };
        let used: i32 = self.columns.iter().map(|c| c.width).sum();
        let ncol = self.columns.len() as i32;
        if let Some(last) = self.columns.last_mut() {
            last.width = (last.width + ctx.base.width - used - border - ncol).max(1);
        }
    }

    fn draw(&mut self, ctx: &mut WidgetCtx, canvas: &mut Canvas) {
        let base = &*ctx.base;
        let (width, height) = (base.width, base.height);
        let pos = base.has_border() as i32;
        let normal = Attr::new(ColorPair::Normal);

        if self.top.is_none() {
            self.top = self.root;
        }
        if self.current.is_none() {
            self.current = self.root;
        }

        let mut start = 0;
        if self.show_title {
            let mut x = pos;
            canvas.hline(pos, pos, ' ', normal, width - 2 * pos);
            for col in self.columns.iter().filter(|c| c.visible) {
                if let Some(title) = &col.title {
                    canvas.put_str(x, pos, truncate(title, col.width), Attr::new(ColorPair::Normal).bold());
                }
                x += col.width + 1;
            }
            canvas.hline(pos, pos + 1, ctx.glyphs.hline, normal, width - 2 * pos);
            start = 2;
        }

        let mut rows = height - 2 * pos - start - 1;
        let (bottom, down) = self.next_n_opt(self.top, rows);
        self.bottom = bottom;
        if down < rows {
            self.top = self.prev_n(self.bottom, rows).or(self.root);
        }
        if let (Some(top), Some(current)) = (self.top, self.current) {
            let up = self.distance(top, current);
            if up < 0 {
                self.top = Some(current);
            } else if up >= height - pos {
                self.top = self.prev_n(Some(current), rows);
            }
        }
        if let Some(top) = self.top.filter(|&t| !self.matches_search(t)) {
            self.top = self.next_of(top);
        }

        let text_cols = width - 1 - 2 * pos;
        let mut row = self.top;
        let mut y = start + pos;
        while let (Some(r), true) = (row, y < height - pos) {
            let text = self.display_text(r, width);
            let text = truncate(&text, text_cols);
            let flags = self.rows[r].flags;
            let mut attr = flags.to_attr();
            if Some(r) == self.current {
                attr.pair = if ctx.focused { ColorPair::Highlight } else { ColorPair::HighlightD };
                attr.dim = false;
            }
            let written = canvas.put_str(pos, y, text, attr);
            canvas.hline(pos + written, y, ' ', attr, text_cols - written);
            self.bottom = Some(r);
            self.mark_columns(canvas, pos, y, ctx.glyphs.vline);
            y += 1;
            row = self.next_of(r);
        }
        while y < height - pos {
            canvas.hline(pos, y, ' ', normal, width - 2 * pos - 1);
            self.mark_columns(canvas, pos, y, ctx.glyphs.vline);
            y += 1;
        }

        let scroll_col = width - pos - 1;
        let thumb = Attr::new(ColorPair::HighlightD);
        rows -= 1;
        if rows > 0 {
            let (_, mut total) = self.next_n_opt(self.root, self.rows.len() as i32);
            let showing = (rows * rows / total.max(1) + 1).min(rows);
            total -= rows;
            let up = match (self.root, self.top) {
                (Some(root), Some(top)) => self.distance(root, top),
                _ => 0,
            };
            let down = total - up;
            let mut position = (rows - showing) * up / (up + down).max(1);
            position = position.max(i32::from(self.top != self.root));
            if showing + position > rows {
                position = rows - showing;
            }
            if showing + position == rows && row.is_some() {
                position = (rows - 1 - showing).max(0);
            } else if showing + position < rows && row.is_none() {
                position = rows - showing;
            }
            position += pos + start + 1;
            canvas.vline(scroll_col, pos + start + 1, ' ', normal, rows);
            canvas.vline(scroll_col, position, ctx.glyphs.checkerboard, thumb, showing);
        }
        let up_glyph = if self.top != self.root { ctx.glyphs.up_arrow } else { ' ' };
        canvas.put_char(scroll_col, start + pos, up_glyph, thumb);
        let down_glyph = if row.is_some() { ctx.glyphs.down_arrow } else { ' ' };
        canvas.put_char(scroll_col, height - pos - 1, down_glyph, thumb);
    }

    fn key_pressed(&mut self, ctx: &mut WidgetCtx, keys: &str) -> bool {
        if keys == KEY_ENTER {
            self.end_search();
            ctx.emit(Signal::Activate);
            ctx.queue_draw();
            return true;
        }
        if self.search.is_some() {
            let mut chars = keys.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if c.is_alphanumeric() || c == ' ' {
                    if let Some(query) = self.search.as_mut() {
                        query.push(c);
                    }
                    if let Some(current) = self.current.filter(|&c| !self.matches_search(c)) {
                        let next = self.next_of(current).or_else(|| self.prev_of(current));
                        self.move_selection(next);
                    }
                    ctx.queue_draw();
                }
            }
            return true;
        }
        if keys == KEY_SPACE && self.toggle_current() {
            ctx.queue_draw();
            return true;
        }
        false
    }

    fn clicked(&mut self, ctx: &mut WidgetCtx, event: MouseEvent, _x: i32, y: i32) -> bool {
        match event {
            MouseEvent::ScrollUp => {
                self.move_up();
            }
            MouseEvent::ScrollDown => {
                self.move_down();
            }
            MouseEvent::LeftDown => {
                let pos = ctx.base.has_border() as i32 + if self.show_title { 2 } else { 0 };
                let offset = y - ctx.base.y - pos;
                if offset < 0 {
                    return false;
                }
                let (target, taken) = self.next_n_opt(self.top, offset);
                if taken < offset || target.is_none() {
                    return false;
                }
                if target == self.current {
                    if !self.toggle_current() {
                        ctx.emit(Signal::Activate);
                    }
                } else {
                    self.move_selection(target);
                }
            }
            _ => return false,
        }
        ctx.queue_draw();
        true
    }

    fn take_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.signals)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

fn tree_action(screen: &mut Screen, id: Option<WidgetId>, f: impl FnOnce(&mut Tree, &WidgetBase) -> bool) -> bool {
    let Some(id) = id else {
        return false;
    };
    screen
        .with_leaf::<Tree, _>(id, |tree, ctx| {
            let handled = f(tree, ctx.base);
            ctx.queue_draw();
            handled
        })
        .unwrap_or(false)
}

/// Register the "Tree" class: cursor movement, paging and search.
pub fn register_class(classes: &mut ClassRegistry<Screen>) {
    classes.class_init(CLASS, Some(WIDGET_CLASS), |table| {
        table.register_action("move-up", |s, id, _| tree_action(s, id, |t, _| t.move_up()), Some(KEY_UP), vec![]);
        table.register_binding("move-up", "\x10", vec![]);
        table.register_action("move-down", |s, id, _| tree_action(s, id, |t, _| t.move_down()), Some(KEY_DOWN), vec![]);
        table.register_binding("move-down", "\x0e", vec![]);
        table.register_action("move-parent", |s, id, _| tree_action(s, id, |t, _| t.move_parent()), Some(KEY_BACKSPACE), vec![]);
        table.register_action("page-up", |s, id, _| tree_action(s, id, Tree::page_up), Some(KEY_PGUP), vec![]);
        table.register_action("page-down", |s, id, _| tree_action(s, id, Tree::page_down), Some(KEY_PGDOWN), vec![]);
        table.register_action("start-search", |s, id, _| tree_action(s, id, |t, _| t.start_search()), Some("/"), vec![]);
        table.register_action("end-search", |s, id, _| tree_action(s, id, |t, _| t.end_search()), Some(KEY_ESC), vec![]);
    });
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn cols(text: &str) -> Vec<String> {
        vec![text.to_owned()]
    }

    fn key(k: &str) -> RowKey {
        RowKey::from(k)
    }

    /// ```text
    /// a
    ///   a1
    ///   a2
    /// b
    /// c
    /// ```
    fn sample() -> Tree {
        let mut tree = Tree::new();
        tree.add_row_last("a", cols("alpha"), None);
        tree.add_row_last("b", cols("beta"), None);
        tree.add_row_last("c", cols("gamma"), None);
        tree.add_row_last("a1", cols("one"), Some(&key("a")));
        tree.add_row_last("a2", cols("two"), Some(&key("a")));
        tree
    }

    fn order(tree: &Tree) -> Vec<&str> {
        tree.visible_keys().into_iter().map(RowKey::as_str).collect()
    }

    #[test]
    fn preorder_traversal() {
        let tree = sample();
        assert_eq!(order(&tree), vec!["a", "a1", "a2", "b", "c"]);
    }

    #[test]
    fn next_and_prev_are_inverse() {
        let tree = sample();
        for k in ["a", "a1", "a2", "b"] {
            let next = tree.next_key(&key(k)).cloned();
            let back = next.as_ref().and_then(|n| tree.prev_key(n));
            assert_eq!(back, Some(&key(k)));
        }
        assert_eq!(tree.prev_key(&key("a")), None);
        assert_eq!(tree.next_key(&key("c")), None);
    }

    #[test]
    fn distance_matches_display_position() {
        let tree = sample();
        assert_eq!(tree.key_distance(&key("a"), &key("b")), Some(3));
        assert_eq!(tree.key_distance(&key("c"), &key("a1")), Some(-3));
    }

    #[test]
    fn collapsed_children_are_skipped() {
        let mut tree = sample();
        tree.set_expanded(&key("a"), false);
        assert_eq!(order(&tree), vec!["a", "b", "c"]);
        assert_eq!(tree.prev_key(&key("b")), Some(&key("a")));
    }

    #[test]
    fn add_after_big_brother_and_as_first_child() {
        let mut tree = sample();
        tree.add_row_after("ab", cols("between"), None, Some(&key("a")));
        tree.add_row_after("a0", cols("zero"), Some(&key("a")), None);
        assert_eq!(order(&tree), vec!["a", "a0", "a1", "a2", "ab", "b", "c"]);
        assert!(!tree.add_row_last("a", cols("dup"), None));
    }

    #[test]
    fn choice_rows_refuse_children() {
        let mut tree = Tree::new();
        assert!(tree.add_choice("x", cols("check"), None, None));
        assert!(!tree.add_row_after("y", cols("under"), Some(&key("x")), None));
        assert!(!tree.add_row_last("y", cols("under"), Some(&key("x"))));
        assert!(!tree.add_choice("y", cols("under"), Some(&key("x")), None));
        assert!(!tree.contains(&key("y")));

        // Siblings of a choice row are fine.
        assert!(tree.add_row_after("z", cols("plain"), None, Some(&key("x"))));
        assert!(tree.add_choice("z1", cols("leaf"), Some(&key("z")), None));
        assert!(tree.add_row_after("z2", cols("next"), None, Some(&key("z1"))));
        assert_eq!(tree.parent_key(&key("z2")), Some(&key("z")));
        assert_eq!(order(&tree), vec!["x", "z", "z1", "z2"]);
    }

    /// ```text
    /// a
    ///   e
    /// c
    /// d
    ///   b
    /// ```
    fn nested() -> Tree {
        let mut tree = Tree::new();
        tree.add_row_last("a", cols("a"), None);
        tree.add_row_last("c", cols("c"), None);
        tree.add_row_last("d", cols("d"), None);
        tree.add_row_last("e", cols("e"), Some(&key("a")));
        tree.add_row_last("b", cols("b"), Some(&key("d")));
        tree
    }

    #[test]
    fn nested_rows_walk_in_display_order() {
        let tree = nested();
        assert_eq!(order(&tree), vec!["a", "e", "c", "d", "b"]);
        assert_eq!(tree.next_key(&key("a")), Some(&key("e")));
        assert_eq!(tree.next_key(&key("e")), Some(&key("c")));
        assert_eq!(tree.next_key(&key("d")), Some(&key("b")));
        assert_eq!(tree.prev_key(&key("b")), Some(&key("d")));
        assert_eq!(tree.prev_key(&key("c")), Some(&key("e")));
        assert_eq!(tree.next_key(&key("b")), None);
    }

    #[test]
    fn distance_from_root_is_display_index() {
        for tree in [sample(), nested()] {
            let keys: Vec<RowKey> = tree.visible_keys().into_iter().cloned().collect();
            let root = &keys[0];
            for (index, row) in keys.iter().enumerate() {
                assert_eq!(tree.key_distance(root, row), Some(index as i32), "row {row:?}");
            }
        }
    }

    #[test]
    fn remove_drops_children_and_moves_selection() {
        let mut tree = sample();
        tree.set_selected(&key("a"));
        tree.take_signals();
        assert!(tree.remove(&key("a")));
        assert_eq!(order(&tree), vec!["b", "c"]);
        assert!(!tree.contains(&key("a1")));
        assert_eq!(tree.selection(), Some(&key("b")));
        let signals = tree.take_signals();
        assert_eq!(
            signals,
            vec![Signal::SelectionChanged { old: Some(key("a")), current: Some(key("b")) }]
        );
    }

    #[test]
    fn removing_last_row_clears_cursors() {
        let mut tree = Tree::new();
        tree.add_row_last("x", cols("x"), None);
        tree.set_selected(&key("x"));
        tree.remove(&key("x"));
        assert_eq!(tree.selection(), None);
        assert_eq!(tree.row_count(), 0);
    }

    #[test]
    fn search_filters_traversal() {
        let mut tree = sample();
        assert!(tree.start_search());
        assert!(!tree.start_search());
        tree.search = Some("ET".into());
        assert_eq!(order(&tree), vec!["b"]);
        assert!(tree.end_search());
        assert!(!tree.end_search());
        assert_eq!(order(&tree).len(), 5);
    }

    #[test]
    fn display_text_prefixes() {
        let mut tree = sample();
        tree.add_choice("ch", cols("check"), None, None);
        tree.set_choice(&key("ch"), true);
        let id = |t: &Tree, k: &str| t.index[&key(k)];
        assert_eq!(tree.display_text(id(&tree, "a"), 20), "- alpha");
        assert_eq!(tree.display_text(id(&tree, "a1"), 20), "   one");
        assert_eq!(tree.display_text(id(&tree, "ch"), 20), "[X] check");
        tree.set_expanded(&key("a"), false);
        assert_eq!(tree.display_text(id(&tree, "a"), 20), "+ alpha");
    }

    #[test]
    fn long_text_is_cut_with_ellipsis() {
        let mut tree = Tree::new();
        tree.set_ascii_ellipsis(true);
        tree.add_row_last("k", cols("abcdefghij"), None);
        let id = tree.index[&key("k")];
        assert_eq!(tree.display_text(id, 6), "abcde~");
    }

    #[test]
    fn multi_column_text_uses_separator() {
        let mut tree = Tree::with_columns(2);
        tree.set_col_width(0, 5);
        tree.add_row_last("k", vec!["ab".into(), "cd".into()], None);
        let id = tree.index[&key("k")];
        assert_eq!(tree.display_text(id, 12), "ab   |cd");
    }

    #[test]
    fn choice_toggle_emits_toggled() {
        let mut tree = Tree::new();
        tree.add_choice("x", cols("x"), None, None);
        tree.set_selected(&key("x"));
        tree.take_signals();
        assert!(tree.toggle_current());
        assert!(tree.get_choice(&key("x")));
        assert_eq!(tree.take_signals(), vec![Signal::Toggled(key("x"))]);
    }

    #[test]
    fn scroll_up_at_top_is_refused() {
        let mut tree = sample();
        tree.top = tree.root;
        assert_eq!(tree.scroll(-1), 0);
        assert!(tree.take_signals().is_empty());
    }

    #[test]
    fn scroll_down_is_limited_by_remaining_rows() {
        let mut tree = sample();
        tree.top = tree.root;
        tree.bottom = Some(tree.index[&key("a2")]);
        assert_eq!(tree.scroll(5), 2);
        assert_eq!(tree.top(), Some(&key("a2")));
        assert_eq!(tree.take_signals(), vec![Signal::Scrolled(2)]);
    }

    #[test]
    fn row_key_from_widget_is_stable() {
        let mut map: SlotMap<WidgetId, ()> = SlotMap::with_key();
        let id = map.insert(());
        assert_eq!(RowKey::from_widget(id), RowKey::from_widget(id));
    }
}
