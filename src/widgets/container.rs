//! Box: an ordered container that lays its children out in a row or a column.
//!
//! Children are stacked along the main axis (vertical or horizontal) with
//! `pad` cells between them and a one-cell border inset unless the box has
//! `NO_BORDER`. A top-level box keeps the *focus list*: every focusable leaf
//! below it, nested boxes flattened, in display order. Nested boxes defer to
//! the root's list.
//!
//! Resizing uses a single-absorber policy: the first child that accepts the
//! whole main-axis delta takes it, every other child only follows along the
//! cross axis. If no child accepts, the resize is refused.

use tracing::trace;

use crate::event::binding::{ActionParam, ClassRegistry};
use crate::event::input::{MouseEvent, KEY_BACK_TAB, KEY_LEFT, KEY_RIGHT, KEY_TAB};
use crate::render::cell::{Attr, ColorPair};
use crate::render::width::width_to_index;
use crate::screen::Screen;
use crate::widget::arena::WidgetKind;
use crate::widget::node::{WidgetBase, WidgetFlags, WidgetId};
use crate::widget::WIDGET_CLASS;

pub const CLASS: &str = "Box";

// ---------------------------------------------------------------------------
// Alignment
// ---------------------------------------------------------------------------

/// Cross-axis placement of children narrower than the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Right,
    Mid,
    Top,
    Bottom,
}

// ---------------------------------------------------------------------------
// BoxState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BoxState {
    /// Display order.
    pub(crate) children: Vec<WidgetId>,
    /// Focusable descendants; only maintained on a top-level box.
    pub(crate) focus: Vec<WidgetId>,
    pub(crate) active: Option<WidgetId>,
    /// Child chosen by the last successful `confirm_size`.
    pub(crate) size_queued: Option<WidgetId>,
    /// Child that absorbed the previous resize; tried first next time.
    pub(crate) last_resized: Option<WidgetId>,
    pub vertical: bool,
    pub homogeneous: bool,
    /// Stretch children to the widest (or tallest) one on the cross axis.
    pub fill: bool,
    pub pad: i32,
    pub alignment: Alignment,
    pub title: Option<String>,
}

impl BoxState {
    pub fn new(homogeneous: bool, vertical: bool) -> Self {
        Self {
            children: Vec::new(),
            focus: Vec::new(),
            active: None,
            size_queued: None,
            last_resized: None,
            vertical,
            homogeneous,
            fill: true,
            pad: 1,
            alignment: if vertical { Alignment::Left } else { Alignment::Mid },
            title: None,
        }
    }

    pub fn children(&self) -> &[WidgetId] {
        &self.children
    }

    pub fn active(&self) -> Option<WidgetId> {
        self.active
    }

    pub fn focus_list(&self) -> &[WidgetId] {
        &self.focus
    }

    /// Advance `active` circularly through the focus list to the next
    /// widget accepted by `eligible`. Stays put if none is.
    pub fn find_next_focus(&mut self, eligible: impl Fn(WidgetId) -> bool) {
        self.cycle_focus(eligible, |idx, len| match idx {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        });
    }

    /// Like [`find_next_focus`](Self::find_next_focus), backwards.
    pub fn find_prev_focus(&mut self, eligible: impl Fn(WidgetId) -> bool) {
        self.cycle_focus(eligible, |idx, len| match idx {
            Some(i) if i > 0 => i - 1,
            _ => len - 1,
        });
    }

    fn cycle_focus(&mut self, eligible: impl Fn(WidgetId) -> bool, step: impl Fn(Option<usize>, usize) -> usize) {
        let len = self.focus.len();
        if len == 0 {
            return;
        }
        let start = self.active;
        let mut idx = self.active.and_then(|a| self.focus.iter().position(|&f| f == a));
        for _ in 0..len {
            let next = step(idx, len);
            idx = Some(next);
            if eligible(self.focus[next]) {
                self.active = Some(self.focus[next]);
                return;
            }
        }
        self.active = start;
    }
}

// ---------------------------------------------------------------------------
// Box operations
// ---------------------------------------------------------------------------

impl Screen {
    /// Create a borderless box.
    pub fn new_box(&mut self, homogeneous: bool, vertical: bool) -> WidgetId {
        let mut base = WidgetBase::new(CLASS);
        base.flags = WidgetFlags::NO_BORDER
            | WidgetFlags::NO_SHADOW
            | WidgetFlags::GROW_X
            | WidgetFlags::GROW_Y
            | WidgetFlags::CAN_TAKE_FOCUS;
        let id = self.widgets.insert(base, WidgetKind::Box(BoxState::new(homogeneous, vertical)));
        trace!(?id, vertical, "box created");
        id
    }

    pub fn new_vbox(&mut self, homogeneous: bool) -> WidgetId {
        self.new_box(homogeneous, true)
    }

    pub fn new_hbox(&mut self, homogeneous: bool) -> WidgetId {
        self.new_box(homogeneous, false)
    }

    /// A vertical top-level box with border and shadow.
    pub fn new_window(&mut self) -> WidgetId {
        let id = self.new_vbox(false);
        self.set_toplevel(id, true);
        id
    }

    pub fn box_state(&self, id: WidgetId) -> Option<&BoxState> {
        self.widgets.box_state(id)
    }

    /// The focused child of the top-level box containing `id`.
    pub fn active(&self, id: WidgetId) -> Option<WidgetId> {
        let root = self.widgets.root_of(id);
        self.widgets.box_state(root).and_then(|b| b.active)
    }

    /// Append `child` to the box. A child that cannot grow along the cross
    /// axis makes the box unable to grow along it too.
    pub fn box_add(&mut self, id: WidgetId, child: WidgetId) {
        let Some(child_flags) = self.widgets.base(child).map(|b| b.flags) else {
            return;
        };
        let Some(state) = self.widgets.box_state_mut(id) else {
            tracing::warn!(?id, "box_add on a widget that is not a box");
            return;
        };
        state.children.push(child);
        let vertical = state.vertical;
        self.widgets.set_parent(child, id);
        if let Some(base) = self.widgets.base_mut(id) {
            if vertical && !child_flags.contains(WidgetFlags::GROW_X) {
                base.flags.remove(WidgetFlags::GROW_X);
            } else if !vertical && !child_flags.contains(WidgetFlags::GROW_Y) {
                base.flags.remove(WidgetFlags::GROW_Y);
            }
        }
        self.refresh_focus_list(id);
    }

    /// Detach `child` from the box without destroying it, then redraw.
    pub fn box_remove(&mut self, id: WidgetId, child: WidgetId) {
        self.box_unlink(id, child);
        if self.widgets.base(id).is_some_and(WidgetBase::is_mapped) {
            self.draw(id);
        }
    }

    /// Drop `child` from the box's child list and from the root's focus list.
    pub(crate) fn box_unlink(&mut self, id: WidgetId, child: WidgetId) {
        let Some(state) = self.widgets.box_state_mut(id) else {
            return;
        };
        state.children.retain(|&c| c != child);
        if state.size_queued == Some(child) {
            state.size_queued = None;
        }
        if state.last_resized == Some(child) {
            state.last_resized = None;
        }
        let gone = self.widgets.walk_depth_first(child);
        self.widgets.clear_parent(child);

        let root = self.widgets.root_of(id);
        let Some(state) = self.widgets.box_state_mut(root) else {
            return;
        };
        let was_active = state.active.is_some_and(|a| gone.contains(&a));
        state.focus.retain(|f| !gone.contains(f));
        if was_active {
            state.active = state.focus.first().copied();
            if let Some(active) = state.active {
                self.set_focus(active, self.widgets.base(root).is_some_and(|b| b.has(WidgetFlags::HAS_FOCUS)));
            }
        }
    }

    /// Destroy every child.
    pub fn box_remove_all(&mut self, id: WidgetId) {
        for child in self.widgets.children(id).to_vec() {
            self.destroy(child);
        }
        if let Some(state) = self.widgets.box_state_mut(id) {
            state.children.clear();
            state.focus.clear();
            state.active = None;
            state.size_queued = None;
            state.last_resized = None;
        }
        if let Some(base) = self.widgets.base_mut(id) {
            base.width = 0;
            base.height = 0;
        }
    }

    /// Build the focus list of a top-level box if it has none, and pick the
    /// first entry as active if nothing is.
    pub(crate) fn find_focusable(&mut self, id: WidgetId) -> bool {
        if self.widgets.parent(id).is_some() {
            return false;
        }
        let needs_list = self.widgets.box_state(id).is_some_and(|b| b.focus.is_empty());
        if needs_list {
            let focus = self.collect_focusable(id);
            if let Some(state) = self.widgets.box_state_mut(id) {
                state.focus = focus;
            }
        }
        let Some(state) = self.widgets.box_state_mut(id) else {
            return false;
        };
        if state.active.is_none() {
            state.active = state.focus.first().copied();
        }
        state.active.is_some()
    }

    fn collect_focusable(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        for &child in self.widgets.children(id) {
            if self.widgets.is_box(child) {
                out.extend(self.collect_focusable(child));
            } else if self.widgets.base(child).is_some_and(WidgetBase::can_take_focus) {
                out.push(child);
            }
        }
        out
    }

    /// Rebuild the root's focus list after the tree under it changed.
    fn refresh_focus_list(&mut self, id: WidgetId) {
        let root = self.widgets.root_of(id);
        if self.widgets.box_state(root).is_none_or(|b| b.focus.is_empty()) {
            return;
        }
        let focus = self.collect_focusable(root);
        if let Some(state) = self.widgets.box_state_mut(root) {
            if state.active.is_some_and(|a| !focus.contains(&a)) {
                state.active = None;
            }
            state.focus = focus;
        }
    }

    // ── Size negotiation ─────────────────────────────────────────────

    /// Size every child, equalize them (homogeneous / fill), then lay
    /// them out.
    pub(crate) fn box_size_request(&mut self, id: WidgetId) {
        let Some(state) = self.widgets.box_state(id) else {
            return;
        };
        let (vertical, homogeneous, fill) = (state.vertical, state.homogeneous, state.fill);
        let children = state.children.clone();
        for &child in &children {
            self.size_request(child);
        }
        let (mut max_w, mut max_h) = (0, 0);
        for &child in &children {
            let (w, h) = self.get_size(child);
            max_w = max_w.max(w);
            max_h = max_h.max(h);
        }
        for &child in &children {
            let (mut w, mut h) = self.get_size(child);
            if homogeneous {
                if vertical {
                    h = max_h;
                } else {
                    w = max_w;
                }
            }
            if fill {
                if vertical {
                    w = max_w;
                } else {
                    h = max_h;
                }
            }
            let shadow = self.has_shadow(child) as i32;
            if self.confirm_size(child, w - shadow, h - shadow) {
                self.set_size(child, w, h);
            }
        }
        self.reposition_children(id);
    }

    /// Place visible children one after another from the top-left inset and
    /// set the box's own size to fit them.
    pub(crate) fn reposition_children(&mut self, id: WidgetId) {
        let Some(base) = self.widgets.base(id) else {
            return;
        };
        let border = base.has_border();
        let (x0, y0) = (base.x, base.y);
        let Some(state) = self.widgets.box_state(id) else {
            return;
        };
        let (vertical, pad) = (state.vertical, state.pad);
        let children = state.children.clone();

        let inset = border as i32;
        let (mut cur_x, mut cur_y) = (x0 + inset, y0 + inset);
        let mut max = 0;
        let mut placed = false;
        for child in children {
            if self.widgets.base(child).is_none_or(|b| !b.is_visible()) {
                continue;
            }
            self.set_position(child, cur_x, cur_y);
            let (w, h) = self.get_size(child);
            if vertical && h > 0 {
                cur_y += h + pad;
                max = max.max(w);
                placed = true;
            } else if !vertical && w > 0 {
                cur_x += w + pad;
                max = max.max(h);
                placed = true;
            }
        }
        if placed {
            if vertical {
                cur_y -= pad;
            } else {
                cur_x -= pad;
            }
        }
        cur_x += inset;
        cur_y += inset;
        max += 2 * inset;

        if let Some(base) = self.widgets.base_mut(id) {
            if vertical {
                base.width = max;
                base.height = cur_y - y0;
            } else {
                base.width = cur_x - x0;
                base.height = max;
            }
        }
    }

    /// Find a child able to absorb the change to `width` x `height`.
    pub(crate) fn box_confirm_size(&mut self, id: WidgetId, width: i32, height: i32) -> bool {
        let Some(base) = self.widgets.base(id) else {
            return false;
        };
        let (w_change, h_change) = (base.width - width, base.height - height);
        let Some(state) = self.widgets.box_state(id) else {
            return false;
        };
        if state.children.is_empty() || (w_change == 0 && h_change == 0) {
            return true;
        }
        let (vertical, last) = (state.vertical, state.last_resized);
        let children = state.children.clone();

        let accepts = |screen: &mut Screen, child: WidgetId, dw: i32, dh: i32| {
            let shadow = screen.has_shadow(child) as i32;
            let (w, h) = screen.get_size(child);
            screen.confirm_size(child, w - shadow - dw, h - shadow - dh)
        };

        let mut absorber = None;
        for &child in &children {
            if Some(child) == last {
                continue;
            }
            let (w, h) = self.get_size(child);
            let visible = self.widgets.base(child).is_some_and(WidgetBase::is_visible);
            if w > 0 && h > 0 && visible && accepts(self, child, w_change, h_change) {
                absorber = Some(child);
                break;
            }
        }
        if absorber.is_none() {
            absorber = last.filter(|&child| accepts(self, child, w_change, h_change));
        }
        if let Some(state) = self.widgets.box_state_mut(id) {
            state.size_queued = absorber;
        }
        let Some(absorber) = absorber else {
            trace!(?id, w_change, h_change, "no child can absorb the resize");
            return false;
        };

        let absorber_size = self.widgets.base(absorber).map_or((0, 0), |b| (b.width, b.height));
        for &child in &children {
            if child == absorber {
                continue;
            }
            let (w, h) = self.get_size(child);
            if vertical {
                if w_change > 0 && w >= absorber_size.0 && !accepts(self, child, w_change, 0) {
                    return false;
                }
            } else if h_change > 0 && h >= absorber_size.1 && !accepts(self, child, 0, h_change) {
                return false;
            }
        }
        true
    }

    /// Hand the size change to the absorber chosen by `confirm_size`; the
    /// other children follow on the cross axis only.
    pub(crate) fn box_size_changed(&mut self, id: WidgetId, old_width: i32, old_height: i32) {
        let Some(base) = self.widgets.base(id) else {
            return;
        };
        let (mut w_change, mut h_change) = (base.width - old_width, base.height - old_height);
        let Some(state) = self.widgets.box_state_mut(id) else {
            return;
        };
        let absorber = state.size_queued.take();
        if absorber.is_some() {
            state.last_resized = absorber;
        }
        let vertical = state.vertical;
        let children = state.children.clone();

        if let Some(absorber) = absorber {
            let (w, h) = self.get_size(absorber);
            self.set_size(absorber, w + w_change, h + h_change);
        }
        if vertical {
            h_change = 0;
        } else {
            w_change = 0;
        }
        for child in children {
            if Some(child) == absorber {
                continue;
            }
            let (w, h) = self.get_size(child);
            self.set_size(child, w + w_change, h + h_change);
        }
        self.reposition_children(id);
    }

    // ── Drawing ──────────────────────────────────────────────────────

    pub(crate) fn box_draw(&mut self, id: WidgetId) {
        for child in self.widgets.children(id).to_vec() {
            if self.widgets.base(child).is_some_and(WidgetBase::is_visible) {
                self.draw(child);
            }
        }
        self.draw_title(id);
        self.sync_children(id);
    }

    fn draw_title(&mut self, id: WidgetId) {
        let focused = self.has_focus(id);
        let glyphs = self.glyphs;
        let Some(title) = self.widgets.box_state(id).and_then(|b| b.title.clone()) else {
            return;
        };
        let Some(base) = self.widgets.base_mut(id) else {
            return;
        };
        if !base.has_border() {
            return;
        }
        let width = base.width;
        if width < 5 {
            return;
        }
        let Some(canvas) = base.canvas.as_mut() else {
            return;
        };
        let (end, len) = width_to_index(&title, width - 4);
        let (pos, right) = ((width - len) / 2, (width + len) / 2);
        let normal = Attr::new(ColorPair::Normal);
        let attr = Attr::new(if focused { ColorPair::Title } else { ColorPair::TitleD });
        canvas.put_char(pos - 1, 0, glyphs.rtee, normal);
        canvas.put_str(pos, 0, &title[..end], attr);
        canvas.put_char(right, 0, glyphs.ltee, normal);
    }

    /// Copy each visible child's canvas into the box's canvas at its place,
    /// applying the cross-axis alignment.
    pub(crate) fn sync_children(&mut self, id: WidgetId) {
        let Some(base) = self.widgets.base(id) else {
            return;
        };
        let pos = base.has_border() as i32;
        let (bx, by, bw, bh) = (base.x, base.y, base.width, base.height);
        let Some(state) = self.widgets.box_state(id) else {
            return;
        };
        let (vertical, alignment) = (state.vertical, state.alignment);
        let children = state.children.clone();
        let Some(mut canvas) = self.widgets.base_mut(id).and_then(|b| b.canvas.take()) else {
            return;
        };

        for child in children {
            if self.widgets.base(child).is_none_or(|b| !b.is_visible()) {
                continue;
            }
            if self.widgets.is_box(child) {
                self.sync_children(child);
            }
            let (width, height) = self.get_size(child);
            let (cx, cy) = self.get_position(child);
            let (mut x, mut y) = (cx - bx, cy - by);
            if vertical {
                x = pos;
                match alignment {
                    Alignment::Right => x += bw - width,
                    Alignment::Mid => x += (bw - width) / 2,
                    _ => {}
                }
                if x + width > bw - pos {
                    x -= x + width - (bw - pos);
                }
            } else {
                y = pos;
                match alignment {
                    Alignment::Bottom => y += bh - height,
                    Alignment::Mid => y += (bh - height) / 2,
                    _ => {}
                }
                if y + height >= bh - pos {
                    y = bh - height - pos;
                }
            }
            if let Some(child_canvas) = self.widgets.base(child).and_then(WidgetBase::canvas) {
                canvas.blit(child_canvas, x, y);
            }
            self.set_position(child, x + bx, y + by);
        }

        if let Some(base) = self.widgets.base_mut(id) {
            base.canvas = Some(canvas);
        }
    }

    // ── Input ────────────────────────────────────────────────────────

    /// The active child sees the input first, then the box's own bindings,
    /// then the arrow keys move focus.
    pub(crate) fn box_key_pressed(&mut self, id: WidgetId, keys: &str) -> bool {
        let active = self.widgets.box_state(id).and_then(|b| b.active);
        let active = match active {
            Some(a) => Some(a),
            None if self.find_focusable(id) => self.widgets.box_state(id).and_then(|b| b.active),
            None => None,
        };
        let Some(active) = active else {
            return false;
        };
        if self.key_pressed(active, keys) {
            return true;
        }
        if self.perform_action_key(id, keys) {
            return true;
        }
        match keys {
            KEY_LEFT => self.move_focus(id, false),
            KEY_RIGHT => self.move_focus(id, true),
            _ => false,
        }
    }

    /// Cycle the root's focus. Returns whether focus moved.
    pub fn move_focus(&mut self, id: WidgetId, forward: bool) -> bool {
        let root = self.widgets.root_of(id);
        self.find_focusable(root);
        let visible: Vec<WidgetId> = self
            .widgets
            .box_state(root)
            .map(|b| b.focus.clone())
            .unwrap_or_default()
            .into_iter()
            .filter(|&w| self.widgets.base(w).is_some_and(|b| b.is_visible() && b.can_take_focus()))
            .collect();
        let Some(state) = self.widgets.box_state_mut(root) else {
            return false;
        };
        let before = state.active;
        let eligible = |w: WidgetId| visible.contains(&w);
        if forward {
            state.find_next_focus(eligible);
        } else {
            state.find_prev_focus(eligible);
        }
        let after = state.active;
        match (before, after) {
            (Some(old), Some(new)) if old != new => {
                self.set_focus(old, false);
                self.set_focus(new, true);
                self.draw(root);
                true
            }
            _ => false,
        }
    }

    /// Route a click to the child under (x, y). A down event on a
    /// focusable child moves the window's focus to it first.
    pub(crate) fn box_clicked(&mut self, id: WidgetId, event: MouseEvent, x: i32, y: i32) -> bool {
        for child in self.widgets.children(id).to_vec() {
            let (cx, cy) = self.get_position(child);
            let (w, h) = self.get_size(child);
            if x >= cx && x < cx + w && y >= cy && y < cy + h {
                if event.is_down() && self.widgets.base(child).is_some_and(WidgetBase::can_take_focus) {
                    let root = self.widgets.root_of(id);
                    self.give_focus_to_child(root, child);
                }
                return self.clicked(child, event, x, y);
            }
        }
        false
    }

    /// Make `child` the active widget of the window containing `id`.
    pub fn give_focus_to_child(&mut self, id: WidgetId, child: WidgetId) {
        let root = self.widgets.root_of(id);
        self.find_focusable(root);
        let Some(state) = self.widgets.box_state_mut(root) else {
            return;
        };
        let before = state.active;
        if state.focus.contains(&child) {
            state.active = Some(child);
        }
        let after = state.active;
        if let (Some(old), Some(new)) = (before, after) {
            if old != new {
                self.set_focus(old, false);
                self.set_focus(new, true);
            }
        }
        if self.widgets.base(root).is_some_and(|b| b.canvas.is_some()) {
            self.draw(root);
        }
    }

    // ── Properties ───────────────────────────────────────────────────

    /// Give the box a border, a shadow and the ability to take focus, or
    /// take them away.
    pub fn set_toplevel(&mut self, id: WidgetId, set: bool) {
        let Some(base) = self.widgets.base_mut(id) else {
            return;
        };
        base.flags.set(WidgetFlags::NO_BORDER | WidgetFlags::NO_SHADOW, !set);
        base.flags.set(WidgetFlags::CAN_TAKE_FOCUS, set);
    }

    pub fn box_set_title(&mut self, id: WidgetId, title: impl Into<String>) {
        let Some(state) = self.widgets.box_state_mut(id) else {
            return;
        };
        state.title = Some(title.into());
        if self.widgets.base(id).is_some_and(|b| b.canvas.is_some()) {
            self.draw_title(id);
            self.queue_update(id);
        }
        self.update_window_in_list(id);
    }

    pub fn box_title(&self, id: WidgetId) -> Option<&str> {
        self.widgets.box_state(id).and_then(|b| b.title.as_deref())
    }

    pub fn set_pad(&mut self, id: WidgetId, pad: i32) {
        if let Some(state) = self.widgets.box_state_mut(id) {
            state.pad = pad;
        }
    }

    pub fn set_fill(&mut self, id: WidgetId, fill: bool) {
        if let Some(state) = self.widgets.box_state_mut(id) {
            state.fill = fill;
        }
    }

    pub fn set_alignment(&mut self, id: WidgetId, alignment: Alignment) {
        if let Some(state) = self.widgets.box_state_mut(id) {
            state.alignment = alignment;
        }
    }

    /// Forget every computed size under a top-level box and lay it out
    /// again from scratch.
    pub fn box_readjust(&mut self, id: WidgetId) {
        if self.widgets.parent(id).is_some() {
            return;
        }
        self.reset_sizes(id);
        if let Some(state) = self.widgets.box_state_mut(id) {
            state.focus.clear();
            state.active = None;
        }
        self.size_request(id);
        let (width, height) = self.get_size(id);
        self.resize_widget(id, width, height);
        self.find_focusable(id);
    }

    fn reset_sizes(&mut self, id: WidgetId) {
        for child in self.widgets.children(id).to_vec() {
            self.reset_sizes(child);
        }
        if let Some(base) = self.widgets.base_mut(id) {
            base.flags.remove(WidgetFlags::MAPPED);
            base.width = 0;
            base.height = 0;
        }
    }
}

fn focus_action(forward: bool) -> impl Fn(&mut Screen, Option<WidgetId>, &[ActionParam]) -> bool {
    move |screen, id, _| id.is_some_and(|id| screen.move_focus(id, forward))
}

/// Register the "Box" class: Tab and Shift-Tab cycle focus.
pub fn register_class(classes: &mut ClassRegistry<Screen>) {
    classes.class_init(CLASS, Some(WIDGET_CLASS), |table| {
        table.register_action("focus-next", focus_action(true), Some(KEY_TAB), vec![]);
        table.register_action("focus-prev", focus_action(false), Some(KEY_BACK_TAB), vec![]);
    });
}

// ===========================================================================
// Tests
// ===========================================================================
