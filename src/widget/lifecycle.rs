//! Widget operations: drawing, size negotiation, focus, input and teardown.
//!
//! These are methods on [`Screen`] because every one of them may touch more
//! than one widget (a Box forwards to its children, a top-level widget talks
//! to the window manager) and may raise signals whose observers need the
//! screen. Box-specific halves live in
//! [`widgets::container`](crate::widgets::container).

use tracing::{trace, warn};

use super::arena::WidgetKind;
use super::node::{WidgetFlags, WidgetId};
use super::traits::default_confirm_size;
use crate::event::input::MouseEvent;
use crate::event::signal::Signal;
use crate::render::canvas::Canvas;
use crate::render::cell::{Attr, ColorPair};
use crate::screen::Screen;

impl Screen {
    // ── Queries ──────────────────────────────────────────────────────

    pub fn has_shadow(&self, id: WidgetId) -> bool {
        self.config.shadow && self.widgets.base(id).is_some_and(|b| !b.has(WidgetFlags::NO_SHADOW))
    }

    /// Outer size, shadow included.
    pub fn get_size(&self, id: WidgetId) -> (i32, i32) {
        let shadow = self.has_shadow(id) as i32;
        self.widgets
            .base(id)
            .map_or((0, 0), |b| (b.width + shadow, b.height + shadow))
    }

    pub fn get_position(&self, id: WidgetId) -> (i32, i32) {
        self.widgets.base(id).map_or((0, 0), |b| (b.x, b.y))
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.widgets.parent(id)
    }

    /// The top-level widget containing `id`.
    pub fn toplevel(&self, id: WidgetId) -> WidgetId {
        self.widgets.root_of(id)
    }

    pub fn set_flag(&mut self, id: WidgetId, flag: WidgetFlags, on: bool) {
        if let Some(base) = self.widgets.base_mut(id) {
            base.flags.set(flag, on);
        }
    }

    pub fn set_take_focus(&mut self, id: WidgetId, can: bool) {
        self.set_flag(id, WidgetFlags::CAN_TAKE_FOCUS, can);
    }

    pub fn set_name(&mut self, id: WidgetId, name: impl Into<String>) {
        if let Some(base) = self.widgets.base_mut(id) {
            base.name = Some(name.into());
        }
    }

    pub fn name(&self, id: WidgetId) -> Option<&str> {
        self.widgets.base(id).and_then(|b| b.name.as_deref())
    }

    /// Set the minimum inner size accepted by `confirm_size`.
    pub fn set_min_size(&mut self, id: WidgetId, width: i32, height: i32) {
        if let Some(base) = self.widgets.base_mut(id) {
            base.min_width = width;
            base.min_height = height;
        }
    }

    /// Effective focus: the widget's window is frontmost (or is the menu or
    /// the window list) and the widget is the window or its active child.
    pub fn has_focus(&self, id: WidgetId) -> bool {
        if !self.widgets.contains(id) {
            return false;
        }
        let root = self.widgets.root_of(id);
        if Some(root) == self.menu || self.list.as_ref().is_some_and(|l| l.window == root) {
            return true;
        }
        if self.front() != Some(root) {
            return false;
        }
        root == id || self.widgets.box_state(root).is_some_and(|b| b.active == Some(id))
    }

    // ── Drawing ──────────────────────────────────────────────────────

    /// Map the widget if needed, allocate its canvas, paint it and queue a
    /// screen update. Re-entrant calls are ignored.
    pub fn draw(&mut self, id: WidgetId) {
        let Some(base) = self.widgets.base_mut(id) else {
            return;
        };
        if base.has(WidgetFlags::DRAWING) {
            return;
        }
        base.flags.insert(WidgetFlags::DRAWING);
        let mapped = base.is_mapped();
        if !mapped {
            self.map(id);
        }
        if self.widgets.base(id).is_some_and(|b| b.canvas.is_none()) {
            self.allocate_canvas(id);
        }

        self.emit(id, Signal::Draw);
        if self.widgets.is_box(id) {
            self.box_draw(id);
        } else {
            self.draw_leaf(id);
        }
        self.queue_update(id);
        if let Some(base) = self.widgets.base_mut(id) {
            base.flags.remove(WidgetFlags::DRAWING);
        }
    }

    fn map(&mut self, id: WidgetId) {
        let Some(base) = self.widgets.base(id) else {
            return;
        };
        trace!(?id, class = %base.class, "map");
        if base.width == 0 || base.height == 0 {
            self.size_request(id);
            if self.widgets.is_box(id) {
                self.find_focusable(id);
            }
        }
        self.with_leaf_dyn(id, |widget, ctx| widget.map(ctx));
        if let Some(base) = self.widgets.base_mut(id) {
            base.flags.insert(WidgetFlags::MAPPED);
        }
        self.emit(id, Signal::Map);
    }

    /// Clamp the widget to the screen and give it a canvas.
    fn allocate_canvas(&mut self, id: WidgetId) {
        let shadow = self.has_shadow(id) as i32;
        let (max_x, max_y) = (self.cols(), self.rows());
        let Some(base) = self.widgets.base_mut(id) else {
            return;
        };
        let (old_w, old_h) = (base.width + shadow, base.height + shadow);
        let (mut x, mut y) = (base.x.max(0), base.y.max(0));
        if x + old_w >= max_x {
            x = (max_x - old_w).max(0);
        }
        if y + old_h >= max_y {
            y = (max_y - old_h).max(0);
        }
        let (w, h) = (old_w.min(max_x), old_h.min(max_y));
        base.x = x;
        base.y = y;
        if (w, h) != (old_w, old_h) {
            let (inner_w, inner_h) = (base.width, base.height);
            base.width = w - shadow;
            base.height = h - shadow;
            self.size_changed(id, inner_w, inner_h);
        }
        if let Some(base) = self.widgets.base_mut(id) {
            base.canvas = Some(Canvas::new(base.width + shadow, base.height + shadow));
        }
        self.init_canvas(id);
    }

    /// Clear the canvas and paint the border and shadow.
    fn init_canvas(&mut self, id: WidgetId) {
        let shadow = self.has_shadow(id);
        let glyphs = self.glyphs;
        let Some(base) = self.widgets.base_mut(id) else {
            return;
        };
        let (w, h, border) = (base.width, base.height, base.has_border());
        let Some(canvas) = base.canvas.as_mut() else {
            return;
        };
        canvas.set_background(Attr::new(ColorPair::Normal));
        canvas.erase();
        if border {
            canvas.draw_box(0, 0, w, h, &glyphs, Attr::new(ColorPair::Normal));
        }
        if shadow {
            let attr = Attr::new(ColorPair::Shadow);
            canvas.vline(w, 1, ' ', attr, h);
            canvas.hline(1, h, ' ', attr, w);
        }
    }

    /// Schedule a flush of the widget's window.
    pub fn queue_update(&mut self, id: WidgetId) {
        if self.widgets.base(id).is_none_or(|b| b.canvas.is_none()) {
            return;
        }
        let root = self.widgets.root_of(id);
        if !self.pending.contains(&root) {
            self.pending.push(root);
        }
    }

    // ── Size ─────────────────────────────────────────────────────────

    /// Ask the widget to compute its preferred size.
    pub fn size_request(&mut self, id: WidgetId) {
        self.emit(id, Signal::SizeRequest);
        if self.widgets.is_box(id) {
            self.box_size_request(id);
        } else {
            self.with_leaf_dyn(id, |widget, ctx| widget.size_request(ctx));
        }
    }

    /// Whether the widget accepts the inner size `width` x `height`.
    pub fn confirm_size(&mut self, id: WidgetId, width: i32, height: i32) -> bool {
        let Some(node) = self.widgets.get(id) else {
            return false;
        };
        if !default_confirm_size(&node.base, width, height) {
            return false;
        }
        match &node.kind {
            WidgetKind::Box(_) => self.box_confirm_size(id, width, height),
            WidgetKind::Leaf(widget) => widget.confirm_size(&node.base, width, height),
        }
    }

    /// Resize to the outer size `width` x `height` (shadow included).
    /// Non-positive values keep the current extent. Returns whether the
    /// new size was accepted.
    pub fn set_size(&mut self, id: WidgetId, width: i32, height: i32) -> bool {
        let shadow = self.has_shadow(id) as i32;
        let Some(base) = self.widgets.base(id) else {
            warn!(?id, "set_size on a dead widget");
            return false;
        };
        let (mut width, mut height) = (width - shadow, height - shadow);
        if width <= 0 {
            width = base.width;
        }
        if height <= 0 {
            height = base.height;
        }
        let mapped = base.is_mapped();
        if mapped && !self.confirm_size(id, width, height) {
            return false;
        }

        let Some(base) = self.widgets.base_mut(id) else {
            return false;
        };
        let (old_w, old_h) = (base.width, base.height);
        base.width = width;
        base.height = height;
        self.size_changed(id, old_w, old_h);

        let Some(base) = self.widgets.base_mut(id) else {
            return false;
        };
        let (w, h) = (base.width + shadow, base.height + shadow);
        let resized = match base.canvas.as_mut() {
            Some(canvas) => {
                canvas.resize(w, h);
                true
            }
            None => false,
        };
        if !mapped {
            base.flags.insert(WidgetFlags::MAPPED);
        }
        if resized {
            self.init_canvas(id);
        }
        true
    }

    fn size_changed(&mut self, id: WidgetId, old_width: i32, old_height: i32) {
        self.emit(id, Signal::SizeChanged { old_width, old_height });
        if self.widgets.is_box(id) {
            self.box_size_changed(id, old_width, old_height);
        } else {
            self.with_leaf_dyn(id, |widget, ctx| widget.size_changed(ctx, old_width, old_height));
        }
    }

    /// Move the widget. A Box moves its children by the same delta.
    pub fn set_position(&mut self, id: WidgetId, x: i32, y: i32) {
        let Some(base) = self.widgets.base(id) else {
            return;
        };
        let (dx, dy) = (x - base.x, y - base.y);
        self.emit(id, Signal::PositionSet { x, y });
        if dx != 0 || dy != 0 {
            for child in self.widgets.children(id).to_vec() {
                let (cx, cy) = self.get_position(child);
                self.set_position(child, cx + dx, cy + dy);
            }
        }
        if let Some(base) = self.widgets.base_mut(id) {
            base.x = x;
            base.y = y;
        }
    }

    // ── Focus and input ──────────────────────────────────────────────

    /// Set or clear the focus flag. Returns `false` if the widget cannot
    /// take focus or already is in the requested state.
    pub fn set_focus(&mut self, id: WidgetId, set: bool) -> bool {
        let Some(base) = self.widgets.base_mut(id) else {
            return false;
        };
        if !base.can_take_focus() || base.has(WidgetFlags::HAS_FOCUS) == set {
            return false;
        }
        base.flags.set(WidgetFlags::HAS_FOCUS, set);
        let mapped = base.is_mapped();
        self.emit(id, if set { Signal::GainedFocus } else { Signal::LostFocus });

        if let Some(active) = self.widgets.box_state(id).map(|b| b.active) {
            if let Some(active) = active {
                self.set_focus(active, set);
            }
            self.draw(id);
        } else if mapped {
            self.draw(id);
        }
        true
    }

    /// Feed input to a widget. The class remap table rewrites `keys` first;
    /// then its bindings, observers of `key-pressed`, attached scroll views
    /// and finally the widget itself get a chance.
    pub fn key_pressed(&mut self, id: WidgetId, keys: &str) -> bool {
        let Some(base) = self.widgets.base(id) else {
            warn!(?id, "input for a dead widget");
            return false;
        };
        if !base.can_take_focus() {
            return false;
        }
        let class = base.class.clone();
        let keys = self.classes.remap_keys(&class, keys).into_owned();
        // A box runs its own bindings after its active child had a chance.
        let is_box = self.widgets.is_box(id);
        if !is_box && self.perform_action_key(id, &keys) {
            return true;
        }
        if self.emit(id, Signal::KeyPressed(keys.clone())) {
            return true;
        }
        if let Some(&view) = self.scroll_attachments.get(&id) {
            if self.scroll_attached(view, &keys) {
                return true;
            }
        }
        if is_box {
            self.box_key_pressed(id, &keys)
        } else {
            self.with_leaf_dyn(id, |widget, ctx| widget.key_pressed(ctx, &keys))
                .unwrap_or(false)
        }
    }

    /// Deliver a mouse event at absolute coordinates.
    pub fn clicked(&mut self, id: WidgetId, event: MouseEvent, x: i32, y: i32) -> bool {
        if !self.widgets.contains(id) {
            return false;
        }
        if self.emit(id, Signal::Clicked { event, x, y }) {
            return true;
        }
        if self.widgets.is_box(id) {
            self.box_clicked(id, event, x, y)
        } else {
            self.with_leaf_dyn(id, |widget, ctx| widget.clicked(ctx, event, x, y))
                .unwrap_or(false)
        }
    }

    /// Activate the widget (as if Enter was pressed on it).
    pub fn activate(&mut self, id: WidgetId) {
        if !self.widgets.contains(id) {
            return;
        }
        self.emit(id, Signal::Activate);
        self.with_leaf_dyn(id, |widget, ctx| widget.activate(ctx));
    }

    // ── Visibility and teardown ──────────────────────────────────────

    /// Draw the widget and register its window with the window manager.
    pub fn show(&mut self, id: WidgetId) {
        self.set_flag(id, WidgetFlags::INVISIBLE, false);
        self.draw(id);
        self.occupy(id);
    }

    /// Unregister from the window manager and mark invisible.
    pub fn hide(&mut self, id: WidgetId) {
        if !self.widgets.contains(id) {
            return;
        }
        self.emit(id, Signal::Hide);
        if self.menu == Some(id) {
            self.close_menu_state();
        }
        self.release(id);
        if let Some(base) = self.widgets.base_mut(id) {
            base.flags.insert(WidgetFlags::INVISIBLE);
            base.flags.remove(WidgetFlags::MAPPED);
        }
    }

    /// Destroy the widget and everything it contains. Runs once; calls made
    /// while the destruction is in progress are ignored.
    pub fn destroy(&mut self, id: WidgetId) {
        match self.widgets.base(id) {
            Some(base) if !base.has(WidgetFlags::DESTROYING) => {}
            _ => return,
        }
        trace!(?id, "destroy");
        self.hide(id);
        if let Some(base) = self.widgets.base_mut(id) {
            base.canvas = None;
            base.flags.insert(WidgetFlags::DESTROYING);
        }
        self.emit(id, Signal::Destroy);

        if self.widgets.is_box(id) {
            self.box_remove_all(id);
        } else {
            self.with_leaf_dyn(id, |widget, _| widget.destroy());
        }

        if let Some(parent) = self.widgets.parent(id) {
            self.box_unlink(parent, id);
            if self.widgets.base(parent).is_some_and(|b| b.is_mapped()) {
                self.draw(parent);
            }
        }
        self.forget_widget(id);
        self.widgets.remove_subtree(id);
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::ToolkitConfig;
    use crate::event::signal::SignalKind;
    use crate::widgets::label::Label;

    fn screen() -> Screen {
        Screen::new(80, 24, ToolkitConfig::default())
    }

    fn record(screen: &mut Screen, id: WidgetId, kinds: &[SignalKind]) -> Rc<RefCell<Vec<Signal>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        for &kind in kinds {
            let log = log.clone();
            screen.connect(id, kind, move |_, s| log.borrow_mut().push(s.clone()));
        }
        log
    }

    #[test]
    fn first_draw_maps_and_allocates() {
        let mut s = screen();
        let label = s.add_widget(Label::new("hello"));
        let log = record(&mut s, label, &[SignalKind::Map, SignalKind::Draw]);
        s.draw(label);
        let base = s.widget(label).unwrap();
        assert!(base.is_mapped());
        assert_eq!((base.width, base.height), (5, 1));
        assert_eq!(base.canvas().map(|c| c.row_text(0)), Some("hello".to_owned()));
        assert_eq!(*log.borrow(), vec![Signal::Map, Signal::Draw]);
    }

    #[test]
    fn oversized_widget_is_clamped_to_screen() {
        let mut s = screen();
        let label = s.add_widget(Label::new("x"));
        s.set_position(label, 70, 30);
        s.set_size(label, 20, 2);
        s.draw(label);
        let base = s.widget(label).unwrap();
        assert_eq!((base.x, base.y), (60, 21));
    }

    #[test]
    fn set_size_respects_grow_flags_once_mapped() {
        let mut s = screen();
        let label = s.add_widget(Label::new("abc"));
        s.draw(label);
        assert!(!s.set_size(label, 10, 1));
        assert_eq!(s.get_size(label), (3, 1));
        s.set_flag(label, WidgetFlags::GROW_X, true);
        assert!(s.set_size(label, 10, 1));
        assert_eq!(s.get_size(label), (10, 1));
        assert_eq!(s.widget(label).and_then(|b| b.canvas()).map(Canvas::width), Some(10));
    }

    #[test]
    fn set_size_emits_size_changed_with_old_size() {
        let mut s = screen();
        let label = s.add_widget(Label::new("abc"));
        let log = record(&mut s, label, &[SignalKind::SizeChanged]);
        s.set_size(label, 7, 2);
        assert_eq!(*log.borrow(), vec![Signal::SizeChanged { old_width: 0, old_height: 0 }]);
    }

    #[test]
    fn shadow_is_part_of_outer_size() {
        let mut s = Screen::new(80, 24, ToolkitConfig::default().with_shadow(true));
        let label = s.add_widget(Label::new("abc"));
        s.set_flag(label, WidgetFlags::NO_SHADOW, false);
        s.set_size(label, 6, 3);
        let base = s.widget(label).unwrap();
        assert_eq!((base.width, base.height), (5, 2));
        assert_eq!(s.get_size(label), (6, 3));
    }

    #[test]
    fn set_focus_requires_focusable_and_a_change() {
        let mut s = screen();
        let label = s.add_widget(Label::new("abc"));
        assert!(!s.set_focus(label, true));
        s.set_take_focus(label, true);
        let log = record(&mut s, label, &[SignalKind::GainedFocus, SignalKind::LostFocus]);
        assert!(s.set_focus(label, true));
        assert!(!s.set_focus(label, true));
        assert!(s.set_focus(label, false));
        assert_eq!(*log.borrow(), vec![Signal::GainedFocus, Signal::LostFocus]);
    }

    #[test]
    fn key_pressed_ignores_unfocusable_widgets() {
        let mut s = screen();
        let label = s.add_widget(Label::new("abc"));
        let log = record(&mut s, label, &[SignalKind::KeyPressed]);
        assert!(!s.key_pressed(label, "x"));
        assert!(log.borrow().is_empty());
        s.set_take_focus(label, true);
        s.key_pressed(label, "x");
        assert_eq!(*log.borrow(), vec![Signal::KeyPressed("x".into())]);
    }

    #[test]
    fn claimed_key_stops_at_observer() {
        let mut s = screen();
        let label = s.add_widget(Label::new("abc"));
        s.set_take_focus(label, true);
        s.connect_handled(label, SignalKind::KeyPressed, |_, _| true);
        assert!(s.key_pressed(label, "x"));
    }

    #[test]
    fn position_moves_box_children() {
        let mut s = screen();
        let vbox = s.new_vbox(false);
        let label = s.add_widget(Label::new("abc"));
        s.box_add(vbox, label);
        s.set_position(label, 2, 3);
        let log = record(&mut s, vbox, &[SignalKind::PositionSet]);
        s.set_position(vbox, 5, 5);
        assert_eq!(s.get_position(label), (7, 8));
        assert_eq!(*log.borrow(), vec![Signal::PositionSet { x: 5, y: 5 }]);
    }

    #[test]
    fn destroy_runs_once_and_removes_subtree() {
        let mut s = screen();
        let vbox = s.new_vbox(false);
        let label = s.add_widget(Label::new("abc"));
        s.box_add(vbox, label);
        let destroyed = Rc::new(RefCell::new(0));
        for id in [vbox, label] {
            let d = destroyed.clone();
            s.connect(id, SignalKind::Destroy, move |_, _| *d.borrow_mut() += 1);
        }
        let again = vbox;
        s.on(vbox, SignalKind::Destroy, move |screen, _, _| screen.destroy(again));
        s.destroy(vbox);
        s.destroy(vbox);
        assert_eq!(*destroyed.borrow(), 2);
        assert!(!s.contains(vbox));
        assert!(!s.contains(label));
    }

    #[test]
    fn destroying_a_child_unlinks_it() {
        let mut s = screen();
        let vbox = s.new_vbox(false);
        let a = s.add_widget(Label::new("a"));
        let b = s.add_widget(Label::new("b"));
        s.box_add(vbox, a);
        s.box_add(vbox, b);
        s.destroy(a);
        assert_eq!(s.arena().children(vbox), &[b]);
    }

    #[test]
    fn hide_clears_mapped_and_sets_invisible() {
        let mut s = screen();
        let label = s.add_widget(Label::new("abc"));
        s.draw(label);
        s.hide(label);
        let base = s.widget(label).unwrap();
        assert!(!base.is_mapped());
        assert!(!base.is_visible());
    }
}
