//! The `Widget` trait: overridable behavior of leaf widgets.
//!
//! Containers are handled by the screen directly (see
//! [`BoxState`](crate::widgets::container::BoxState)); everything else
//! implements [`Widget`] and is stored as a trait object in the arena. The
//! screen drives every call and passes a [`WidgetCtx`] giving access to the
//! widget's base state and a place to raise signals.

use std::any::Any;

use super::node::{WidgetBase, WidgetFlags, WidgetId};
use crate::event::input::MouseEvent;
use crate::event::signal::Signal;
use crate::render::canvas::{Canvas, Glyphs};

// ---------------------------------------------------------------------------
// WidgetCtx
// ---------------------------------------------------------------------------

/// Per-call context handed to a leaf widget.
///
/// Signals raised through [`emit`](Self::emit) are delivered by the screen
/// once the call returns, in order. [`queue_draw`](Self::queue_draw) asks
/// for the widget to be redrawn afterwards.
pub struct WidgetCtx<'a> {
    pub id: WidgetId,
    pub base: &'a mut WidgetBase,
    /// Whether the widget effectively has focus (its window is frontmost and
    /// it is the window's active child).
    pub focused: bool,
    pub glyphs: Glyphs,
    pub(crate) events: Vec<Signal>,
    pub(crate) redraw: bool,
}

impl<'a> WidgetCtx<'a> {
    pub fn new(id: WidgetId, base: &'a mut WidgetBase, focused: bool, glyphs: Glyphs) -> Self {
        Self {
            id,
            base,
            focused,
            glyphs,
            events: Vec::new(),
            redraw: false,
        }
    }

    /// Raise a signal on this widget.
    pub fn emit(&mut self, signal: Signal) {
        self.events.push(signal);
    }

    /// Request a redraw once the current call returns.
    pub fn queue_draw(&mut self) {
        self.redraw = true;
    }

    pub fn width(&self) -> i32 {
        self.base.width
    }

    pub fn height(&self) -> i32 {
        self.base.height
    }

    pub fn has_border(&self) -> bool {
        self.base.has_border()
    }

    pub fn is_mapped(&self) -> bool {
        self.base.is_mapped()
    }

    /// Signals raised so far.
    pub fn events(&self) -> &[Signal] {
        &self.events
    }
}

// ---------------------------------------------------------------------------
// Widget trait
// ---------------------------------------------------------------------------

/// Behavior of a leaf widget.
///
/// Only [`class_name`](Self::class_name), [`draw`](Self::draw) and the
/// `as_any` pair are required. Size negotiation defaults to "keep whatever
/// size you were given"; [`confirm_size`](Self::confirm_size) defaults to
/// [`default_confirm_size`].
pub trait Widget {
    /// Class name for action/binding lookup (e.g. "Tree").
    fn class_name(&self) -> &'static str;

    /// Set initial flags and minimum size. Called once on insertion.
    fn init(&mut self, _base: &mut WidgetBase) {}

    /// Called when the widget is first mapped, after the size request.
    fn map(&mut self, _ctx: &mut WidgetCtx) {}

    /// Compute the preferred size into `ctx.base.width` / `height`.
    fn size_request(&mut self, _ctx: &mut WidgetCtx) {}

    /// Whether the widget accepts the proposed inner size.
    fn confirm_size(&self, base: &WidgetBase, width: i32, height: i32) -> bool {
        default_confirm_size(base, width, height)
    }

    /// The size has changed from (`old_width`, `old_height`).
    fn size_changed(&mut self, _ctx: &mut WidgetCtx, _old_width: i32, _old_height: i32) {}

    /// Paint the widget's content. The canvas already carries the border.
    fn draw(&mut self, ctx: &mut WidgetCtx, canvas: &mut Canvas);

    /// Handle input that no binding claimed. Returns whether it was consumed.
    fn key_pressed(&mut self, _ctx: &mut WidgetCtx, _keys: &str) -> bool {
        false
    }

    /// Handle a mouse event at absolute screen coordinates.
    fn clicked(&mut self, _ctx: &mut WidgetCtx, _event: MouseEvent, _x: i32, _y: i32) -> bool {
        false
    }

    /// The widget was activated (Enter, a click, or programmatically).
    fn activate(&mut self, _ctx: &mut WidgetCtx) {}

    /// Release resources held by the widget.
    fn destroy(&mut self) {}

    /// Signals the widget queued on its own, outside a [`WidgetCtx`] call
    /// (e.g. a selection change caused by removing a row). The screen drains
    /// and delivers them after every call into the widget.
    fn take_signals(&mut self) -> Vec<Signal> {
        Vec::new()
    }

    /// Downcast to `&dyn Any` for runtime type inspection.
    fn as_any(&self) -> &dyn Any;

    /// Downcast to `&mut dyn Any` for mutable runtime type inspection.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Accept a size only if it respects the minimum size and only changes the
/// axes the widget is allowed to grow along.
pub fn default_confirm_size(base: &WidgetBase, width: i32, height: i32) -> bool {
    if width < base.min_width || height < base.min_height {
        return false;
    }
    if base.width != width && !base.has(WidgetFlags::GROW_X) {
        return false;
    }
    if base.height != height && !base.has(WidgetFlags::GROW_Y) {
        return false;
    }
    true
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(width: i32, height: i32, flags: WidgetFlags) -> WidgetBase {
        let mut base = WidgetBase::new("Widget");
        base.width = width;
        base.height = height;
        base.flags = flags;
        base
    }

    #[test]
    fn unchanged_size_is_always_accepted() {
        let base = sized(10, 5, WidgetFlags::NONE);
        assert!(default_confirm_size(&base, 10, 5));
    }

    #[test]
    fn growth_needs_the_matching_flag() {
        let base = sized(10, 5, WidgetFlags::GROW_Y);
        assert!(!default_confirm_size(&base, 12, 5));
        assert!(default_confirm_size(&base, 10, 9));
    }

    #[test]
    fn minimum_size_is_enforced() {
        let mut base = sized(10, 5, WidgetFlags::GROW_X | WidgetFlags::GROW_Y);
        base.min_width = 4;
        base.min_height = 2;
        assert!(!default_confirm_size(&base, 3, 5));
        assert!(!default_confirm_size(&base, 10, 1));
        assert!(default_confirm_size(&base, 4, 2));
    }
}
