//! Button: a focusable text that activates on Enter or a click.

use std::any::Any;

use crate::event::binding::ClassRegistry;
use crate::event::input::{MouseEvent, KEY_ENTER};
use crate::event::signal::Signal;
use crate::render::canvas::Canvas;
use crate::render::cell::{Attr, ColorPair};
use crate::render::width::{onscreen_width, truncate};
use crate::screen::Screen;
use crate::widget::node::{WidgetBase, WidgetFlags};
use crate::widget::traits::{Widget, WidgetCtx};
use crate::widget::WIDGET_CLASS;

pub const CLASS: &str = "Button";

// ---------------------------------------------------------------------------
// Button
// ---------------------------------------------------------------------------

/// A push button. The label is highlighted while the button has focus.
///
/// A *small* button has no border and is a single row high.
///
/// # Examples
///
/// ```ignore
/// let ok = screen.add_widget(Button::new("OK"));
/// screen.on(ok, SignalKind::Activate, |screen, _, _| screen.quit());
/// ```
#[derive(Debug, Clone)]
pub struct Button {
    label: String,
    small: bool,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            small: true,
        }
    }

    /// Draw a border around the label (builder pattern).
    pub fn bordered(mut self) -> Self {
        self.small = false;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Widget for Button {
    fn class_name(&self) -> &'static str {
        CLASS
    }

    fn init(&mut self, base: &mut WidgetBase) {
        base.flags.insert(WidgetFlags::CAN_TAKE_FOCUS | WidgetFlags::NO_SHADOW);
        if self.small {
            base.flags.insert(WidgetFlags::NO_BORDER);
        }
        base.min_width = 4;
        base.min_height = if self.small { 1 } else { 3 };
    }

    fn size_request(&mut self, ctx: &mut WidgetCtx) {
        let border = if ctx.has_border() { 2 } else { 0 };
        ctx.base.width = onscreen_width(&self.label) + border;
        ctx.base.height = 1 + border;
    }

    fn draw(&mut self, ctx: &mut WidgetCtx, canvas: &mut Canvas) {
        let pos = ctx.has_border() as i32;
        let pair = if ctx.focused { ColorPair::Highlight } else { ColorPair::Normal };
        canvas.put_str(pos, pos, truncate(&self.label, ctx.width() - 2 * pos), Attr::new(pair));
    }

    fn clicked(&mut self, ctx: &mut WidgetCtx, event: MouseEvent, _x: i32, _y: i32) -> bool {
        if event != MouseEvent::LeftDown {
            return false;
        }
        ctx.emit(Signal::Activate);
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Register the "Button" class: Enter activates.
pub fn register_class(classes: &mut ClassRegistry<Screen>) {
    classes.class_init(CLASS, Some(WIDGET_CLASS), |table| {
        table.register_action(
            "activate",
            |screen, id, _| {
                let Some(id) = id else {
                    return false;
                };
                screen.activate(id);
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

#[cfg(test)]
mod tests {
    use std::cell::Cell as Counter;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::ToolkitConfig;
    use crate::event::signal::SignalKind;

    fn screen() -> Screen {
        Screen::new(40, 10, ToolkitConfig::default())
    }

    #[test]
    fn small_button_is_one_row() {
        let mut s = screen();
        let id = s.add_widget(Button::new("OK"));
        s.size_request(id);
        assert_eq!(s.get_size(id), (2, 1));
        assert!(s.widget(id).unwrap().can_take_focus());
    }

    #[test]
    fn bordered_button_draws_label_inside() {
        let mut s = screen();
        let id = s.add_widget(Button::new("Save").bordered());
        s.draw(id);
        assert_eq!(s.get_size(id), (6, 3));
        assert_eq!(s.canvas_of(id).map(|c| c.row_text(1)), Some("│Save│".to_owned()));
    }

    #[test]
    fn enter_and_click_activate() {
        let mut s = screen();
        let id = s.add_widget(Button::new("Go"));
        let count = Rc::new(Counter::new(0));
        let seen = count.clone();
        s.connect(id, SignalKind::Activate, move |_, _| seen.set(seen.get() + 1));
        assert!(s.key_pressed(id, KEY_ENTER));
        assert!(s.clicked(id, MouseEvent::LeftDown, 0, 0));
        assert!(!s.clicked(id, MouseEvent::ScrollUp, 0, 0));
        assert_eq!(count.get(), 2);
    }
}
