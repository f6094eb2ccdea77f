//! Label: fixed, non-interactive text.
//!
//! Lines are split on `'\n'`. The preferred size is the widest line by the
//! number of lines; drawing truncates to the allocated width.

use std::any::Any;

use crate::event::binding::ClassRegistry;
use crate::render::canvas::Canvas;
use crate::render::cell::TextFormat;
use crate::render::width::{onscreen_width, truncate};
use crate::screen::Screen;
use crate::widget::node::{WidgetBase, WidgetFlags, WidgetId};
use crate::widget::traits::{Widget, WidgetCtx};
use crate::widget::WIDGET_CLASS;

pub const CLASS: &str = "Label";

// ---------------------------------------------------------------------------
// Label
// ---------------------------------------------------------------------------

/// A widget that displays text with one format for all of it.
///
/// # Examples
///
/// ```ignore
/// let label = screen.add_widget(Label::new("Hello, world!").with_format(TextFormat::BOLD));
/// ```
#[derive(Debug, Clone)]
pub struct Label {
    text: String,
    format: TextFormat,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::NORMAL,
        }
    }

    /// Set the text format (builder pattern).
    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn format(&self) -> TextFormat {
        self.format
    }

    fn preferred_size(&self) -> (i32, i32) {
        let lines = self.text.split('\n');
        let width = lines.clone().map(onscreen_width).max().unwrap_or(0);
        (width, lines.count() as i32)
    }
}

impl Widget for Label {
    fn class_name(&self) -> &'static str {
        CLASS
    }

    fn init(&mut self, base: &mut WidgetBase) {
        base.flags.insert(WidgetFlags::NO_BORDER | WidgetFlags::NO_SHADOW);
    }

    fn size_request(&mut self, ctx: &mut WidgetCtx) {
        let (width, height) = self.preferred_size();
        ctx.base.width = width;
        ctx.base.height = height;
    }

    fn draw(&mut self, ctx: &mut WidgetCtx, canvas: &mut Canvas) {
        let attr = self.format.to_attr();
        let width = ctx.width();
        for (y, line) in self.text.split('\n').take(ctx.height().max(0) as usize).enumerate() {
            let written = canvas.put_str(0, y as i32, truncate(line, width), attr);
            canvas.hline(written, y as i32, ' ', attr, width - written);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Screen {
    /// Replace a label's text and lay its window out again if the label no
    /// longer fits.
    pub fn label_set_text(&mut self, id: WidgetId, text: impl Into<String>) {
        let text = text.into();
        let Some(fits) = self.modify_leaf::<Label, _>(id, |label| {
            label.text = text;
            label.preferred_size()
        }) else {
            return;
        };
        let (width, height) = self.get_size(id);
        if (fits.0 > width || fits.1 != height) && self.parent(id).is_some() {
            let root = self.toplevel(id);
            if self.widget(root).is_some_and(WidgetBase::is_mapped) {
                self.box_readjust(root);
            }
        }
    }
}

pub fn register_class(classes: &mut ClassRegistry<Screen>) {
    classes.class_init(CLASS, Some(WIDGET_CLASS), |_| {});
}

// ===========================================================================
// Tests
// ===========================================================================
