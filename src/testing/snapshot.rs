//! Snapshot rendering helpers.
//!
//! Functions for converting canvases, widgets and the composed screen into
//! plain-text strings suitable for snapshot testing and assertions.

use crate::render::canvas::Canvas;
use crate::render::compositor::Compositor;
use crate::screen::Screen;
use crate::widget::node::WidgetId;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Convert a canvas to text.
///
/// Each row becomes one line, right-trimmed of spaces. Lines are joined with
/// `'\n'` and the final line has no trailing newline.
pub fn canvas_to_string(canvas: &Canvas) -> String {
    let lines: Vec<String> = (0..canvas.height())
        .map(|y| canvas.row_text(y).trim_end().to_owned())
        .collect();
    lines.join("\n")
}

/// Convert the last composed compositor frame to text.
///
/// Does not compose; call [`Compositor::compose`] (or use
/// [`screen_to_string`]) first.
pub fn compositor_to_string(compositor: &Compositor) -> String {
    let lines: Vec<String> = (0..compositor.height)
        .map(|y| compositor.row_text(y).trim_end().to_owned())
        .collect();
    lines.join("\n")
}

/// Flush the screen and render every window plus the taskbar to text.
pub fn screen_to_string(screen: &mut Screen) -> String {
    let lines: Vec<String> = screen
        .screen_text()
        .into_iter()
        .map(|row| row.trim_end().to_owned())
        .collect();
    lines.join("\n")
}

/// Render the canvas of one window to text.
///
/// Returns `None` if the widget is gone or has never been drawn.
pub fn render_to_string(screen: &mut Screen, window: WidgetId) -> Option<String> {
    screen.run_idle();
    screen.canvas_of(window).map(canvas_to_string)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::ToolkitConfig;
    use crate::render::cell::Attr;
    use crate::widgets::label::Label;

    // ── canvas_to_string ─────────────────────────────────────────────

    #[test]
    fn canvas_rows_are_trimmed() {
        let mut canvas = Canvas::new(6, 2);
        canvas.put_str(0, 0, "Hi", Attr::default());
        canvas.put_str(1, 1, "yo", Attr::default());
        assert_eq!(canvas_to_string(&canvas), "Hi\n yo");
    }

    #[test]
    fn wide_glyphs_are_not_doubled() {
        let mut canvas = Canvas::new(6, 1);
        canvas.put_str(0, 0, "日本", Attr::default());
        assert_eq!(canvas_to_string(&canvas), "日本");
    }

    #[test]
    fn empty_canvas_is_blank_lines() {
        let canvas = Canvas::new(4, 3);
        assert_eq!(canvas_to_string(&canvas), "\n\n");
    }

    // ── compositor / screen ──────────────────────────────────────────

    #[test]
    fn blank_compositor() {
        let mut compositor = Compositor::new(10, 3);
        compositor.compose();
        assert_eq!(compositor_to_string(&compositor), "\n\n");
    }

    #[test]
    fn window_snapshot() {
        let mut s = Screen::new(20, 6, ToolkitConfig::default());
        let win = s.new_window();
        let label = s.add_widget(Label::new("hello"));
        s.box_add(win, label);
        s.show(win);
        let text = render_to_string(&mut s, win).unwrap();
        assert_eq!(text, "┌─────┐\n│hello│\n└─────┘");
        assert!(screen_to_string(&mut s).starts_with("┌─────┐\n│hello│\n└─────┘"));
    }

    #[test]
    fn unknown_widget_has_no_snapshot() {
        let mut s = Screen::new(20, 6, ToolkitConfig::default());
        let label = s.add_widget(Label::new("x"));
        s.destroy(label);
        assert_eq!(render_to_string(&mut s, label), None);
    }
}
