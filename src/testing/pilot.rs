//! Pilot: programmatic interaction with a headless App.
//!
//! The `Pilot` wraps an [`App`](crate::app::App) in headless mode and provides
//! methods to simulate user input (key sequences, mouse clicks, resize),
//! flush the screen, and read back what it shows.

use crate::app::{App, AppConfig};
use crate::config::ToolkitConfig;
use crate::event::input::{alt, encode_mouse, InputEvent, MouseEvent, MouseInput};
use crate::screen::Screen;
use crate::widget::node::WidgetId;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless app driver for testing.
///
/// # Examples
///
/// ```
/// use gnt_tui::testing::Pilot;
///
/// let mut pilot = Pilot::new(80, 24);
/// pilot.press_alt('q');
/// assert!(!pilot.is_running());
/// ```
pub struct Pilot {
    app: App,
}

impl Pilot {
    /// Create a headless app with the given terminal size.
    pub fn new(width: u16, height: u16) -> Self {
        Self::with_config(width, height, ToolkitConfig::default())
    }

    /// Create a headless app with custom toolkit options.
    pub fn with_config(width: u16, height: u16, toolkit: ToolkitConfig) -> Self {
        let config = AppConfig::new().with_toolkit(toolkit);
        Self {
            app: App::new_headless(width, height, config),
        }
    }

    // ── Input simulation ─────────────────────────────────────────────

    /// Send one key sequence (see the `KEY_*` constants). Returns whether
    /// anything consumed it.
    pub fn press(&mut self, keys: &str) -> bool {
        self.app.handle_input(InputEvent::Bytes(keys.as_bytes().to_vec()))
    }

    /// Send Alt + `c`.
    pub fn press_alt(&mut self, c: char) -> bool {
        self.press(&alt(c))
    }

    /// Send each character of `text` as its own key press.
    pub fn type_text(&mut self, text: &str) {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.press(ch.encode_utf8(&mut buf));
        }
    }

    /// Send a mouse report. Mouse decoding must be enabled in the config.
    pub fn mouse(&mut self, event: MouseEvent, x: i32, y: i32) -> bool {
        let bytes = encode_mouse(MouseInput { event, x, y });
        self.app.handle_input(InputEvent::Bytes(bytes))
    }

    /// Simulate a left click (press then release) at (x, y).
    pub fn click(&mut self, x: i32, y: i32) {
        self.mouse(MouseEvent::LeftDown, x, y);
        self.mouse(MouseEvent::Up, x, y);
    }

    /// Simulate a terminal resize to the given dimensions.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.app.handle_input(InputEvent::Resize { width, height });
    }

    // ── Processing ───────────────────────────────────────────────────

    /// Flush every pending window update.
    pub fn process(&mut self) {
        self.app.screen.run_idle();
    }

    /// Simulate one frame: flush and commit to the headless backend.
    ///
    /// Returns the number of cells written.
    pub fn tick(&mut self) -> usize {
        self.app.render().expect("headless backend cannot fail")
    }

    // ── Query ────────────────────────────────────────────────────────

    /// Borrow the underlying app immutably.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Borrow the underlying app mutably.
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    pub fn screen(&self) -> &Screen {
        &self.app.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.app.screen
    }

    /// Whether the app is still running (has not quit).
    pub fn is_running(&self) -> bool {
        !self.app.should_quit()
    }

    /// The window with focus.
    pub fn front(&self) -> Option<WidgetId> {
        self.app.screen.front()
    }

    // ── Render helpers ───────────────────────────────────────────────

    /// The whole composed screen as text, trailing spaces trimmed.
    pub fn screen_text(&mut self) -> String {
        super::snapshot::screen_to_string(&mut self.app.screen)
    }

    /// One composed row, trailing spaces trimmed.
    pub fn row(&mut self, y: usize) -> String {
        self.app
            .screen
            .screen_text()
            .get(y)
            .map(|row| row.trim_end().to_owned())
            .unwrap_or_default()
    }

    /// The taskbar row.
    pub fn taskbar(&mut self) -> String {
        let last = self.app.screen.rows() as usize;
        self.row(last)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::event::input::KEY_ENTER;
    use crate::widgets::button::Button;
    use crate::widgets::label::Label;

    fn titled(pilot: &mut Pilot, title: &str) -> WidgetId {
        let screen = pilot.screen_mut();
        let win = screen.new_window();
        screen.box_set_title(win, title);
        let label = screen.add_widget(Label::new(title));
        screen.box_add(win, label);
        screen.show(win);
        screen.run_idle();
        win
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn new_creates_headless_app() {
        let pilot = Pilot::new(80, 24);
        assert!(!pilot.app().has_driver());
        assert!(pilot.is_running());
        assert_eq!(pilot.front(), None);
    }

    #[test]
    fn with_config_passes_toolkit_options() {
        let pilot = Pilot::with_config(40, 10, ToolkitConfig::new().with_shadow(true));
        assert!(pilot.screen().config().shadow);
    }

    // ── Key input ────────────────────────────────────────────────────

    #[test]
    fn unbound_key_is_not_consumed() {
        let mut pilot = Pilot::new(40, 10);
        titled(&mut pilot, "a");
        assert!(!pilot.press("z"));
    }

    #[test]
    fn enter_activates_focused_button() {
        let mut pilot = Pilot::new(40, 10);
        let screen = pilot.screen_mut();
        let win = screen.new_window();
        let button = screen.add_widget(Button::new("Go"));
        screen.box_add(win, button);
        screen.show(win);
        let clicked = std::rc::Rc::new(std::cell::Cell::new(false));
        let seen = std::rc::Rc::clone(&clicked);
        screen.on(button, crate::event::signal::SignalKind::Activate, move |_, _, _| seen.set(true));
        pilot.process();
        assert!(pilot.press(KEY_ENTER));
        assert!(clicked.get());
    }

    #[test]
    fn type_text_sends_each_char() {
        let mut pilot = Pilot::new(40, 10);
        titled(&mut pilot, "a");
        pilot.type_text("xyz");
        assert!(pilot.is_running());
    }

    #[test]
    fn alt_q_quits() {
        let mut pilot = Pilot::new(40, 10);
        pilot.press_alt('q');
        assert!(!pilot.is_running());
    }

    // ── Mouse / resize ───────────────────────────────────────────────

    #[test]
    fn click_on_taskbar_switches_windows() {
        let mut pilot = Pilot::with_config(40, 10, ToolkitConfig::new().with_mouse(true));
        let a = titled(&mut pilot, "a");
        let b = titled(&mut pilot, "b");
        assert_eq!(pilot.front(), Some(a));
        pilot.click(25, 9);
        assert_eq!(pilot.front(), Some(b));
    }

    #[test]
    fn resize_pulls_windows_inside() {
        let mut pilot = Pilot::new(40, 10);
        let a = titled(&mut pilot, "a");
        pilot.screen_mut().move_widget(a, 35, 5);
        pilot.resize(20, 6);
        let (x, y) = pilot.screen().get_position(a);
        let (w, h) = pilot.screen().get_size(a);
        assert!(x + w <= 20);
        assert!(y + h <= 5);
    }

    // ── Rendering ────────────────────────────────────────────────────

    #[test]
    fn screen_text_and_taskbar() {
        let mut pilot = Pilot::new(20, 5);
        titled(&mut pilot, "ab");
        assert_eq!(pilot.row(1), "│ab│");
        assert!(pilot.taskbar().starts_with("ab"));
        assert_eq!(pilot.screen_text().lines().count(), 5);
    }

    #[test]
    fn tick_commits_a_frame() {
        let mut pilot = Pilot::new(20, 5);
        titled(&mut pilot, "ab");
        assert!(pilot.tick() > 0);
        assert_eq!(pilot.app().headless().unwrap().commits, 1);
        // Nothing changed, so the next frame writes no cells.
        assert_eq!(pilot.tick(), 0);
    }
}
