//! Input routing: modes, global bindings and the mouse.

use tracing::{debug, trace};

use super::{wm, Drag, Mode, Screen};
use crate::event::input::{
    parse_mouse, refine, InputEvent, MouseEvent, MouseInput, KEY_DOWN, KEY_ENTER, KEY_ESC, KEY_LEFT, KEY_RIGHT, KEY_UP,
};
use crate::widget::node::{WidgetFlags, WidgetId};

impl Screen {
    /// Handle one event from the terminal backend.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::Bytes(bytes) => self.process_input(&bytes),
            InputEvent::Resize { width, height } => {
                self.resize_terminal(width, height);
                true
            }
            InputEvent::Ignored => false,
        }
    }

    /// Handle one chunk of raw input. Returns whether anything consumed it.
    pub fn process_input(&mut self, bytes: &[u8]) -> bool {
        self.event_stack = true;
        let handled = self.dispatch_input(bytes);
        self.event_stack = false;
        handled
    }

    fn dispatch_input(&mut self, bytes: &[u8]) -> bool {
        if self.config.mouse {
            if let Some(mouse) = parse_mouse(bytes) {
                return self.mouse_action(mouse);
            }
        }
        let text = String::from_utf8_lossy(bytes);
        let keys = refine(&text).into_owned();
        trace!(keys = ?keys, mode = ?self.mode, "input");
        match self.mode {
            Mode::Normal => self.normal_key(&keys),
            Mode::Move => self.move_key(&keys),
            Mode::Resize => self.resize_key(&keys),
            Mode::Menu => self.menu_key(&keys),
            Mode::WindowList => self.list_key(&keys),
        }
    }

    fn normal_key(&mut self, keys: &str) -> bool {
        let target = self.menu.or_else(|| self.front());
        if target.is_some_and(|t| self.key_pressed(t, keys)) {
            return true;
        }
        match self.classes.resolve_key(wm::CLASS, keys) {
            Some((callback, params)) => callback(self, None, &params),
            None => false,
        }
    }

    fn leave_mode(&mut self) {
        if let Some(front) = self.front() {
            self.window_reverse(front, false);
        }
        self.set_mode(Mode::Normal);
    }

    fn move_key(&mut self, keys: &str) -> bool {
        if keys == KEY_ENTER || keys == KEY_ESC {
            self.leave_mode();
            return true;
        }
        let Some(front) = self.front() else {
            self.set_mode(Mode::Normal);
            return false;
        };
        let (mut x, mut y) = self.get_position(front);
        let (w, h) = self.get_size(front);
        let changed = match keys {
            KEY_LEFT if x > 0 => {
                x -= 1;
                true
            }
            KEY_RIGHT if x + w < self.cols() => {
                x += 1;
                true
            }
            KEY_UP if y > 0 => {
                y -= 1;
                true
            }
            KEY_DOWN if y + h < self.rows() => {
                y += 1;
                true
            }
            _ => false,
        };
        if changed {
            self.move_widget(front, x, y);
        }
        true
    }

    fn resize_key(&mut self, keys: &str) -> bool {
        if keys == KEY_ENTER || keys == KEY_ESC {
            self.leave_mode();
            return true;
        }
        let Some(front) = self.front() else {
            self.set_mode(Mode::Normal);
            return false;
        };
        let (x, y) = self.get_position(front);
        let (mut width, mut height) = self.get_size(front);
        let changed = match keys {
            KEY_DOWN if y + height < self.rows() => {
                height += 1;
                true
            }
            KEY_UP => {
                height -= 1;
                true
            }
            KEY_LEFT => {
                width -= 1;
                true
            }
            KEY_RIGHT if x + width < self.cols() => {
                width += 1;
                true
            }
            _ => false,
        };
        if changed {
            self.resize_widget(front, width, height);
            self.window_reverse(front, true);
        }
        true
    }

    fn menu_key(&mut self, keys: &str) -> bool {
        let Some(menu) = self.menu else {
            self.set_mode(Mode::Normal);
            return false;
        };
        if keys == KEY_ESC {
            self.close_menu();
            return true;
        }
        self.key_pressed(menu, keys);
        if keys == KEY_ENTER {
            self.close_menu();
        }
        true
    }

    fn list_key(&mut self, keys: &str) -> bool {
        let Some(window) = self.list.as_ref().map(|l| l.window) else {
            self.set_mode(Mode::Normal);
            return false;
        };
        self.key_pressed(window, keys);
        if keys == KEY_ENTER || keys == KEY_ESC {
            self.close_list();
        }
        true
    }

    // ── Mouse ────────────────────────────────────────────────────────

    /// The topmost window covering (x, y).
    pub fn window_at(&self, x: i32, y: i32) -> Option<WidgetId> {
        let panel = self.compositor.panel_at(x, y)?;
        self.nodes
            .iter()
            .find(|(_, p)| **p == Some(panel))
            .map(|(&w, _)| w)
    }

    fn mouse_action(&mut self, input: MouseInput) -> bool {
        if self.ordered.is_empty() {
            return false;
        }
        let MouseInput { event, x, y } = input;
        let widget = self.window_at(x, y);
        let is_list = |s: &Screen, w: WidgetId| s.list.as_ref().is_some_and(|l| l.window == w);

        match event {
            MouseEvent::LeftDown => {
                if let Some(w) = widget.filter(|&w| {
                    !is_list(self, w) && !self.widgets.base(w).is_some_and(|b| b.has(WidgetFlags::TRANSIENT))
                }) {
                    if self.front() != Some(w) {
                        self.bring_on_top(w);
                    }
                    let (wx, wy) = self.get_position(w);
                    if y == wy {
                        self.drag = Drag {
                            widget: Some(w),
                            offset: x - wx,
                        };
                    }
                }
            }
            MouseEvent::Up => {
                let drag = std::mem::take(&mut self.drag);
                match drag.widget {
                    None if y == self.rows() => {
                        let count = self.focus_list.len() as i32;
                        if count > 0 {
                            let width = (self.cols() / count).max(1);
                            self.switch_window_n((x / width) as usize);
                        }
                    }
                    Some(w) => {
                        debug!(window = ?w, x, y, "window dragged");
                        self.move_widget(w, (x - drag.offset).max(0), y.max(0));
                        self.refresh_node(w);
                    }
                    None => {}
                }
            }
            _ => {}
        }

        if let Some(w) = widget {
            self.clicked(w, event, x, y);
        }
        true
    }

    // ── Decorations ──────────────────────────────────────────────────

    /// Toggle reverse video on a window's border.
    pub(crate) fn window_reverse(&mut self, id: WidgetId, set: bool) {
        let Some(base) = self.widgets.base_mut(id) else {
            return;
        };
        if base.has(WidgetFlags::NO_BORDER) {
            return;
        }
        let (w, h) = (base.width, base.height);
        let Some(canvas) = base.canvas.as_mut() else {
            return;
        };
        for x in 0..w {
            canvas.set_reverse(x, 0, set);
            canvas.set_reverse(x, h - 1, set);
        }
        for y in 0..h {
            canvas.set_reverse(0, y, set);
            canvas.set_reverse(w - 1, y, set);
        }
        self.queue_update(id);
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::ToolkitConfig;
    use crate::event::input::{alt, encode_mouse};
    use crate::widgets::label::Label;
    use crate::widgets::textview::TextView;

    fn screen() -> Screen {
        Screen::new(60, 20, ToolkitConfig::default().with_mouse(true))
    }

    fn window(s: &mut Screen, title: &str) -> WidgetId {
        let win = s.new_window();
        s.box_set_title(win, title);
        let label = s.add_widget(Label::new(title));
        s.box_add(win, label);
        s.show(win);
        s.run_idle();
        win
    }

    fn press(s: &mut Screen, keys: &str) -> bool {
        s.process_input(keys.as_bytes())
    }

    #[test]
    fn alt_n_rotates_windows() {
        let mut s = screen();
        let a = window(&mut s, "a");
        let b = window(&mut s, "b");
        let c = window(&mut s, "c");
        assert!(press(&mut s, &alt('n')));
        assert_eq!(s.stacking(), &[b, a, c]);
        assert!(press(&mut s, &alt('p')));
        assert_eq!(s.stacking(), &[a, b, c]);
    }

    #[test]
    fn alt_digit_switches_to_window() {
        let mut s = screen();
        let _a = window(&mut s, "a");
        let b = window(&mut s, "b");
        press(&mut s, &alt('2'));
        assert_eq!(s.front(), Some(b));
    }

    #[test]
    fn move_mode_moves_and_clamps() {
        let mut s = screen();
        let a = window(&mut s, "a");
        press(&mut s, &alt('m'));
        assert_eq!(s.mode(), Mode::Move);
        let canvas = s.canvas_of(a).unwrap();
        assert!(canvas.get(0, 0).unwrap().attr.reverse);

        press(&mut s, KEY_LEFT);
        assert_eq!(s.get_position(a), (0, 0));
        press(&mut s, KEY_RIGHT);
        press(&mut s, KEY_DOWN);
        assert_eq!(s.get_position(a), (1, 1));

        press(&mut s, KEY_ENTER);
        assert_eq!(s.mode(), Mode::Normal);
        assert!(!s.canvas_of(a).unwrap().get(0, 0).unwrap().attr.reverse);
    }

    #[test]
    fn resize_mode_grows_the_front_window() {
        let mut s = screen();
        let a = s.new_window();
        let view = s.add_widget(TextView::new());
        s.set_size(view, 10, 3);
        s.box_add(a, view);
        s.show(a);
        s.run_idle();
        let before = s.get_size(a);
        press(&mut s, &alt('r'));
        assert_eq!(s.mode(), Mode::Resize);
        press(&mut s, KEY_DOWN);
        assert_eq!(s.get_size(a), (before.0, before.1 + 1));
        press(&mut s, KEY_ESC);
        assert_eq!(s.mode(), Mode::Normal);
    }

    #[test]
    fn window_list_closes_on_escape() {
        let mut s = screen();
        let _a = window(&mut s, "a");
        press(&mut s, &alt('w'));
        assert_eq!(s.mode(), Mode::WindowList);
        press(&mut s, KEY_ESC);
        assert_eq!(s.mode(), Mode::Normal);
        assert_eq!(s.list_kind(), None);
    }

    #[test]
    fn window_list_enter_raises_selection() {
        let mut s = screen();
        let _a = window(&mut s, "a");
        let b = window(&mut s, "b");
        press(&mut s, &alt('w'));
        press(&mut s, KEY_DOWN);
        press(&mut s, KEY_ENTER);
        assert_eq!(s.front(), Some(b));
        assert_eq!(s.mode(), Mode::Normal);
    }

    #[test]
    fn alt_c_closes_front_window() {
        let mut s = screen();
        let a = window(&mut s, "a");
        press(&mut s, &alt('c'));
        assert!(!s.contains(a));
        assert!(s.windows().is_empty());
    }

    #[test]
    fn alt_q_stops_the_loop() {
        let mut s = screen();
        press(&mut s, &alt('q'));
        assert!(!s.is_running());
    }

    #[test]
    fn unbound_keys_are_not_consumed() {
        let mut s = screen();
        let _a = window(&mut s, "a");
        assert!(!press(&mut s, "z"));
    }

    #[test]
    fn click_raises_and_taskbar_click_switches() {
        let mut s = screen();
        let a = window(&mut s, "a");
        let b = window(&mut s, "b");
        s.move_widget(b, 30, 5);
        s.run_idle();

        let click = |s: &mut Screen, event, x, y| s.process_input(&encode_mouse(MouseInput { event, x, y }));
        click(&mut s, MouseEvent::LeftDown, 31, 6);
        assert_eq!(s.front(), Some(b));
        click(&mut s, MouseEvent::Up, 31, 6);

        click(&mut s, MouseEvent::Up, 1, 19);
        assert_eq!(s.front(), Some(a));
    }

    #[test]
    fn title_drag_moves_window() {
        let mut s = screen();
        let a = window(&mut s, "a");
        s.move_widget(a, 5, 5);
        s.run_idle();
        let click = |s: &mut Screen, event, x, y| s.process_input(&encode_mouse(MouseInput { event, x, y }));
        click(&mut s, MouseEvent::LeftDown, 6, 5);
        click(&mut s, MouseEvent::Up, 11, 8);
        assert_eq!(s.get_position(a), (10, 8));
    }
}
