//! Window registration, stacking, focus rotation and the taskbar.

use std::io;
use std::path::Path;

use tracing::{debug, trace, warn};

use super::{Mode, Screen};
use crate::event::binding::{ActionParam, ClassRegistry};
use crate::event::input::alt;
use crate::event::signal::Signal;
use crate::render::cell::{Attr, ColorPair, TextFormat};
use crate::render::compositor::PanelId;
use crate::widget::node::{WidgetFlags, WidgetId};
use crate::widgets::tree::Tree;

/// Class holding the window manager's global bindings.
pub const CLASS: &str = "WindowManager";

impl Screen {
    // ── Registration ─────────────────────────────────────────────────

    /// Register `id`'s top-level widget as a window. Its stacking panel is
    /// created on the next flush.
    pub(crate) fn occupy(&mut self, id: WidgetId) {
        let root = self.widgets.root_of(id);
        if self.nodes.contains_key(&root) {
            return;
        }
        self.nodes.insert(root, None);
        self.refresh_node(root);

        let Some(base) = self.widgets.base(root) else {
            return;
        };
        let focusable = base.can_take_focus();
        let transient = base.has(WidgetFlags::TRANSIENT);
        let is_list = self.list.as_ref().is_some_and(|l| l.window == root);
        if focusable && !transient {
            self.take_focus(root);
        }
        if focusable && !is_list && self.box_title(root).is_some() {
            self.add_window_to_list(root);
        }
        debug!(window = ?root, "window registered");
        self.draw_taskbar();
        self.queue_update(root);
    }

    /// Unregister a window and drop its panel.
    pub(crate) fn release(&mut self, id: WidgetId) {
        self.remove_widget(id);
        let Some(panel) = self.nodes.remove(&id) else {
            return;
        };
        if let Some(panel) = panel {
            self.compositor.destroy_panel(panel);
        }
        self.remove_window_from_list(id);
        debug!(window = ?id, "window released");
    }

    /// Add a window to the focus stack. Windows registered while input is
    /// being processed (or the first window) come to the front; others join
    /// at the back and are marked urgent when they first appear.
    pub fn take_focus(&mut self, id: WidgetId) {
        if self.lock_focus_list || self.focus_list.contains(&id) {
            return;
        }
        let old = self.front();
        self.focus_list.push(id);
        if self.event_stack || self.ordered.is_empty() {
            self.ordered.insert(0, id);
            self.give_focus.insert(id);
            self.set_focus(id, true);
            if let Some(old) = old {
                self.give_focus.remove(&old);
                self.set_focus(old, false);
            }
        } else {
            self.ordered.push(id);
        }
        debug!(window = ?id, front = ?self.front(), "focus stack changed");
        self.draw_taskbar();
    }

    /// Drop a window from the focus stack. The next window in stacking
    /// order is brought to the front.
    pub fn remove_widget(&mut self, id: WidgetId) {
        if self.lock_focus_list {
            return;
        }
        let Some(pos) = self.focus_list.iter().position(|&w| w == id) else {
            return;
        };
        self.focus_list.remove(pos);
        self.ordered.retain(|&w| w != id);
        self.give_focus.remove(&id);
        if let Some(front) = self.front() {
            self.bring_on_top(front);
        }
        self.draw_taskbar();
    }

    /// Drop every reference the screen holds to a widget being destroyed.
    pub(crate) fn forget_widget(&mut self, id: WidgetId) {
        self.forget_observers(id);
        self.pending.retain(|&w| w != id);
        self.scroll_attachments.retain(|&source, &mut view| source != id && view != id);
        self.give_focus.remove(&id);
        self.focus_list.retain(|&w| w != id);
        self.ordered.retain(|&w| w != id);
        if let Some(Some(panel)) = self.nodes.remove(&id) {
            self.compositor.destroy_panel(panel);
        }
        if self.drag.widget == Some(id) {
            self.drag = Default::default();
        }
        if self.menu == Some(id) {
            self.close_menu_state();
        }
        if self.list.as_ref().is_some_and(|l| l.window == id || l.tree == id) {
            self.list = None;
            self.set_mode(Mode::Normal);
        }
    }

    pub(crate) fn close_menu_state(&mut self) {
        self.menu = None;
        if self.mode == Mode::Menu {
            self.set_mode(Mode::Normal);
        }
    }

    pub(crate) fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!(from = ?self.mode, to = ?mode, "mode changed");
            self.mode = mode;
        }
    }

    // ── Flushing ─────────────────────────────────────────────────────

    /// Copy a window's canvas into its panel, creating the panel on first
    /// use.
    pub(crate) fn update(&mut self, id: WidgetId) {
        let root = self.widgets.root_of(id);
        if self.widgets.is_box(root) {
            self.sync_children(root);
        }
        let Some(&slot) = self.nodes.get(&root) else {
            return;
        };
        let Some(base) = self.widgets.base(root) else {
            return;
        };
        let Some(canvas) = base.canvas() else {
            return;
        };
        let (x, y) = (base.x, base.y);
        let (width, height) = (canvas.width(), canvas.height());
        trace!(window = ?root, "flush");

        match slot {
            Some(panel) => {
                self.compositor.update_panel(panel, canvas);
                self.compositor.move_panel(panel, x, y);
            }
            None => {
                let transient = base.has(WidgetFlags::TRANSIENT);
                let panel = self.compositor.create_panel(x, y, canvas.clone());
                self.nodes.insert(root, Some(panel));
                let is_list = self.list.as_ref().is_some_and(|l| l.window == root);
                if !transient && !is_list {
                    if self.give_focus.remove(&root) {
                        self.bring_on_top(root);
                    } else {
                        self.compositor.lower(panel);
                        self.set_urgent(root);
                    }
                }
            }
        }
        self.raise_overlays();
        self.emit(root, Signal::Expose { x, y, width, height });
    }

    fn panel_of(&self, id: WidgetId) -> Option<PanelId> {
        self.nodes.get(&id).copied().flatten()
    }

    /// Keep the window list and the menu above every window.
    fn raise_overlays(&mut self) {
        let overlays = [self.list.as_ref().map(|l| l.window), self.menu.map(|m| self.widgets.root_of(m))];
        let panels: Vec<PanelId> = overlays.into_iter().flatten().filter_map(|w| self.panel_of(w)).collect();
        for panel in panels {
            self.compositor.raise(panel);
        }
    }

    // ── Stacking and focus ───────────────────────────────────────────

    /// Make `id` the front window: focus it, redraw it and raise its panel.
    pub fn bring_on_top(&mut self, id: WidgetId) {
        if !self.nodes.contains_key(&id) {
            return;
        }
        if let Some(old) = self.front().filter(|&w| w != id) {
            if let Some(pos) = self.ordered.iter().position(|&w| w == id) {
                self.ordered.remove(pos);
                self.ordered.insert(0, id);
                self.set_focus(old, false);
            }
        }
        self.set_focus(id, true);
        self.draw(id);
        if let Some(panel) = self.panel_of(id) {
            self.compositor.raise(panel);
        }
        self.raise_overlays();
        debug!(window = ?id, "window raised");
        self.draw_taskbar();
    }

    /// Rotate the front window through the taskbar order.
    pub fn switch_window(&mut self, direction: i32) {
        if self.ordered.len() < 2 {
            return;
        }
        let Some(current) = self.front() else {
            return;
        };
        let count = self.focus_list.len() as i32;
        let pos = self.focus_list.iter().position(|&w| w == current).map_or(0, |p| p as i32) + direction;
        let target = if pos < 0 {
            self.focus_list.last()
        } else if pos >= count {
            self.focus_list.first()
        } else {
            self.focus_list.get(pos as usize)
        };
        if let Some(&target) = target {
            self.bring_on_top(target);
        }
    }

    /// Bring the `n`th window of the taskbar (zero-based) to the front.
    pub fn switch_window_n(&mut self, n: usize) {
        if let Some(&target) = self.focus_list.get(n) {
            self.bring_on_top(target);
        }
    }

    /// Move a window one slot earlier (`dir < 0`) or later in the taskbar,
    /// wrapping at both ends.
    pub fn shift_window(&mut self, id: WidgetId, dir: i32) {
        let Some(pos) = self.focus_list.iter().position(|&w| w == id) else {
            return;
        };
        let len = self.focus_list.len() as i32;
        let mut target = pos as i32 + dir + i32::from(dir > 0);
        if target < 0 {
            target = len;
        } else if target > len {
            target = 0;
        }
        let target = target as usize;
        self.focus_list.insert(target, id);
        self.focus_list.remove(if target <= pos { pos + 1 } else { pos });
        self.draw_taskbar();
    }

    /// Mark a window that is not in front as wanting attention.
    pub fn set_urgent(&mut self, id: WidgetId) {
        let root = self.widgets.root_of(id);
        if self.front() == Some(root) {
            return;
        }
        self.set_flag(root, WidgetFlags::URGENT, true);
        self.draw_taskbar();
    }

    /// Paint the taskbar: one equal slot per window in taskbar order.
    pub fn draw_taskbar(&mut self) {
        let cols = self.cols();
        let front = self.front();
        let titles: Vec<(WidgetId, String)> = self
            .focus_list
            .iter()
            .map(|&w| (w, self.box_title(w).unwrap_or("<gnt>").to_owned()))
            .collect();

        let normal = Attr::new(ColorPair::Normal);
        let taskbar = self.compositor.taskbar_mut();
        taskbar.set_background(normal);
        taskbar.erase();
        let width = if titles.is_empty() { 0 } else { cols / titles.len() as i32 };

        let mut listed = Vec::new();
        for (i, (window, title)) in titles.iter().enumerate() {
            let x = width * i as i32;
            let is_urgent = self.widgets.base(*window).is_some_and(|b| b.has(WidgetFlags::URGENT));
            let pair = if Some(*window) == front {
                ColorPair::Title
            } else if is_urgent {
                ColorPair::Urgent
            } else {
                ColorPair::Normal
            };
            let taskbar = self.compositor.taskbar_mut();
            taskbar.hline(x, 0, ' ', Attr::new(pair), width);
            taskbar.put_str(x, 0, title, Attr::new(pair));
            if i > 0 {
                taskbar.put_char(x - 1, 0, self.glyphs.vline, normal.reverse());
            }
            listed.push(*window);
        }

        if let Some(front) = front {
            self.set_flag(front, WidgetFlags::URGENT, false);
        }
        for window in listed {
            self.update_window_in_list(window);
        }
    }

    // ── Geometry ─────────────────────────────────────────────────────

    /// Move a window and its panel.
    pub fn move_widget(&mut self, id: WidgetId, x: i32, y: i32) {
        self.set_position(id, x, y);
        if let Some(panel) = self.panel_of(id) {
            self.compositor.move_panel(panel, x, y);
        }
        self.queue_update(id);
    }

    /// Resize a registered window, redraw it and refresh its panel.
    pub fn resize_widget(&mut self, id: WidgetId, width: i32, height: i32) {
        if self.widgets.parent(id).is_some() || !self.nodes.contains_key(&id) {
            return;
        }
        self.set_size(id, width, height);
        self.draw(id);
        trace!(window = ?id, width, height, "window resized");
    }

    /// Keep a window inside the screen, shrinking it if it cannot fit.
    pub(crate) fn refresh_node(&mut self, id: WidgetId) {
        let (mut x, mut y) = self.get_position(id);
        let (w, h) = self.get_size(id);
        let (max_x, max_y) = (self.cols(), self.rows());
        if x + w >= max_x {
            x = (max_x - w).max(0);
        }
        if y + h >= max_y {
            y = (max_y - h).max(0);
        }
        self.move_widget(id, x, y);
        let (nw, nh) = (w.min(max_x), h.min(max_y));
        if (nw, nh) != (w, h) {
            self.resize_widget(id, nw, nh);
        }
    }

    /// Change the title of a window everywhere it is shown.
    pub fn rename_window(&mut self, id: WidgetId, title: impl Into<String>) {
        self.box_set_title(id, title);
        self.draw(id);
        self.draw_taskbar();
    }

    /// Repaint everything and pull windows back inside the screen.
    pub fn refresh(&mut self) {
        let windows: Vec<WidgetId> = self.nodes.keys().copied().collect();
        for window in windows {
            self.refresh_node(window);
        }
        self.compositor.invalidate();
        self.draw_taskbar();
    }

    /// Write the composed screen, taskbar included, to `path` as plain text.
    pub fn dump_screen(&mut self, path: &Path) -> io::Result<()> {
        let mut text = self.screen_text().join("\n");
        text.push('\n');
        std::fs::write(path, text)?;
        debug!(path = %path.display(), "screen dumped");
        Ok(())
    }

    /// React to a terminal size change.
    pub fn resize_terminal(&mut self, cols: u16, rows: u16) {
        debug!(cols, rows, "terminal resized");
        self.compositor.resize(cols, rows);
        self.refresh();
    }

    // ── Window list rows ─────────────────────────────────────────────

    /// Refresh a window's row in the open window list: dim for the front
    /// window, bold for urgent ones.
    pub(crate) fn update_window_in_list(&mut self, id: WidgetId) {
        let Some(tree) = self.list.as_ref().filter(|l| l.kind == super::ListKind::Windows).map(|l| l.tree) else {
            return;
        };
        let Some(base) = self.widgets.base(id) else {
            return;
        };
        let format = if self.front() == Some(id) {
            TextFormat::DIM
        } else if base.has(WidgetFlags::URGENT) {
            TextFormat::BOLD
        } else {
            TextFormat::NORMAL
        };
        let title = self.box_title(id).map(str::to_owned);
        let key = crate::widgets::tree::RowKey::from_widget(id);
        self.modify_leaf::<Tree, _>(tree, |tree| {
            if let Some(title) = title {
                tree.change_text(&key, 0, title);
            }
            tree.set_row_flags(&key, format);
        });
    }
}

// ---------------------------------------------------------------------------
// Global bindings
// ---------------------------------------------------------------------------

fn front_action(screen: &mut Screen, f: impl FnOnce(&mut Screen, WidgetId)) -> bool {
    match screen.front() {
        Some(front) => {
            f(screen, front);
            true
        }
        None => false,
    }
}

fn reverse_front(screen: &mut Screen, mode: Mode) -> bool {
    front_action(screen, |s, front| {
        s.set_mode(mode);
        s.window_reverse(front, true);
    })
}

/// Register the window manager's own bindings (Alt-prefixed keys).
pub fn register_class(classes: &mut ClassRegistry<Screen>) {
    classes.class_init(CLASS, None, |table| {
        table.register_action(
            "window-close",
            |s, _, _| front_action(s, |s, front| s.destroy(front)),
            Some(&alt('c')),
            vec![],
        );
        table.register_action(
            "quit",
            |s, _, _| {
                s.quit();
                true
            },
            Some(&alt('q')),
            vec![],
        );
        table.register_action(
            "window-next",
            |s, _, _| {
                s.switch_window(1);
                true
            },
            Some(&alt('n')),
            vec![],
        );
        table.register_action(
            "window-prev",
            |s, _, _| {
                s.switch_window(-1);
                true
            },
            Some(&alt('p')),
            vec![],
        );
        table.register_action("window-move", |s, _, _| reverse_front(s, Mode::Move), Some(&alt('m')), vec![]);
        table.register_action("window-resize", |s, _, _| reverse_front(s, Mode::Resize), Some(&alt('r')), vec![]);
        table.register_action(
            "window-list",
            |s, _, _| {
                s.show_window_list();
                true
            },
            Some(&alt('w')),
            vec![],
        );
        table.register_action(
            "action-list",
            |s, _, _| {
                s.show_action_list();
                true
            },
            Some(&alt('a')),
            vec![],
        );
        table.register_action(
            "shift-left",
            |s, _, _| front_action(s, |s, front| s.shift_window(front, -1)),
            Some(&alt(',')),
            vec![],
        );
        table.register_action(
            "shift-right",
            |s, _, _| front_action(s, |s, front| s.shift_window(front, 1)),
            Some(&alt('.')),
            vec![],
        );
        table.register_action(
            "refresh-screen",
            |s, _, _| {
                s.refresh();
                true
            },
            Some(&alt('l')),
            vec![],
        );
        table.register_action(
            "dump-screen",
            |s, _, _| {
                let path = s.config().dump_path().to_path_buf();
                if let Err(err) = s.dump_screen(&path) {
                    warn!(path = %path.display(), %err, "failed to dump the screen");
                }
                true
            },
            Some(&alt('d')),
            vec![],
        );
        table.register_action(
            "switch-window-n",
            |s, _, params| {
                let n = params.first().and_then(ActionParam::as_int).unwrap_or(0);
                s.switch_window_n(n.max(0) as usize);
                true
            },
            None,
            vec![],
        );
        for digit in 1..=9u8 {
            let key = alt((b'0' + digit) as char);
            table.register_binding("switch-window-n", &key, vec![ActionParam::Int(i64::from(digit) - 1)]);
        }
        table.register_binding("switch-window-n", &alt('0'), vec![ActionParam::Int(9)]);
    });
}

// ===========================================================================
// Tests
// ===========================================================================
