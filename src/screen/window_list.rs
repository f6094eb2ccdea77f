//! Meta-windows: the window list, the action list and popup menus.

use std::rc::Rc;

use tracing::debug;

use super::{Mode, Screen, ScreenAction};
use crate::event::signal::SignalKind;
use crate::render::width::onscreen_width;
use crate::widget::node::{WidgetFlags, WidgetId};
use crate::widgets::tree::{RowKey, Tree};

/// What an open list window shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// Every window in the focus stack (Alt-w).
    Windows,
    /// The application's registered actions (Alt-a).
    Actions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListTarget {
    Window(WidgetId),
    Action(usize),
}

/// The open list window and the rows it shows.
#[derive(Debug)]
pub(crate) struct ListWindow {
    pub(crate) window: WidgetId,
    pub(crate) tree: WidgetId,
    pub(crate) kind: ListKind,
    entries: Vec<(RowKey, ListTarget)>,
}

impl ListWindow {
    fn target(&self, key: &RowKey) -> Option<ListTarget> {
        self.entries.iter().find(|(k, _)| k == key).map(|&(_, t)| t)
    }
}

impl Screen {
    /// Which list window is open, if any.
    pub fn list_kind(&self) -> Option<ListKind> {
        self.list.as_ref().map(|l| l.kind)
    }

    /// The tree inside the open list window.
    pub fn list_tree(&self) -> Option<WidgetId> {
        self.list.as_ref().map(|l| l.tree)
    }

    /// Add an entry to the action list.
    pub fn register_action<F>(&mut self, label: impl Into<String>, callback: F)
    where
        F: Fn(&mut Screen) + 'static,
    {
        self.actions.push(ScreenAction {
            label: label.into(),
            callback: Rc::new(callback),
        });
    }

    fn setup_list(&mut self, title: &str) -> (WidgetId, WidgetId) {
        let window = self.new_hbox(false);
        self.set_toplevel(window, true);
        self.set_pad(window, 0);
        self.box_set_title(window, title);
        let tree = self.add_widget(Tree::new());
        self.box_add(window, tree);
        self.on(tree, SignalKind::Activate, |screen, _, _| screen.list_activate());
        (window, tree)
    }

    fn present_list(&mut self, list: ListWindow) {
        let window = list.window;
        debug!(kind = ?list.kind, "list window opened");
        self.list = Some(list);
        self.set_mode(Mode::WindowList);
        self.lock_focus_list = true;
        self.show(window);
        self.lock_focus_list = false;
    }

    /// Open the window list. Does nothing when a list is already open or
    /// there are no windows.
    pub fn show_window_list(&mut self) {
        if self.list.is_some() || self.focus_list.is_empty() {
            return;
        }
        let (window, tree) = self.setup_list("Window List");
        let (cols, rows) = (self.cols(), self.rows());
        let windows = self.focus_list.clone();
        let rows_text: Vec<(RowKey, String)> = windows
            .iter()
            .map(|&w| (RowKey::from_widget(w), self.box_title(w).unwrap_or_default().to_owned()))
            .collect();
        let front = self.front().map(RowKey::from_widget);
        self.modify_leaf::<Tree, _>(tree, |t| {
            for (key, title) in &rows_text {
                t.add_row_last(key.clone(), vec![title.clone()], None);
            }
            if let Some(front) = &front {
                t.set_selected(front);
            }
            t.set_col_width(0, cols / 3);
        });
        self.set_size(tree, cols / 3 + 3, rows / 2);
        self.set_position(window, cols / 3, rows / 4);

        let entries = rows_text
            .into_iter()
            .zip(windows)
            .map(|((key, _), w)| (key, ListTarget::Window(w)))
            .collect();
        self.present_list(ListWindow {
            window,
            tree,
            kind: ListKind::Windows,
            entries,
        });
        let listed = self.focus_list.clone();
        for w in listed {
            self.update_window_in_list(w);
        }
    }

    /// Open the list of application actions, sorted by label, above the
    /// taskbar.
    pub fn show_action_list(&mut self) {
        if self.list.is_some() {
            return;
        }
        let (window, tree) = self.setup_list("Actions");
        self.set_flag(tree, WidgetFlags::NO_BORDER, true);

        let mut order: Vec<usize> = (0..self.actions.len()).collect();
        order.sort_by(|&a, &b| self.actions[a].label.cmp(&self.actions[b].label));
        let labels: Vec<(RowKey, String, usize)> = order
            .into_iter()
            .map(|i| (RowKey::new(format!("action:{i}")), self.actions[i].label.clone(), i))
            .collect();
        let width = labels.iter().map(|(_, l, _)| onscreen_width(l)).max().unwrap_or(0).max(4);
        self.modify_leaf::<Tree, _>(tree, |t| {
            for (key, label, _) in &labels {
                t.add_row_last(key.clone(), vec![label.clone()], None);
            }
            t.set_col_width(0, width);
        });
        self.set_size(tree, width + 1, labels.len().max(1) as i32);
        self.size_request(window);
        let (_, height) = self.get_size(window);
        let rows = self.rows();
        self.set_position(window, 0, rows - height);

        let entries = labels.into_iter().map(|(key, _, i)| (key, ListTarget::Action(i))).collect();
        self.present_list(ListWindow {
            window,
            tree,
            kind: ListKind::Actions,
            entries,
        });
    }

    /// Close the open list window.
    pub fn close_list(&mut self) {
        let Some(list) = self.list.take() else {
            return;
        };
        self.set_mode(Mode::Normal);
        self.lock_focus_list = true;
        self.destroy(list.window);
        self.lock_focus_list = false;
        debug!("list window closed");
    }

    fn list_activate(&mut self) {
        let Some(list) = self.list.as_ref() else {
            return;
        };
        let Some(key) = self.leaf::<Tree>(list.tree).and_then(Tree::selection) else {
            return;
        };
        match list.target(key) {
            Some(ListTarget::Window(window)) => self.bring_on_top(window),
            Some(ListTarget::Action(index)) => {
                if let Some(callback) = self.actions.get(index).map(|a| Rc::clone(&a.callback)) {
                    callback(self);
                }
            }
            None => {}
        }
    }

    pub(crate) fn add_window_to_list(&mut self, window: WidgetId) {
        let Some(list) = self.list.as_mut().filter(|l| l.kind == ListKind::Windows) else {
            return;
        };
        let key = RowKey::from_widget(window);
        list.entries.push((key.clone(), ListTarget::Window(window)));
        let tree = list.tree;
        let title = self.box_title(window).unwrap_or_default().to_owned();
        self.modify_leaf::<Tree, _>(tree, |t| t.add_row_last(key, vec![title], None));
        self.update_window_in_list(window);
    }

    pub(crate) fn remove_window_from_list(&mut self, window: WidgetId) {
        let Some(list) = self.list.as_mut().filter(|l| l.kind == ListKind::Windows) else {
            return;
        };
        let key = RowKey::from_widget(window);
        list.entries.retain(|(k, _)| *k != key);
        let tree = list.tree;
        self.modify_leaf::<Tree, _>(tree, |t| t.remove(&key));
    }

    // ── Menus ────────────────────────────────────────────────────────

    /// Show `widget` as a popup menu. All input goes to it until it is
    /// closed. Returns `false` if another menu is already shown.
    pub fn show_menu(&mut self, widget: WidgetId) -> bool {
        if self.menu.is_some() {
            return false;
        }
        let root = self.widgets.root_of(widget);
        self.set_flag(root, WidgetFlags::TRANSIENT, true);
        self.menu = Some(widget);
        self.set_mode(Mode::Menu);
        self.show(root);
        true
    }

    /// Hide the popup menu.
    pub fn close_menu(&mut self) {
        if let Some(menu) = self.menu {
            let root = self.widgets.root_of(menu);
            self.hide(root);
            self.close_menu_state();
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
