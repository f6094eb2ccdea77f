//! Integration tests for gnt-tui.
//!
//! These tests exercise the public API from outside the crate, driving a
//! headless app through the pilot and reading back the composed screen.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use gnt_tui::event::input::{KEY_BACKSPACE, KEY_DOWN, KEY_ENTER, KEY_ESC, KEY_PGDOWN, KEY_PGUP, KEY_RIGHT, KEY_TAB, KEY_UP};
use gnt_tui::event::signal::SignalKind;
use gnt_tui::render::cell::TextFormat;
use gnt_tui::screen::{ListKind, Mode};
use gnt_tui::testing::snapshot::render_to_string;
use gnt_tui::testing::Pilot;
use gnt_tui::widgets::{Button, Entry, Label, RowKey, TextView, TextViewFlags, Tree};
use gnt_tui::{ToolkitConfig, WidgetFlags, WidgetId};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn titled(pilot: &mut Pilot, title: &str) -> WidgetId {
    let screen = pilot.screen_mut();
    let win = screen.new_window();
    screen.box_set_title(win, title);
    let label = screen.add_widget(Label::new(title));
    screen.box_add(win, label);
    screen.show(win);
    pilot.process();
    win
}

fn tree_window(pilot: &mut Pilot, rows: &[&str]) -> (WidgetId, WidgetId) {
    let screen = pilot.screen_mut();
    let win = screen.new_window();
    screen.box_set_title(win, "tree");
    let tree = screen.add_widget(Tree::new());
    screen.modify_leaf::<Tree, _>(tree, |t| {
        for row in rows {
            t.add_row_last(*row, vec![(*row).to_owned()], None);
        }
        t.set_col_width(0, 10);
    });
    screen.set_size(tree, 12, 4);
    screen.box_add(win, tree);
    screen.show(win);
    pilot.process();
    (win, tree)
}

fn selection(pilot: &Pilot, tree: WidgetId) -> Option<String> {
    pilot
        .screen()
        .leaf::<Tree>(tree)
        .and_then(Tree::selection)
        .map(|k| k.as_str().to_owned())
}

// ---------------------------------------------------------------------------
// Window manager
// ---------------------------------------------------------------------------

#[test]
fn test_later_windows_open_in_the_background() {
    let mut pilot = Pilot::new(60, 20);
    let a = titled(&mut pilot, "a");
    let b = titled(&mut pilot, "b");
    assert_eq!(pilot.front(), Some(a));
    assert!(pilot.screen().widget(b).unwrap().has(WidgetFlags::URGENT));
}

#[test]
fn test_alt_n_rotates_three_windows() {
    let mut pilot = Pilot::new(60, 20);
    let a = titled(&mut pilot, "a");
    let b = titled(&mut pilot, "b");
    let c = titled(&mut pilot, "c");
    assert_eq!(pilot.screen().stacking(), &[a, b, c]);

    pilot.press_alt('n');
    assert_eq!(pilot.front(), Some(b));
    assert_eq!(pilot.screen().stacking(), &[b, a, c]);
    assert!(!pilot.screen().widget(b).unwrap().has(WidgetFlags::URGENT));

    pilot.press_alt('p');
    assert_eq!(pilot.front(), Some(a));
}

#[test]
fn test_taskbar_lists_every_window() {
    let mut pilot = Pilot::new(30, 10);
    titled(&mut pilot, "a");
    titled(&mut pilot, "b");
    titled(&mut pilot, "c");
    insta::assert_snapshot!(pilot.taskbar(), @"a        │b        │c");
}

#[test]
fn test_alt_c_closes_front_window_and_focus_moves_on() {
    let mut pilot = Pilot::new(60, 20);
    let a = titled(&mut pilot, "a");
    let b = titled(&mut pilot, "b");
    assert!(pilot.press_alt('c'));
    assert!(!pilot.screen().contains(a));
    assert_eq!(pilot.front(), Some(b));
    assert_eq!(pilot.screen().windows(), &[b]);
}

#[test]
fn test_window_list_selects_and_raises() {
    let mut pilot = Pilot::new(60, 20);
    let _a = titled(&mut pilot, "alpha");
    let b = titled(&mut pilot, "beta");

    pilot.press_alt('w');
    assert_eq!(pilot.screen().mode(), Mode::WindowList);
    assert_eq!(pilot.screen().list_kind(), Some(ListKind::Windows));
    pilot.press(KEY_DOWN);
    pilot.press(KEY_ENTER);

    assert_eq!(pilot.screen().mode(), Mode::Normal);
    assert_eq!(pilot.screen().list_kind(), None);
    assert_eq!(pilot.front(), Some(b));
}

#[test]
fn test_action_list_runs_registered_action() {
    let mut pilot = Pilot::new(60, 20);
    titled(&mut pilot, "a");
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    pilot.screen_mut().register_action("Say hello", move |_| sink.borrow_mut().push("hello"));

    pilot.press_alt('a');
    assert_eq!(pilot.screen().list_kind(), Some(ListKind::Actions));
    pilot.press(KEY_ENTER);
    assert_eq!(*log.borrow(), vec!["hello"]);
    assert_eq!(pilot.screen().mode(), Mode::Normal);
}

#[test]
fn test_escape_closes_window_list() {
    let mut pilot = Pilot::new(60, 20);
    let a = titled(&mut pilot, "a");
    pilot.press_alt('w');
    pilot.press(KEY_ESC);
    assert_eq!(pilot.screen().list_kind(), None);
    assert_eq!(pilot.front(), Some(a));
}

#[test]
fn test_move_mode_moves_front_window() {
    let mut pilot = Pilot::new(60, 20);
    let a = titled(&mut pilot, "a");
    pilot.press_alt('m');
    assert_eq!(pilot.screen().mode(), Mode::Move);
    pilot.press(KEY_RIGHT);
    pilot.press(KEY_RIGHT);
    pilot.press(KEY_DOWN);
    pilot.press(KEY_ENTER);
    assert_eq!(pilot.screen().mode(), Mode::Normal);
    assert_eq!(pilot.screen().get_position(a), (2, 1));
}

#[test]
fn test_menu_takes_all_input_until_escape() {
    let mut pilot = Pilot::new(60, 20);
    let a = titled(&mut pilot, "a");
    let (_, tree) = tree_window(&mut pilot, &["one", "two"]);
    let screen = pilot.screen_mut();
    let menu_tree = screen.add_widget(Tree::new());
    screen.modify_leaf::<Tree, _>(menu_tree, |t| {
        t.add_row_last("open", vec!["Open".to_owned()], None);
        t.add_row_last("save", vec!["Save".to_owned()], None);
    });
    screen.set_size(menu_tree, 10, 4);
    assert!(screen.show_menu(menu_tree));
    pilot.process();

    pilot.press(KEY_DOWN);
    assert_eq!(selection(&pilot, menu_tree).as_deref(), Some("save"));
    assert_eq!(selection(&pilot, tree).as_deref(), Some("one"));
    pilot.press(KEY_ESC);
    assert_eq!(pilot.screen().menu(), None);
    assert_eq!(pilot.screen().mode(), Mode::Normal);
    assert_eq!(pilot.front(), Some(a));
}

#[test]
fn test_alt_q_quits() {
    let mut pilot = Pilot::new(60, 20);
    titled(&mut pilot, "a");
    assert!(pilot.press_alt('q'));
    assert!(!pilot.is_running());
}

#[test]
fn test_terminal_resize_pulls_windows_back() {
    let mut pilot = Pilot::new(60, 20);
    let a = titled(&mut pilot, "a");
    pilot.screen_mut().move_widget(a, 50, 10);
    pilot.resize(30, 10);
    let (x, y) = pilot.screen().get_position(a);
    let (w, h) = pilot.screen().get_size(a);
    assert!(x + w <= 30);
    assert!(y + h <= 9);
}

// ---------------------------------------------------------------------------
// Box layout
// ---------------------------------------------------------------------------

#[test]
fn test_vertical_box_layout() {
    let mut pilot = Pilot::new(40, 12);
    let screen = pilot.screen_mut();
    let win = screen.new_window();
    let one = screen.add_widget(Label::new("one"));
    let three = screen.add_widget(Label::new("three"));
    screen.box_add(win, one);
    screen.box_add(win, three);
    screen.show(win);
    let text = render_to_string(pilot.screen_mut(), win).unwrap();
    assert_eq!(text, "┌─────┐\n│one  │\n│     │\n│three│\n└─────┘");
}

#[test]
fn test_single_absorber_takes_the_extra_height() {
    let mut pilot = Pilot::new(60, 20);
    let screen = pilot.screen_mut();
    let win = screen.new_window();
    let label = screen.add_widget(Label::new("status"));
    let view = screen.add_widget(TextView::new());
    screen.set_size(view, 20, 4);
    screen.box_add(win, view);
    screen.box_add(win, label);
    screen.show(win);
    pilot.process();

    let screen = pilot.screen_mut();
    let (w, h) = screen.get_size(win);
    assert!(screen.set_size(win, w, h + 3));
    assert_eq!(screen.get_size(view), (20, 7));
    assert_eq!(screen.get_size(label), (6, 1));
}

#[test]
fn test_tab_cycles_focus_inside_window() {
    let mut pilot = Pilot::new(40, 12);
    let screen = pilot.screen_mut();
    let win = screen.new_window();
    let first = screen.add_widget(Tree::new());
    let second = screen.add_widget(Tree::new());
    for tree in [first, second] {
        screen.set_size(tree, 8, 2);
        screen.box_add(win, tree);
    }
    screen.show(win);
    pilot.process();

    assert!(pilot.screen().has_focus(first));
    pilot.press(KEY_TAB);
    assert!(pilot.screen().has_focus(second));
    pilot.press(KEY_TAB);
    assert!(pilot.screen().has_focus(first));
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[test]
fn test_tree_arrow_navigation() {
    let mut pilot = Pilot::new(60, 20);
    let (_, tree) = tree_window(&mut pilot, &["one", "two", "three"]);
    assert_eq!(selection(&pilot, tree).as_deref(), Some("one"));
    pilot.press(KEY_DOWN);
    pilot.press(KEY_DOWN);
    assert_eq!(selection(&pilot, tree).as_deref(), Some("three"));
    pilot.press(KEY_DOWN);
    assert_eq!(selection(&pilot, tree).as_deref(), Some("three"));
    pilot.press(KEY_UP);
    assert_eq!(selection(&pilot, tree).as_deref(), Some("two"));
}

#[test]
fn test_tree_enter_activates() {
    let mut pilot = Pilot::new(60, 20);
    let (_, tree) = tree_window(&mut pilot, &["one", "two"]);
    let picked = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&picked);
    pilot.screen_mut().on(tree, SignalKind::Activate, move |screen, id, _| {
        let key = screen.leaf::<Tree>(id).and_then(Tree::selection).cloned();
        *sink.borrow_mut() = key;
    });
    pilot.press(KEY_DOWN);
    pilot.press(KEY_ENTER);
    assert_eq!(*picked.borrow(), Some(RowKey::new("two")));
}

#[test]
fn test_rc_file_binding_overrides_tree_keys() {
    let config = ToolkitConfig::from_rc_str("[Tree::binding]\nj = move-down\nk = move-up\n").unwrap();
    let mut pilot = Pilot::with_config(60, 20, config);
    let (_, tree) = tree_window(&mut pilot, &["one", "two", "three"]);
    pilot.press("j");
    pilot.press("j");
    assert_eq!(selection(&pilot, tree).as_deref(), Some("three"));
    pilot.press("k");
    assert_eq!(selection(&pilot, tree).as_deref(), Some("two"));
}

#[test]
fn test_remapped_key_reaches_tree_bindings() {
    let config = ToolkitConfig::new().with_remap("Tree", "j", KEY_DOWN);
    let mut pilot = Pilot::with_config(60, 20, config);
    let (_, tree) = tree_window(&mut pilot, &["one", "two", "three"]);
    assert!(pilot.press("j"));
    assert_eq!(selection(&pilot, tree).as_deref(), Some("two"));
    pilot.press("j");
    assert_eq!(selection(&pilot, tree).as_deref(), Some("three"));
}

#[test]
fn test_tree_renders_rows_in_window() {
    let mut pilot = Pilot::new(60, 20);
    let (win, _) = tree_window(&mut pilot, &["one", "two"]);
    let text = render_to_string(pilot.screen_mut(), win).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[2].contains("one"));
    assert!(lines[3].contains("two"));
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

fn entry_text(pilot: &Pilot, entry: WidgetId) -> String {
    pilot.screen().leaf::<Entry>(entry).map(|e| e.text().to_owned()).unwrap_or_default()
}

#[test]
fn test_entry_typing_completion_and_activate() {
    let mut pilot = Pilot::new(60, 20);
    let screen = pilot.screen_mut();
    let win = screen.new_window();
    screen.box_set_title(win, "form");
    let mut field = Entry::new("");
    field.add_suggest("hello");
    field.add_suggest("help");
    let entry = screen.add_widget(field);
    screen.box_add(win, entry);
    screen.show(win);
    let activations = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&activations);
    screen.connect(entry, SignalKind::Activate, move |_, _| *seen.borrow_mut() += 1);
    pilot.process();

    pilot.type_text("hex");
    assert!(pilot.press(KEY_BACKSPACE));
    assert_eq!(entry_text(&pilot, entry), "he");

    assert!(pilot.press(KEY_TAB));
    assert!(pilot.screen().leaf::<Entry>(entry).unwrap().has_dropdown());
    assert!(pilot.press(KEY_DOWN));
    assert!(pilot.press(KEY_ENTER));
    assert_eq!(entry_text(&pilot, entry), "help");
    assert!(!pilot.screen().leaf::<Entry>(entry).unwrap().has_dropdown());
    assert_eq!(*activations.borrow(), 0);

    pilot.press(KEY_ENTER);
    assert_eq!(*activations.borrow(), 1);
    assert!(pilot.screen_text().contains("help_"));
}

// ---------------------------------------------------------------------------
// TextView
// ---------------------------------------------------------------------------

fn view_window(pilot: &mut Pilot, flags: TextViewFlags, width: i32, height: i32) -> WidgetId {
    let screen = pilot.screen_mut();
    let win = screen.new_window();
    let view = screen.add_widget(TextView::new().with_flags(flags));
    screen.set_size(view, width, height);
    screen.box_add(win, view);
    screen.show(win);
    pilot.process();
    view
}

fn view_lines(pilot: &Pilot, view: WidgetId) -> Vec<(String, bool)> {
    let mut lines = pilot.screen().leaf::<TextView>(view).unwrap().lines();
    lines.reverse();
    lines
}

#[test]
fn test_textview_wraps_long_words_with_scroll_column() {
    let mut pilot = Pilot::new(60, 20);
    let view = view_window(&mut pilot, TextViewFlags::NONE, 10, 4);
    pilot.screen_mut().textview_append(view, "abcdefghijk", TextFormat::NORMAL);
    assert_eq!(
        view_lines(&pilot, view),
        vec![("abcdefghi".to_owned(), false), ("jk".to_owned(), true)]
    );
}

#[test]
fn test_textview_without_scroll_column_uses_full_width() {
    let mut pilot = Pilot::new(60, 20);
    let view = view_window(&mut pilot, TextViewFlags::NO_SCROLL, 10, 4);
    pilot.screen_mut().textview_append(view, "abcdefghijk", TextFormat::NORMAL);
    assert_eq!(
        view_lines(&pilot, view),
        vec![("abcdefghij".to_owned(), false), ("k".to_owned(), true)]
    );
}

#[test]
fn test_textview_word_wrap_breaks_at_spaces() {
    let mut pilot = Pilot::new(60, 20);
    let view = view_window(&mut pilot, TextViewFlags::NO_SCROLL, 10, 4);
    pilot.screen_mut().textview_append(view, "hello brave new world", TextFormat::NORMAL);
    let lines: Vec<String> = view_lines(&pilot, view).into_iter().map(|(text, _)| text).collect();
    assert_eq!(lines, vec!["hello ", "brave new ", "world"]);
}

#[test]
fn test_textview_page_keys_in_attached_widget() {
    let mut pilot = Pilot::new(60, 20);
    let screen = pilot.screen_mut();
    let win = screen.new_window();
    let view = screen.add_widget(TextView::new());
    screen.set_size(view, 20, 4);
    let button = screen.add_widget(Button::new("more"));
    screen.box_add(win, view);
    screen.box_add(win, button);
    screen.attach_scroll_widget(view, button);
    screen.show(win);
    for i in 0..10 {
        screen.textview_append(view, &format!("line {i}\n"), TextFormat::NORMAL);
    }
    pilot.process();

    assert_eq!(pilot.screen().leaf::<TextView>(view).unwrap().lines_below(), 0);
    pilot.press(KEY_PGUP);
    assert_eq!(pilot.screen().leaf::<TextView>(view).unwrap().lines_below(), 2);
    pilot.press(KEY_PGDOWN);
    assert_eq!(pilot.screen().leaf::<TextView>(view).unwrap().lines_below(), 0);
}
