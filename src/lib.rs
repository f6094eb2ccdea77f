//! # gnt-tui
//!
//! A character-cell terminal UI toolkit with a built-in window manager.
//!
//! Widgets live in a slotmap arena and draw into their own canvases. Top-level
//! windows are stacked by a compositor, listed in a taskbar, and driven by
//! per-class key bindings that applications can override from an rc file.
//!
//! ## Core Systems
//!
//! - **[`widget`]**: Widget arena, base state, the `Widget` trait and the lifecycle operations
//! - **[`widgets`]**: Built-in widgets: Box, Tree, TextView, Entry, Label, Button
//! - **[`event`]**: Input sequences, widget signals, per-class action bindings
//! - **[`screen`]**: Window manager: focus stack, taskbar, window/action lists, menus, input modes
//! - **[`render`]**: Cells, canvases, the stacking compositor and terminal backends
//! - **[`config`]**: Toolkit options and the rc-file format
//! - **[`app`]**: Application struct and event loop
//! - **[`testing`]**: Headless pilot and text snapshots
//! - **[`geometry`]**: Size and Region primitives

// Foundation
pub mod config;
pub mod geometry;

// Widget system
pub mod widget;
pub mod widgets;

// Events
pub mod event;

// Rendering
pub mod render;

// Application
pub mod app;
pub mod screen;

// Testing support
pub mod testing;

pub use app::{App, AppConfig};
pub use config::{ConfigError, ToolkitConfig};
pub use screen::{Mode, Screen};
pub use widget::node::{WidgetFlags, WidgetId};
