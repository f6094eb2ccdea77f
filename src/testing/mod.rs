//! Headless testing framework: Pilot, snapshot helpers.
//!
//! Use the [`Pilot`] to programmatically drive an [`App`](crate::app::App) without
//! a real terminal. Use [`screen_to_string`] and related helpers to capture the
//! composed screen as plain text for snapshot-style assertions.

pub mod pilot;
pub mod snapshot;

pub use pilot::Pilot;
pub use snapshot::{canvas_to_string, render_to_string, screen_to_string};
