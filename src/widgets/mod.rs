//! Built-in widgets: Box, Label, Button, Entry, Tree and TextView.

pub mod button;
pub mod container;
pub mod entry;
pub mod label;
pub mod textview;
pub mod tree;

pub use button::Button;
pub use container::{Alignment, BoxState};
pub use entry::{Entry, EntryFlags};
pub use label::Label;
pub use textview::{TextView, TextViewFlags};
pub use tree::{RowKey, Tree};
