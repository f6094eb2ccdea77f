//! Widget core: identity and flags, arena storage, the leaf trait and the
//! lifecycle operations.

pub mod arena;
pub mod lifecycle;
pub mod node;
pub mod traits;

pub use arena::{WidgetArena, WidgetKind, WidgetNode};
pub use node::{WidgetBase, WidgetFlags, WidgetId};
pub use traits::{default_confirm_size, Widget, WidgetCtx};

/// Root of the class hierarchy; every other class inherits its bindings.
pub const WIDGET_CLASS: &str = "Widget";
