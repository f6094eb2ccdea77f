//! Input sequences, widget signals, and per-class action bindings.

pub mod binding;
pub mod input;
pub mod signal;

pub use binding::{ActionFn, ActionParam, Binding, ClassRegistry, ClassTable};
pub use input::{InputEvent, MouseEvent, MouseInput};
pub use signal::{HandlerId, Signal, SignalBus, SignalKind};
