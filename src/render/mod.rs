//! Rendering pipeline: cells, widget canvases, stacking compositor, terminal backends.

pub mod canvas;
pub mod cell;
pub mod compositor;
pub mod driver;
pub mod width;

pub use canvas::{Canvas, Glyphs};
pub use cell::{Attr, Cell, ColorPair, TextFormat};
pub use compositor::{CellUpdate, Compositor, PanelId};
pub use driver::{Backend, Driver, HeadlessBackend, Palette};
