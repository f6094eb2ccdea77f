//! Stacking panels and differential screen composition.
//!
//! The `Compositor` owns one stacking [`PanelId`] per top-level window. Each
//! panel holds a snapshot of the window's canvas and a position; the z-order
//! is a bottom-to-top list. A commit paints every visible panel in z-order,
//! then the taskbar row, into the screen buffer, compares the result against
//! the last committed frame and hands only the changed cells to the
//! [`Backend`](super::driver::Backend).

use std::io;

use slotmap::{new_key_type, SlotMap};

use super::canvas::Canvas;
use super::cell::Cell;
use super::driver::Backend;
use crate::geometry::Region;

new_key_type! {
    /// A window's slot in the stacking order.
    pub struct PanelId;
}

// ---------------------------------------------------------------------------
// CellUpdate
// ---------------------------------------------------------------------------

/// A single cell that changed between frames.
///
/// Used by the driver to emit minimal terminal escape sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub x: u16,
    pub y: u16,
    pub cell: Cell,
}

// ---------------------------------------------------------------------------
// Panel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Panel {
    x: i32,
    y: i32,
    canvas: Canvas,
    hidden: bool,
}

impl Panel {
    fn region(&self) -> Region {
        Region::new(self.x, self.y, self.canvas.width(), self.canvas.height())
    }
}

// ---------------------------------------------------------------------------
// Compositor
// ---------------------------------------------------------------------------

/// Manages stacking panels, the taskbar row and the screen buffer.
#[derive(Debug, Clone)]
pub struct Compositor {
    panels: SlotMap<PanelId, Panel>,
    /// Z-order, bottom first.
    order: Vec<PanelId>,
    /// The screen being composed. `screen[y][x]` is column x, row y.
    screen: Vec<Vec<Cell>>,
    /// The last frame handed to the backend; `None` forces a full repaint.
    front: Option<Vec<Vec<Cell>>>,
    /// The bottom row, owned by the window manager's taskbar.
    taskbar: Canvas,
    /// Terminal width.
    pub width: u16,
    /// Terminal height.
    pub height: u16,
}

impl Compositor {
    /// Create a compositor with a blank screen of the given dimensions.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            panels: SlotMap::with_key(),
            order: Vec::new(),
            screen: Self::blank_screen(width, height),
            front: None,
            taskbar: Canvas::new(width as i32, 1),
            width,
            height,
        }
    }

    /// Resize the screen buffer and force a full repaint on the next commit.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.screen = Self::blank_screen(width, height);
        self.taskbar = Canvas::new(width as i32, 1);
        self.front = None;
    }

    /// Force the next commit to repaint every cell.
    pub fn invalidate(&mut self) {
        self.front = None;
    }

    // ── Panels ───────────────────────────────────────────────────────

    /// Allocate a stacking panel on top of all others.
    pub fn create_panel(&mut self, x: i32, y: i32, canvas: Canvas) -> PanelId {
        let id = self.panels.insert(Panel { x, y, canvas, hidden: false });
        self.order.push(id);
        id
    }

    /// Release a panel. Unknown ids are ignored.
    pub fn destroy_panel(&mut self, id: PanelId) {
        self.panels.remove(id);
        self.order.retain(|&p| p != id);
    }

    pub fn contains_panel(&self, id: PanelId) -> bool {
        self.panels.contains_key(id)
    }

    /// Replace the panel's snapshot with a copy of `canvas`.
    pub fn update_panel(&mut self, id: PanelId, canvas: &Canvas) {
        if let Some(panel) = self.panels.get_mut(id) {
            panel.canvas.clone_from(canvas);
        }
    }

    pub fn move_panel(&mut self, id: PanelId, x: i32, y: i32) {
        if let Some(panel) = self.panels.get_mut(id) {
            panel.x = x;
            panel.y = y;
        }
    }

    pub fn set_panel_hidden(&mut self, id: PanelId, hidden: bool) {
        if let Some(panel) = self.panels.get_mut(id) {
            panel.hidden = hidden;
        }
    }

    /// Move the panel to the top of the stacking order.
    pub fn raise(&mut self, id: PanelId) {
        if self.panels.contains_key(id) {
            self.order.retain(|&p| p != id);
            self.order.push(id);
        }
    }

    /// Move the panel to the bottom of the stacking order.
    pub fn lower(&mut self, id: PanelId) {
        if self.panels.contains_key(id) {
            self.order.retain(|&p| p != id);
            self.order.insert(0, id);
        }
    }

    /// Stacking order, bottom first.
    pub fn stacking_order(&self) -> &[PanelId] {
        &self.order
    }

    /// Screen rectangle covered by a panel.
    pub fn panel_region(&self, id: PanelId) -> Option<Region> {
        self.panels.get(id).map(Panel::region)
    }

    /// The topmost visible panel covering (x, y).
    pub fn panel_at(&self, x: i32, y: i32) -> Option<PanelId> {
        self.order
            .iter()
            .rev()
            .copied()
            .find(|&id| {
                self.panels
                    .get(id)
                    .is_some_and(|p| !p.hidden && p.region().contains(x, y))
            })
    }

    // ── Taskbar ──────────────────────────────────────────────────────

    /// Mutable access to the taskbar row (always `width` x 1).
    pub fn taskbar_mut(&mut self) -> &mut Canvas {
        &mut self.taskbar
    }

    pub fn taskbar(&self) -> &Canvas {
        &self.taskbar
    }

    // ── Composition ──────────────────────────────────────────────────

    /// Paint all visible panels in z-order, then the taskbar, into the screen buffer.
    pub fn compose(&mut self) {
        let bounds = Region::new(0, 0, self.width as i32, self.height as i32);
        self.screen = Self::blank_screen(self.width, self.height);
        for &id in &self.order {
            let Some(panel) = self.panels.get(id) else {
                continue;
            };
            if panel.hidden {
                continue;
            }
            let clip = panel.region().intersection(bounds);
            for y in clip.y..clip.bottom() {
                for x in clip.x..clip.right() {
                    if let Some(cell) = panel.canvas.get(x - panel.x, y - panel.y) {
                        self.screen[y as usize][x as usize] = *cell;
                    }
                }
            }
        }
        if self.height > 0 {
            let row = self.height as usize - 1;
            for x in 0..self.width as usize {
                if let Some(cell) = self.taskbar.get(x as i32, 0) {
                    self.screen[row][x] = *cell;
                }
            }
        }
    }

    /// Compare the composed screen against the last committed frame.
    ///
    /// Every cell is an update when there is no previous frame.
    pub fn diff(&self) -> Vec<CellUpdate> {
        let mut updates = Vec::new();
        for (y, row) in self.screen.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                let unchanged = self
                    .front
                    .as_ref()
                    .and_then(|front| front.get(y))
                    .and_then(|r| r.get(x))
                    .is_some_and(|old| old == cell);
                if !unchanged {
                    updates.push(CellUpdate { x: x as u16, y: y as u16, cell: *cell });
                }
            }
        }
        updates
    }

    /// Compose, diff and push the changes to `backend` in one pass.
    ///
    /// Returns the number of cells written.
    pub fn commit(&mut self, backend: &mut dyn Backend) -> io::Result<usize> {
        self.compose();
        let updates = self.diff();
        backend.commit(&updates)?;
        self.front = Some(self.screen.clone());
        Ok(updates.len())
    }

    /// The composed cell at (x, y).
    pub fn get_cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.screen
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
    }

    /// Text of one composed row, wide-glyph tails removed.
    pub fn row_text(&self, y: u16) -> String {
        self.screen
            .get(y as usize)
            .map(|row| {
                row.iter()
                    .filter(|c| !c.is_wide_tail())
                    .map(|c| c.ch)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Create a blank screen buffer.
    fn blank_screen(width: u16, height: u16) -> Vec<Vec<Cell>> {
        (0..height as usize)
            .map(|_| vec![Cell::blank(); width as usize])
            .collect()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
