//! Canvas: a widget's allocated rectangular character region.
//!
//! Every widget that has been drawn owns a [`Canvas`] sized to its outer
//! extent. Containers copy their children's canvases into their own
//! ([`Canvas::blit`]) and top-level canvases are handed to the
//! [`Compositor`](super::compositor::Compositor) as stacking panels.

use super::cell::{Attr, Cell};
use super::width::char_width;

// ---------------------------------------------------------------------------
// Glyphs
// ---------------------------------------------------------------------------

/// Line-drawing and indicator glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyphs {
    pub hline: char,
    pub vline: char,
    pub ul_corner: char,
    pub ur_corner: char,
    pub ll_corner: char,
    pub lr_corner: char,
    /// Tee pointing left (`┤`), placed before a title.
    pub rtee: char,
    /// Tee pointing right (`├`), placed after a title.
    pub ltee: char,
    pub up_arrow: char,
    pub down_arrow: char,
    /// Scrollbar thumb.
    pub checkerboard: char,
    /// Mask for hidden text.
    pub bullet: char,
}

impl Glyphs {
    pub const UNICODE: Glyphs = Glyphs {
        hline: '─',
        vline: '│',
        ul_corner: '┌',
        ur_corner: '┐',
        ll_corner: '└',
        lr_corner: '┘',
        rtee: '┤',
        ltee: '├',
        up_arrow: '↑',
        down_arrow: '↓',
        checkerboard: '▒',
        bullet: '•',
    };

    pub const ASCII: Glyphs = Glyphs {
        hline: '-',
        vline: '|',
        ul_corner: '+',
        ur_corner: '+',
        ll_corner: '+',
        lr_corner: '+',
        rtee: '+',
        ltee: '+',
        up_arrow: '^',
        down_arrow: 'v',
        checkerboard: '#',
        bullet: '*',
    };

    /// Pick the glyph set for the configured mode.
    pub const fn for_mode(ascii_only: bool) -> Glyphs {
        if ascii_only {
            Glyphs::ASCII
        } else {
            Glyphs::UNICODE
        }
    }
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// A width x height grid of [`Cell`]s with a background attribute.
///
/// All painting operations clip silently; degenerate sizes produce an empty
/// canvas rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    background: Attr,
}

impl Canvas {
    /// Allocate a blank canvas. Negative dimensions are clamped to zero.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![Cell::blank(); (width * height) as usize],
            background: Attr::default(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Reallocate to a new size; contents are reset to the background.
    pub fn resize(&mut self, width: i32, height: i32) {
        self.width = width.max(0);
        self.height = height.max(0);
        self.cells = vec![Cell::blank_with(self.background); (self.width * self.height) as usize];
    }

    /// The attribute used by [`erase`](Self::erase) and blank padding.
    pub fn background(&self) -> Attr {
        self.background
    }

    pub fn set_background(&mut self, attr: Attr) {
        self.background = attr;
    }

    /// Fill every cell with a blank in the background attribute.
    pub fn erase(&mut self) {
        let blank = Cell::blank_with(self.background);
        self.cells.fill(blank);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    /// The cell at (x, y), if inside the canvas.
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Overwrite the cell at (x, y). Out-of-range writes are ignored.
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    /// Paint one glyph; returns the columns it occupies, or 0 if it did not fit.
    pub fn put_char(&mut self, x: i32, y: i32, ch: char, attr: Attr) -> i32 {
        let w = char_width(ch);
        if self.index(x, y).is_none() || x + w > self.width {
            return 0;
        }
        self.set(x, y, Cell::new(ch, attr));
        if w == 2 {
            self.set(x + 1, y, Cell::new(Cell::WIDE_TAIL, attr));
        }
        w
    }

    /// Paint `text` starting at (x, y), stopping at the right edge.
    ///
    /// Returns the number of columns written.
    pub fn put_str(&mut self, x: i32, y: i32, text: &str, attr: Attr) -> i32 {
        let mut col = x;
        for ch in text.chars() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            let w = self.put_char(col, y, ch, attr);
            if w == 0 {
                break;
            }
            col += w;
        }
        col - x
    }

    /// Horizontal run of `n` copies of `ch`.
    pub fn hline(&mut self, x: i32, y: i32, ch: char, attr: Attr, n: i32) {
        for i in 0..n.max(0) {
            self.set(x + i, y, Cell::new(ch, attr));
        }
    }

    /// Vertical run of `n` copies of `ch`.
    pub fn vline(&mut self, x: i32, y: i32, ch: char, attr: Attr, n: i32) {
        for i in 0..n.max(0) {
            self.set(x, y + i, Cell::new(ch, attr));
        }
    }

    /// Outline the canvas edge.
    pub fn draw_border(&mut self, glyphs: &Glyphs, attr: Attr) {
        self.draw_box(0, 0, self.width, self.height, glyphs, attr);
    }

    /// Outline the `w` x `h` rectangle whose top-left corner is (x, y).
    pub fn draw_box(&mut self, x: i32, y: i32, w: i32, h: i32, glyphs: &Glyphs, attr: Attr) {
        if w < 2 || h < 2 {
            return;
        }
        let (right, bottom) = (x + w - 1, y + h - 1);
        self.hline(x + 1, y, glyphs.hline, attr, w - 2);
        self.hline(x + 1, bottom, glyphs.hline, attr, w - 2);
        self.vline(x, y + 1, glyphs.vline, attr, h - 2);
        self.vline(right, y + 1, glyphs.vline, attr, h - 2);
        self.set(x, y, Cell::new(glyphs.ul_corner, attr));
        self.set(right, y, Cell::new(glyphs.ur_corner, attr));
        self.set(x, bottom, Cell::new(glyphs.ll_corner, attr));
        self.set(right, bottom, Cell::new(glyphs.lr_corner, attr));
    }

    /// Copy all of `src` into this canvas with its origin at (dst_x, dst_y).
    pub fn blit(&mut self, src: &Canvas, dst_x: i32, dst_y: i32) {
        for sy in 0..src.height {
            for sx in 0..src.width {
                if let Some(cell) = src.get(sx, sy) {
                    self.set(dst_x + sx, dst_y + sy, *cell);
                }
            }
        }
    }

    /// Toggle reverse video on the cell at (x, y).
    pub fn set_reverse(&mut self, x: i32, y: i32, reverse: bool) {
        if let Some(i) = self.index(x, y) {
            self.cells[i].attr.reverse = reverse;
        }
    }

    /// Text content of one row, wide-glyph tails removed, trailing spaces kept.
    pub fn row_text(&self, y: i32) -> String {
        (0..self.width)
            .filter_map(|x| self.get(x, y))
            .filter(|c| !c.is_wide_tail())
            .map(|c| c.ch)
            .collect()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::cell::ColorPair;

    #[test]
    fn new_clamps_negative_sizes() {
        let c = Canvas::new(-3, 2);
        assert_eq!(c.width(), 0);
        assert_eq!(c.height(), 2);
        assert!(c.get(0, 0).is_none());
    }

    #[test]
    fn put_str_clips_at_right_edge() {
        let mut c = Canvas::new(4, 1);
        let written = c.put_str(1, 0, "hello", Attr::default());
        assert_eq!(written, 3);
        assert_eq!(c.row_text(0), " hel");
    }

    #[test]
    fn wide_glyph_takes_two_cells() {
        let mut c = Canvas::new(4, 1);
        assert_eq!(c.put_str(0, 0, "漢a", Attr::default()), 3);
        assert!(c.get(1, 0).is_some_and(Cell::is_wide_tail));
        assert_eq!(c.row_text(0), "漢a ");
    }

    #[test]
    fn wide_glyph_not_split_at_edge() {
        let mut c = Canvas::new(2, 1);
        assert_eq!(c.put_str(1, 0, "漢", Attr::default()), 0);
        assert_eq!(c.row_text(0), "  ");
    }

    #[test]
    fn border_corners() {
        let mut c = Canvas::new(4, 3);
        c.draw_border(&Glyphs::ASCII, Attr::default());
        assert_eq!(c.row_text(0), "+--+");
        assert_eq!(c.row_text(1), "|  |");
        assert_eq!(c.row_text(2), "+--+");
    }

    #[test]
    fn blit_copies_with_offset_and_clips() {
        let mut src = Canvas::new(3, 1);
        src.put_str(0, 0, "abc", Attr::default());
        let mut dst = Canvas::new(4, 2);
        dst.blit(&src, 2, 1);
        assert_eq!(dst.row_text(0), "    ");
        assert_eq!(dst.row_text(1), "  ab");
    }

    #[test]
    fn erase_uses_background() {
        let mut c = Canvas::new(2, 1);
        c.put_str(0, 0, "xy", Attr::default());
        c.set_background(Attr::new(ColorPair::Highlight));
        c.erase();
        assert_eq!(c.row_text(0), "  ");
        assert_eq!(c.get(0, 0).map(|cell| cell.attr.pair), Some(ColorPair::Highlight));
    }

    #[test]
    fn set_reverse_marks_cell() {
        let mut c = Canvas::new(1, 1);
        c.set_reverse(0, 0, true);
        assert!(c.get(0, 0).is_some_and(|cell| cell.attr.reverse));
    }
}
