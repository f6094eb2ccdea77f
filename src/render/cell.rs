//! Cells: one glyph with its color pair and text attributes.
//!
//! A [`Cell`] is the unit stored in widget canvases and in the compositor's
//! screen buffer. Colors are expressed as semantic [`ColorPair`]s; the driver
//! maps pairs to concrete terminal colors through its palette.

use std::ops::BitOr;

// ---------------------------------------------------------------------------
// ColorPair
// ---------------------------------------------------------------------------

/// Semantic foreground/background pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorPair {
    #[default]
    Normal,
    Highlight,
    Disabled,
    /// Highlight for a widget that does not have focus.
    HighlightD,
    Text,
    TextNormal,
    Mnemonic,
    MnemonicD,
    Shadow,
    Title,
    /// Title of a window that does not have focus.
    TitleD,
    Urgent,
}

impl ColorPair {
    /// All pairs, in palette order.
    pub const ALL: [ColorPair; 12] = [
        ColorPair::Normal,
        ColorPair::Highlight,
        ColorPair::Disabled,
        ColorPair::HighlightD,
        ColorPair::Text,
        ColorPair::TextNormal,
        ColorPair::Mnemonic,
        ColorPair::MnemonicD,
        ColorPair::Shadow,
        ColorPair::Title,
        ColorPair::TitleD,
        ColorPair::Urgent,
    ];
}

// ---------------------------------------------------------------------------
// Attr
// ---------------------------------------------------------------------------

/// Render attributes for a cell: a color pair plus text attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attr {
    pub pair: ColorPair,
    pub bold: bool,
    pub underline: bool,
    pub blink: bool,
    pub dim: bool,
    pub reverse: bool,
}

impl Attr {
    /// Plain attributes with the given color pair.
    pub const fn new(pair: ColorPair) -> Self {
        Self {
            pair,
            bold: false,
            underline: false,
            blink: false,
            dim: false,
            reverse: false,
        }
    }

    /// Set bold (builder).
    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Set dim (builder).
    pub const fn dim(mut self) -> Self {
        self.dim = true;
        self
    }

    /// Set reverse video (builder).
    pub const fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }
}

// ---------------------------------------------------------------------------
// TextFormat
// ---------------------------------------------------------------------------

/// Format flags attached to text runs (TextView segments, Tree rows).
///
/// Flags are composed with an optional base color pair; [`to_attr`](Self::to_attr)
/// resolves them into concrete render [`Attr`]ibutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextFormat {
    bits: u8,
    pair: Option<ColorPair>,
}

impl TextFormat {
    pub const NORMAL: TextFormat = TextFormat { bits: 0, pair: None };
    pub const BOLD: TextFormat = TextFormat { bits: 1, pair: None };
    pub const UNDERLINE: TextFormat = TextFormat { bits: 2, pair: None };
    pub const BLINK: TextFormat = TextFormat { bits: 4, pair: None };
    pub const DIM: TextFormat = TextFormat { bits: 8, pair: None };
    pub const HIGHLIGHT: TextFormat = TextFormat { bits: 16, pair: None };

    /// Attach a base color pair (builder).
    pub const fn with_pair(mut self, pair: ColorPair) -> Self {
        self.pair = Some(pair);
        self
    }

    /// Whether every flag bit in `other` is set in `self`.
    pub const fn contains(self, other: TextFormat) -> bool {
        self.bits & other.bits == other.bits
    }

    /// Resolve flags into render attributes.
    ///
    /// `DIM` and `HIGHLIGHT` imply a dim attribute with the disabled and
    /// highlight pairs respectively; an explicit base pair takes precedence.
    pub fn to_attr(self) -> Attr {
        let mut pair = ColorPair::Normal;
        let mut attr = Attr::new(pair);
        attr.bold = self.contains(Self::BOLD);
        attr.underline = self.contains(Self::UNDERLINE);
        attr.blink = self.contains(Self::BLINK);
        if self.contains(Self::DIM) {
            attr.dim = true;
            pair = ColorPair::Disabled;
        }
        if self.contains(Self::HIGHLIGHT) {
            attr.dim = true;
            pair = ColorPair::Highlight;
        }
        attr.pair = self.pair.unwrap_or(pair);
        attr
    }
}

impl BitOr for TextFormat {
    type Output = TextFormat;
    fn bitor(self, rhs: Self) -> Self::Output {
        TextFormat {
            bits: self.bits | rhs.bits,
            pair: rhs.pair.or(self.pair),
        }
    }
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A single terminal cell: one glyph with its attributes.
///
/// A double-width glyph occupies its own cell plus a following
/// [`WIDE_TAIL`](Cell::WIDE_TAIL) cell that the driver never prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub attr: Attr,
}

impl Cell {
    /// Placeholder glyph for the second column of a wide glyph.
    pub const WIDE_TAIL: char = '\0';

    /// Create a new cell.
    pub const fn new(ch: char, attr: Attr) -> Self {
        Self { ch, attr }
    }

    /// A blank (space) cell with default attributes.
    pub const fn blank() -> Self {
        Self { ch: ' ', attr: Attr::new(ColorPair::Normal) }
    }

    /// A blank (space) cell with the given attributes.
    pub const fn blank_with(attr: Attr) -> Self {
        Self { ch: ' ', attr }
    }

    /// Whether this cell continues a wide glyph.
    pub const fn is_wide_tail(&self) -> bool {
        self.ch == Self::WIDE_TAIL
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
