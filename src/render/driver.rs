//! Terminal backends.
//!
//! [`Backend`] is the seam between the toolkit and the terminal: it reports
//! the terminal size and receives one batch of changed cells per commit.
//! [`Driver`] implements it with crossterm over a buffered stdout writer;
//! [`HeadlessBackend`] keeps a cell grid in memory for tests. Semantic color
//! pairs are mapped to concrete colors through a [`Palette`] whose entries are
//! parsed as named colors or `#rrggbb` hex values.

use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor, execute, queue,
    event::{DisableMouseCapture, EnableMouseCapture},
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};

use super::cell::{Attr, Cell, ColorPair};
use super::compositor::CellUpdate;

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Where composed frames go.
pub trait Backend {
    /// Terminal size as (columns, rows).
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Physically apply one frame's worth of changed cells.
    fn commit(&mut self, updates: &[CellUpdate]) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Foreground/background colors for each [`ColorPair`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pairs: [(Color, Color); 12],
}

impl Default for Palette {
    fn default() -> Self {
        let defaults = [
            (ColorPair::Normal, "black", "white"),
            (ColorPair::Highlight, "white", "blue"),
            (ColorPair::Disabled, "dark_grey", "white"),
            (ColorPair::HighlightD, "cyan", "dark_grey"),
            (ColorPair::Text, "white", "blue"),
            (ColorPair::TextNormal, "white", "blue"),
            (ColorPair::Mnemonic, "magenta", "white"),
            (ColorPair::MnemonicD, "magenta", "dark_grey"),
            (ColorPair::Shadow, "black", "dark_grey"),
            (ColorPair::Title, "white", "blue"),
            (ColorPair::TitleD, "white", "dark_grey"),
            (ColorPair::Urgent, "white", "red"),
        ];
        let mut palette = Palette { pairs: [(Color::Reset, Color::Reset); 12] };
        for (pair, fg, bg) in defaults {
            palette.set(pair, fg, bg);
        }
        palette
    }
}

impl Palette {
    /// Override a pair. Unparseable color names leave the pair unchanged.
    pub fn set(&mut self, pair: ColorPair, fg: &str, bg: &str) -> bool {
        match (parse_color(fg), parse_color(bg)) {
            (Some(fg), Some(bg)) => {
                self.pairs[Self::slot(pair)] = (fg, bg);
                true
            }
            _ => false,
        }
    }

    /// The (foreground, background) colors for a pair.
    pub fn get(&self, pair: ColorPair) -> (Color, Color) {
        self.pairs[Self::slot(pair)]
    }

    fn slot(pair: ColorPair) -> usize {
        ColorPair::ALL.iter().position(|&p| p == pair).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Terminal output backend using crossterm.
///
/// Wraps a `BufWriter<Stdout>` for batched writes. The driver does NOT
/// automatically enter the alternate screen on creation; call
/// [`enter_alt_screen`](Self::enter_alt_screen) explicitly.
pub struct Driver {
    writer: BufWriter<Stdout>,
    palette: Palette,
}

impl Driver {
    /// Create a new driver wrapping stdout.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            writer: BufWriter::new(io::stdout()),
            palette: Palette::default(),
        })
    }

    /// Replace the color palette (builder).
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Enter alternate screen and enable raw mode.
    pub fn enter_alt_screen(&mut self) -> io::Result<()> {
        execute!(self.writer, EnterAlternateScreen, cursor::Hide)?;
        terminal::enable_raw_mode()?;
        Ok(())
    }

    /// Leave alternate screen and disable raw mode.
    pub fn leave_alt_screen(&mut self) -> io::Result<()> {
        terminal::disable_raw_mode()?;
        execute!(self.writer, cursor::Show, LeaveAlternateScreen)?;
        Ok(())
    }

    /// Ask the terminal to report mouse events.
    pub fn enable_mouse(&mut self) -> io::Result<()> {
        execute!(self.writer, EnableMouseCapture)
    }

    pub fn disable_mouse(&mut self) -> io::Result<()> {
        execute!(self.writer, DisableMouseCapture)
    }

    /// Get the terminal size (columns, rows) via crossterm.
    pub fn terminal_size() -> io::Result<(u16, u16)> {
        terminal::size()
    }

    /// Queue crossterm style commands for a cell's attributes.
    fn apply_attr(&mut self, attr: &Attr) -> io::Result<()> {
        let (fg, bg) = self.palette.get(attr.pair);
        queue!(self.writer, SetForegroundColor(fg), SetBackgroundColor(bg))?;
        if attr.bold {
            queue!(self.writer, SetAttribute(Attribute::Bold))?;
        }
        if attr.dim {
            queue!(self.writer, SetAttribute(Attribute::Dim))?;
        }
        if attr.underline {
            queue!(self.writer, SetAttribute(Attribute::Underlined))?;
        }
        if attr.blink {
            queue!(self.writer, SetAttribute(Attribute::SlowBlink))?;
        }
        if attr.reverse {
            queue!(self.writer, SetAttribute(Attribute::Reverse))?;
        }
        Ok(())
    }
}

impl Backend for Driver {
    fn size(&self) -> io::Result<(u16, u16)> {
        Self::terminal_size()
    }

    /// Move, style and print each changed cell, then flush once.
    fn commit(&mut self, updates: &[CellUpdate]) -> io::Result<()> {
        for update in updates {
            if update.cell.is_wide_tail() {
                continue;
            }
            queue!(self.writer, cursor::MoveTo(update.x, update.y))?;
            self.apply_attr(&update.cell.attr)?;
            queue!(
                self.writer,
                Print(update.cell.ch),
                SetAttribute(Attribute::Reset),
                ResetColor
            )?;
        }
        self.writer.flush()
    }
}

// ---------------------------------------------------------------------------
// HeadlessBackend
// ---------------------------------------------------------------------------

/// In-memory backend: applies updates to a cell grid and counts commits.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    width: u16,
    height: u16,
    cells: Vec<Vec<Cell>>,
    /// Number of commits received.
    pub commits: usize,
}

impl HeadlessBackend {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![vec![Cell::blank(); width as usize]; height as usize],
            commits: 0,
        }
    }

    /// Change the reported size; the grid is reset.
    pub fn resize(&mut self, width: u16, height: u16) {
        *self = Self { commits: self.commits, ..Self::new(width, height) };
    }

    /// The last committed cell at (x, y).
    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.cells.get(y as usize).and_then(|row| row.get(x as usize))
    }
}

impl Backend for HeadlessBackend {
    fn size(&self) -> io::Result<(u16, u16)> {
        Ok((self.width, self.height))
    }

    fn commit(&mut self, updates: &[CellUpdate]) -> io::Result<()> {
        for update in updates {
            if let Some(cell) = self
                .cells
                .get_mut(update.y as usize)
                .and_then(|row| row.get_mut(update.x as usize))
            {
                *cell = update.cell;
            }
        }
        self.commits += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Color parsing
// ---------------------------------------------------------------------------

/// Parse a color string into a crossterm `Color`.
///
/// Supports:
/// - Hex colors: `#rrggbb` or `#rgb`
/// - Named colors: `black`, `red`, `green`, `yellow`, `blue`, `magenta`, `cyan`, `white`,
///   `dark_red`, `dark_green`, `dark_yellow`, `dark_blue`, `dark_magenta`, `dark_cyan`, `dark_grey`/`dark_gray`,
///   `grey`/`gray`
///
/// Returns `None` if the color string cannot be parsed.
pub fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();

    // Hex color
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex_color(hex);
    }

    // Named colors (case-insensitive)
    match s.to_ascii_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "dark_red" | "darkred" => Some(Color::DarkRed),
        "dark_green" | "darkgreen" => Some(Color::DarkGreen),
        "dark_yellow" | "darkyellow" => Some(Color::DarkYellow),
        "dark_blue" | "darkblue" => Some(Color::DarkBlue),
        "dark_magenta" | "darkmagenta" => Some(Color::DarkMagenta),
        "dark_cyan" | "darkcyan" => Some(Color::DarkCyan),
        "dark_grey" | "dark_gray" | "darkgrey" | "darkgray" => Some(Color::DarkGrey),
        "grey" | "gray" => Some(Color::Grey),
        _ => None,
    }
}

/// Parse a hex color string (without the leading `#`).
///
/// Supports 6-digit (`rrggbb`) and 3-digit (`rgb`) formats.
fn parse_hex_color(hex: &str) -> Option<Color> {
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::Rgb { r, g, b })
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
            // Expand: 0xA -> 0xAA
            Some(Color::Rgb {
                r: r * 16 + r,
                g: g * 16 + g,
                b: b * 16 + b,
            })
        }
        _ => None,
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::style::Color;

    #[test]
    fn parse_hex_colors() {
        assert_eq!(parse_color("#ff0000"), Some(Color::Rgb { r: 255, g: 0, b: 0 }));
        assert_eq!(parse_color("#abc"), Some(Color::Rgb { r: 0xaa, g: 0xbb, b: 0xcc }));
        assert_eq!(parse_color("#ff00"), None);
        assert_eq!(parse_color("#gghhii"), None);
    }

    #[test]
    fn parse_named_colors() {
        assert_eq!(parse_color("Red"), Some(Color::Red));
        assert_eq!(parse_color("dark_grey"), Some(Color::DarkGrey));
        assert_eq!(parse_color("  gray "), Some(Color::Grey));
        assert_eq!(parse_color("rainbow"), None);
    }

    #[test]
    fn default_palette_maps_urgent_to_red() {
        let palette = Palette::default();
        assert_eq!(palette.get(ColorPair::Urgent), (Color::White, Color::Red));
        assert_eq!(palette.get(ColorPair::Normal), (Color::Black, Color::White));
    }

    #[test]
    fn palette_rejects_unknown_names() {
        let mut palette = Palette::default();
        assert!(!palette.set(ColorPair::Title, "nope", "blue"));
        assert_eq!(palette.get(ColorPair::Title), (Color::White, Color::Blue));
        assert!(palette.set(ColorPair::Title, "#000000", "yellow"));
        assert_eq!(
            palette.get(ColorPair::Title),
            (Color::Rgb { r: 0, g: 0, b: 0 }, Color::Yellow)
        );
    }

    #[test]
    fn headless_backend_applies_updates() {
        let mut backend = HeadlessBackend::new(3, 1);
        let cell = Cell::new('x', Attr::default());
        backend
            .commit(&[CellUpdate { x: 1, y: 0, cell }])
            .unwrap();
        assert_eq!(backend.cell(1, 0).map(|c| c.ch), Some('x'));
        assert_eq!(backend.commits, 1);
        assert_eq!(backend.size().unwrap(), (3, 1));
    }

    #[test]
    fn driver_new_succeeds() {
        assert!(Driver::new().is_ok());
    }
}
