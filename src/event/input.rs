//! Input byte sequences: trigger constants, key names, mouse decoding.
//!
//! The toolkit consumes raw terminal input as byte chunks. Keys are compared
//! as strings ("trigger sequences"); this module names the common ones,
//! translates human-readable key names (`c-n`, `up`, `m-w`) into sequences,
//! normalizes alternate encodings emitted by different terminals, decodes
//! X10 mouse reports, and converts crossterm events into the same byte form
//! so that a crossterm-driven event loop feeds the toolkit unchanged.

use std::borrow::Cow;

// ---------------------------------------------------------------------------
// Trigger sequences
// ---------------------------------------------------------------------------

pub const KEY_ESC: &str = "\x1b";
pub const KEY_ENTER: &str = "\r";
pub const KEY_TAB: &str = "\t";
pub const KEY_BACK_TAB: &str = "\x1b[Z";
pub const KEY_BACKSPACE: &str = "\x7f";
pub const KEY_SPACE: &str = " ";
pub const KEY_UP: &str = "\x1b[A";
pub const KEY_DOWN: &str = "\x1b[B";
pub const KEY_RIGHT: &str = "\x1b[C";
pub const KEY_LEFT: &str = "\x1b[D";
pub const KEY_HOME: &str = "\x1b[H";
pub const KEY_END: &str = "\x1b[F";
pub const KEY_INS: &str = "\x1b[2~";
pub const KEY_DEL: &str = "\x1b[3~";
pub const KEY_PGUP: &str = "\x1b[5~";
pub const KEY_PGDOWN: &str = "\x1b[6~";
pub const KEY_CTRL_UP: &str = "\x1b[1;5A";
pub const KEY_CTRL_DOWN: &str = "\x1b[1;5B";

const FUNCTION_KEYS: [&str; 12] = [
    "\x1bOP", "\x1bOQ", "\x1bOR", "\x1bOS", "\x1b[15~", "\x1b[17~", "\x1b[18~", "\x1b[19~",
    "\x1b[20~", "\x1b[21~", "\x1b[23~", "\x1b[24~",
];

/// The sequence for function key `n` (1-based), if it exists.
pub fn function_key(n: u8) -> Option<&'static str> {
    FUNCTION_KEYS.get((n as usize).checked_sub(1)?).copied()
}

/// Control-modified letter: `ctrl('n')` is `"\x0e"`.
pub fn ctrl(c: char) -> String {
    let lower = c.to_ascii_lowercase();
    if lower.is_ascii_lowercase() {
        ((lower as u8 - b'a' + 1) as char).to_string()
    } else {
        c.to_string()
    }
}

/// Alt-modified key: an escape prefix followed by the key.
pub fn alt(c: char) -> String {
    format!("{KEY_ESC}{c}")
}

/// Translate a key name (as written in configuration files) into its
/// trigger sequence.
///
/// Accepts `c-x` / `ctrl-x` for control, `m-x` / `a-x` / `alt-x` for alt
/// (alt may wrap any other name), named keys, `f1`..`f12`, and single
/// characters which translate to themselves.
pub fn translate(name: &str) -> Option<String> {
    let lower = name.to_ascii_lowercase();
    for prefix in ["m-", "a-", "alt-"] {
        if let Some(rest) = lower.strip_prefix(prefix) {
            if rest.is_empty() {
                break;
            }
            let inner = translate(&name[prefix.len()..])?;
            return Some(format!("{KEY_ESC}{inner}"));
        }
    }
    for prefix in ["c-", "ctrl-"] {
        if let Some(rest) = lower.strip_prefix(prefix) {
            let mut chars = rest.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                return Some(ctrl(c));
            }
        }
    }
    let named = match lower.as_str() {
        "up" => KEY_UP,
        "down" => KEY_DOWN,
        "left" => KEY_LEFT,
        "right" => KEY_RIGHT,
        "c-up" | "ctrl-up" => KEY_CTRL_UP,
        "c-down" | "ctrl-down" => KEY_CTRL_DOWN,
        "home" => KEY_HOME,
        "end" => KEY_END,
        "pageup" | "pgup" => KEY_PGUP,
        "pagedown" | "pgdown" => KEY_PGDOWN,
        "insert" | "ins" => KEY_INS,
        "delete" | "del" => KEY_DEL,
        "tab" => KEY_TAB,
        "back-tab" | "backtab" => KEY_BACK_TAB,
        "enter" | "return" => KEY_ENTER,
        "escape" | "esc" => KEY_ESC,
        "backspace" => KEY_BACKSPACE,
        "space" => KEY_SPACE,
        _ => {
            if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                return function_key(n).map(str::to_owned);
            }
            let mut chars = name.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c.to_string()),
                _ => None,
            };
        }
    };
    Some(named.to_owned())
}

/// Normalize alternate encodings of the same key to the canonical sequence.
pub fn refine(keys: &str) -> Cow<'_, str> {
    let canonical = match keys {
        "\x1bOA" => KEY_UP,
        "\x1bOB" => KEY_DOWN,
        "\x1bOC" => KEY_RIGHT,
        "\x1bOD" => KEY_LEFT,
        "\x1bOH" | "\x1b[1~" | "\x1b[7~" => KEY_HOME,
        "\x1bOF" | "\x1b[4~" | "\x1b[8~" => KEY_END,
        "\x08" => KEY_BACKSPACE,
        "\n" => KEY_ENTER,
        _ => return Cow::Borrowed(keys),
    };
    Cow::Borrowed(canonical)
}

// ---------------------------------------------------------------------------
// Mouse
// ---------------------------------------------------------------------------

/// Mouse report kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEvent {
    LeftDown,
    RightDown,
    MiddleDown,
    Up,
    ScrollUp,
    ScrollDown,
}

impl MouseEvent {
    /// Whether this is a button press (as opposed to release or wheel).
    pub fn is_down(self) -> bool {
        matches!(self, MouseEvent::LeftDown | MouseEvent::RightDown | MouseEvent::MiddleDown)
    }
}

/// A decoded mouse report in zero-based screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseInput {
    pub event: MouseEvent,
    pub x: i32,
    pub y: i32,
}

const MOUSE_PREFIX: &[u8] = b"\x1b[M";

/// Decode an X10 mouse report (`ESC [ M b x y`).
pub fn parse_mouse(bytes: &[u8]) -> Option<MouseInput> {
    let rest = bytes.strip_prefix(MOUSE_PREFIX)?;
    let &[b, x, y, ..] = rest else {
        return None;
    };
    let event = match b {
        b' ' => MouseEvent::LeftDown,
        b'!' => MouseEvent::MiddleDown,
        b'"' => MouseEvent::RightDown,
        b'#' => MouseEvent::Up,
        b'`' => MouseEvent::ScrollUp,
        b'a' => MouseEvent::ScrollDown,
        _ => return None,
    };
    Some(MouseInput {
        event,
        x: x as i32 - 33,
        y: y as i32 - 33,
    })
}

/// Encode a mouse report back into X10 bytes.
pub fn encode_mouse(input: MouseInput) -> Vec<u8> {
    let b = match input.event {
        MouseEvent::LeftDown => b' ',
        MouseEvent::MiddleDown => b'!',
        MouseEvent::RightDown => b'"',
        MouseEvent::Up => b'#',
        MouseEvent::ScrollUp => b'`',
        MouseEvent::ScrollDown => b'a',
    };
    let coord = |v: i32| (v + 33).clamp(33, 255) as u8;
    let mut out = MOUSE_PREFIX.to_vec();
    out.extend([b, coord(input.x), coord(input.y)]);
    out
}

// ---------------------------------------------------------------------------
// InputEvent / From<crossterm> conversions
// ---------------------------------------------------------------------------

/// Input as the toolkit sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// One raw input chunk: a key sequence, pasted text or a mouse report.
    Bytes(Vec<u8>),
    /// The terminal changed size.
    Resize { width: u16, height: u16 },
    /// Something the toolkit does not react to.
    Ignored,
}

/// Encode a crossterm key press as a trigger sequence.
///
/// Returns `None` for key releases and keys without a sequence.
pub fn encode_key(ct: crossterm::event::KeyEvent) -> Option<String> {
    use crossterm::event::{KeyCode, KeyEventKind, KeyModifiers};

    if ct.kind == KeyEventKind::Release {
        return None;
    }
    let base = match ct.code {
        KeyCode::Char(c) if ct.modifiers.contains(KeyModifiers::CONTROL) => ctrl(c),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => KEY_ENTER.to_owned(),
        KeyCode::Esc => KEY_ESC.to_owned(),
        KeyCode::Tab => KEY_TAB.to_owned(),
        KeyCode::BackTab => KEY_BACK_TAB.to_owned(),
        KeyCode::Backspace => KEY_BACKSPACE.to_owned(),
        KeyCode::Delete => KEY_DEL.to_owned(),
        KeyCode::Insert => KEY_INS.to_owned(),
        KeyCode::Left => KEY_LEFT.to_owned(),
        KeyCode::Right => KEY_RIGHT.to_owned(),
        KeyCode::Up if ct.modifiers.contains(KeyModifiers::CONTROL) => KEY_CTRL_UP.to_owned(),
        KeyCode::Down if ct.modifiers.contains(KeyModifiers::CONTROL) => KEY_CTRL_DOWN.to_owned(),
        KeyCode::Up => KEY_UP.to_owned(),
        KeyCode::Down => KEY_DOWN.to_owned(),
        KeyCode::Home => KEY_HOME.to_owned(),
        KeyCode::End => KEY_END.to_owned(),
        KeyCode::PageUp => KEY_PGUP.to_owned(),
        KeyCode::PageDown => KEY_PGDOWN.to_owned(),
        KeyCode::F(n) => function_key(n)?.to_owned(),
        _ => return None,
    };
    if ct.modifiers.contains(KeyModifiers::ALT) {
        Some(format!("{KEY_ESC}{base}"))
    } else {
        Some(base)
    }
}

impl From<crossterm::event::Event> for InputEvent {
    fn from(ct: crossterm::event::Event) -> Self {
        use crossterm::event::{Event, MouseButton, MouseEventKind};

        match ct {
            Event::Key(ke) => match encode_key(ke) {
                Some(seq) => InputEvent::Bytes(seq.into_bytes()),
                None => InputEvent::Ignored,
            },
            Event::Mouse(me) => {
                let event = match me.kind {
                    MouseEventKind::Down(MouseButton::Left) => MouseEvent::LeftDown,
                    MouseEventKind::Down(MouseButton::Middle) => MouseEvent::MiddleDown,
                    MouseEventKind::Down(MouseButton::Right) => MouseEvent::RightDown,
                    MouseEventKind::Up(_) => MouseEvent::Up,
                    MouseEventKind::ScrollUp => MouseEvent::ScrollUp,
                    MouseEventKind::ScrollDown => MouseEvent::ScrollDown,
                    _ => return InputEvent::Ignored,
                };
                InputEvent::Bytes(encode_mouse(MouseInput {
                    event,
                    x: me.column as i32,
                    y: me.row as i32,
                }))
            }
            Event::Resize(width, height) => InputEvent::Resize { width, height },
            Event::Paste(text) => InputEvent::Bytes(text.into_bytes()),
            Event::FocusGained | Event::FocusLost => InputEvent::Ignored,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
