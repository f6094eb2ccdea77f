//! Toolkit configuration: display options plus per-class binding overrides
//! and key remaps.
//!
//! Configuration is built in code with the `with_*` builder methods or read
//! from a small rc file:
//!
//! ```text
//! # comment
//! [general]
//! shadow = true
//! dump_file = /tmp/screen.txt
//! [Tree::binding]
//! c-n = move-down
//! [TextView::remap]
//! j = down
//! ```
//!
//! Key names are translated to trigger sequences with
//! [`translate`](crate::event::input::translate).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use logos::Logos;

use crate::event::input::translate;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure to read or parse an rc file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("line {line}: unexpected `{text}`")]
    UnexpectedToken { line: usize, text: String },
    #[error("line {line}: expected `name = value`")]
    ExpectedAssignment { line: usize },
    #[error("line {line}: unknown section `{name}`")]
    UnknownSection { line: usize, name: String },
    #[error("line {line}: `{name}` outside of any section")]
    NoSection { line: usize, name: String },
    #[error("line {line}: unknown option `{name}`")]
    UnknownOption { line: usize, name: String },
    #[error("line {line}: `{value}` is not a boolean")]
    InvalidBool { line: usize, value: String },
    #[error("line {line}: unknown key name `{name}`")]
    UnknownKey { line: usize, name: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// rc-file token. Input is lexed one line at a time.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r]+")]
enum Token {
    /// `# ...` to end of line.
    #[regex(r"#[^\n]*", logos::skip)]
    Comment,

    #[token("[")]
    SectionOpen,

    #[token("]")]
    SectionClose,

    #[token("=")]
    Equals,

    /// Anything else: option names, key names, action names, values.
    #[regex(r"[^ \t\r\n=\[\]#]+")]
    Word,
}

fn lex_line(line: &str, number: usize) -> Result<Vec<(Token, &str)>, ConfigError> {
    let mut lexer = Token::lexer(line);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.slice())),
            Err(()) => {
                return Err(ConfigError::UnexpectedToken { line: number, text: lexer.slice().to_owned() });
            }
        }
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------------
// ToolkitConfig
// ---------------------------------------------------------------------------

/// Display options and input customization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolkitConfig {
    /// Draw a one-cell shadow to the right of and below bordered widgets.
    pub shadow: bool,
    /// Use ASCII glyphs for borders, arrows and scrollbars.
    pub ascii_only: bool,
    /// Decode xterm mouse reports.
    pub mouse: bool,
    /// `class -> [(action, trigger)]`, applied at class registration.
    pub bindings: HashMap<String, Vec<(String, String)>>,
    /// `class -> {from -> to}` input substitutions.
    pub remaps: HashMap<String, HashMap<String, String>>,
    /// Where `dump-screen` writes the composed screen. Defaults to
    /// [`DEFAULT_DUMP_FILE`] in the working directory.
    pub dump_file: Option<PathBuf>,
}

pub const DEFAULT_DUMP_FILE: &str = "dump.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Section {
    General,
    Binding(String),
    Remap(String),
}

impl ToolkitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shadow(mut self, shadow: bool) -> Self {
        self.shadow = shadow;
        self
    }

    pub fn with_ascii_only(mut self, ascii_only: bool) -> Self {
        self.ascii_only = ascii_only;
        self
    }

    pub fn with_mouse(mut self, mouse: bool) -> Self {
        self.mouse = mouse;
        self
    }

    pub fn with_dump_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.dump_file = Some(path.into());
        self
    }

    /// The file `dump-screen` writes to.
    pub fn dump_path(&self) -> &Path {
        self.dump_file.as_deref().unwrap_or(Path::new(DEFAULT_DUMP_FILE))
    }

    /// Bind `trigger` (a raw sequence) to `action` in `class`. An empty
    /// action name masks an inherited binding.
    pub fn with_binding(mut self, class: &str, action: &str, trigger: &str) -> Self {
        self.bindings
            .entry(class.to_owned())
            .or_default()
            .push((action.to_owned(), trigger.to_owned()));
        self
    }

    /// Substitute input `from` with `to` before binding lookup in `class`.
    pub fn with_remap(mut self, class: &str, from: &str, to: &str) -> Self {
        self.remaps
            .entry(class.to_owned())
            .or_default()
            .insert(from.to_owned(), to.to_owned());
        self
    }

    /// Parse rc-file text into a fresh configuration.
    pub fn from_rc_str(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.merge_rc(text)?;
        Ok(config)
    }

    /// Read and parse an rc file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_rc_str(&text)
    }

    /// Apply rc-file text on top of the current settings.
    pub fn merge_rc(&mut self, text: &str) -> Result<(), ConfigError> {
        let mut section = None;
        for (idx, line) in text.lines().enumerate() {
            let number = idx + 1;
            let tokens = lex_line(line, number)?;
            match tokens.as_slice() {
                [] => {}
                [(Token::SectionOpen, _), (Token::Word, name), (Token::SectionClose, _)] => {
                    section = Some(parse_section(name, number)?);
                }
                [(Token::Word, name), (Token::Equals, _), (Token::Word, value)] => {
                    let Some(current) = &section else {
                        return Err(ConfigError::NoSection { line: number, name: (*name).to_owned() });
                    };
                    self.apply(current, name, value, number)?;
                }
                [(Token::Word, _), (Token::Equals, _)] | [(Token::Word, _)] => {
                    return Err(ConfigError::ExpectedAssignment { line: number });
                }
                [(_, text), ..] => {
                    return Err(ConfigError::UnexpectedToken { line: number, text: (*text).to_owned() });
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, section: &Section, name: &str, value: &str, line: usize) -> Result<(), ConfigError> {
        let key = |name: &str| {
            translate(name).ok_or_else(|| ConfigError::UnknownKey { line, name: name.to_owned() })
        };
        match section {
            Section::General if name == "dump_file" => self.dump_file = Some(PathBuf::from(value)),
            Section::General => {
                let flag = parse_bool(value, line)?;
                match name {
                    "shadow" => self.shadow = flag,
                    "ascii" | "ascii_only" => self.ascii_only = flag,
                    "mouse" => self.mouse = flag,
                    _ => return Err(ConfigError::UnknownOption { line, name: name.to_owned() }),
                }
            }
            Section::Binding(class) => {
                let trigger = key(name)?;
                let action = if value == "none" { "" } else { value };
                self.bindings
                    .entry(class.clone())
                    .or_default()
                    .push((action.to_owned(), trigger));
            }
            Section::Remap(class) => {
                let (from, to) = (key(name)?, key(value)?);
                self.remaps.entry(class.clone()).or_default().insert(from, to);
            }
        }
        Ok(())
    }
}

fn parse_section(name: &str, line: usize) -> Result<Section, ConfigError> {
    if name.eq_ignore_ascii_case("general") {
        return Ok(Section::General);
    }
    match name.split_once("::") {
        Some((class, "binding")) if !class.is_empty() => Ok(Section::Binding(class.to_owned())),
        Some((class, "remap")) if !class.is_empty() => Ok(Section::Remap(class.to_owned())),
        _ => Err(ConfigError::UnknownSection { line, name: name.to_owned() }),
    }
}

fn parse_bool(value: &str, line: usize) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBool { line, value: value.to_owned() }),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::event::input::KEY_DOWN;

    #[test]
    fn parses_all_sections() {
        let text = "\
# display
[general]
shadow = yes
mouse = true

[Tree::binding]
c-n = move-down
f5 = none

[TextView::remap]
j = down
";
        let config = ToolkitConfig::from_rc_str(text).unwrap();
        assert!(config.shadow);
        assert!(config.mouse);
        assert!(!config.ascii_only);
        assert_eq!(
            config.bindings["Tree"],
            vec![
                ("move-down".to_owned(), "\x0e".to_owned()),
                (String::new(), "\x1b[15~".to_owned()),
            ]
        );
        assert_eq!(config.remaps["TextView"]["j"], KEY_DOWN);
    }

    #[test]
    fn builder_matches_parsed_config() {
        let built = ToolkitConfig::new()
            .with_ascii_only(true)
            .with_binding("Tree", "move-up", "\x10");
        let parsed = ToolkitConfig::from_rc_str("[general]\nascii = on\n[Tree::binding]\nc-p = move-up\n").unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = ToolkitConfig::from_rc_str("[general]\nshadow = maybe\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { line: 2, .. }));

        let err = ToolkitConfig::from_rc_str("\n\n[Nope]\n").unwrap_err();
        assert_eq!(err.to_string(), "line 3: unknown section `Nope`");

        let err = ToolkitConfig::from_rc_str("shadow = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::NoSection { line: 1, .. }));

        let err = ToolkitConfig::from_rc_str("[Tree::binding]\nhyper-x = move-up\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { line: 2, .. }));
    }

    #[test]
    fn dump_file_option() {
        assert_eq!(ToolkitConfig::new().dump_path(), Path::new(DEFAULT_DUMP_FILE));
        let config = ToolkitConfig::from_rc_str("[general]\ndump_file = /tmp/screen.txt\n").unwrap();
        assert_eq!(config.dump_path(), Path::new("/tmp/screen.txt"));
        assert_eq!(config, ToolkitConfig::new().with_dump_file("/tmp/screen.txt"));
    }

    #[test]
    fn missing_value_is_reported() {
        let err = ToolkitConfig::from_rc_str("[general]\nshadow =\n").unwrap_err();
        assert!(matches!(err, ConfigError::ExpectedAssignment { line: 2 }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ToolkitConfig::load("/nonexistent/gnt-tui.rc").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
