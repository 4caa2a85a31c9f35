//! IRC control-code text formatting.
//!
//! Wraps text in mIRC-style control bytes for bold, italic, underline,
//! strikethrough and color formatting. Every wrapper has toggle semantics:
//! the same byte opens and closes a span, so nesting and overlap are the
//! caller's responsibility and are not validated here.
//!
//! Color names follow <https://www.mirc.com/colors.html>.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use fancy_regex::Regex;
use once_cell::sync::Lazy;

use crate::common::error::{FormatError, FormatResult};

/// The control code to reset formatting.
pub const CONTROL_NORMAL: char = '\x0f';
/// The control code to start or end color formatting.
pub const CONTROL_COLOR: char = '\x03';
/// The control code to start or end hexadecimal color formatting.
pub const CONTROL_HEX_COLOR: char = '\x04';
/// The control code to start or end bold formatting.
pub const CONTROL_BOLD: char = '\x02';
/// The control code to start or end italic formatting.
pub const CONTROL_ITALIC: char = '\x1d';
/// The control code to start or end underlining.
pub const CONTROL_UNDERLINE: char = '\x1f';
/// The control code to start or end strikethrough formatting.
pub const CONTROL_STRIKETHROUGH: char = '\x1e';
/// The control code to start or end monospace formatting.
pub const CONTROL_MONOSPACE: char = '\x11';
/// The control code to start or end reverse-color formatting.
pub const CONTROL_REVERSE: char = '\x16';

/// Color and hex-color escape sequences, with or without digit payloads.
///
/// Covers the bare two-digit form, the `fg,bg` digit form, the six-hex
/// form and the paired `fg,bg` hex form in one pattern.
static FORMATTING_SEQUENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\x03((\d{1,2},\d{2})|\d{2})?|\x04(([0-9a-fA-F]{6},[0-9a-fA-F]{6})|[0-9a-fA-F]{6})?",
    )
    .unwrap()
});

/// mIRC color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
    Blue,
    Green,
    LightRed,
    Brown,
    Purple,
    Orange,
    Yellow,
    LightGreen,
    Cyan,
    LightCyan,
    LightBlue,
    Pink,
    Grey,
    LightGrey,
}

impl Color {
    /// Every palette entry, in code order.
    pub const ALL: [Color; 16] = [
        Color::White,
        Color::Black,
        Color::Blue,
        Color::Green,
        Color::LightRed,
        Color::Brown,
        Color::Purple,
        Color::Orange,
        Color::Yellow,
        Color::LightGreen,
        Color::Cyan,
        Color::LightCyan,
        Color::LightBlue,
        Color::Pink,
        Color::Grey,
        Color::LightGrey,
    ];

    /// The two-digit mIRC code for this color.
    pub const fn code(self) -> &'static str {
        match self {
            Color::White => "00",
            Color::Black => "01",
            Color::Blue => "02",
            Color::Green => "03",
            Color::LightRed => "04",
            Color::Brown => "05",
            Color::Purple => "06",
            Color::Orange => "07",
            Color::Yellow => "08",
            Color::LightGreen => "09",
            Color::Cyan => "10",
            Color::LightCyan => "11",
            Color::LightBlue => "12",
            Color::Pink => "13",
            Color::Grey => "14",
            Color::LightGrey => "15",
        }
    }

    /// The canonical lowercase name for this color.
    pub const fn name(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::LightRed => "light_red",
            Color::Brown => "brown",
            Color::Purple => "purple",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::LightGreen => "light_green",
            Color::Cyan => "cyan",
            Color::LightCyan => "light_cyan",
            Color::LightBlue => "light_blue",
            Color::Pink => "pink",
            Color::Grey => "grey",
            Color::LightGrey => "light_grey",
        }
    }
}

impl FromStr for Color {
    type Err = FormatError;

    fn from_str(s: &str) -> FormatResult<Self> {
        let name = s.to_ascii_lowercase();
        Color::ALL
            .into_iter()
            .find(|color| color.name() == name)
            .ok_or(FormatError::UnknownColorName { name })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A color argument: either a palette entry or a raw numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpec {
    Palette(Color),
    Code(u8),
}

impl ColorSpec {
    /// The two-digit code sent on the wire.
    ///
    /// Numeric codes above 99 are rejected.
    fn resolve(self) -> FormatResult<String> {
        match self {
            ColorSpec::Palette(color) => Ok(color.code().to_string()),
            ColorSpec::Code(code) if code > 99 => Err(FormatError::ColorCodeOutOfRange {
                code: u16::from(code),
            }),
            ColorSpec::Code(code) => Ok(format!("{code:02}")),
        }
    }
}

impl From<Color> for ColorSpec {
    fn from(color: Color) -> Self {
        ColorSpec::Palette(color)
    }
}

impl From<u8> for ColorSpec {
    fn from(code: u8) -> Self {
        ColorSpec::Code(code)
    }
}

impl FromStr for ColorSpec {
    type Err = FormatError;

    /// Accepts a numeric code (`"04"`) or a palette name (`"light_red"`).
    fn from_str(s: &str) -> FormatResult<Self> {
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            return match s.parse::<u16>() {
                Ok(code) if code <= 99 => Ok(ColorSpec::Code(code as u8)),
                Ok(code) => Err(FormatError::ColorCodeOutOfRange { code }),
                Err(_) => Err(FormatError::ColorCodeOutOfRange { code: u16::MAX }),
            };
        }
        Color::from_str(s).map(ColorSpec::Palette)
    }
}

/// Return the text with the given colors applied in IRC formatting.
///
/// The background code is only emitted when given.
pub fn color(
    text: &str,
    fg: impl Into<ColorSpec>,
    bg: Option<ColorSpec>,
) -> FormatResult<String> {
    let fg = fg.into().resolve()?;
    match bg {
        Some(bg) => {
            let bg = bg.resolve()?;
            Ok(format!("{CONTROL_COLOR}{fg},{bg}{text}{CONTROL_COLOR}"))
        }
        None => Ok(format!("{CONTROL_COLOR}{fg}{text}{CONTROL_COLOR}")),
    }
}

/// Return the text with bold IRC formatting.
pub fn bold(text: &str) -> String {
    format!("{CONTROL_BOLD}{text}{CONTROL_BOLD}")
}

/// Return the text with italic IRC formatting.
pub fn italic(text: &str) -> String {
    format!("{CONTROL_ITALIC}{text}{CONTROL_ITALIC}")
}

/// Return the text with underline IRC formatting.
pub fn underline(text: &str) -> String {
    format!("{CONTROL_UNDERLINE}{text}{CONTROL_UNDERLINE}")
}

/// Return the text with strikethrough IRC formatting.
pub fn strikethrough(text: &str) -> String {
    format!("{CONTROL_STRIKETHROUGH}{text}{CONTROL_STRIKETHROUGH}")
}

/// Return the text without any IRC formatting.
///
/// Removes color and hex-color escape sequences, then every remaining
/// non-printing byte (the ASCII control range plus DEL). All other
/// characters, including multi-byte ones, pass through unchanged.
pub fn strip_formatting(text: &str) -> String {
    let stripped = if text.contains(CONTROL_COLOR) || text.contains(CONTROL_HEX_COLOR) {
        FORMATTING_SEQUENCE.replace_all(text, "")
    } else {
        Cow::Borrowed(text)
    };
    stripped
        .chars()
        .filter(|&c| c >= '\x20' && c != '\x7f')
        .collect()
}
