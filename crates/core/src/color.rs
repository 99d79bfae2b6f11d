//! Font and highlight colors.
//!
//! Word stores run colors as six-digit hex strings and highlights as a fixed
//! palette of named tokens. Slides have no highlight palette, so every palette
//! entry is translated to an explicit RGB hex value.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Exactly six hex digits, nothing else.
static HEX_COLOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Fa-f]{6}$").unwrap());

/// An explicit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbColor {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parse a color from its six-digit hex form (`"1A2B3C"`).
    ///
    /// Anything that is not exactly six hex digits is a format error; the
    /// string is never truncated or padded.
    pub fn from_hex(hex: &str) -> Result<Self> {
        if !HEX_COLOR_REGEX.is_match(hex) {
            return Err(Error::format(format!(
                "malformed color '{}': expected 6 hex digits",
                hex
            )));
        }

        let byte = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|e| Error::format(format!("malformed color '{}': {}", hex, e)))
        };

        Ok(Self::new(byte(0..2)?, byte(2..4)?, byte(4..6)?))
    }

    /// Upper-case six-digit hex form, without a leading `#`.
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Highlight (text background) color from the 16-entry Word palette.
///
/// Values outside the palette are carried as [`HighlightColor::Unsupported`]
/// so that the decision to reject them is made when building slides, not while
/// reading the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HighlightColor {
    Black,
    Blue,
    BrightGreen,
    DarkBlue,
    DarkRed,
    DarkYellow,
    Gray25,
    Gray50,
    Green,
    Pink,
    Red,
    Teal,
    Turquoise,
    Violet,
    White,
    Yellow,
    /// A highlight value with no entry in the palette.
    Unsupported(String),
}

impl HighlightColor {
    /// Map a WordprocessingML `w:highlight/@w:val` token to a palette entry.
    ///
    /// Returns `None` for `none`, which means the run has no highlight.
    pub fn from_token(token: &str) -> Option<Self> {
        let color = match token {
            "none" => return None,
            "black" => Self::Black,
            "blue" => Self::Blue,
            "green" => Self::BrightGreen,
            "darkBlue" => Self::DarkBlue,
            "darkRed" => Self::DarkRed,
            "darkYellow" => Self::DarkYellow,
            "lightGray" => Self::Gray25,
            "darkGray" => Self::Gray50,
            "darkGreen" => Self::Green,
            "magenta" => Self::Pink,
            "red" => Self::Red,
            "darkCyan" => Self::Teal,
            "cyan" => Self::Turquoise,
            "darkMagenta" => Self::Violet,
            "white" => Self::White,
            "yellow" => Self::Yellow,
            other => Self::Unsupported(other.to_string()),
        };
        Some(color)
    }

    /// Hex value (no leading `#`) used for the slide highlight markup.
    ///
    /// Mapping based on the WdColor table of the Word object model.
    pub fn to_hex(&self) -> Result<&'static str> {
        let hex = match self {
            Self::Black => "000000",
            Self::Blue => "0000FF",
            Self::BrightGreen => "00FF00",
            Self::DarkBlue => "000080",
            Self::DarkRed => "800000",
            Self::DarkYellow => "808000",
            Self::Gray25 => "C0C0C0",
            Self::Gray50 => "808080",
            Self::Green => "008000",
            Self::Pink => "FF00FF",
            Self::Red => "FF0000",
            Self::Teal => "008080",
            Self::Turquoise => "00FFFF",
            Self::Violet => "800080",
            Self::White => "FFFFFF",
            Self::Yellow => "FFFF00",
            Self::Unsupported(value) => {
                return Err(Error::unsupported("highlight", value.clone()));
            }
        };
        Ok(hex)
    }

    /// Palette entry for an explicit hex value, if there is one.
    pub fn from_hex(hex: &str) -> Option<Self> {
        const PALETTE: [HighlightColor; 16] = [
            HighlightColor::Black,
            HighlightColor::Blue,
            HighlightColor::BrightGreen,
            HighlightColor::DarkBlue,
            HighlightColor::DarkRed,
            HighlightColor::DarkYellow,
            HighlightColor::Gray25,
            HighlightColor::Gray50,
            HighlightColor::Green,
            HighlightColor::Pink,
            HighlightColor::Red,
            HighlightColor::Teal,
            HighlightColor::Turquoise,
            HighlightColor::Violet,
            HighlightColor::White,
            HighlightColor::Yellow,
        ];

        PALETTE
            .into_iter()
            .find(|c| c.to_hex().is_ok_and(|h| h.eq_ignore_ascii_case(hex)))
    }
}
