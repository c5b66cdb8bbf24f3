//! Parameter types for compositing and encoding.
//!
//! - [`Quality`]: JPEG quality (1–100, default 75). Clamped on construction.
//! - [`CanvasSize`]: fixed output raster size (default 3590×3590).
//! - [`Background`]: opaque colour that JPEG output flattens alpha onto.
//! - [`OutputFormat`]: JPEG or PNG, with its MIME type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const DEFAULT: CanvasSize = CanvasSize {
        width: 3590,
        height: 3590,
    };
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for CanvasSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An opaque RGB colour written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Background(pub [u8; 3]);

impl TryFrom<String> for Background {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Background> for String {
    fn from(value: Background) -> Self {
        value.to_string()
    }
}

impl FromStr for Background {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| format!("expected #rrggbb, got '{s}'"))?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| format!("bad hex colour '{s}'"))
        };
        Ok(Self([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }
}

/// Everything an encoder needs besides the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    pub quality: Quality,
    pub background: Background,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_75() {
        assert_eq!(Quality::default().value(), 75);
    }

    #[test]
    fn canvas_default_is_square_3590() {
        assert_eq!(CanvasSize::default(), CanvasSize::DEFAULT);
        assert_eq!(CanvasSize::default().to_string(), "3590x3590");
    }

    #[test]
    fn background_parses_hex() {
        assert_eq!("#000000".parse::<Background>(), Ok(Background([0, 0, 0])));
        assert_eq!(
            "#ff8000".parse::<Background>(),
            Ok(Background([255, 128, 0]))
        );
        assert_eq!(Background([255, 128, 0]).to_string(), "#ff8000");
    }

    #[test]
    fn background_rejects_malformed() {
        assert!("000000".parse::<Background>().is_err());
        assert!("#fff".parse::<Background>().is_err());
        assert!("#gggggg".parse::<Background>().is_err());
        assert!("#ffé00".parse::<Background>().is_err());
        assert!("#+f+f+f".parse::<Background>().is_err());
        assert!("#-1ffff".parse::<Background>().is_err());
    }

    #[test]
    fn format_mime_type() {
        assert_eq!(OutputFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(OutputFormat::Png.mime_type(), "image/png");
    }
}
