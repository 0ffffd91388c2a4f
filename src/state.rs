//! Core constants and shared value types.
//!
//! This module contains the tuning constants for history loading and the
//! color type shared by the display configuration and the formatter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Constants
// ============================================================================

/// Number of lines per block for history loading and re-rendering
pub const BLOCK_LINE_COUNT: usize = 50;

/// Line count at which history loading switches to the worker pool
pub const CONCURRENT_LINE_THRESHOLD: usize = 1500;

/// Thread cap of the dedicated pool used for batch loads
pub const BATCH_WORKER_CAP: usize = 3;

/// Literal separating the record header from the message
pub const MESSAGE_SEPARATOR: &str = " >> ";

/// Delimiter between source path segments
pub const PATH_DELIMITER: &str = "::";

// ============================================================================
// Colors
// ============================================================================

/// An opaque RGB color, serialized as `#rrggbb`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb([r, g, b])
    }

    pub fn r(&self) -> u8 {
        self.0[0]
    }

    pub fn g(&self) -> u8 {
        self.0[1]
    }

    pub fn b(&self) -> u8 {
        self.0[2]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

/// Error returned when a color name is not of the form `#rrggbb`
#[derive(Debug, thiserror::Error)]
#[error("invalid color name `{0}`, expected #rrggbb")]
pub struct InvalidColor(String);

impl FromStr for Rgb {
    type Err = InvalidColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.is_ascii())
            .ok_or_else(|| InvalidColor(s.to_string()))?;

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| InvalidColor(s.to_string()))
        };

        Ok(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
    }
}

impl TryFrom<String> for Rgb {
    type Error = InvalidColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_display() {
        assert_eq!(Rgb::new(0x55, 0xaa, 0xff).to_string(), "#55aaff");
        assert_eq!(Rgb::new(0, 0, 0).to_string(), "#000000");
    }

    #[test]
    fn test_rgb_parse() {
        assert_eq!("#868686".parse::<Rgb>().unwrap(), Rgb::new(0x86, 0x86, 0x86));
        assert_eq!("#FFaa00".parse::<Rgb>().unwrap(), Rgb::new(0xff, 0xaa, 0x00));
        assert!("868686".parse::<Rgb>().is_err());
        assert!("#8686".parse::<Rgb>().is_err());
        assert!("#zz0000".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_rgb_serde() {
        let json = serde_json::to_string(&Rgb::new(0, 0, 0xff)).unwrap();
        assert_eq!(json, "\"#0000ff\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgb::new(0, 0, 0xff));
    }
}
