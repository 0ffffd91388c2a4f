//! Display preferences for the console.
//!
//! Field toggles, the per-level enable mask and the color table. Everything
//! here is plain data: the formatter reads a snapshot of it per render.

use serde::{Deserialize, Serialize};

use crate::parsers::Level;
use crate::state::Rgb;

/// Which header fields are rendered in front of the message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayFields {
    pub date: bool,
    pub time: bool,
    /// Only honored while `time` is on
    pub time_millis: bool,
    pub level: bool,
    pub source: bool,
}

impl Default for DisplayFields {
    fn default() -> Self {
        Self {
            date: false,
            time: true,
            time_millis: true,
            level: false,
            source: true,
        }
    }
}

/// Per-level enable mask
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelMask {
    pub debug: bool,
    pub info: bool,
    pub warning: bool,
    pub critical: bool,
    pub fatal: bool,
}

impl Default for LevelMask {
    fn default() -> Self {
        Self {
            debug: true,
            info: true,
            warning: true,
            critical: true,
            fatal: true,
        }
    }
}

impl LevelMask {
    pub fn is_enabled(&self, level: Level) -> bool {
        match level {
            Level::Debug => self.debug,
            Level::Info => self.info,
            Level::Warning => self.warning,
            Level::Critical => self.critical,
            Level::Fatal => self.fatal,
        }
    }

    pub fn set(&mut self, level: Level, enabled: bool) {
        let slot = match level {
            Level::Debug => &mut self.debug,
            Level::Info => &mut self.info,
            Level::Warning => &mut self.warning,
            Level::Critical => &mut self.critical,
            Level::Fatal => &mut self.fatal,
        };
        *slot = enabled;
    }
}

/// Foreground colors per field kind and per level, plus the two
/// backgrounds used for severe levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorTable {
    pub date: Rgb,
    pub time: Rgb,
    pub level: Rgb,
    pub source: Rgb,
    pub debug: Rgb,
    pub info: Rgb,
    pub warning: Rgb,
    pub critical: Rgb,
    pub fatal: Rgb,
    pub critical_background: Rgb,
    pub fatal_background: Rgb,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self {
            date: Rgb::new(0x00, 0x00, 0xff),
            time: Rgb::new(0xaa, 0x00, 0xff),
            level: Rgb::new(0x55, 0xff, 0x00),
            source: Rgb::new(0x55, 0xaa, 0xff),
            debug: Rgb::new(0x00, 0x00, 0x00),
            info: Rgb::new(0x00, 0x00, 0xff),
            warning: Rgb::new(0xff, 0xaa, 0x00),
            critical: Rgb::new(0xff, 0x00, 0x00),
            fatal: Rgb::new(0xff, 0x00, 0x00),
            critical_background: Rgb::new(0x86, 0x86, 0x86),
            fatal_background: Rgb::new(0x00, 0x00, 0x00),
        }
    }
}

impl ColorTable {
    /// Foreground of a message at `level`
    pub fn message_color(&self, level: Level) -> Rgb {
        match level {
            Level::Debug => self.debug,
            Level::Info => self.info,
            Level::Warning => self.warning,
            Level::Critical => self.critical,
            Level::Fatal => self.fatal,
        }
    }

    /// Background of a message at `level`, set for Critical and Fatal only
    pub fn background(&self, level: Level) -> Option<Rgb> {
        match level {
            Level::Critical => Some(self.critical_background),
            Level::Fatal => Some(self.fatal_background),
            _ => None,
        }
    }
}

/// Everything that decides how a record is rendered
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub fields: DisplayFields,
    pub levels: LevelMask,
    pub colors: ColorTable,
    /// One colored run per field instead of a single line in the level color
    pub extended_colors: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fields: DisplayFields::default(),
            levels: LevelMask::default(),
            colors: ColorTable::default(),
            extended_colors: true,
        }
    }
}
