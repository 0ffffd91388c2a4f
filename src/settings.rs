//! JSON persistence for console settings.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::display::DisplayConfig;
use crate::error::{ConsoleError, Result};
use crate::state::Rgb;

/// Default file name for the settings written by a quick-start session
pub const DEFAULT_SETTINGS_FILE: &str = "ConsoleDefaultSettings.json";

/// Everything persisted between sessions
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    pub display: DisplayConfig,
    /// User palette offered by color pickers
    pub custom_colors: Vec<Rgb>,
    /// Flat filter state, `::`-joined path to enabled
    pub filter: BTreeMap<String, bool>,
}

impl ConsoleSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| ConsoleError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|source| ConsoleError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ConsoleError::Settings {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ConsoleError::io(parent, e))?;
        }
        fs::write(path, json).map_err(|e| ConsoleError::io(path, e))
    }

    /// Filter entries in replay order
    pub fn filter_entries(&self) -> impl Iterator<Item = (&str, bool)> {
        self.filter.iter().map(|(path, enabled)| (path.as_str(), *enabled))
    }
}
