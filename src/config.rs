//! Settings Module
//! User-tunable knobs for loading, previewing, charting and exporting.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Tokens treated as missing values when a cell matches one exactly.
pub const DEFAULT_MISSING_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Rows shown in a file preview.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How raw cells are interpreted while loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadSettings {
    pub missing_tokens: Vec<String>,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            missing_tokens: DEFAULT_MISSING_TOKENS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl LoadSettings {
    /// Whether a raw cell counts as missing.
    pub fn is_missing(&self, raw: &str) -> bool {
        raw.is_empty() || self.missing_tokens.iter().any(|t| t == raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportSettings {
    /// Worksheet name used for XLSX output.
    pub sheet_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            sheet_name: "Sheet1".to_string(),
        }
    }
}

/// Pixel size of rendered chart images.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
        }
    }
}

/// All settings, usually read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub load: LoadSettings,
    pub preview_rows: usize,
    pub export: ExportSettings,
    pub chart: ChartSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            load: LoadSettings::default(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
            export: ExportSettings::default(),
            chart: ChartSettings::default(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON text. Absent fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read settings from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
