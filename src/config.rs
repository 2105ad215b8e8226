//! Diagram geometry and layout options.

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagramConfig {
    pub entity_width: f64,
    pub margin_x: f64,
    pub margin_y: f64,
    pub entity_margin_x: f64,
    pub entity_margin_y: f64,
    pub header_height: f64,
    pub column_height: f64,
    pub zoom: f64,
    /// Hops of foreign-key expansion from the initial entities. 0 = unlimited.
    pub maximum_nesting_level: u32,
    /// Entities per row before wrapping. 0 = single row.
    pub maximum_columns_per_row: usize,
    /// Attach cardinality markers to relationship lines in addition to the dots.
    pub marker_ends: bool,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            entity_width: 200.0,
            margin_x: 20.0,
            margin_y: 20.0,
            entity_margin_x: 40.0,
            entity_margin_y: 20.0,
            header_height: 20.0,
            column_height: 20.0,
            zoom: 1.0,
            maximum_nesting_level: 0,
            maximum_columns_per_row: 0,
            marker_ends: false,
        }
    }
}

impl DiagramConfig {
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&source)
    }

    /// Replace out-of-range request values with usable defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.entity_margin_x < 1.0 {
            self.entity_margin_x = defaults.entity_margin_x;
        }
        if self.entity_margin_y < 1.0 {
            self.entity_margin_y = defaults.entity_margin_y;
        }
        if !(self.zoom >= 0.25) {
            self.zoom = defaults.zoom;
        }
        if self.entity_width < 1.0 {
            self.entity_width = defaults.entity_width;
        }
        self
    }

    /// Whether recursion may follow a reference found at `level`.
    pub fn allows_nesting(&self, level: u32) -> bool {
        self.maximum_nesting_level == 0 || level < self.maximum_nesting_level
    }

    pub fn needs_wrap(&self, entity_count: usize) -> bool {
        self.maximum_columns_per_row > 0 && entity_count > self.maximum_columns_per_row
    }
}
