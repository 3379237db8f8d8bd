//! Engine configuration.

use crate::render::LinePalette;
use crate::shapes::SerializableColor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunables for a diagram. Every field has a default, so a config file only
/// needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    /// Grid spacing in world units.
    pub grid_size: i32,
    /// Whether the dot grid is drawn on new diagrams.
    pub show_grid: bool,
    /// Pick radius around shape connectors.
    pub connector_hit_radius: f64,
    /// Pick radius around connection endpoints.
    pub endpoint_hit_radius: f64,
    /// Pick distance from a connection line.
    pub line_hit_radius: f64,
    /// Default line colors for new diagrams.
    pub palette: LinePalette,
    /// Default background color for new diagrams.
    pub background_color: SerializableColor,
    /// Grid dot color.
    pub grid_color: SerializableColor,
    /// Deleting a shape also deletes the connections wired to it.
    pub cascade_delete: bool,
    /// Abort loading on the first unknown shape kind instead of skipping it.
    pub strict_load: bool,
    /// Key mixed into document signatures.
    pub signing_key: String,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            show_grid: false,
            connector_hit_radius: 6.0,
            endpoint_hit_radius: 5.0,
            line_hit_radius: 3.0,
            palette: LinePalette::default(),
            background_color: SerializableColor::new(240, 240, 240, 255),
            grid_color: SerializableColor::new(160, 160, 160, 255),
            cascade_delete: true,
            strict_load: false,
            signing_key: "flowink".to_string(),
        }
    }
}

impl DiagramConfig {
    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Serialize the config to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
