use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default font family applied to every overlay element
pub const DEFAULT_FONT: &str = "Noto Sans SC";

/// Editor tuning knobs.
///
/// Missing fields fall back to their defaults when deserializing, so a
/// config file only needs to mention what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Width of the box the source image is fitted into for display
    pub max_canvas_width: f32,
    /// Height of the box the source image is fitted into for display
    pub max_canvas_height: f32,
    /// Font family given to new elements and restored on reset
    pub default_font: String,
    /// Eraser diameter; recorded strokes use half of it as radius
    pub eraser_size: f32,
    /// Fraction of the detection size the covering rect grows by on each side
    pub cover_expand: f32,
    /// Distance of the background sample strips from the detection bounds
    pub background_margin: u32,
    /// Approximate number of pixels read from each background strip
    pub samples_per_strip: usize,
    /// Upper bound on strokes a single erase drag may record per element
    pub max_strokes_per_element: Option<usize>,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_step: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_canvas_width: 800.0,
            max_canvas_height: 600.0,
            default_font: DEFAULT_FONT.to_string(),
            eraser_size: 20.0,
            cover_expand: 0.1,
            background_margin: 5,
            samples_per_strip: 50,
            max_strokes_per_element: Some(10_000),
            min_zoom: 0.25,
            max_zoom: 4.0,
            zoom_step: 1.2,
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    /// Radius of one eraser stroke
    pub fn eraser_radius(&self) -> f32 {
        self.eraser_size / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = EditorConfig::from_json_str(r#"{ "eraser_size": 40 }"#).unwrap();
        assert_eq!(config.eraser_size, 40.0);
        assert_eq!(config.eraser_radius(), 20.0);
        assert_eq!(config.default_font, DEFAULT_FONT);
        assert_eq!(config.background_margin, 5);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let result = EditorConfig::from_json_str(r#"{ "eraser_size": "big" }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = EditorConfig::load("/definitely/not/here/overlay.json");
        assert!(matches!(result, Err(ConfigError::Read(_))));
    }
}
