//! Editor tunables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors loading an [`EditorConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Numbers the interaction, history and persistence layers agree on.
///
/// Every field has a default, so a config file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of history snapshots kept.
    pub history_depth: usize,
    /// Offset applied to pasted copies, in world units.
    pub paste_offset: f64,
    /// Resize handle hit radius in screen pixels.
    pub handle_radius_px: f64,
    /// Gap between a shape and its selection frame, in screen pixels.
    pub handle_padding_px: f64,
    /// Distance of the rotate knob above the frame, in screen pixels.
    pub rotate_handle_offset_px: f64,
    pub rotate_knob_radius_px: f64,
    /// Slop for line/stroke hit tests, in world units.
    pub hit_tolerance: f64,
    pub eraser_radius: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom factor applied by `+`/`-`.
    pub key_zoom_step: f64,
    /// Wheel zoom factor per unit of scroll delta.
    pub wheel_zoom_speed: f64,
    /// Minimum time between thumbnail exports.
    pub thumbnail_interval_ms: u64,
    /// Time a save waits for further edits. 0 saves on the next tick.
    pub save_debounce_ms: u64,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 100,
            paste_offset: 20.0,
            handle_radius_px: 6.0,
            handle_padding_px: 6.0,
            rotate_handle_offset_px: 30.0,
            rotate_knob_radius_px: 6.0,
            hit_tolerance: crate::shapes::HIT_TOLERANCE,
            eraser_radius: 10.0,
            min_zoom: 0.1,
            max_zoom: 5.0,
            key_zoom_step: 1.2,
            wheel_zoom_speed: 0.0015,
            thumbnail_interval_ms: 8000,
            save_debounce_ms: 0,
            thumbnail_width: 640,
            thumbnail_height: 360,
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON text.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{"history_depth": 10, "max_zoom": 8.0}"#).unwrap();
        assert_eq!(config.history_depth, 10);
        assert!((config.max_zoom - 8.0).abs() < f64::EPSILON);
        assert!((config.min_zoom - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.thumbnail_interval_ms, 8000);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(EditorConfig::from_json("{"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            EditorConfig::from_json_file("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
