//! Editor configuration.
//!
//! Every field has a default so partial configuration files deserialize
//! cleanly; hosts usually load this from TOML (see the `sldraft` CLI).

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Default maximum number of undoable commands.
pub const DEFAULT_HISTORY_DEPTH: usize = 50;
/// Default grid spacing in world units.
pub const DEFAULT_GRID_SIZE: u32 = 20;

/// Tunables for an [`Editor`](crate::Editor) session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum depth of the undo stack; oldest entries are evicted.
    pub max_history_depth: usize,
    /// Lower zoom clamp.
    pub min_zoom: f64,
    /// Upper zoom clamp.
    pub max_zoom: f64,
    /// Zoom level for a fresh or reset view.
    pub default_zoom: f64,
    /// Grid spacing in world units.
    pub grid_size: u32,
    /// Whether the grid is drawn.
    pub grid_enabled: bool,
    /// Whether drags snap to the grid.
    pub snap_to_grid: bool,
    /// Extra hit-test slack in screen pixels.
    pub hit_tolerance: f64,
    /// Name of the layer created for a new editor (None = start without layers).
    pub default_layer: Option<String>,
    /// Conductor kind used by the connect tool when none is given.
    pub default_connection_kind: String,
    /// Initial viewport width in screen pixels.
    pub viewport_width: f64,
    /// Initial viewport height in screen pixels.
    pub viewport_height: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history_depth: DEFAULT_HISTORY_DEPTH,
            min_zoom: 0.1,
            max_zoom: 10.0,
            default_zoom: 1.0,
            grid_size: DEFAULT_GRID_SIZE,
            grid_enabled: true,
            snap_to_grid: false,
            hit_tolerance: 0.0,
            default_layer: Some("Default".to_string()),
            default_connection_kind: "conductor".to_string(),
            viewport_width: 1280.0,
            viewport_height: 800.0,
        }
    }
}

impl EditorConfig {
    /// Check the numeric fields for values the engine cannot work with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.grid_size == 0 {
            return Err(EngineError::InvalidGeometry(
                "grid_size must be positive".to_string(),
            ));
        }
        if self.min_zoom <= 0.0 || self.min_zoom > self.max_zoom {
            return Err(EngineError::InvalidGeometry(format!(
                "zoom range [{}, {}] is not valid",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.hit_tolerance < 0.0 {
            return Err(EngineError::InvalidGeometry(
                "hit_tolerance must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EditorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_history_depth, 50);
        assert_eq!(config.grid_size, 20);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{ "grid_size": 10 }"#).unwrap();
        assert_eq!(config.grid_size, 10);
        assert_eq!(config.max_history_depth, DEFAULT_HISTORY_DEPTH);
        assert!(!config.snap_to_grid);
    }

    #[test]
    fn test_invalid_grid_size() {
        let config = EditorConfig {
            grid_size: 0,
            ..EditorConfig::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::InvalidGeometry(_))));
    }

    #[test]
    fn test_invalid_zoom_range() {
        let config = EditorConfig {
            min_zoom: 5.0,
            max_zoom: 1.0,
            ..EditorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
