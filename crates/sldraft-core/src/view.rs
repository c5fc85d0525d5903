//! Canvas view state: pan, zoom, and grid settings.

use crate::config::EditorConfig;
use crate::error::{EngineError, EngineResult};
use crate::geometry;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Session-scoped view of the canvas.
///
/// `pan` is the world point shown at the top-left corner of the viewport,
/// so `screen = (world - pan) * zoom`. None of this is persisted with the
/// diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasViewState {
    /// Current zoom factor (1.0 = one world unit per pixel).
    pub zoom: f64,
    /// World-space pan offset.
    pub pan: Point,
    /// Grid spacing in world units.
    pub grid_size: u32,
    /// Whether the grid is drawn.
    pub grid_enabled: bool,
    /// Whether drags snap to the grid.
    pub snap_to_grid: bool,
    /// Viewport size in screen pixels.
    pub viewport: Size,
    /// Minimum allowed zoom level.
    pub min_zoom: f64,
    /// Maximum allowed zoom level.
    pub max_zoom: f64,
    default_zoom: f64,
}

impl Default for CanvasViewState {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl CanvasViewState {
    /// Create a view state from the editor configuration.
    pub fn new(config: &EditorConfig) -> Self {
        let default_zoom = config.default_zoom.clamp(config.min_zoom, config.max_zoom);
        Self {
            zoom: default_zoom,
            pan: Point::ZERO,
            grid_size: config.grid_size.max(1),
            grid_enabled: config.grid_enabled,
            snap_to_grid: config.snap_to_grid,
            viewport: Size::new(config.viewport_width, config.viewport_height),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            default_zoom,
        }
    }

    /// Convert a screen point to world coordinates.
    pub fn to_world(&self, screen: Point) -> Point {
        geometry::screen_to_world(screen, self)
    }

    /// Convert a world point to screen coordinates.
    pub fn to_screen(&self, world: Point) -> Point {
        geometry::world_to_screen(world, self)
    }

    /// Set the zoom level, clamped to the configured range.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Zoom by `factor`, keeping the world point under `screen_point` fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }
        let anchor = self.to_world(screen_point);
        self.zoom = new_zoom;
        self.pan = Point::new(
            anchor.x - screen_point.x / new_zoom,
            anchor.y - screen_point.y / new_zoom,
        );
    }

    /// Pan by a delta in screen pixels (content follows the pointer).
    pub fn pan_by_screen(&mut self, delta: Vec2) {
        self.pan -= delta / self.zoom;
    }

    /// Set the grid spacing.
    pub fn set_grid_size(&mut self, grid_size: u32) -> EngineResult<()> {
        if grid_size == 0 {
            return Err(EngineError::InvalidGeometry(
                "grid size must be positive".to_string(),
            ));
        }
        self.grid_size = grid_size;
        Ok(())
    }

    /// Toggle grid visibility.
    pub fn toggle_grid(&mut self) {
        self.grid_enabled = !self.grid_enabled;
    }

    /// Enable or disable snap-to-grid.
    pub fn set_snap_to_grid(&mut self, snap: bool) {
        self.snap_to_grid = snap;
    }

    /// Snap a world point if snapping is enabled, otherwise return it as is.
    pub fn snap(&self, point: Point) -> Point {
        if self.snap_to_grid {
            geometry::snap_to_grid(point, f64::from(self.grid_size))
        } else {
            point
        }
    }

    /// Set the viewport size in screen pixels.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Size::new(width, height);
    }

    /// Reset pan and zoom.
    pub fn reset(&mut self) {
        self.pan = Point::ZERO;
        self.zoom = self.default_zoom;
    }

    /// Fit the view to show the given world bounds with `padding` screen pixels.
    pub fn fit_to_bounds(&mut self, bounds: Rect, padding: f64) {
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            self.reset();
            return;
        }

        let available = Size::new(
            (self.viewport.width - padding * 2.0).max(1.0),
            (self.viewport.height - padding * 2.0).max(1.0),
        );
        let scale_x = available.width / bounds.width();
        let scale_y = available.height / bounds.height();
        self.zoom = scale_x.min(scale_y).clamp(self.min_zoom, self.max_zoom);

        let center = bounds.center();
        self.pan = Point::new(
            center.x - self.viewport.width / (2.0 * self.zoom),
            center.y - self.viewport.height / (2.0 * self.zoom),
        );
    }

    /// World-space rect currently visible in the viewport (for culling).
    pub fn visible_world_rect(&self) -> Rect {
        let top_left = self.to_world(Point::ZERO);
        let bottom_right = self.to_world(Point::new(self.viewport.width, self.viewport.height));
        geometry::rect_from_corners(top_left, bottom_right)
    }
}
