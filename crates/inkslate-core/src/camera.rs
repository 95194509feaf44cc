//! Camera module for pan/zoom transforms.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Camera manages the view transform for the canvas.
///
/// Screen to world is `(screen - pan) / zoom`, with independent zoom
/// factors per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan), in screen pixels.
    pub pan: Vec2,
    pub zoom_x: f64,
    pub zoom_y: f64,
    /// Minimum allowed zoom level
    pub min_zoom: f64,
    /// Maximum allowed zoom level
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom_x: 1.0,
            zoom_y: 1.0,
            min_zoom: 0.1,
            max_zoom: 5.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera with custom zoom limits.
    pub fn with_limits(min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            min_zoom,
            max_zoom,
            ..Self::default()
        }
    }

    /// World to screen transform, for rendering.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale_non_uniform(self.zoom_x, self.zoom_y)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan.x) / self.zoom_x,
            (screen.y - self.pan.y) / self.zoom_y,
        )
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.zoom_x + self.pan.x,
            world.y * self.zoom_y + self.pan.y,
        )
    }

    /// Convert a screen-space length to world units (using the smaller zoom).
    pub fn screen_to_world_len(&self, len: f64) -> f64 {
        len / self.zoom_x.min(self.zoom_y)
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Multiply both zoom factors by `factor`, keeping the world point under
    /// `anchor` fixed on screen.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let world = self.screen_to_world(anchor);
        self.zoom_x = (self.zoom_x * factor).clamp(self.min_zoom, self.max_zoom);
        self.zoom_y = (self.zoom_y * factor).clamp(self.min_zoom, self.max_zoom);
        // pan' = anchor - world * zoom'
        self.pan = Vec2::new(
            anchor.x - world.x * self.zoom_x,
            anchor.y - world.y * self.zoom_y,
        );
    }

    /// Reset camera to default position and zoom.
    pub fn reset(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom_x = 1.0;
        self.zoom_y = 1.0;
    }
}
