//! Icon shape: an external image drawn into a box.

use super::{ShapeId, ShapeStyle, ShapeTrait, rect_contains};
use crate::surface::Surface;
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Vec2};
use uuid::Uuid;

/// An image reference stretched over its anchor box.
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    pub(crate) id: ShapeId,
    pub start: Point,
    pub end: Point,
    /// Image reference (path or URL) resolved by the surface.
    pub path: String,
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Icon {
    pub fn new(start: Point, end: Point, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            path: path.into(),
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }
}

impl ShapeTrait for Icon {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn local_bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    fn hit_test_local(&self, point: Point, tolerance: f64) -> bool {
        rect_contains(self.local_bounds().inflate(tolerance, tolerance), point)
    }

    fn to_path(&self) -> BezPath {
        self.local_bounds().to_path(0.1)
    }

    fn centroid_local(&self) -> Point {
        self.local_bounds().center()
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        self.start += delta;
        self.end += delta;
    }

    fn draw(&self, surface: &mut dyn Surface, transform: Affine) {
        surface.draw_image(&self.path, self.local_bounds(), transform);
    }
}
