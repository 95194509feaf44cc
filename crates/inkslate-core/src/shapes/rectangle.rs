//! Rectangle shape.

use super::{ShapeId, ShapeStyle, ShapeTrait, rect_contains};
use kurbo::{BezPath, Point, Rect, RoundedRect, Shape as KurboShape, Vec2};
use uuid::Uuid;

/// An axis-aligned rectangle between two anchor corners, optionally rounded.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub(crate) id: ShapeId,
    /// First corner (where the gesture started).
    pub start: Point,
    /// Opposite corner.
    pub end: Point,
    /// Rotation angle in radians (around center).
    pub rotation: f64,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Rectangle {
    /// Create a new rectangle from two corner points.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    /// Get the rectangle as a normalized kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }
}

impl ShapeTrait for Rectangle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn local_bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test_local(&self, point: Point, tolerance: f64) -> bool {
        rect_contains(self.as_rect().inflate(tolerance, tolerance), point)
    }

    fn to_path(&self) -> BezPath {
        let rect = self.as_rect();
        let max_radius = rect.width().min(rect.height()) / 2.0;
        let radius = self.style.corner_radius.min(max_radius);
        if radius > 0.0 {
            RoundedRect::from_rect(rect, radius).to_path(0.1)
        } else {
            rect.to_path(0.1)
        }
    }

    fn centroid_local(&self) -> Point {
        self.as_rect().center()
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
}
