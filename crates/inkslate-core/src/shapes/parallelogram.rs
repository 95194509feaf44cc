//! Parallelogram shape.

use super::{
    ShapeId, ShapeStyle, ShapeTrait, points_bounds, polygon_hit, polygon_path, vertex_mean,
};
use kurbo::{BezPath, Point, Rect, Vec2};
use uuid::Uuid;

/// Horizontal skew as a fraction of the width.
pub const SKEW_RATIO: f64 = 0.3;

/// A parallelogram leaning right, spanned by its two anchors.
#[derive(Debug, Clone, PartialEq)]
pub struct Parallelogram {
    pub(crate) id: ShapeId,
    pub start: Point,
    pub end: Point,
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Parallelogram {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    /// Top-left, top-right, bottom-right, bottom-left.
    pub fn vertices(&self) -> [Point; 4] {
        let (sx, sy) = (self.start.x, self.start.y);
        let w = self.end.x - sx;
        let h = self.end.y - sy;
        let skew = w * SKEW_RATIO;
        [
            Point::new(sx, sy),
            Point::new(sx + w + skew, sy),
            Point::new(sx + w, sy + h),
            Point::new(sx - skew, sy + h),
        ]
    }
}

impl ShapeTrait for Parallelogram {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn local_bounds(&self) -> Rect {
        points_bounds(&self.vertices())
    }

    fn hit_test_local(&self, point: Point, tolerance: f64) -> bool {
        polygon_hit(&self.vertices(), point, tolerance)
    }

    fn to_path(&self) -> BezPath {
        polygon_path(&self.vertices())
    }

    fn centroid_local(&self) -> Point {
        vertex_mean(&self.vertices())
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
