//! Triangle shape.

use super::{
    ShapeId, ShapeStyle, ShapeTrait, points_bounds, polygon_hit, polygon_path, vertex_mean,
};
use kurbo::{BezPath, Point, Rect, Vec2};
use uuid::Uuid;

/// An isosceles triangle with its apex at `start` and its base through `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub(crate) id: ShapeId,
    /// Apex.
    pub start: Point,
    /// Bottom-right corner.
    pub end: Point,
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Triangle {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    /// Apex, bottom-right, bottom-left (mirror of `end` about the apex).
    pub fn vertices(&self) -> [Point; 3] {
        [
            self.start,
            self.end,
            Point::new(2.0 * self.start.x - self.end.x, self.end.y),
        ]
    }
}

impl ShapeTrait for Triangle {
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
