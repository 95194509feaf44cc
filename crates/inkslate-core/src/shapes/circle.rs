//! Circle shape.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{BezPath, Circle as KurboCircle, Point, Rect, Shape as KurboShape, Vec2};
use uuid::Uuid;

/// A circle centred on `start` whose radius reaches `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub(crate) id: ShapeId,
    /// Centre.
    pub start: Point,
    /// A point on the circumference.
    pub end: Point,
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Circle {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    pub fn radius(&self) -> f64 {
        (self.end - self.start).hypot()
    }
}

impl ShapeTrait for Circle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn local_bounds(&self) -> Rect {
        let r = self.radius();
        Rect::new(self.start.x - r, self.start.y - r, self.start.x + r, self.start.y + r)
    }

    fn hit_test_local(&self, point: Point, tolerance: f64) -> bool {
        (point - self.start).hypot() <= self.radius() + tolerance
    }

    fn to_path(&self) -> BezPath {
        KurboCircle::new(self.start, self.radius()).to_path(0.1)
    }

    fn centroid_local(&self) -> Point {
        self.start
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
