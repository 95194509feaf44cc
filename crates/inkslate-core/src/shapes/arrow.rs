//! Arrow shape.

use super::{ShapeId, ShapeStyle, ShapeTrait, point_to_segment_dist, points_bounds};
use crate::surface::Surface;
use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use std::f64::consts::PI;
use uuid::Uuid;

/// Length of each arrowhead barb.
pub const ARROW_HEAD_LENGTH: f64 = 10.0;
/// Angle between the shaft and each barb.
pub const ARROW_HEAD_ANGLE: f64 = PI / 6.0;

/// A line with an arrowhead at `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub(crate) id: ShapeId,
    /// Tail.
    pub start: Point,
    /// Tip.
    pub end: Point,
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Arrow {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    /// The two barb end points of the arrowhead.
    pub fn head_points(&self) -> [Point; 2] {
        let dir = self.end - self.start;
        let angle = dir.y.atan2(dir.x);
        let barb = |offset: f64| {
            let a = angle + offset;
            Point::new(
                self.end.x - ARROW_HEAD_LENGTH * a.cos(),
                self.end.y - ARROW_HEAD_LENGTH * a.sin(),
            )
        };
        [barb(-ARROW_HEAD_ANGLE), barb(ARROW_HEAD_ANGLE)]
    }
}

impl ShapeTrait for Arrow {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn local_bounds(&self) -> Rect {
        let [left, right] = self.head_points();
        points_bounds(&[self.start, self.end, left, right])
    }

    fn hit_test_local(&self, point: Point, tolerance: f64) -> bool {
        let [left, right] = self.head_points();
        point_to_segment_dist(point, self.start, self.end) <= tolerance
            || point_to_segment_dist(point, self.end, left) <= tolerance
            || point_to_segment_dist(point, self.end, right) <= tolerance
    }

    fn to_path(&self) -> BezPath {
        let [left, right] = self.head_points();
        let mut path = BezPath::new();
        path.move_to(self.start);
        path.line_to(self.end);
        path.move_to(left);
        path.line_to(self.end);
        path.line_to(right);
        path
    }

    fn centroid_local(&self) -> Point {
        self.start.midpoint(self.end)
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
        surface.stroke_path(
            &self.to_path(),
            self.style.stroke_with_opacity(),
            self.style.stroke_width,
            transform,
        );
    }
}
