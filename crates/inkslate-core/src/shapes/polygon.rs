//! Regular polygon shape.

use super::{
    ShapeId, ShapeStyle, ShapeTrait, points_bounds, polygon_hit, polygon_path,
};
use kurbo::{BezPath, Point, Rect, Vec2};
use std::f64::consts::{FRAC_PI_2, TAU};
use uuid::Uuid;

/// Fewest sides a polygon may have.
pub const MIN_SIDES: u8 = 3;

/// A regular polygon centred on `start`, circumradius reaching `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub(crate) id: ShapeId,
    /// Number of sides (at least 3).
    pub sides: u8,
    /// Centre.
    pub start: Point,
    /// Radius reference point.
    pub end: Point,
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Polygon {
    pub fn new(sides: u8, start: Point, end: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            sides: sides.max(MIN_SIDES),
            start,
            end,
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    pub fn radius(&self) -> f64 {
        (self.end - self.start).hypot()
    }

    /// Vertices, the first one pointing straight up.
    pub fn vertices(&self) -> Vec<Point> {
        let radius = self.radius();
        let n = self.sides.max(MIN_SIDES);
        let step = TAU / n as f64;
        (0..n)
            .map(|i| {
                let angle = i as f64 * step - FRAC_PI_2;
                Point::new(
                    self.start.x + radius * angle.cos(),
                    self.start.y + radius * angle.sin(),
                )
            })
            .collect()
    }
}

impl ShapeTrait for Polygon {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pentagon_vertices() {
        let pentagon = Polygon::new(5, Point::new(0.0, 0.0), Point::new(0.0, 10.0));
        let vertices = pentagon.vertices();
        assert_eq!(vertices.len(), 5);
        // First vertex points up
        assert!(vertices[0].x.abs() < 1e-9);
        assert!((vertices[0].y + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_sides_are_clamped() {
        let polygon = Polygon::new(1, Point::ZERO, Point::new(5.0, 0.0));
        assert_eq!(polygon.sides, MIN_SIDES);
        assert_eq!(polygon.vertices().len(), 3);
    }

    #[test]
    fn test_hexagon_hit() {
        let hexagon = Polygon::new(6, Point::new(50.0, 50.0), Point::new(80.0, 50.0));
        assert!(hexagon.hit_test_local(Point::new(60.0, 55.0), 0.0));
        assert!(!hexagon.hit_test_local(Point::new(85.0, 50.0), 0.0));
    }
}
