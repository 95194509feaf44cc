//! Free-hand stroke shape.

use super::{ShapeId, ShapeStyle, ShapeTrait, point_to_polyline_dist, points_bounds};
use crate::surface::Surface;
use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use uuid::Uuid;

/// A free-hand stroke kept as the raw list of sampled points.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeDraw {
    pub(crate) id: ShapeId,
    /// Sampled points, in drawing order.
    pub points: Vec<Point>,
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl FreeDraw {
    /// Start a stroke at `first`.
    pub fn new(first: Point) -> Self {
        Self::from_points(vec![first])
    }

    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    /// Append a sampled point.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Whether any sampled point lies within `radius` of `point` on both axes.
    pub fn has_point_near(&self, point: Point, radius: f64) -> bool {
        self.points
            .iter()
            .any(|p| (p.x - point.x).abs() <= radius && (p.y - point.y).abs() <= radius)
    }
}

impl ShapeTrait for FreeDraw {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn local_bounds(&self) -> Rect {
        points_bounds(&self.points)
    }

    fn hit_test_local(&self, point: Point, tolerance: f64) -> bool {
        point_to_polyline_dist(point, &self.points) <= tolerance
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if let Some((first, rest)) = self.points.split_first() {
            path.move_to(*first);
            if rest.is_empty() {
                // A dot still renders with round-ish caps
                path.line_to(*first);
            }
            for p in rest {
                path.line_to(*p);
            }
        }
        path
    }

    fn centroid_local(&self) -> Point {
        self.points
            .get(self.points.len() / 2)
            .copied()
            .unwrap_or(Point::ZERO)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            *p += delta;
        }
    }

    fn draw(&self, surface: &mut dyn Surface, transform: Affine) {
        if self.points.is_empty() {
            return;
        }
        surface.stroke_path(
            &self.to_path(),
            self.style.stroke_with_opacity(),
            self.style.stroke_width,
            transform,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_point_extends_bounds() {
        let mut stroke = FreeDraw::new(Point::new(0.0, 0.0));
        stroke.add_point(Point::new(10.0, 5.0));
        stroke.add_point(Point::new(20.0, -5.0));
        let bounds = stroke.local_bounds();
        assert!((bounds.x1 - 20.0).abs() < f64::EPSILON);
        assert!((bounds.y0 + 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_along_stroke() {
        let mut stroke = FreeDraw::new(Point::new(0.0, 0.0));
        stroke.add_point(Point::new(100.0, 0.0));
        assert!(stroke.hit_test_local(Point::new(50.0, 2.0), 3.0));
        assert!(!stroke.hit_test_local(Point::new(50.0, 10.0), 3.0));
    }

    #[test]
    fn test_point_proximity_is_axis_aligned() {
        let stroke = FreeDraw::from_points(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
        assert!(stroke.has_point_near(Point::new(9.0, 9.0), 10.0));
        assert!(!stroke.has_point_near(Point::new(50.0, 0.0), 10.0));
    }

    #[test]
    fn test_empty_stroke_is_safe() {
        let stroke = FreeDraw::from_points(Vec::new());
        assert_eq!(stroke.local_bounds(), Rect::ZERO);
        assert!(!stroke.hit_test_local(Point::ZERO, 3.0));
    }
}
