//! Ellipse shape.

use super::{ShapeId, ShapeStyle, ShapeTrait, point_to_segment_dist};
use kurbo::{BezPath, Ellipse as KurboEllipse, Point, Rect, Shape as KurboShape, Vec2};
use uuid::Uuid;

/// An ellipse inscribed in the box spanned by its two anchors.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipse {
    pub(crate) id: ShapeId,
    pub start: Point,
    pub end: Point,
    /// Rotation angle in radians (around center).
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Ellipse {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    pub fn center(&self) -> Point {
        self.local_bounds().center()
    }

    /// Half-width and half-height.
    pub fn radii(&self) -> Vec2 {
        let rect = self.local_bounds();
        Vec2::new(rect.width() / 2.0, rect.height() / 2.0)
    }
}

impl ShapeTrait for Ellipse {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn local_bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    fn hit_test_local(&self, point: Point, tolerance: f64) -> bool {
        let center = self.center();
        let radii = self.radii();
        if radii.x < f64::EPSILON || radii.y < f64::EPSILON {
            // Collapsed to a segment (or a point)
            let a = center - radii;
            let b = center + radii;
            return point_to_segment_dist(point, a, b) <= tolerance;
        }
        let dx = (point.x - center.x) / (radii.x + tolerance);
        let dy = (point.y - center.y) / (radii.y + tolerance);
        dx * dx + dy * dy <= 1.0
    }

    fn to_path(&self) -> BezPath {
        KurboEllipse::from_rect(self.local_bounds()).to_path(0.1)
    }

    fn centroid_local(&self) -> Point {
        self.center()
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
