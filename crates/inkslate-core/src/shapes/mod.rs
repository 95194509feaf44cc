//! Shape definitions for the whiteboard.

mod arrow;
mod circle;
mod code;
mod ellipse;
mod freedraw;
mod icon;
mod line;
mod parallelogram;
mod polygon;
mod record;
mod rectangle;
mod text;
mod triangle;

pub use arrow::Arrow;
pub use circle::Circle;
pub use code::Code;
pub use ellipse::Ellipse;
pub use freedraw::FreeDraw;
pub use icon::Icon;
pub use line::Line;
pub use parallelogram::Parallelogram;
pub use polygon::Polygon;
pub use record::{
    RecordPoint, ShapeRecord, decode_records, decode_shape, encode_shape, encode_shapes,
    parse_css_color,
};
pub use rectangle::Rectangle;
pub use text::{ADVANCE_RATIO, Text};
pub use triangle::Triangle;

use crate::surface::Surface;
use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distance within which a click counts as touching a line or stroke outline.
pub const HIT_TOLERANCE: f64 = 3.0;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Format as a CSS hex string (`#rrggbb`, or `#rrggbbaa` when not opaque).
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Apply an opacity multiplier to the alpha channel.
    pub fn with_opacity(&self, opacity: f64) -> Color {
        let alpha = (self.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
        Color::from_rgba8(self.r, self.g, self.b, alpha)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeStyle {
    /// Stroke color.
    pub stroke_color: SerializableColor,
    /// Stroke width. Text derives its font size from this.
    pub stroke_width: f64,
    /// Fill color (None = no fill).
    pub fill_color: Option<SerializableColor>,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    pub opacity: f64,
    /// Corner radius, interpreted by rectangles only.
    pub corner_radius: f64,
}

impl ShapeStyle {
    /// Get the stroke color with opacity applied.
    pub fn stroke_with_opacity(&self) -> Color {
        self.stroke_color.with_opacity(self.opacity)
    }

    /// Get the fill color with opacity applied.
    pub fn fill_with_opacity(&self) -> Option<Color> {
        self.fill_color.map(|c| c.with_opacity(self.opacity))
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 3.0,
            fill_color: None,
            opacity: 1.0,
            corner_radius: 0.0,
        }
    }
}

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// The variant tag of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Circle,
    Line,
    Arrow,
    Triangle,
    Polygon(u8),
    Parallelogram,
    FreeDraw,
    Text,
    Icon,
    Code,
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (point - *only).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Even-odd containment test for a closed polygon.
pub fn polygon_contains(vertices: &[Point], point: Point) -> bool {
    let mut inside = false;
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (vi, vj) = (vertices[i], vertices[j]);
        if (vi.y > point.y) != (vj.y > point.y) {
            let x_cross = vi.x + (point.y - vi.y) * (vj.x - vi.x) / (vj.y - vi.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Hit test for a closed polygon: inside, or within `tolerance` of its outline.
pub(crate) fn polygon_hit(vertices: &[Point], point: Point, tolerance: f64) -> bool {
    if polygon_contains(vertices, point) {
        return true;
    }
    let mut ring = vertices.to_vec();
    if let Some(first) = vertices.first() {
        ring.push(*first);
    }
    point_to_polyline_dist(point, &ring) <= tolerance
}

/// Closed path through the given vertices.
pub(crate) fn polygon_path(vertices: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = vertices.split_first() {
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        path.close_path();
    }
    path
}

/// Axis-aligned box around a set of points.
pub(crate) fn points_bounds(points: &[Point]) -> Rect {
    let mut iter = points.iter();
    let Some(first) = iter.next() else {
        return Rect::ZERO;
    };
    iter.fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
}

/// Mean of the given points.
pub(crate) fn vertex_mean(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::ZERO;
    }
    let sum = points
        .iter()
        .fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
    (sum / points.len() as f64).to_point()
}

/// Inclusive containment check (kurbo's `Rect::contains` excludes the far edges).
pub fn rect_contains(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Common trait for all shapes.
///
/// Geometry here is always the unrotated geometry; [`Shape`] applies the
/// rotation about the centre of [`ShapeTrait::local_bounds`].
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> ShapeId;

    /// Bounding box of the unrotated geometry.
    fn local_bounds(&self) -> Rect;

    /// Check if a point in the shape's unrotated frame hits this shape.
    fn hit_test_local(&self, point: Point, tolerance: f64) -> bool;

    /// Outline path for rendering, before rotation.
    fn to_path(&self) -> BezPath;

    /// A point that always hits the unrotated shape.
    fn centroid_local(&self) -> Point;

    /// Get the style.
    fn style(&self) -> &ShapeStyle;

    /// Get mutable style.
    fn style_mut(&mut self) -> &mut ShapeStyle;

    /// Move the shape by a world-space delta.
    fn translate(&mut self, delta: Vec2);

    /// Render the unrotated shape; `transform` already carries view and rotation.
    fn draw(&self, surface: &mut dyn Surface, transform: Affine) {
        let path = self.to_path();
        let style = self.style();
        if let Some(fill) = style.fill_with_opacity() {
            surface.fill_path(&path, fill, transform);
        }
        surface.stroke_path(&path, style.stroke_with_opacity(), style.stroke_width, transform);
    }
}

/// Placeholder for a record that could not be decoded.
///
/// Keeps the raw record so writing the document back does not lose it.
#[derive(Debug, Clone, PartialEq)]
pub struct NullShape {
    pub(crate) id: ShapeId,
    /// The undecodable record, written back verbatim on save.
    pub raw: Option<serde_json::Value>,
    style: ShapeStyle,
}

impl NullShape {
    pub fn new(raw: Option<serde_json::Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            raw,
            style: ShapeStyle::default(),
        }
    }
}

impl ShapeTrait for NullShape {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn local_bounds(&self) -> Rect {
        Rect::ZERO
    }

    fn hit_test_local(&self, _point: Point, _tolerance: f64) -> bool {
        false
    }

    fn to_path(&self) -> BezPath {
        BezPath::new()
    }

    fn centroid_local(&self) -> Point {
        Point::ZERO
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, _delta: Vec2) {}

    fn draw(&self, _surface: &mut dyn Surface, _transform: Affine) {}
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Shape::Rectangle($s) => $body,
            Shape::Ellipse($s) => $body,
            Shape::Circle($s) => $body,
            Shape::Line($s) => $body,
            Shape::Arrow($s) => $body,
            Shape::Triangle($s) => $body,
            Shape::Polygon($s) => $body,
            Shape::Parallelogram($s) => $body,
            Shape::FreeDraw($s) => $body,
            Shape::Text($s) => $body,
            Shape::Icon($s) => $body,
            Shape::Code($s) => $body,
            Shape::Null($s) => $body,
        }
    };
}

/// Enum wrapper for all shape types.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Circle(Circle),
    Line(Line),
    Arrow(Arrow),
    Triangle(Triangle),
    Polygon(Polygon),
    Parallelogram(Parallelogram),
    FreeDraw(FreeDraw),
    Text(Text),
    Icon(Icon),
    Code(Code),
    Null(NullShape),
}

impl Shape {
    pub fn id(&self) -> ShapeId {
        dispatch!(self, s => s.id())
    }

    /// Variant tag, or `None` for the null placeholder.
    pub fn kind(&self) -> Option<ShapeKind> {
        Some(match self {
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Ellipse(_) => ShapeKind::Ellipse,
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Line(_) => ShapeKind::Line,
            Shape::Arrow(_) => ShapeKind::Arrow,
            Shape::Triangle(_) => ShapeKind::Triangle,
            Shape::Polygon(p) => ShapeKind::Polygon(p.sides),
            Shape::Parallelogram(_) => ShapeKind::Parallelogram,
            Shape::FreeDraw(_) => ShapeKind::FreeDraw,
            Shape::Text(_) => ShapeKind::Text,
            Shape::Icon(_) => ShapeKind::Icon,
            Shape::Code(_) => ShapeKind::Code,
            Shape::Null(_) => return None,
        })
    }

    pub fn style(&self) -> &ShapeStyle {
        dispatch!(self, s => s.style())
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        dispatch!(self, s => s.style_mut())
    }

    /// Get the rotation angle in radians.
    pub fn rotation(&self) -> f64 {
        match self {
            Shape::Rectangle(s) => s.rotation,
            Shape::Ellipse(s) => s.rotation,
            Shape::Circle(s) => s.rotation,
            Shape::Line(s) => s.rotation,
            Shape::Arrow(s) => s.rotation,
            Shape::Triangle(s) => s.rotation,
            Shape::Polygon(s) => s.rotation,
            Shape::Parallelogram(s) => s.rotation,
            Shape::FreeDraw(s) => s.rotation,
            Shape::Text(s) => s.rotation,
            Shape::Icon(s) => s.rotation,
            Shape::Code(s) => s.rotation,
            Shape::Null(_) => 0.0,
        }
    }

    /// Set the rotation angle in radians.
    pub fn set_rotation(&mut self, rotation: f64) {
        let rotation = if rotation.is_finite() { rotation } else { 0.0 };
        match self {
            Shape::Rectangle(s) => s.rotation = rotation,
            Shape::Ellipse(s) => s.rotation = rotation,
            Shape::Circle(s) => s.rotation = rotation,
            Shape::Line(s) => s.rotation = rotation,
            Shape::Arrow(s) => s.rotation = rotation,
            Shape::Triangle(s) => s.rotation = rotation,
            Shape::Polygon(s) => s.rotation = rotation,
            Shape::Parallelogram(s) => s.rotation = rotation,
            Shape::FreeDraw(s) => s.rotation = rotation,
            Shape::Text(s) => s.rotation = rotation,
            Shape::Icon(s) => s.rotation = rotation,
            Shape::Code(s) => s.rotation = rotation,
            Shape::Null(_) => {}
        }
    }

    /// Centre of the unrotated geometry; rotation pivots here.
    pub fn center(&self) -> Point {
        dispatch!(self, s => s.local_bounds().center())
    }

    /// Rotation about [`Shape::center`].
    pub fn rotation_transform(&self) -> Affine {
        let rotation = self.rotation();
        if rotation == 0.0 {
            Affine::IDENTITY
        } else {
            Affine::rotate_about(rotation, self.center())
        }
    }

    /// Axis-aligned bounding box in world coordinates, rotation included.
    pub fn bounds(&self) -> Rect {
        let local = dispatch!(self, s => s.local_bounds());
        if self.rotation() == 0.0 {
            return local;
        }
        let affine = self.rotation_transform();
        let corners = [
            affine * Point::new(local.x0, local.y0),
            affine * Point::new(local.x1, local.y0),
            affine * Point::new(local.x1, local.y1),
            affine * Point::new(local.x0, local.y1),
        ];
        points_bounds(&corners)
    }

    /// Check if a point (in world coordinates) hits this shape.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let local = if self.rotation() == 0.0 {
            point
        } else {
            self.rotation_transform().inverse() * point
        };
        dispatch!(self, s => s.hit_test_local(local, tolerance))
    }

    /// A world-space point that always hits this shape.
    pub fn centroid(&self) -> Point {
        let local = dispatch!(self, s => s.centroid_local());
        self.rotation_transform() * local
    }

    /// Outline path in world coordinates, rotation included.
    pub fn to_path(&self) -> BezPath {
        let path = dispatch!(self, s => s.to_path());
        self.rotation_transform() * path
    }

    /// Move the shape by a world-space delta.
    pub fn translate(&mut self, delta: Vec2) {
        dispatch!(self, s => s.translate(delta))
    }

    /// Render the shape under the given world-to-screen transform.
    pub fn draw(&self, surface: &mut dyn Surface, view: Affine) {
        let transform = view * self.rotation_transform();
        dispatch!(self, s => s.draw(surface, transform))
    }

    /// Anchor points for shapes defined by a start/end pair.
    pub fn anchors(&self) -> Option<(Point, Point)> {
        match self {
            Shape::Rectangle(s) => Some((s.start, s.end)),
            Shape::Ellipse(s) => Some((s.start, s.end)),
            Shape::Circle(s) => Some((s.start, s.end)),
            Shape::Line(s) => Some((s.start, s.end)),
            Shape::Arrow(s) => Some((s.start, s.end)),
            Shape::Triangle(s) => Some((s.start, s.end)),
            Shape::Polygon(s) => Some((s.start, s.end)),
            Shape::Parallelogram(s) => Some((s.start, s.end)),
            Shape::Text(s) => Some((s.start, s.end)),
            Shape::Icon(s) => Some((s.start, s.end)),
            Shape::Code(s) => Some((s.start, s.end)),
            Shape::FreeDraw(_) | Shape::Null(_) => None,
        }
    }

    /// Replace the anchor points. No-op for point-list shapes.
    pub fn set_anchors(&mut self, start: Point, end: Point) {
        match self {
            Shape::Rectangle(s) => (s.start, s.end) = (start, end),
            Shape::Ellipse(s) => (s.start, s.end) = (start, end),
            Shape::Circle(s) => (s.start, s.end) = (start, end),
            Shape::Line(s) => (s.start, s.end) = (start, end),
            Shape::Arrow(s) => (s.start, s.end) = (start, end),
            Shape::Triangle(s) => (s.start, s.end) = (start, end),
            Shape::Polygon(s) => (s.start, s.end) = (start, end),
            Shape::Parallelogram(s) => (s.start, s.end) = (start, end),
            Shape::Text(s) => (s.start, s.end) = (start, end),
            Shape::Icon(s) => (s.start, s.end) = (start, end),
            Shape::Code(s) => (s.start, s.end) = (start, end),
            Shape::FreeDraw(_) | Shape::Null(_) => {}
        }
    }

    /// Whether this shape holds editable text content.
    pub fn is_text_like(&self) -> bool {
        matches!(self, Shape::Text(_) | Shape::Code(_))
    }

    /// Append a character to Text/Code content. Returns false for other shapes.
    pub fn push_char(&mut self, ch: char) -> bool {
        match self {
            Shape::Text(t) => {
                t.push_char(ch);
                true
            }
            Shape::Code(c) => {
                c.push_char(ch);
                true
            }
            _ => false,
        }
    }

    /// Remove the last character of Text/Code content. Returns true if one was removed.
    pub fn pop_char(&mut self) -> bool {
        match self {
            Shape::Text(t) => t.pop_char().is_some(),
            Shape::Code(c) => c.pop_char().is_some(),
            _ => false,
        }
    }

    /// Regenerate the shape's ID with a new unique identifier.
    /// This is used when pasting shapes to ensure they have unique IDs.
    pub fn regenerate_id(&mut self) {
        let new_id = Uuid::new_v4();
        dispatch!(self, s => s.id = new_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::ParamCurve;

    fn every_variant() -> Vec<Shape> {
        let a = Point::new(10.0, 10.0);
        let b = Point::new(110.0, 60.0);
        let mut freedraw = FreeDraw::new(a);
        freedraw.add_point(Point::new(40.0, 30.0));
        freedraw.add_point(b);
        vec![
            Shape::Rectangle(Rectangle::new(a, b)),
            Shape::Ellipse(Ellipse::new(a, b)),
            Shape::Circle(Circle::new(a, b)),
            Shape::Line(Line::new(a, b)),
            Shape::Arrow(Arrow::new(a, b)),
            Shape::Triangle(Triangle::new(a, b)),
            Shape::Polygon(Polygon::new(5, a, b)),
            Shape::Polygon(Polygon::new(6, a, b)),
            Shape::Parallelogram(Parallelogram::new(a, b)),
            Shape::FreeDraw(freedraw),
            Shape::Text(Text::new(a, b)),
            Shape::Icon(Icon::new(a, b, "icons/server.svg")),
            Shape::Code(Code::new(a, b)),
        ]
    }

    #[test]
    fn test_centroid_hits_and_far_point_misses() {
        for mut shape in every_variant() {
            for rotation in [0.0, 0.7, -2.1] {
                shape.set_rotation(rotation);
                let centroid = shape.centroid();
                assert!(shape.hit_test(centroid, HIT_TOLERANCE), "{:?} at {rotation}", shape.kind());
                let bounds = shape.bounds();
                let far = Point::new(bounds.x1 + 500.0, bounds.y1 + 500.0);
                assert!(!shape.hit_test(far, HIT_TOLERANCE), "{:?} at {rotation}", shape.kind());
            }
        }
    }

    #[test]
    fn test_rotated_bounds_contain_outline() {
        for mut shape in every_variant() {
            shape.set_rotation(1.0);
            let bounds = shape.bounds().inflate(1e-6, 1e-6);
            let path = shape.to_path();
            for seg in path.segments() {
                let p = seg.eval(0.5);
                assert!(rect_contains(bounds, p), "{:?}", shape.kind());
            }
        }
    }

    #[test]
    fn test_degenerate_shapes_do_not_panic() {
        let p = Point::new(5.0, 5.0);
        let shapes = vec![
            Shape::Rectangle(Rectangle::new(p, p)),
            Shape::Ellipse(Ellipse::new(p, p)),
            Shape::Circle(Circle::new(p, p)),
            Shape::Line(Line::new(p, p)),
            Shape::Arrow(Arrow::new(p, p)),
            Shape::Triangle(Triangle::new(p, p)),
            Shape::Polygon(Polygon::new(3, p, p)),
            Shape::Parallelogram(Parallelogram::new(p, p)),
            Shape::FreeDraw(FreeDraw::new(p)),
        ];
        for shape in shapes {
            let bounds = shape.bounds();
            assert!(bounds.x0.is_finite() && bounds.y1.is_finite());
            assert!(shape.hit_test(p, HIT_TOLERANCE), "{:?}", shape.kind());
            let _ = shape.to_path();
        }
    }

    #[test]
    fn test_translate_moves_anchors() {
        let mut shape = Shape::Rectangle(Rectangle::new(Point::new(10.0, 10.0), Point::new(110.0, 60.0)));
        shape.translate(Vec2::new(5.0, 5.0));
        let (start, end) = shape.anchors().unwrap();
        assert_eq!(start, Point::new(15.0, 15.0));
        assert_eq!(end, Point::new(115.0, 65.0));
    }

    #[test]
    fn test_null_shape_is_inert() {
        let shape = Shape::Null(NullShape::new(None));
        assert!(!shape.hit_test(Point::ZERO, 100.0));
        assert_eq!(shape.bounds(), Rect::ZERO);
        assert!(shape.kind().is_none());
    }

    #[test]
    fn test_regenerate_id() {
        let mut shape = Shape::Line(Line::new(Point::ZERO, Point::new(1.0, 1.0)));
        let before = shape.id();
        shape.regenerate_id();
        assert_ne!(before, shape.id());
    }

    #[test]
    fn test_css_color_format() {
        assert_eq!(SerializableColor::new(255, 0, 16, 255).to_css(), "#ff0010");
        assert_eq!(SerializableColor::new(0, 0, 0, 128).to_css(), "#00000080");
    }

    #[test]
    fn test_polygon_contains() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(polygon_contains(&square, Point::new(5.0, 5.0)));
        assert!(!polygon_contains(&square, Point::new(15.0, 5.0)));
    }
}
