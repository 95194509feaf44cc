//! Text shape with engine-owned layout.

use super::{ShapeId, ShapeStyle, ShapeTrait, rect_contains};
use crate::surface::Surface;
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Size, Vec2};
use peniko::Color;
use uuid::Uuid;

/// Text drawn while the content is empty.
pub const PLACEHOLDER: &str = "type something...";
/// Padding between the anchor and the first glyph.
pub const TEXT_PADDING: Vec2 = Vec2::new(4.0, 4.0);
/// Approximate glyph advance as a fraction of the font size.
pub const ADVANCE_RATIO: f64 = 0.6;

/// Measure a block of text laid out with fixed-advance glyphs.
pub(crate) fn measure(content: &str, font_size: f64, line_height: f64) -> Size {
    let mut lines = 0usize;
    let mut widest = 0usize;
    for line in content.split('\n') {
        lines += 1;
        widest = widest.max(line.chars().count());
    }
    Size::new(widest as f64 * font_size * ADVANCE_RATIO, lines as f64 * line_height)
}

/// A block of text anchored at its top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub(crate) id: ShapeId,
    /// Top-left anchor.
    pub start: Point,
    /// Opposite corner of the initial box.
    pub end: Point,
    /// Text content (may be empty).
    pub content: String,
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Text {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            content: String::new(),
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    /// Font size derived from the stroke width.
    pub fn font_size(&self) -> f64 {
        (self.style.stroke_width * 10.0).max(1.0)
    }

    pub fn line_height(&self) -> f64 {
        self.font_size() + 4.0
    }

    /// The string actually laid out: the content, or the placeholder when empty.
    pub fn display_text(&self) -> &str {
        if self.content.is_empty() {
            PLACEHOLDER
        } else {
            &self.content
        }
    }

    /// Box occupied by the laid out text, padding included.
    pub fn layout_box(&self) -> Rect {
        let size = measure(self.display_text(), self.font_size(), self.line_height());
        Rect::from_origin_size(
            self.start,
            Size::new(size.width + 2.0 * TEXT_PADDING.x, size.height + 2.0 * TEXT_PADDING.y),
        )
    }

    /// Append one character.
    pub fn push_char(&mut self, ch: char) {
        self.content.push(ch);
    }

    /// Remove the last character, if any.
    pub fn pop_char(&mut self) -> Option<char> {
        self.content.pop()
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn local_bounds(&self) -> Rect {
        self.layout_box().union(Rect::from_points(self.start, self.end))
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
        let color = if self.content.is_empty() {
            Color::from_rgba8(150, 150, 150, 255)
        } else {
            self.style.stroke_with_opacity()
        };
        let font_size = self.font_size();
        let origin = self.start + TEXT_PADDING;
        for (i, line) in self.display_text().split('\n').enumerate() {
            let line_origin = origin + Vec2::new(0.0, i as f64 * self.line_height());
            surface.draw_text(line, line_origin, font_size, color, transform);
        }
    }
}
