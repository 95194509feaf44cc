//! Code block shape: a monospace text panel whose layout the engine owns.

use super::text::measure;
use super::{ShapeId, ShapeStyle, ShapeTrait, rect_contains};
use crate::surface::Surface;
use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Shape as KurboShape, Size, Vec2};
use peniko::Color;
use uuid::Uuid;

pub const DEFAULT_CODE: &str = "// Write your code here";
pub const DEFAULT_SIZE: Size = Size::new(300.0, 150.0);
pub const MIN_SIZE: Size = Size::new(200.0, 100.0);
pub const CODE_FONT_SIZE: f64 = 14.0;
pub const CODE_LINE_HEIGHT: f64 = 18.0;
pub const CODE_PADDING: f64 = 8.0;

const BACKGROUND: Color = Color::from_rgba8(0x1e, 0x1e, 0x1e, 255);
const FOREGROUND: Color = Color::from_rgba8(0xd4, 0xd4, 0xd4, 255);

/// A code panel anchored at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub(crate) id: ShapeId,
    pub start: Point,
    pub end: Point,
    pub content: String,
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Code {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            content: DEFAULT_CODE.to_string(),
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    /// Panel rectangle: the anchor box (or the default size when collapsed),
    /// grown to fit the content and never below the minimum size.
    pub fn panel(&self) -> Rect {
        let anchor = Rect::from_points(self.start, self.end);
        let mut width = if anchor.width() < 1.0 { DEFAULT_SIZE.width } else { anchor.width() };
        let mut height = if anchor.height() < 1.0 { DEFAULT_SIZE.height } else { anchor.height() };
        let text = measure(&self.content, CODE_FONT_SIZE, CODE_LINE_HEIGHT);
        width = width.max(text.width + 2.0 * CODE_PADDING).max(MIN_SIZE.width);
        height = height.max(text.height + 2.0 * CODE_PADDING).max(MIN_SIZE.height);
        Rect::from_origin_size(anchor.origin(), Size::new(width, height))
    }

    pub fn push_char(&mut self, ch: char) {
        self.content.push(ch);
    }

    pub fn pop_char(&mut self) -> Option<char> {
        self.content.pop()
    }
}

impl ShapeTrait for Code {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn local_bounds(&self) -> Rect {
        self.panel()
    }

    fn hit_test_local(&self, point: Point, tolerance: f64) -> bool {
        rect_contains(self.panel().inflate(tolerance, tolerance), point)
    }

    fn to_path(&self) -> BezPath {
        RoundedRect::from_rect(self.panel(), 4.0).to_path(0.1)
    }

    fn centroid_local(&self) -> Point {
        self.panel().center()
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
        let path = self.to_path();
        surface.fill_path(&path, BACKGROUND, transform);
        surface.stroke_path(&path, self.style.stroke_with_opacity(), 2.0, transform);
        let origin = self.panel().origin() + Vec2::new(CODE_PADDING, CODE_PADDING);
        for (i, line) in self.content.split('\n').enumerate() {
            let line_origin = origin + Vec2::new(0.0, i as f64 * CODE_LINE_HEIGHT);
            surface.draw_text(line, line_origin, CODE_FONT_SIZE, FOREGROUND, transform);
        }
    }
}
