//! Drawing surface abstraction.
//!
//! Shapes and the render loop draw through [`Surface`] so the engine has no
//! opinion on the backend: the raster exporter, a GPU scene or a test recorder.

use kurbo::{Affine, BezPath, Point, Rect};
use peniko::Color;

/// Something shapes can be painted onto.
pub trait Surface {
    /// Fill a closed path.
    fn fill_path(&mut self, path: &BezPath, color: Color, transform: Affine);

    /// Stroke a path with the given width (in world units, scaled by `transform`).
    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64, transform: Affine);

    /// Draw one line of text with its top-left corner at `origin`.
    fn draw_text(&mut self, text: &str, origin: Point, size: f64, color: Color, transform: Affine);

    /// Draw the image named by `reference` stretched over `rect`.
    fn draw_image(&mut self, reference: &str, rect: Rect, transform: Affine);
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Fill { color: Color },
    Stroke { color: Color, width: f64 },
    Text { text: String, origin: Point, size: f64 },
    Image { reference: String, rect: Rect },
}

/// A surface that only records what was drawn. Used for headless checks.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded text runs, in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn fill_path(&mut self, _path: &BezPath, color: Color, _transform: Affine) {
        self.ops.push(DrawOp::Fill { color });
    }

    fn stroke_path(&mut self, _path: &BezPath, color: Color, width: f64, _transform: Affine) {
        self.ops.push(DrawOp::Stroke { color, width });
    }

    fn draw_text(&mut self, text: &str, origin: Point, size: f64, _color: Color, _transform: Affine) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            origin,
            size,
        });
    }

    fn draw_image(&mut self, reference: &str, rect: Rect, _transform: Affine) {
        self.ops.push(DrawOp::Image {
            reference: reference.to_string(),
            rect,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Icon, Rectangle, SerializableColor, Shape, Text};

    #[test]
    fn test_filled_shape_fills_then_strokes() {
        let mut rect = Rectangle::new(Point::ZERO, Point::new(10.0, 10.0));
        rect.style.fill_color = Some(SerializableColor::white());
        let mut surface = RecordingSurface::new();
        Shape::Rectangle(rect).draw(&mut surface, Affine::IDENTITY);
        assert!(matches!(surface.ops[0], DrawOp::Fill { .. }));
        assert!(matches!(surface.ops[1], DrawOp::Stroke { .. }));
    }

    #[test]
    fn test_empty_text_draws_placeholder() {
        let mut surface = RecordingSurface::new();
        Shape::Text(Text::new(Point::ZERO, Point::new(10.0, 10.0))).draw(&mut surface, Affine::IDENTITY);
        assert_eq!(surface.texts(), vec!["type something..."]);
    }

    #[test]
    fn test_icon_draws_reference() {
        let mut surface = RecordingSurface::new();
        Shape::Icon(Icon::new(Point::ZERO, Point::new(32.0, 32.0), "icons/db.svg"))
            .draw(&mut surface, Affine::IDENTITY);
        assert!(matches!(&surface.ops[0], DrawOp::Image { reference, .. } if reference == "icons/db.svg"));
    }
}
