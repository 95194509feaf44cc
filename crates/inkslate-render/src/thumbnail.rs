//! PNG board thumbnails.

use crate::raster::RasterSurface;
use crate::RenderResult;
use inkslate_core::storage::ThumbnailRenderer;
use inkslate_core::Shape;
use kurbo::{Affine, Rect, Size};
use peniko::Color;

/// Margin around the content, in output pixels.
const PADDING: f64 = 20.0;

/// Transform that fits `content` inside an output of `size`, centred, with
/// `padding` pixels kept free on every side. Content is never scaled up past 1:1.
pub fn fit_transform(content: Rect, size: Size, padding: f64) -> Affine {
    let avail = Size::new(
        (size.width - 2.0 * padding).max(1.0),
        (size.height - 2.0 * padding).max(1.0),
    );
    let scale_x = if content.width() > 0.0 { avail.width / content.width() } else { 1.0 };
    let scale_y = if content.height() > 0.0 { avail.height / content.height() } else { 1.0 };
    let scale = scale_x.min(scale_y).min(1.0);
    let offset = (
        (size.width - content.width() * scale) / 2.0,
        (size.height - content.height() * scale) / 2.0,
    );
    Affine::translate(offset) * Affine::scale(scale) * Affine::translate((-content.x0, -content.y0))
}

/// Renders shapes onto a white raster, fitted to their bounds.
#[derive(Debug, Clone)]
pub struct PngThumbnailer {
    background: Color,
    padding: f64,
}

impl Default for PngThumbnailer {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            padding: PADDING,
        }
    }
}

impl PngThumbnailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rasterize `shapes` at `width`x`height`.
    pub fn render(&self, shapes: &[Shape], width: u32, height: u32) -> RenderResult<RasterSurface> {
        let mut surface = RasterSurface::new(width, height, self.background)?;
        let content = shapes
            .iter()
            .filter(|shape| !matches!(shape, Shape::Null(_)))
            .map(Shape::bounds)
            .filter(|b| b.is_finite())
            .reduce(|acc, b| acc.union(b));
        let Some(content) = content else {
            return Ok(surface);
        };
        let view = fit_transform(content, Size::new(width as f64, height as f64), self.padding);
        for shape in shapes {
            shape.draw(&mut surface, view);
        }
        Ok(surface)
    }
}

impl ThumbnailRenderer for PngThumbnailer {
    fn render_png(&self, shapes: &[Shape], width: u32, height: u32) -> Result<Vec<u8>, String> {
        self.render(shapes, width, height)
            .and_then(|surface| surface.encode_png())
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkslate_core::shapes::{Rectangle, SerializableColor};
    use kurbo::Point;

    fn filled_rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Shape {
        let mut rect = Rectangle::new(Point::new(x0, y0), Point::new(x1, y1));
        rect.style.fill_color = Some(SerializableColor::new(255, 0, 0, 255));
        Shape::Rectangle(rect)
    }

    #[test]
    fn test_fit_transform_centres_and_shrinks() {
        let view = fit_transform(Rect::new(1000.0, 1000.0, 3000.0, 2000.0), Size::new(240.0, 140.0), 20.0);
        let top_left = view * Point::new(1000.0, 1000.0);
        let bottom_right = view * Point::new(3000.0, 2000.0);
        assert!((top_left.x - 20.0).abs() < 1e-9);
        assert!((bottom_right.x - 220.0).abs() < 1e-9);
        assert!((top_left.y + bottom_right.y - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_transform_never_upscales() {
        let view = fit_transform(Rect::new(0.0, 0.0, 10.0, 10.0), Size::new(200.0, 200.0), 20.0);
        let p = view * Point::new(10.0, 10.0);
        assert!((p.x - 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_board_is_blank() {
        let surface = PngThumbnailer::new().render(&[], 16, 16).unwrap();
        assert!(surface.pixels().iter().all(|&b| b == 255));
    }

    #[test]
    fn test_content_far_from_origin_is_visible() {
        let shapes = vec![filled_rect(5000.0, 5000.0, 5100.0, 5050.0)];
        let surface = PngThumbnailer::new().render(&shapes, 200, 100).unwrap();
        assert_eq!(surface.pixel(100, 50), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(2, 2), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_render_png() {
        let png = PngThumbnailer::new()
            .render_png(&[filled_rect(0.0, 0.0, 10.0, 10.0)], 64, 36)
            .unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 36));
        assert!(PngThumbnailer::new().render_png(&[], 0, 36).is_err());
    }
}
