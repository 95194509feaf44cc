//! CPU raster surface on a `tiny_skia` pixmap.
//!
//! Text uses the first monospace system font found, through `imageproc`. On
//! hosts with no usable font, characters are drawn as blocks on the same
//! advance grid.

use crate::glyphs::glyph_blocks;
use crate::{RenderError, RenderResult};
use ab_glyph::FontArc;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use inkslate_core::Surface;
use kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape as KurboShape};
use peniko::Color;
use std::collections::HashMap;
use std::sync::OnceLock;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, IntSize, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};

/// Largest accepted width or height.
const MAX_DIMENSION: u32 = 8192;

const PLACEHOLDER_FILL: Color = Color::from_rgba8(0xe0, 0xe0, 0xe0, 255);
const PLACEHOLDER_STROKE: Color = Color::from_rgba8(0x99, 0x99, 0x99, 255);

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    "/System/Library/Fonts/Monaco.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
];

fn system_font() -> Option<&'static FontArc> {
    static FONT: OnceLock<Option<FontArc>> = OnceLock::new();
    FONT.get_or_init(|| {
        let font = FONT_CANDIDATES.iter().find_map(|path| {
            let bytes = std::fs::read(path).ok()?;
            FontArc::try_from_vec(bytes).ok()
        });
        if font.is_none() {
            log::debug!("No system font found; text renders as blocks");
        }
        font
    })
    .as_ref()
}

fn to_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn to_path(path: &BezPath) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32),
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn paint_for(color: Color) -> Paint<'static> {
    let rgba = color.to_rgba8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba.r, rgba.g, rgba.b, rgba.a);
    paint.anti_alias = true;
    paint
}

/// Uniform scale of `transform`, for sizing hairlines and type.
fn scale_of(transform: Affine) -> f64 {
    transform.determinant().abs().sqrt()
}

fn image_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// A pixmap implementing [`Surface`].
pub struct RasterSurface {
    pixmap: Pixmap,
    /// Decoded images by reference; `None` marks a reference that failed to load.
    images: HashMap<String, Option<Pixmap>>,
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .finish_non_exhaustive()
    }
}

impl RasterSurface {
    /// A surface cleared to `background`.
    pub fn new(width: u32, height: u32, background: Color) -> RenderResult<Self> {
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(RenderError::InvalidSize(width, height));
        }
        let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidSize(width, height))?;
        let bg = background.to_rgba8();
        pixmap.fill(tiny_skia::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));
        Ok(Self {
            pixmap,
            images: HashMap::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Premultiplied RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Straight-alpha RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Encode the surface as PNG.
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(e.to_string()))
    }

    fn decoded_image(&mut self, reference: &str) -> Option<&Pixmap> {
        self.images
            .entry(reference.to_string())
            .or_insert_with(|| match image::open(reference) {
                Ok(decoded) => image_to_pixmap(&decoded.to_rgba8()),
                Err(e) => {
                    log::debug!("Image {reference} unavailable, drawing placeholder: {e}");
                    None
                }
            })
            .as_ref()
    }

    fn draw_placeholder(&mut self, rect: Rect, transform: Affine) {
        self.fill_path(&rect.to_path(0.1), PLACEHOLDER_FILL, transform);
        let mut cross = rect.to_path(0.1);
        cross.move_to((rect.x0, rect.y0));
        cross.line_to((rect.x1, rect.y1));
        cross.move_to((rect.x1, rect.y0));
        cross.line_to((rect.x0, rect.y1));
        self.stroke_path(&cross, PLACEHOLDER_STROKE, 1.0, transform);
    }

    /// Rasterize one line with `font` at device resolution and composite it.
    fn draw_glyphs(&mut self, font: &FontArc, text: &str, origin: Point, size: f64, color: Color, transform: Affine) {
        let scale = scale_of(transform);
        let px = (size * scale) as f32;
        if px < 1.0 || text.trim().is_empty() {
            return;
        }
        let (width, height) = text_size(px, font, text);
        let Some(int_size) = IntSize::from_wh(width, height) else {
            return;
        };
        let rgba = color.to_rgba8();
        let mut mask = RgbaImage::new(width, height);
        draw_text_mut(&mut mask, Rgba([rgba.r, rgba.g, rgba.b, 255]), 0, 0, px, font, text);
        // Drawing onto transparent black leaves premultiplied coverage.
        let Some(glyphs) = Pixmap::from_vec(mask.into_raw(), int_size) else {
            return;
        };
        let paint = PixmapPaint {
            opacity: rgba.a as f32 / 255.0,
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        let placement = transform * Affine::translate(origin.to_vec2()) * Affine::scale(1.0 / scale);
        self.pixmap
            .draw_pixmap(0, 0, glyphs.as_ref(), &paint, to_transform(placement), None);
    }
}

impl Surface for RasterSurface {
    fn fill_path(&mut self, path: &BezPath, color: Color, transform: Affine) {
        let Some(path) = to_path(path) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &paint_for(color),
            FillRule::Winding,
            to_transform(transform),
            None,
        );
    }

    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64, transform: Affine) {
        if width <= 0.0 {
            return;
        }
        let Some(path) = to_path(path) else {
            return;
        };
        // Keep hairlines at least one device pixel wide
        let scale = scale_of(transform);
        let width = if scale > 0.0 { width.max(1.0 / scale) } else { width };
        let stroke = Stroke {
            width: width as f32,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint_for(color), &stroke, to_transform(transform), None);
    }

    fn draw_text(&mut self, text: &str, origin: Point, size: f64, color: Color, transform: Affine) {
        if let Some(font) = system_font() {
            self.draw_glyphs(font, text, origin, size, color, transform);
            return;
        }
        for block in glyph_blocks(text, origin, size) {
            self.fill_path(&block.to_path(0.1), color, transform);
        }
    }

    fn draw_image(&mut self, reference: &str, rect: Rect, transform: Affine) {
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return;
        }
        let Some(image) = self.decoded_image(reference).cloned() else {
            self.draw_placeholder(rect, transform);
            return;
        };
        let placement = transform
            * Affine::translate((rect.x0, rect.y0))
            * Affine::scale_non_uniform(
                rect.width() / image.width() as f64,
                rect.height() / image.height() as f64,
            );
        let paint = PixmapPaint {
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, image.as_ref(), &paint, to_transform(placement), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::from_rgba8(255, 0, 0, 255);

    fn white(width: u32, height: u32) -> RasterSurface {
        RasterSurface::new(width, height, Color::WHITE).unwrap()
    }

    #[test]
    fn test_invalid_size() {
        assert!(matches!(
            RasterSurface::new(0, 10, Color::WHITE),
            Err(RenderError::InvalidSize(0, 10))
        ));
        assert!(RasterSurface::new(10, MAX_DIMENSION + 1, Color::WHITE).is_err());
    }

    #[test]
    fn test_fill_rect() {
        let mut surface = white(20, 20);
        surface.fill_path(&Rect::new(5.0, 5.0, 15.0, 15.0).to_path(0.1), RED, Affine::IDENTITY);
        assert_eq!(surface.pixel(10, 10), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(5, 5), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(15, 15), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(2, 10), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_fill_respects_transform() {
        let mut surface = white(40, 40);
        let path = Rect::new(0.0, 0.0, 5.0, 5.0).to_path(0.1);
        surface.fill_path(&path, RED, Affine::translate((20.0, 20.0)) * Affine::scale(2.0));
        assert_eq!(surface.pixel(25, 25), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(31, 31), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(2, 2), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_stroke_line() {
        let mut surface = white(30, 30);
        let mut line = BezPath::new();
        line.move_to((2.0, 15.0));
        line.line_to((28.0, 15.0));
        surface.stroke_path(&line, Color::BLACK, 4.0, Affine::IDENTITY);
        assert_eq!(surface.pixel(15, 15), Some([0, 0, 0, 255]));
        assert_eq!(surface.pixel(15, 14), Some([0, 0, 0, 255]));
        assert_eq!(surface.pixel(15, 5), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_half_transparent_blend() {
        let mut surface = white(4, 4);
        let half = Color::from_rgba8(0, 0, 0, 128);
        surface.fill_path(&Rect::new(0.0, 0.0, 4.0, 4.0).to_path(0.1), half, Affine::IDENTITY);
        let [r, g, b, a] = surface.pixel(1, 1).unwrap();
        assert!((120..=135).contains(&r));
        assert_eq!((g, b, a), (r, r, 255));
    }

    #[test]
    fn test_text_paints_inside_its_line() {
        let mut surface = white(60, 24);
        surface.draw_text("ab", Point::new(0.0, 0.0), 16.0, Color::BLACK, Affine::IDENTITY);
        let inked = (0..60)
            .flat_map(|x| (0..24).map(move |y| (x, y)))
            .filter(|&(x, y)| surface.pixel(x, y).is_some_and(|p| p[0] < 128))
            .count();
        assert!(inked > 0);
        // Nothing lands right of two advances.
        assert!((30..60).all(|x| (0..24).all(|y| surface.pixel(x, y) == Some([255, 255, 255, 255]))));
    }

    #[test]
    fn test_missing_image_draws_placeholder() {
        let mut surface = white(40, 40);
        surface.draw_image("/no/such/image.png", Rect::new(0.0, 0.0, 40.0, 40.0), Affine::IDENTITY);
        assert_eq!(surface.pixel(30, 20), Some([0xe0, 0xe0, 0xe0, 255]));
        // The cross runs through the centre.
        assert!(surface.pixel(20, 20).is_some_and(|p| p[0] < 0xe0));
    }

    #[test]
    fn test_image_is_stretched_over_rect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blue.png");
        RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]))
            .save(&path)
            .unwrap();
        let mut surface = white(20, 20);
        surface.draw_image(path.to_str().unwrap(), Rect::new(5.0, 5.0, 15.0, 15.0), Affine::IDENTITY);
        assert_eq!(surface.pixel(10, 10), Some([0, 0, 255, 255]));
        assert_eq!(surface.pixel(2, 2), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_encode_png_signature() {
        let png = white(8, 8).encode_png().unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }
}
