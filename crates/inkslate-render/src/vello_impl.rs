//! Vello scene surface.

use crate::glyphs::glyph_blocks;
use inkslate_core::Surface;
use kurbo::{Affine, BezPath, Point, Rect, Stroke};
use peniko::{Color, Fill};
use std::collections::HashMap;
use std::sync::Arc;
use vello::Scene;

const PLACEHOLDER_FILL: Color = Color::from_rgba8(0xe0, 0xe0, 0xe0, 255);
const PLACEHOLDER_STROKE: Color = Color::from_rgba8(0x99, 0x99, 0x99, 255);

/// Builds a Vello [`Scene`] from engine draw calls.
#[derive(Default)]
pub struct SceneSurface {
    scene: Scene,
    /// Decoded images by reference; `None` marks a reference that failed to load.
    image_cache: HashMap<String, Option<peniko::ImageData>>,
}

impl SceneSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take the built scene, leaving an empty one for the next frame.
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    pub fn reset(&mut self) {
        self.scene.reset();
    }

    fn image(&mut self, reference: &str) -> Option<peniko::ImageData> {
        self.image_cache
            .entry(reference.to_string())
            .or_insert_with(|| match ::image::open(reference) {
                Ok(decoded) => {
                    let rgba = decoded.to_rgba8();
                    let (width, height) = rgba.dimensions();
                    Some(peniko::ImageData {
                        data: peniko::Blob::new(Arc::new(rgba.into_vec())),
                        format: peniko::ImageFormat::Rgba8,
                        width,
                        height,
                        alpha_type: peniko::ImageAlphaType::Alpha,
                    })
                }
                Err(e) => {
                    log::debug!("Image {reference} unavailable, drawing placeholder: {e}");
                    None
                }
            })
            .clone()
    }
}

impl Surface for SceneSurface {
    fn fill_path(&mut self, path: &BezPath, color: Color, transform: Affine) {
        self.scene.fill(Fill::NonZero, transform, color, None, path);
    }

    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64, transform: Affine) {
        self.scene.stroke(&Stroke::new(width), transform, color, None, path);
    }

    fn draw_text(&mut self, text: &str, origin: Point, size: f64, color: Color, transform: Affine) {
        for block in glyph_blocks(text, origin, size) {
            self.scene.fill(Fill::NonZero, transform, color, None, &block);
        }
    }

    fn draw_image(&mut self, reference: &str, rect: Rect, transform: Affine) {
        let Some(image_data) = self.image(reference) else {
            self.scene.fill(Fill::NonZero, transform, PLACEHOLDER_FILL, None, &rect);
            self.scene.stroke(&Stroke::new(1.0), transform, PLACEHOLDER_STROKE, None, &rect);
            return;
        };
        if image_data.width == 0 || image_data.height == 0 {
            return;
        }
        let scale_x = rect.width() / image_data.width as f64;
        let scale_y = rect.height() / image_data.height as f64;
        let image_transform = transform
            * Affine::translate((rect.x0, rect.y0))
            * Affine::scale_non_uniform(scale_x, scale_y);
        self.scene.draw_image(&image_data.into(), image_transform);
    }
}
