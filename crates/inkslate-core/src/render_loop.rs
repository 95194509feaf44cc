//! Repaint coalescing and the paint pass.

use crate::canvas::Canvas;
use crate::selection::{HandleKind, selection_frame};
use crate::surface::Surface;
use kurbo::{Affine, BezPath, Circle, Rect, Shape as KurboShape};
use peniko::Color;

const SELECTION_COLOR: Color = Color::from_rgba8(0x4a, 0x90, 0xe2, 255);
const HANDLE_FILL: Color = Color::from_rgba8(255, 255, 255, 255);

/// Coalesces repaint requests: any number of requests between two ticks
/// produce one paint.
#[derive(Debug, Clone, Default)]
pub struct RepaintScheduler {
    pending: bool,
    frames: u64,
}

impl RepaintScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Called once per display refresh. Returns true if a paint is due.
    pub fn tick(&mut self) -> bool {
        if std::mem::take(&mut self.pending) {
            self.frames += 1;
            true
        } else {
            false
        }
    }

    /// Paints granted so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Paint the canvas: committed shapes in z-order, the drawing preview, then
/// the selection frame, its handles and the rotate knob.
pub fn paint_canvas(canvas: &Canvas, surface: &mut dyn Surface) {
    let view = canvas.camera.transform();
    for shape in canvas.document.shapes() {
        shape.draw(surface, view);
    }
    if let Some(preview) = canvas.state().preview() {
        preview.draw(surface, view);
    }
    if let Some(shape) = canvas.selected_shape() {
        paint_selection(canvas, shape, surface, view);
    }
}

fn paint_selection(
    canvas: &Canvas,
    shape: &crate::shapes::Shape,
    surface: &mut dyn Surface,
    view: Affine,
) {
    let Some(frame) = selection_frame(shape, &canvas.camera, &canvas.config) else {
        // Shapes without handles still get an outline
        let bounds = shape.bounds();
        surface.stroke_path(&bounds.to_path(0.1), SELECTION_COLOR, line_width(canvas), view);
        return;
    };
    let width = line_width(canvas);
    surface.stroke_path(&frame.rect.to_path(0.1), SELECTION_COLOR, width, view * frame.transform);

    let half = canvas.camera.screen_to_world_len(canvas.config.handle_radius_px) / 2.0;
    for handle in &frame.handles {
        match handle.kind {
            HandleKind::Rotate => {
                if let Some(stem) = frame.rotate_stem {
                    let mut line = BezPath::new();
                    line.move_to(stem);
                    line.line_to(handle.position);
                    surface.stroke_path(&line, SELECTION_COLOR, width, view);
                }
                let knob = canvas.camera.screen_to_world_len(canvas.config.rotate_knob_radius_px);
                let path = Circle::new(handle.position, knob).to_path(0.1);
                surface.fill_path(&path, HANDLE_FILL, view);
                surface.stroke_path(&path, SELECTION_COLOR, width, view);
            }
            _ => {
                let square = Rect::from_center_size(handle.position, (half * 2.0, half * 2.0)).to_path(0.1);
                surface.fill_path(&square, HANDLE_FILL, view);
                surface.stroke_path(&square, SELECTION_COLOR, width, view);
            }
        }
    }
}

fn line_width(canvas: &Canvas) -> f64 {
    canvas.camera.screen_to_world_len(1.0)
}
