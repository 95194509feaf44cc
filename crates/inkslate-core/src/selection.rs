//! Selection frame, manipulation handles and the resize/rotate math behind them.

use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::shapes::{Shape, ShapeTrait};
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    TopLeft,
    TopMiddle,
    TopRight,
    MiddleLeft,
    MiddleRight,
    BottomLeft,
    BottomMiddle,
    BottomRight,
    /// Rotation knob above the top edge.
    Rotate,
}

/// Which edge of the box a handle moves on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeSide {
    Min,
    Max,
    None,
}

impl HandleKind {
    /// The eight resize handles, in drawing order.
    pub const RESIZE: [HandleKind; 8] = [
        HandleKind::TopLeft,
        HandleKind::TopMiddle,
        HandleKind::TopRight,
        HandleKind::MiddleLeft,
        HandleKind::MiddleRight,
        HandleKind::BottomLeft,
        HandleKind::BottomMiddle,
        HandleKind::BottomRight,
    ];

    /// Edges owned on the (x, y) axes.
    fn sides(self) -> (EdgeSide, EdgeSide) {
        use EdgeSide::*;
        match self {
            HandleKind::TopLeft => (Min, Min),
            HandleKind::TopMiddle => (None, Min),
            HandleKind::TopRight => (Max, Min),
            HandleKind::MiddleLeft => (Min, None),
            HandleKind::MiddleRight => (Max, None),
            HandleKind::BottomLeft => (Min, Max),
            HandleKind::BottomMiddle => (None, Max),
            HandleKind::BottomRight => (Max, Max),
            HandleKind::Rotate => (None, None),
        }
    }

    /// Position of the handle on `rect`, before rotation.
    fn anchor_on(self, rect: Rect) -> Point {
        let (sx, sy) = self.sides();
        let pick = |side, min: f64, max: f64| match side {
            EdgeSide::Min => min,
            EdgeSide::Max => max,
            EdgeSide::None => (min + max) / 2.0,
        };
        Point::new(pick(sx, rect.x0, rect.x1), pick(sy, rect.y0, rect.y1))
    }
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

/// Geometry of the selection decoration around one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionFrame {
    /// Padded frame in the shape's unrotated frame.
    pub rect: Rect,
    /// Rotation applied to `rect` and the handles.
    pub transform: Affine,
    /// Resize handles (empty for shapes that cannot be resized) and the rotate knob.
    pub handles: Vec<Handle>,
    /// Where the line to the rotate knob leaves the frame (top middle), in world coordinates.
    pub rotate_stem: Option<Point>,
}

/// Box the handles sit on, before padding and rotation.
pub fn frame_box(shape: &Shape) -> Option<Rect> {
    match shape {
        Shape::FreeDraw(_) | Shape::Null(_) => None,
        Shape::Text(t) => Some(t.local_bounds()),
        Shape::Code(c) => Some(c.panel()),
        _ => shape.anchors().map(|(start, end)| Rect::from_points(start, end)),
    }
}

/// Whether a shape gets the eight resize handles.
pub fn is_resizable(shape: &Shape) -> bool {
    !matches!(shape, Shape::Text(_) | Shape::FreeDraw(_) | Shape::Null(_))
}

/// Build the selection frame for `shape` at the current zoom.
pub fn selection_frame(shape: &Shape, camera: &Camera, config: &EditorConfig) -> Option<SelectionFrame> {
    let base = frame_box(shape)?;
    let padding = camera.screen_to_world_len(config.handle_padding_px);
    let rect = base.inflate(padding, padding);
    let transform = shape.rotation_transform();

    let mut handles = Vec::with_capacity(9);
    if is_resizable(shape) {
        for kind in HandleKind::RESIZE {
            handles.push(Handle {
                position: transform * kind.anchor_on(rect),
                kind,
            });
        }
    }
    let stem = HandleKind::TopMiddle.anchor_on(rect);
    let offset = camera.screen_to_world_len(config.rotate_handle_offset_px);
    handles.push(Handle {
        position: transform * (stem - Vec2::new(0.0, offset)),
        kind: HandleKind::Rotate,
    });

    Some(SelectionFrame {
        rect,
        transform,
        handles,
        rotate_stem: Some(transform * stem),
    })
}

/// Find the handle under a screen-space point. Handle radii are in screen
/// pixels, so the hit area does not change with zoom.
pub fn hit_handle(shape: &Shape, camera: &Camera, config: &EditorConfig, screen: Point) -> Option<HandleKind> {
    let frame = selection_frame(shape, camera, config)?;
    frame.handles.iter().rev().find_map(|handle| {
        let radius = match handle.kind {
            HandleKind::Rotate => config.rotate_knob_radius_px.max(config.handle_radius_px),
            _ => config.handle_radius_px,
        };
        let on_screen = camera.world_to_screen(handle.position);
        ((on_screen - screen).hypot() <= radius).then_some(handle.kind)
    })
}

/// Prepare a shape for a resize gesture so its anchors match its frame box.
///
/// Code panels may be larger than their anchors (default size, content growth);
/// resizing starts from the visible panel.
pub fn normalize_for_resize(shape: &Shape) -> Shape {
    let mut shape = shape.clone();
    if let Shape::Code(code) = &shape {
        let panel = code.panel();
        shape.set_anchors(Point::new(panel.x0, panel.y0), Point::new(panel.x1, panel.y1));
    }
    shape
}

/// Apply a resize: `original` is the shape as it was when the gesture began,
/// `delta` the total world-space pointer movement since then.
///
/// Each handle moves only the edges it owns. An edge maps to whichever of
/// start/end currently holds the smaller (Min) or larger (Max) coordinate;
/// ties go to start for Min and end for Max.
pub fn resize_shape(original: &Shape, handle: HandleKind, delta: Vec2) -> Shape {
    let mut shape = original.clone();
    let Some((mut start, mut end)) = original.anchors() else {
        return shape;
    };
    let rotation = original.rotation();
    let local = if rotation == 0.0 {
        delta
    } else {
        (Affine::rotate(-rotation) * delta.to_point()).to_vec2()
    };

    let (side_x, side_y) = handle.sides();
    apply_axis(side_x, &mut start.x, &mut end.x, local.x);
    apply_axis(side_y, &mut start.y, &mut end.y, local.y);
    shape.set_anchors(start, end);
    shape
}

fn apply_axis(side: EdgeSide, start: &mut f64, end: &mut f64, delta: f64) {
    let start_is_min = *start <= *end;
    match side {
        EdgeSide::Min if start_is_min => *start += delta,
        EdgeSide::Min => *end += delta,
        EdgeSide::Max if start_is_min => *end += delta,
        EdgeSide::Max => *start += delta,
        EdgeSide::None => {}
    }
}

/// Angle of `point` around `center`.
pub fn angle_around(center: Point, point: Point) -> f64 {
    (point.y - center.y).atan2(point.x - center.x)
}

/// Rotation after the pointer moved from `start_angle` to `point`.
pub fn rotation_for(center: Point, start_angle: f64, initial: f64, point: Point) -> f64 {
    initial + angle_around(center, point) - start_angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{FreeDraw, Rectangle, Text};

    fn rect_shape() -> Shape {
        Shape::Rectangle(Rectangle::new(Point::new(10.0, 10.0), Point::new(110.0, 60.0)))
    }

    fn edges(shape: &Shape) -> [f64; 4] {
        let (s, e) = shape.anchors().unwrap();
        let r = Rect::from_points(s, e);
        [r.x0, r.y0, r.x1, r.y1]
    }

    #[test]
    fn test_each_handle_moves_only_its_edges() {
        let original = rect_shape();
        let delta = Vec2::new(7.0, 5.0);
        // [left, top, right, bottom] changed?
        let expected = [
            (HandleKind::TopLeft, [true, true, false, false]),
            (HandleKind::TopMiddle, [false, true, false, false]),
            (HandleKind::TopRight, [false, true, true, false]),
            (HandleKind::MiddleLeft, [true, false, false, false]),
            (HandleKind::MiddleRight, [false, false, true, false]),
            (HandleKind::BottomLeft, [true, false, false, true]),
            (HandleKind::BottomMiddle, [false, false, false, true]),
            (HandleKind::BottomRight, [false, false, true, true]),
        ];
        let before = edges(&original);
        for (handle, changed) in expected {
            let after = edges(&resize_shape(&original, handle, delta));
            for i in 0..4 {
                assert_eq!(before[i] != after[i], changed[i], "{handle:?} edge {i}");
            }
        }
    }

    #[test]
    fn test_top_left_updates_start_only() {
        let resized = resize_shape(&rect_shape(), HandleKind::TopLeft, Vec2::new(-4.0, -6.0));
        assert_eq!(resized.anchors(), Some((Point::new(6.0, 4.0), Point::new(110.0, 60.0))));
    }

    #[test]
    fn test_flipped_anchors_resize_the_visual_edge() {
        let shape = Shape::Rectangle(Rectangle::new(Point::new(110.0, 60.0), Point::new(10.0, 10.0)));
        let resized = resize_shape(&shape, HandleKind::MiddleLeft, Vec2::new(5.0, 0.0));
        assert_eq!(resized.anchors(), Some((Point::new(110.0, 60.0), Point::new(15.0, 10.0))));
    }

    #[test]
    fn test_handle_hit_is_in_screen_pixels() {
        let shape = rect_shape();
        let config = EditorConfig::default();
        for zoom in [0.5, 1.0, 4.0] {
            let mut camera = Camera::new();
            camera.zoom_x = zoom;
            camera.zoom_y = zoom;
            let frame = selection_frame(&shape, &camera, &config).unwrap();
            let br = frame.handles.iter().find(|h| h.kind == HandleKind::BottomRight).unwrap();
            let screen = camera.world_to_screen(br.position);
            assert_eq!(
                hit_handle(&shape, &camera, &config, screen + Vec2::new(5.0, 0.0)),
                Some(HandleKind::BottomRight)
            );
            assert_eq!(hit_handle(&shape, &camera, &config, screen + Vec2::new(9.0, 0.0)), None);
        }
    }

    #[test]
    fn test_rotate_handle_above_top_edge() {
        let shape = rect_shape();
        let frame = selection_frame(&shape, &Camera::new(), &EditorConfig::default()).unwrap();
        let knob = frame.handles.last().unwrap();
        assert_eq!(knob.kind, HandleKind::Rotate);
        assert!((knob.position.x - 60.0).abs() < 1e-9);
        assert!((knob.position.y - (10.0 - 6.0 - 30.0)).abs() < 1e-9);
    }

    #[test]
    fn test_text_and_freedraw_handles() {
        let camera = Camera::new();
        let config = EditorConfig::default();
        let text = Shape::Text(Text::new(Point::ZERO, Point::new(50.0, 20.0)));
        let frame = selection_frame(&text, &camera, &config).unwrap();
        assert_eq!(frame.handles.len(), 1);
        let stroke = Shape::FreeDraw(FreeDraw::new(Point::ZERO));
        assert!(selection_frame(&stroke, &camera, &config).is_none());
    }

    #[test]
    fn test_rotation_delta() {
        let center = Point::new(0.0, 0.0);
        let start_angle = angle_around(center, Point::new(10.0, 0.0));
        let rotation = rotation_for(center, start_angle, 0.25, Point::new(0.0, 10.0));
        assert!((rotation - (0.25 + std::f64::consts::FRAC_PI_2)).abs() < 1e-12);
    }
}
