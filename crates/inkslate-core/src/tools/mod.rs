//! Tool system for the whiteboard.

use crate::shapes::{
    Arrow, Circle, Code, Ellipse, FreeDraw, Icon, Line, Parallelogram, Polygon, Rectangle,
    SerializableColor, Shape, ShapeKind, ShapeStyle, Text, Triangle,
};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Size of a text box placed by a click.
pub const DEFAULT_TEXT_SIZE: Vec2 = Vec2::new(150.0, 30.0);

/// What a primary-button gesture on empty canvas does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    /// Select, drag, resize and rotate existing shapes.
    #[default]
    Select,
    /// Draw a new shape of the given kind.
    Draw(ShapeKind),
    /// Remove shapes touched by the pointer.
    Eraser,
}

/// Style and content applied to newly created shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub stroke_color: SerializableColor,
    pub stroke_width: f64,
    pub fill_color: Option<SerializableColor>,
    pub opacity: f64,
    pub corner_radius: f64,
    /// Image drawn by the icon tool.
    pub icon_reference: Option<String>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        let style = ShapeStyle::default();
        Self {
            stroke_color: style.stroke_color,
            stroke_width: style.stroke_width,
            fill_color: style.fill_color,
            opacity: style.opacity,
            corner_radius: style.corner_radius,
            icon_reference: None,
        }
    }
}

impl ToolSettings {
    /// Style for a new shape.
    pub fn style(&self) -> ShapeStyle {
        ShapeStyle {
            stroke_color: self.stroke_color,
            stroke_width: self.stroke_width,
            fill_color: self.fill_color,
            opacity: self.opacity,
            corner_radius: self.corner_radius,
        }
    }
}

/// Build a shape of `kind` spanning `start` to `end`, styled from `settings`.
///
/// Free-hand strokes start with the two given points (one if they coincide).
pub fn create_shape(kind: ShapeKind, start: Point, end: Point, settings: &ToolSettings) -> Shape {
    let mut shape = match kind {
        ShapeKind::Rectangle => Shape::Rectangle(Rectangle::new(start, end)),
        ShapeKind::Ellipse => Shape::Ellipse(Ellipse::new(start, end)),
        ShapeKind::Circle => Shape::Circle(Circle::new(start, end)),
        ShapeKind::Line => Shape::Line(Line::new(start, end)),
        ShapeKind::Arrow => Shape::Arrow(Arrow::new(start, end)),
        ShapeKind::Triangle => Shape::Triangle(Triangle::new(start, end)),
        ShapeKind::Polygon(sides) => Shape::Polygon(Polygon::new(sides, start, end)),
        ShapeKind::Parallelogram => Shape::Parallelogram(Parallelogram::new(start, end)),
        ShapeKind::FreeDraw => {
            let mut stroke = FreeDraw::new(start);
            if end != start {
                stroke.add_point(end);
            }
            Shape::FreeDraw(stroke)
        }
        ShapeKind::Text => Shape::Text(Text::new(start, end)),
        ShapeKind::Icon => Shape::Icon(Icon::new(
            start,
            end,
            settings.icon_reference.clone().unwrap_or_default(),
        )),
        ShapeKind::Code => Shape::Code(Code::new(start, end)),
    };
    *shape.style_mut() = settings.style();
    shape
}

/// Current mode plus the settings new shapes are created with.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    pub mode: ToolMode,
    pub settings: ToolSettings,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mode(&mut self, mode: ToolMode) {
        self.mode = mode;
    }

    /// Shape kind drawn by the current mode, if any.
    pub fn drawing_kind(&self) -> Option<ShapeKind> {
        match self.mode {
            ToolMode::Draw(kind) => Some(kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_applies_settings() {
        let settings = ToolSettings {
            stroke_color: SerializableColor::new(255, 0, 0, 255),
            stroke_width: 5.0,
            fill_color: Some(SerializableColor::white()),
            opacity: 0.5,
            corner_radius: 4.0,
            icon_reference: Some("icons/cloud.svg".to_string()),
        };
        let shape = create_shape(ShapeKind::Rectangle, Point::ZERO, Point::new(10.0, 10.0), &settings);
        assert_eq!(shape.style(), &settings.style());
        let icon = create_shape(ShapeKind::Icon, Point::ZERO, Point::new(10.0, 10.0), &settings);
        match icon {
            Shape::Icon(icon) => assert_eq!(icon.path, "icons/cloud.svg"),
            other => panic!("expected icon, got {other:?}"),
        }
    }

    #[test]
    fn test_factory_covers_every_kind() {
        let kinds = [
            ShapeKind::Rectangle,
            ShapeKind::Ellipse,
            ShapeKind::Circle,
            ShapeKind::Line,
            ShapeKind::Arrow,
            ShapeKind::Triangle,
            ShapeKind::Polygon(5),
            ShapeKind::Parallelogram,
            ShapeKind::FreeDraw,
            ShapeKind::Text,
            ShapeKind::Icon,
            ShapeKind::Code,
        ];
        let settings = ToolSettings::default();
        for kind in kinds {
            let shape = create_shape(kind, Point::ZERO, Point::new(20.0, 20.0), &settings);
            assert_eq!(shape.kind(), Some(kind));
        }
    }

    #[test]
    fn test_drawing_kind() {
        let mut tools = ToolManager::new();
        assert_eq!(tools.drawing_kind(), None);
        tools.set_mode(ToolMode::Draw(ShapeKind::Arrow));
        assert_eq!(tools.drawing_kind(), Some(ShapeKind::Arrow));
    }
}
