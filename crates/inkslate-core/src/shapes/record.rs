//! Wire records: the JSON form shapes take in storage, history and live sync.

use super::{
    Arrow, Circle, Code, Ellipse, FreeDraw, Icon, Line, NullShape, Parallelogram, Polygon,
    Rectangle, SerializableColor, Shape, ShapeStyle, Text, Triangle,
};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A point inside a free-hand record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordPoint {
    pub x: f64,
    pub y: f64,
}

/// One serialized shape. Every field but the discriminant is optional so
/// records written by older or newer clients still decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<RecordPoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sides: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ShapeRecord {
    fn start(&self) -> Point {
        Point::new(self.start_x.unwrap_or(0.0), self.start_y.unwrap_or(0.0))
    }

    fn end(&self) -> Point {
        Point::new(
            self.end_x.or(self.start_x).unwrap_or(0.0),
            self.end_y.or(self.start_y).unwrap_or(0.0),
        )
    }

    fn style(&self) -> ShapeStyle {
        let defaults = ShapeStyle::default();
        ShapeStyle {
            stroke_color: self
                .stroke_style
                .as_deref()
                .and_then(parse_css_color)
                .unwrap_or(defaults.stroke_color),
            stroke_width: finite_or(self.line_width, defaults.stroke_width),
            fill_color: self
                .fill
                .as_deref()
                .and_then(parse_css_color)
                .filter(|c| c.a > 0),
            opacity: finite_or(self.opacity, defaults.opacity).clamp(0.0, 1.0),
            corner_radius: finite_or(self.border_radius, 0.0).max(0.0),
        }
    }

    fn shape_id(&self) -> Uuid {
        self.id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
            .unwrap_or_else(Uuid::new_v4)
    }

    fn with_anchors(shape: &Shape) -> Self {
        let mut record = Self::default();
        if let Some((start, end)) = shape.anchors() {
            record.start_x = Some(start.x);
            record.start_y = Some(start.y);
            record.end_x = Some(end.x);
            record.end_y = Some(end.y);
        }
        record
    }
}

fn finite_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(default)
}

/// Parse a CSS colour string: `#rgb`, `#rrggbb`, `#rrggbbaa`, `transparent`
/// or one of a few common names.
pub fn parse_css_color(color: &str) -> Option<SerializableColor> {
    let color = color.trim();
    if color.is_empty() || color.eq_ignore_ascii_case("transparent") {
        return Some(SerializableColor::transparent());
    }

    if let Some(hex) = color.strip_prefix('#') {
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        return match hex.len() {
            3 => {
                let r = channel(hex.get(0..1)?)? * 17;
                let g = channel(hex.get(1..2)?)? * 17;
                let b = channel(hex.get(2..3)?)? * 17;
                Some(SerializableColor::new(r, g, b, 255))
            }
            6 | 8 => {
                let r = channel(hex.get(0..2)?)?;
                let g = channel(hex.get(2..4)?)?;
                let b = channel(hex.get(4..6)?)?;
                let a = match hex.get(6..8) {
                    Some(a) => channel(a)?,
                    None => 255,
                };
                Some(SerializableColor::new(r, g, b, a))
            }
            _ => None,
        };
    }

    let named = match color.to_ascii_lowercase().as_str() {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        "gray" | "grey" => (128, 128, 128),
        _ => return None,
    };
    Some(SerializableColor::new(named.0, named.1, named.2, 255))
}

/// Serialize one shape to its wire record.
pub fn encode_shape(shape: &Shape) -> Value {
    let mut record = ShapeRecord::with_anchors(shape);
    record.kind = match shape {
        Shape::Rectangle(_) => "rect",
        Shape::Ellipse(_) => "ellipse",
        Shape::Circle(_) => "circle",
        Shape::Line(_) => "line",
        Shape::Arrow(_) => "arrow",
        Shape::Triangle(_) => "triangle",
        Shape::Polygon(p) => match p.sides {
            5 => "pentagon",
            6 => "hexagon",
            _ => "polygon",
        },
        Shape::Parallelogram(_) => "parallelogram",
        Shape::FreeDraw(_) => "freedraw",
        Shape::Text(_) => "text",
        Shape::Icon(_) => "icon",
        Shape::Code(_) => "code",
        Shape::Null(null) => {
            return null
                .raw
                .clone()
                .unwrap_or_else(|| serde_json::json!({ "type": "null" }));
        }
    }
    .to_string();

    match shape {
        Shape::Polygon(p) => record.sides = Some(p.sides),
        Shape::FreeDraw(f) => {
            record.points = Some(f.points.iter().map(|p| RecordPoint { x: p.x, y: p.y }).collect());
        }
        Shape::Text(t) => record.text = Some(t.content.clone()),
        Shape::Code(c) => record.text = Some(c.content.clone()),
        Shape::Icon(i) => record.path = Some(i.path.clone()),
        _ => {}
    }

    let style = shape.style();
    record.id = Some(shape.id().to_string());
    record.stroke_style = Some(style.stroke_color.to_css());
    record.line_width = Some(style.stroke_width);
    record.fill = Some(style.fill_color.map(|c| c.to_css()).unwrap_or_default());
    record.opacity = Some(style.opacity);
    record.border_radius = Some(style.corner_radius);
    record.rotation = Some(shape.rotation());

    serde_json::to_value(&record).unwrap_or(Value::Null)
}

/// Serialize a whole shape sequence, preserving order.
pub fn encode_shapes<'a>(shapes: impl IntoIterator<Item = &'a Shape>) -> Vec<Value> {
    shapes.into_iter().map(encode_shape).collect()
}

/// Decode one record. Anything that cannot be decoded becomes a Null shape
/// holding the raw record.
pub fn decode_shape(value: Value) -> Shape {
    let record: ShapeRecord = match serde_json::from_value(value.clone()) {
        Ok(record) => record,
        Err(err) => {
            log::warn!("Dropping malformed shape record: {err}");
            return Shape::Null(NullShape::new(Some(value)));
        }
    };

    let start = record.start();
    let end = record.end();
    let mut shape = match record.kind.as_str() {
        "rect" | "rectangle" => Shape::Rectangle(Rectangle::new(start, end)),
        "ellipse" => Shape::Ellipse(Ellipse::new(start, end)),
        "circle" => Shape::Circle(Circle::new(start, end)),
        "line" => Shape::Line(Line::new(start, end)),
        "arrow" => Shape::Arrow(Arrow::new(start, end)),
        "triangle" => Shape::Triangle(Triangle::new(start, end)),
        "pentagon" => Shape::Polygon(Polygon::new(record.sides.unwrap_or(5), start, end)),
        "hexagon" | "polygon" => Shape::Polygon(Polygon::new(record.sides.unwrap_or(6), start, end)),
        "parallelogram" => Shape::Parallelogram(Parallelogram::new(start, end)),
        "freedraw" => {
            let points = record
                .points
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|p| Point::new(p.x, p.y))
                .collect();
            Shape::FreeDraw(FreeDraw::from_points(points))
        }
        "text" => {
            let mut text = Text::new(start, end);
            text.content = record.text.clone().unwrap_or_default();
            Shape::Text(text)
        }
        "code" => {
            let mut code = Code::new(start, end);
            if let Some(content) = &record.text {
                code.content = content.clone();
            }
            Shape::Code(code)
        }
        "icon" => Shape::Icon(Icon::new(start, end, record.path.clone().unwrap_or_default())),
        "null" => return Shape::Null(NullShape::new(Some(value))),
        other => {
            log::warn!("Unknown shape type {other:?}, keeping it as a placeholder");
            return Shape::Null(NullShape::new(Some(value)));
        }
    };

    *shape.style_mut() = record.style();
    shape.set_rotation(record.rotation.unwrap_or(0.0));
    let id = record.shape_id();
    set_id(&mut shape, id);
    shape
}

fn set_id(shape: &mut Shape, id: Uuid) {
    match shape {
        Shape::Rectangle(s) => s.id = id,
        Shape::Ellipse(s) => s.id = id,
        Shape::Circle(s) => s.id = id,
        Shape::Line(s) => s.id = id,
        Shape::Arrow(s) => s.id = id,
        Shape::Triangle(s) => s.id = id,
        Shape::Polygon(s) => s.id = id,
        Shape::Parallelogram(s) => s.id = id,
        Shape::FreeDraw(s) => s.id = id,
        Shape::Text(s) => s.id = id,
        Shape::Icon(s) => s.id = id,
        Shape::Code(s) => s.id = id,
        Shape::Null(s) => s.id = id,
    }
}

/// Decode a sequence of records, one shape per record, in order.
pub fn decode_records(values: Vec<Value>) -> Vec<Shape> {
    values.into_iter().map(decode_shape).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn populated() -> Vec<Shape> {
        let a = Point::new(10.0, 20.0);
        let b = Point::new(110.0, 80.0);
        let mut rect = Rectangle::new(a, b);
        rect.style.fill_color = Some(SerializableColor::new(255, 0, 0, 128));
        rect.style.corner_radius = 6.0;
        rect.rotation = 0.5;
        let mut free = FreeDraw::new(a);
        free.add_point(Point::new(12.0, 24.0));
        free.add_point(b);
        let mut text = Text::new(a, b);
        text.content = "hello\nworld".to_string();
        let mut code = Code::new(a, b);
        code.content = "fn main() {}".to_string();
        vec![
            Shape::Rectangle(rect),
            Shape::Ellipse(Ellipse::new(a, b)),
            Shape::Circle(Circle::new(a, b)),
            Shape::Line(Line::new(a, b)),
            Shape::Arrow(Arrow::new(a, b)),
            Shape::Triangle(Triangle::new(a, b)),
            Shape::Polygon(Polygon::new(5, a, b)),
            Shape::Polygon(Polygon::new(6, a, b)),
            Shape::Polygon(Polygon::new(8, a, b)),
            Shape::Parallelogram(Parallelogram::new(a, b)),
            Shape::FreeDraw(free),
            Shape::Text(text),
            Shape::Icon(Icon::new(a, b, "icons/db.svg")),
            Shape::Code(code),
        ]
    }

    #[test]
    fn test_document_round_trip() {
        let shapes = populated();
        let decoded = decode_records(encode_shapes(&shapes));
        assert_eq!(decoded, shapes);
    }

    #[test]
    fn test_polygon_discriminants() {
        let pentagon = encode_shape(&Shape::Polygon(Polygon::new(5, Point::ZERO, Point::new(1.0, 1.0))));
        assert_eq!(pentagon["type"], "pentagon");
        let hexagon = decode_shape(json!({"type": "hexagon", "startX": 0, "startY": 0, "endX": 10, "endY": 0}));
        assert_eq!(hexagon.kind(), Some(crate::shapes::ShapeKind::Polygon(6)));
    }

    #[test]
    fn test_unknown_type_is_preserved() {
        let raw = json!({"type": "sticky-note", "startX": 1, "color": "pink"});
        let shapes = decode_records(vec![
            raw.clone(),
            json!({"type": "rect", "startX": 0, "startY": 0, "endX": 5, "endY": 5}),
        ]);
        assert_eq!(shapes.len(), 2);
        assert!(shapes[0].kind().is_none());
        assert_eq!(shapes[1].kind(), Some(crate::shapes::ShapeKind::Rectangle));
        assert_eq!(encode_shape(&shapes[0]), raw);
    }

    #[test]
    fn test_malformed_record_becomes_null() {
        let shape = decode_shape(json!({"type": "rect", "startX": "oops"}));
        assert!(shape.kind().is_none());
        let shape = decode_shape(json!(42));
        assert!(shape.kind().is_none());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let shape = decode_shape(json!({"type": "line"}));
        assert!((shape.style().stroke_width - 3.0).abs() < f64::EPSILON);
        assert!(shape.style().fill_color.is_none());
        assert_eq!(shape.anchors(), Some((Point::ZERO, Point::ZERO)));
    }

    #[test]
    fn test_record_id_is_kept_or_replaced() {
        let id = Uuid::new_v4();
        let shape = decode_shape(json!({"type": "circle", "id": id.to_string()}));
        assert_eq!(shape.id(), id);
        let shape = decode_shape(json!({"type": "circle", "id": "shape-1"}));
        assert_ne!(shape.id().to_string(), "shape-1");
    }

    #[test]
    fn test_parse_css_color() {
        assert_eq!(parse_css_color("#fff"), Some(SerializableColor::white()));
        assert_eq!(parse_css_color("#ff000080"), Some(SerializableColor::new(255, 0, 0, 128)));
        assert_eq!(parse_css_color("Red"), Some(SerializableColor::new(255, 0, 0, 255)));
        assert_eq!(parse_css_color("transparent"), Some(SerializableColor::transparent()));
        assert_eq!(parse_css_color("#12"), None);
        assert_eq!(parse_css_color("#zzzzzz"), None);
        assert_eq!(parse_css_color("chartreuse"), None);
    }

    #[test]
    fn test_empty_fill_means_none() {
        let shape = decode_shape(json!({"type": "rect", "fill": ""}));
        assert!(shape.style().fill_color.is_none());
        let shape = decode_shape(json!({"type": "rect", "fill": "#00ff00"}));
        assert_eq!(shape.style().fill_color, Some(SerializableColor::new(0, 255, 0, 255)));
    }
}
