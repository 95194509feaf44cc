//! Gesture scripts for headless replay.
//!
//! A script is a JSON array of events, each tagged by `event`:
//!
//! ```json
//! [
//!   { "event": "mode", "mode": { "draw": "rectangle" } },
//!   { "event": "down", "x": 10, "y": 10 },
//!   { "event": "move", "x": 110, "y": 60 },
//!   { "event": "up", "x": 110, "y": 60 },
//!   { "event": "key", "key": { "char": "z" }, "modifiers": { "ctrl": true } },
//!   { "event": "wheel", "x": 400, "y": 300, "dy": -120 },
//!   { "event": "wait", "ms": 500 }
//! ]
//! ```

use inkslate_core::shapes::{SerializableColor, parse_css_color};
use inkslate_core::{Canvas, KeyEvent, MouseButton, PointerEvent, ToolMode};
use kurbo::{Point, Size, Vec2};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

fn left() -> MouseButton {
    MouseButton::Left
}

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    Down {
        x: f64,
        y: f64,
        #[serde(default = "left")]
        button: MouseButton,
    },
    Move {
        x: f64,
        y: f64,
    },
    Up {
        x: f64,
        y: f64,
        #[serde(default = "left")]
        button: MouseButton,
    },
    Wheel {
        x: f64,
        y: f64,
        #[serde(default)]
        dx: f64,
        dy: f64,
    },
    Key(KeyEvent),
    Mode {
        mode: ToolMode,
    },
    Viewport {
        width: f64,
        height: f64,
    },
    /// Style change applied to the selected shape and to new shapes.
    /// Colours are CSS strings; a `fill` of `""` or `transparent` clears it.
    Style {
        #[serde(default)]
        stroke: Option<String>,
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        fill: Option<String>,
        #[serde(default)]
        opacity: Option<f64>,
    },
    Icon {
        reference: String,
    },
    /// Advance the replay clock.
    Wait {
        ms: u64,
    },
}

impl ScriptEvent {
    /// Apply the event to `canvas`. Returns how far the clock advances.
    pub fn apply(&self, canvas: &mut Canvas) -> Duration {
        match self {
            ScriptEvent::Down { x, y, button } => canvas.handle_pointer(PointerEvent::Down {
                position: Point::new(*x, *y),
                button: *button,
            }),
            ScriptEvent::Move { x, y } => canvas.handle_pointer(PointerEvent::Move {
                position: Point::new(*x, *y),
            }),
            ScriptEvent::Up { x, y, button } => canvas.handle_pointer(PointerEvent::Up {
                position: Point::new(*x, *y),
                button: *button,
            }),
            ScriptEvent::Wheel { x, y, dx, dy } => canvas.wheel(Point::new(*x, *y), Vec2::new(*dx, *dy)),
            ScriptEvent::Key(event) => {
                if !canvas.handle_key(event.clone()) {
                    log::debug!("Unbound key {:?}", event.key);
                }
            }
            ScriptEvent::Mode { mode } => canvas.set_mode(*mode),
            ScriptEvent::Viewport { width, height } => canvas.set_viewport(Size::new(*width, *height)),
            ScriptEvent::Style {
                stroke,
                width,
                fill,
                opacity,
            } => {
                if let Some(color) = stroke.as_deref().and_then(css_color) {
                    canvas.set_stroke_color(color);
                }
                if let Some(width) = width {
                    canvas.set_stroke_width(*width);
                }
                if let Some(fill) = fill {
                    canvas.set_fill(css_color(fill).filter(|c| c.a > 0));
                }
                if let Some(opacity) = opacity {
                    canvas.set_opacity(*opacity);
                }
            }
            ScriptEvent::Icon { reference } => canvas.set_icon_reference(reference.clone()),
            ScriptEvent::Wait { ms } => return Duration::from_millis(*ms),
        }
        Duration::ZERO
    }
}

fn css_color(css: &str) -> Option<SerializableColor> {
    if css.is_empty() {
        return None;
    }
    let color = parse_css_color(css);
    if color.is_none() {
        log::warn!("Ignoring unrecognised colour {css:?}");
    }
    color
}

pub fn parse_script(json: &str) -> serde_json::Result<Vec<ScriptEvent>> {
    serde_json::from_str(json)
}

pub fn load_script(path: &Path) -> anyhow::Result<Vec<ScriptEvent>> {
    let json = std::fs::read_to_string(path)?;
    Ok(parse_script(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkslate_core::shapes::ShapeKind;
    use inkslate_core::{EditorConfig, Key};

    const DRAW_AND_UNDO: &str = r#"[
        { "event": "mode", "mode": { "draw": "rectangle" } },
        { "event": "down", "x": 10, "y": 10 },
        { "event": "move", "x": 110, "y": 60 },
        { "event": "up", "x": 110, "y": 60 },
        { "event": "key", "key": { "char": "z" }, "modifiers": { "ctrl": true } },
        { "event": "wait", "ms": 250 }
    ]"#;

    #[test]
    fn test_parse_script() {
        let script = parse_script(DRAW_AND_UNDO).unwrap();
        assert_eq!(script.len(), 6);
        assert_eq!(
            script[0],
            ScriptEvent::Mode {
                mode: ToolMode::Draw(ShapeKind::Rectangle)
            }
        );
        assert_eq!(
            script[1],
            ScriptEvent::Down {
                x: 10.0,
                y: 10.0,
                button: MouseButton::Left
            }
        );
        match &script[4] {
            ScriptEvent::Key(event) => {
                assert_eq!(event.key, Key::Char('z'));
                assert!(event.modifiers.ctrl);
                assert!(!event.modifiers.shift);
            }
            other => panic!("expected key event, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        assert!(parse_script(r#"[{ "event": "teleport" }]"#).is_err());
    }

    #[test]
    fn test_apply_draw_then_undo() {
        let script = parse_script(DRAW_AND_UNDO).unwrap();
        let mut canvas = Canvas::new(EditorConfig::default());
        let mut elapsed = Duration::ZERO;
        for event in &script[..4] {
            elapsed += event.apply(&mut canvas);
        }
        assert_eq!(canvas.document.len(), 1);

        for event in &script[4..] {
            elapsed += event.apply(&mut canvas);
        }
        assert!(canvas.document.is_empty());
        assert_eq!(elapsed, Duration::from_millis(250));
    }

    #[test]
    fn test_wheel_zooms() {
        let mut canvas = Canvas::new(EditorConfig::default());
        let before = canvas.camera.zoom_x;
        ScriptEvent::Wheel {
            x: 0.0,
            y: 0.0,
            dx: 0.0,
            dy: -100.0,
        }
        .apply(&mut canvas);
        assert!(canvas.camera.zoom_x > before);
    }

    #[test]
    fn test_style_uses_css_colours() {
        let script = parse_script(
            r##"[{ "event": "style", "stroke": "#ff0000", "width": 5, "fill": "transparent" }]"##,
        )
        .unwrap();
        let mut canvas = Canvas::new(EditorConfig::default());
        script[0].apply(&mut canvas);
        assert_eq!(canvas.settings().stroke_color, SerializableColor::new(255, 0, 0, 255));
        assert!((canvas.settings().stroke_width - 5.0).abs() < 1e-9);
        assert_eq!(canvas.settings().fill_color, None);
    }
}
