//! The interaction state machine's state.
//!
//! Exactly one gesture is in progress at a time, so the states are a single
//! enum rather than a set of flags.

use crate::selection::HandleKind;
use crate::shapes::{Shape, ShapeId, ShapeKind};
use kurbo::Point;

/// What the pointer is currently doing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Drawing a new shape. `preview` is the transient shape shown while dragging.
    Drawing {
        kind: ShapeKind,
        start: Point,
        current: Point,
        preview: Option<Shape>,
    },
    /// Moving a shape. `last` is the previous pointer position in world space.
    Dragging { id: ShapeId, last: Point, moved: bool },
    /// Resizing through one handle, relative to the shape as it was at `start`.
    Resizing {
        id: ShapeId,
        handle: HandleKind,
        start: Point,
        original: Shape,
        moved: bool,
    },
    /// Rotating around `center`.
    Rotating {
        id: ShapeId,
        center: Point,
        start_angle: f64,
        initial: f64,
        moved: bool,
    },
    /// Panning with a secondary button. `last` is in screen space.
    /// `resume` is the text being edited when panning began.
    Panning { last: Point, resume: Option<ShapeId> },
    /// Eraser held down.
    Erasing { erased: usize },
    /// Typing into a Text or Code shape.
    EditingText { id: ShapeId },
}

impl InteractionState {
    /// Short name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Drawing { .. } => "drawing",
            InteractionState::Dragging { .. } => "dragging",
            InteractionState::Resizing { .. } => "resizing",
            InteractionState::Rotating { .. } => "rotating",
            InteractionState::Panning { .. } => "panning",
            InteractionState::Erasing { .. } => "erasing",
            InteractionState::EditingText { .. } => "editing_text",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    /// The shape this state acts on, if any.
    pub fn target(&self) -> Option<ShapeId> {
        match self {
            InteractionState::Dragging { id, .. }
            | InteractionState::Resizing { id, .. }
            | InteractionState::Rotating { id, .. }
            | InteractionState::EditingText { id } => Some(*id),
            _ => None,
        }
    }

    /// Transient preview shape, while drawing.
    pub fn preview(&self) -> Option<&Shape> {
        match self {
            InteractionState::Drawing { preview, .. } => preview.as_ref(),
            _ => None,
        }
    }
}
