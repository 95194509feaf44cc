//! Canvas document and editor state.

use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::history::{History, Snapshot};
use crate::input::InputState;
use crate::interaction::InteractionState;
use crate::render_loop::RepaintScheduler;
use crate::shapes::{
    SerializableColor, Shape, ShapeId, decode_records, encode_shapes, points_bounds,
};
use crate::spatial::SpatialIndex;
use crate::tools::{ToolManager, ToolMode, ToolSettings};
use kurbo::{Point, Rect, Size, Vec2};
use serde_json::Value;

/// The ordered shape sequence plus the index kept in step with it.
///
/// Shapes are only mutated through methods that refresh their index entry,
/// so the index never goes stale.
#[derive(Debug, Clone, Default)]
pub struct CanvasDocument {
    shapes: Vec<Shape>,
    index: SpatialIndex,
}

impl CanvasDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from shapes in z-order.
    pub fn from_shapes(shapes: Vec<Shape>) -> Self {
        let mut doc = Self::new();
        doc.replace_all(shapes);
        doc
    }

    /// Decode a document from wire records.
    pub fn from_records(records: Vec<Value>) -> Self {
        Self::from_shapes(decode_records(records))
    }

    /// Decode a document from a JSON array of records.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_records(serde_json::from_str(json)?))
    }

    pub fn to_records(&self) -> Vec<Value> {
        encode_shapes(&self.shapes)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_records())
    }

    /// Shapes in z-order (back to front).
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.get(id).is_some()
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    fn index_shape(index: &mut SpatialIndex, shape: &Shape) {
        if shape.kind().is_some() {
            index.insert(shape.id(), shape.bounds());
        }
    }

    /// Add a shape on top.
    pub fn push(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        Self::index_shape(&mut self.index, &shape);
        self.shapes.push(shape);
        id
    }

    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        let pos = self.shapes.iter().position(|s| s.id() == id)?;
        self.index.remove(id);
        Some(self.shapes.remove(pos))
    }

    /// Mutate a shape in place and refresh its index entry.
    pub fn update<R>(&mut self, id: ShapeId, f: impl FnOnce(&mut Shape) -> R) -> Option<R> {
        let shape = self.shapes.iter_mut().find(|s| s.id() == id)?;
        let result = f(shape);
        if shape.kind().is_some() {
            self.index.update(id, shape.bounds());
        }
        Some(result)
    }

    /// Swap a shape for a new version with the same id.
    pub fn replace(&mut self, id: ShapeId, shape: Shape) -> bool {
        self.update(id, move |s| *s = shape).is_some()
    }

    /// Replace the whole sequence and rebuild the index.
    pub fn replace_all(&mut self, shapes: Vec<Shape>) {
        self.index.clear();
        for shape in &shapes {
            Self::index_shape(&mut self.index, shape);
        }
        self.shapes = shapes;
    }

    /// Top-most shape under `point`: index candidates in reverse insertion
    /// order, confirmed by the exact hit test.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> Option<ShapeId> {
        self.index
            .query_point(point, tolerance)
            .into_iter()
            .rev()
            .find(|id| self.get(*id).is_some_and(|s| s.hit_test(point, tolerance)))
    }

    /// Union of all shape bounds.
    pub fn bounds(&self) -> Option<Rect> {
        let mut corners = Vec::with_capacity(self.shapes.len() * 2);
        for shape in self.shapes.iter().filter(|s| s.kind().is_some()) {
            let b = shape.bounds();
            corners.push(Point::new(b.x0, b.y0));
            corners.push(Point::new(b.x1, b.y1));
        }
        (!corners.is_empty()).then(|| points_bounds(&corners))
    }
}

/// The editor: document, view, tools, history and the current gesture.
#[derive(Debug)]
pub struct Canvas {
    pub document: CanvasDocument,
    pub camera: Camera,
    pub tools: ToolManager,
    pub config: EditorConfig,
    pub(crate) input: InputState,
    pub(crate) state: InteractionState,
    pub(crate) selection: Option<ShapeId>,
    pub(crate) history: History,
    pub(crate) clipboard: Option<Shape>,
    pub(crate) repaint: RepaintScheduler,
    viewport: Size,
    persist_requested: bool,
    local_edits: bool,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Canvas {
    pub fn new(config: EditorConfig) -> Self {
        let document = CanvasDocument::new();
        let mut history = History::new(config.history_depth);
        history.push_snapshot(Snapshot::capture(document.shapes()));
        Self {
            document,
            camera: Camera::with_limits(config.min_zoom, config.max_zoom),
            tools: ToolManager::new(),
            config,
            input: InputState::new(),
            state: InteractionState::Idle,
            selection: None,
            history,
            clipboard: None,
            repaint: RepaintScheduler::new(),
            viewport: Size::new(1280.0, 720.0),
            persist_requested: false,
            local_edits: false,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn selection(&self) -> Option<ShapeId> {
        self.selection
    }

    pub fn selected_shape(&self) -> Option<&Shape> {
        self.selection.and_then(|id| self.document.get(id))
    }

    /// Select a shape (or nothing). Unknown ids clear the selection.
    pub fn select(&mut self, id: Option<ShapeId>) {
        self.selection = id.filter(|id| self.document.contains(*id));
        self.request_repaint();
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn mode(&self) -> ToolMode {
        self.tools.mode
    }

    /// Switch tool mode. Drops the selection and any gesture in progress.
    pub fn set_mode(&mut self, mode: ToolMode) {
        log::debug!("Tool mode {:?} -> {:?}", self.tools.mode, mode);
        self.tools.set_mode(mode);
        self.selection = None;
        self.state = InteractionState::Idle;
        self.request_repaint();
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Size of the visible area in screen pixels; `+`/`-` zoom about its centre.
    pub fn set_viewport(&mut self, size: Size) {
        self.viewport = size;
        self.request_repaint();
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.tools.settings
    }

    pub fn request_repaint(&mut self) {
        self.repaint.request();
    }

    /// Consume a pending repaint request. See [`RepaintScheduler::tick`].
    pub fn take_repaint(&mut self) -> bool {
        self.repaint.tick()
    }

    /// Whether a completed change is waiting to be saved and broadcast.
    pub fn persist_pending(&self) -> bool {
        self.persist_requested
    }

    /// Consume the pending save request.
    pub fn take_persist_request(&mut self) -> bool {
        std::mem::take(&mut self.persist_requested)
    }

    /// Whether the document was edited locally since it was created or loaded.
    pub fn has_local_edits(&self) -> bool {
        self.local_edits
    }

    /// Record a completed mutation: one history entry, one save request.
    pub(crate) fn commit(&mut self) {
        self.history.push_snapshot(Snapshot::capture(self.document.shapes()));
        self.mark_changed();
    }

    fn mark_changed(&mut self) {
        self.persist_requested = true;
        self.local_edits = true;
        self.request_repaint();
    }

    /// Drop selection and gesture state that refer to shapes no longer present.
    fn forget_missing(&mut self) {
        if self.selection.is_some_and(|id| !self.document.contains(id)) {
            self.selection = None;
        }
        if self.state.target().is_some_and(|id| !self.document.contains(id)) {
            self.state = InteractionState::Idle;
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.document.replace_all(snapshot.restore());
        self.state = InteractionState::Idle;
        self.forget_missing();
        self.mark_changed();
    }

    /// Step back one history entry. No-op at the oldest entry.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Step forward one history entry. No-op at the newest entry.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Replace the document with a stored one. Resets history; not a local edit.
    pub fn load_records(&mut self, records: Vec<Value>) {
        self.document.replace_all(decode_records(records));
        self.history.clear_with(Snapshot::capture(self.document.shapes()));
        self.selection = None;
        self.state = InteractionState::Idle;
        self.local_edits = false;
        self.persist_requested = false;
        self.request_repaint();
    }

    /// Apply a peer's document wholesale. No history entry, no save.
    pub fn replace_from_remote(&mut self, records: Vec<Value>) {
        self.document.replace_all(decode_records(records));
        if matches!(self.state, InteractionState::Drawing { .. } | InteractionState::Erasing { .. }) {
            self.state = InteractionState::Idle;
        }
        self.forget_missing();
        self.request_repaint();
    }

    pub fn to_records(&self) -> Vec<Value> {
        self.document.to_records()
    }

    /// Copy the selected shape. Returns whether anything was copied.
    pub fn copy(&mut self) -> bool {
        self.clipboard = self.selected_shape().cloned();
        self.clipboard.is_some()
    }

    /// Paste the clipboard offset by the paste delta and select the copy.
    /// Repeated pastes cascade.
    pub fn paste(&mut self) -> Option<ShapeId> {
        let mut shape = self.clipboard.clone()?;
        let offset = self.config.paste_offset;
        shape.translate(Vec2::new(offset, offset));
        shape.regenerate_id();
        self.clipboard = Some(shape.clone());
        let id = self.document.push(shape);
        self.selection = Some(id);
        self.state = InteractionState::Idle;
        self.commit();
        Some(id)
    }

    /// Remove the selected shape.
    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.selection.take() else {
            return false;
        };
        if self.document.remove(id).is_none() {
            return false;
        }
        self.forget_missing();
        self.commit();
        true
    }

    /// Zoom about the viewport centre.
    pub fn zoom_by(&mut self, factor: f64) {
        let center = Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        self.camera.zoom_at(center, factor);
        self.request_repaint();
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(self.config.key_zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(1.0 / self.config.key_zoom_step);
    }

    /// Apply a style edit to the tool settings and, if a shape is selected,
    /// to that shape (one history entry, one save).
    fn restyle(&mut self, apply: impl Fn(&mut ToolSettings, Option<&mut Shape>)) {
        apply(&mut self.tools.settings, None);
        let Some(id) = self.selection else {
            return;
        };
        let settings = &mut self.tools.settings;
        if self.document.update(id, |shape| apply(settings, Some(shape))).is_some() {
            self.commit();
        }
    }

    pub fn set_stroke_color(&mut self, color: SerializableColor) {
        self.restyle(|settings, shape| match shape {
            Some(shape) => shape.style_mut().stroke_color = color,
            None => settings.stroke_color = color,
        });
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        let width = width.max(0.0);
        self.restyle(|settings, shape| match shape {
            Some(shape) => shape.style_mut().stroke_width = width,
            None => settings.stroke_width = width,
        });
    }

    pub fn set_fill(&mut self, fill: Option<SerializableColor>) {
        let fill = fill.filter(|c| c.a > 0);
        self.restyle(|settings, shape| match shape {
            Some(shape) => shape.style_mut().fill_color = fill,
            None => settings.fill_color = fill,
        });
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        let opacity = opacity.clamp(0.0, 1.0);
        self.restyle(|settings, shape| match shape {
            Some(shape) => shape.style_mut().opacity = opacity,
            None => settings.opacity = opacity,
        });
    }

    pub fn set_corner_radius(&mut self, radius: f64) {
        let radius = radius.max(0.0);
        self.restyle(|settings, shape| match shape {
            Some(shape) => shape.style_mut().corner_radius = radius,
            None => settings.corner_radius = radius,
        });
    }

    /// Choose the image placed by the icon tool.
    pub fn set_icon_reference(&mut self, reference: impl Into<String>) {
        self.tools.settings.icon_reference = Some(reference.into());
    }
}
