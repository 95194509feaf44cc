//! Pointer, wheel and keyboard handling for [`Canvas`].

use crate::canvas::Canvas;
use crate::input::{Key, KeyEvent, MouseButton, PointerEvent};
use crate::interaction::InteractionState;
use crate::selection::{angle_around, hit_handle, normalize_for_resize, resize_shape, rotation_for};
use crate::selection::HandleKind;
use crate::shapes::{Shape, ShapeId, ShapeKind};
use crate::tools::{DEFAULT_TEXT_SIZE, ToolMode, create_shape};
use kurbo::{Point, Vec2};

impl Canvas {
    /// Feed one pointer event. Positions are in screen coordinates.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        self.input.handle_pointer_event(&event);
        match event {
            PointerEvent::Down { position, button } => self.pointer_down(position, button),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { position, button } => self.pointer_up(position, button),
            PointerEvent::Scroll { position, delta } => self.wheel(position, delta),
        }
    }

    /// Wheel zoom anchored at the pointer.
    pub fn wheel(&mut self, position: Point, delta: Vec2) {
        let factor = (1.0 - delta.y * self.config.wheel_zoom_speed).max(0.01);
        self.camera.zoom_at(position, factor);
        self.request_repaint();
    }

    fn pointer_down(&mut self, screen: Point, button: MouseButton) {
        if matches!(self.state, InteractionState::Panning { .. }) {
            return;
        }
        if button.is_secondary() {
            let resume = match self.state {
                InteractionState::EditingText { id } => Some(id),
                _ => None,
            };
            self.state = InteractionState::Panning { last: screen, resume };
            return;
        }

        let world = self.camera.screen_to_world(screen);

        if self.tools.mode == ToolMode::Eraser {
            self.selection = None;
            self.state = InteractionState::Erasing { erased: 0 };
            self.erase_at(world);
            return;
        }

        if self.begin_handle_gesture(screen, world) {
            return;
        }

        match self.tools.mode {
            ToolMode::Select => match self.document.hit_test(world, self.config.hit_tolerance) {
                Some(id) => {
                    self.selection = Some(id);
                    self.state = InteractionState::Dragging { id, last: world, moved: false };
                    self.request_repaint();
                }
                None => {
                    self.selection = None;
                    self.state = InteractionState::Idle;
                    self.request_repaint();
                }
            },
            ToolMode::Draw(ShapeKind::Text) => {
                let shape = create_shape(ShapeKind::Text, world, world + DEFAULT_TEXT_SIZE, &self.tools.settings);
                let id = self.document.push(shape);
                self.selection = Some(id);
                self.state = InteractionState::EditingText { id };
                self.commit();
            }
            ToolMode::Draw(kind) => {
                let preview = (kind == ShapeKind::FreeDraw)
                    .then(|| create_shape(kind, world, world, &self.tools.settings));
                self.selection = None;
                self.state = InteractionState::Drawing {
                    kind,
                    start: world,
                    current: world,
                    preview,
                };
                self.request_repaint();
            }
            ToolMode::Eraser => {}
        }
    }

    /// Start a resize or rotate if the pointer is on a handle of the selection.
    fn begin_handle_gesture(&mut self, screen: Point, world: Point) -> bool {
        let Some(shape) = self.selected_shape() else {
            return false;
        };
        let Some(handle) = hit_handle(shape, &self.camera, &self.config, screen) else {
            return false;
        };
        let id = shape.id();
        self.state = match handle {
            HandleKind::Rotate => {
                let center = shape.center();
                InteractionState::Rotating {
                    id,
                    center,
                    start_angle: angle_around(center, world),
                    initial: shape.rotation(),
                    moved: false,
                }
            }
            handle => InteractionState::Resizing {
                id,
                handle,
                start: world,
                original: normalize_for_resize(shape),
                moved: false,
            },
        };
        self.request_repaint();
        true
    }

    fn pointer_move(&mut self, screen: Point) {
        let world = self.camera.screen_to_world(screen);
        let settings = &self.tools.settings;
        let mut erase = false;
        match &mut self.state {
            InteractionState::Idle | InteractionState::EditingText { .. } => return,
            InteractionState::Drawing { kind, start, current, preview } => {
                *current = world;
                if *kind == ShapeKind::FreeDraw {
                    if let Some(Shape::FreeDraw(stroke)) = preview {
                        stroke.add_point(world);
                    }
                } else {
                    *preview = Some(create_shape(*kind, *start, world, settings));
                }
            }
            InteractionState::Dragging { id, last, moved } => {
                let delta = world - *last;
                *last = world;
                if delta != Vec2::ZERO {
                    *moved = true;
                    self.document.update(*id, |s| s.translate(delta));
                }
            }
            InteractionState::Resizing { id, handle, start, original, moved } => {
                let resized = resize_shape(original, *handle, world - *start);
                *moved = true;
                self.document.replace(*id, resized);
            }
            InteractionState::Rotating { id, center, start_angle, initial, moved } => {
                let rotation = rotation_for(*center, *start_angle, *initial, world);
                *moved = true;
                self.document.update(*id, |s| s.set_rotation(rotation));
            }
            InteractionState::Panning { last, .. } => {
                let delta = screen - *last;
                *last = screen;
                self.camera.pan_by(delta);
            }
            InteractionState::Erasing { .. } => erase = true,
        }
        if erase {
            self.erase_at(world);
        }
        self.request_repaint();
    }

    fn pointer_up(&mut self, screen: Point, button: MouseButton) {
        let world = self.camera.screen_to_world(screen);
        let state = std::mem::take(&mut self.state);
        match state {
            InteractionState::Panning { resume, last } => {
                if !button.is_secondary() {
                    // Primary release while panning: keep panning
                    self.state = InteractionState::Panning { last, resume };
                    return;
                }
                self.state = match resume.filter(|id| self.document.contains(*id)) {
                    Some(id) => InteractionState::EditingText { id },
                    None => InteractionState::Idle,
                };
            }
            InteractionState::Drawing { kind, start, preview, .. } => {
                let shape = match (kind, preview) {
                    (ShapeKind::FreeDraw, Some(Shape::FreeDraw(mut stroke))) => {
                        if stroke.points.last() != Some(&world) {
                            stroke.add_point(world);
                        }
                        Shape::FreeDraw(stroke)
                    }
                    _ => create_shape(kind, start, world, &self.tools.settings),
                };
                let id = self.document.push(shape);
                log::debug!("Created {kind:?} {id}");
                self.commit();
            }
            InteractionState::Dragging { id, moved, .. } => {
                if moved {
                    self.commit();
                }
                if self.document.get(id).is_some_and(Shape::is_text_like) {
                    self.state = InteractionState::EditingText { id };
                }
            }
            InteractionState::Resizing { moved, .. } | InteractionState::Rotating { moved, .. } => {
                if moved {
                    self.commit();
                }
            }
            InteractionState::Erasing { erased } => {
                if erased > 0 {
                    self.commit();
                }
            }
            other @ (InteractionState::Idle | InteractionState::EditingText { .. }) => {
                self.state = other;
            }
        }
        self.request_repaint();
    }

    /// Remove every shape touched by the eraser at `world`.
    fn erase_at(&mut self, world: Point) -> usize {
        let radius = self.config.eraser_radius;
        let tolerance = self.config.hit_tolerance;
        let victims: Vec<ShapeId> = self
            .document
            .index()
            .query_point(world, radius.max(tolerance))
            .into_iter()
            .filter(|id| {
                self.document.get(*id).is_some_and(|shape| match shape {
                    Shape::FreeDraw(stroke) => {
                        shape.hit_test(world, tolerance) || stroke.has_point_near(world, radius)
                    }
                    _ => shape.hit_test(world, tolerance),
                })
            })
            .collect();
        for id in &victims {
            self.document.remove(*id);
            if self.selection == Some(*id) {
                self.selection = None;
            }
        }
        if let InteractionState::Erasing { erased } = &mut self.state {
            *erased += victims.len();
        }
        if !victims.is_empty() {
            log::debug!("Erased {} shape(s)", victims.len());
            self.request_repaint();
        }
        victims.len()
    }

    /// Shape receiving typed characters: the one being edited, or a selected Text/Code.
    fn text_target(&self) -> Option<ShapeId> {
        match self.state {
            InteractionState::EditingText { id } => Some(id),
            InteractionState::Idle => self
                .selected_shape()
                .filter(|s| s.is_text_like())
                .map(Shape::id),
            _ => None,
        }
    }

    /// Feed one key press. Returns whether the canvas used it.
    pub fn handle_key(&mut self, event: KeyEvent) -> bool {
        let command = event.modifiers.command();
        if command {
            if let Key::Char(ch) = event.key {
                return match ch.to_ascii_lowercase() {
                    'z' if event.modifiers.shift => self.redo(),
                    'z' => self.undo(),
                    'y' => self.redo(),
                    'c' => self.copy(),
                    'v' => self.paste().is_some(),
                    _ => false,
                };
            }
            return false;
        }

        if let Some(id) = self.text_target() {
            let edited = match &event.key {
                Key::Char(ch) => self.document.update(id, |s| s.push_char(*ch)),
                Key::Enter => self.document.update(id, |s| s.push_char('\n')),
                Key::Backspace => self.document.update(id, Shape::pop_char),
                Key::Escape => {
                    self.state = InteractionState::Idle;
                    self.selection = None;
                    self.request_repaint();
                    return true;
                }
                _ => None,
            };
            if let Some(changed) = edited {
                if changed {
                    self.commit();
                }
                return true;
            }
        }

        match event.key {
            Key::Char('+') | Key::Char('=') => {
                self.zoom_in();
                true
            }
            Key::Char('-') => {
                self.zoom_out();
                true
            }
            Key::Delete => self.delete_selected(),
            Key::Escape => {
                self.selection = None;
                self.state = InteractionState::Idle;
                self.request_repaint();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use crate::shapes::FreeDraw;

    fn down(canvas: &mut Canvas, x: f64, y: f64) {
        canvas.handle_pointer(PointerEvent::Down { position: Point::new(x, y), button: MouseButton::Left });
    }

    fn drag_to(canvas: &mut Canvas, x: f64, y: f64) {
        canvas.handle_pointer(PointerEvent::Move { position: Point::new(x, y) });
        canvas.handle_pointer(PointerEvent::Up { position: Point::new(x, y), button: MouseButton::Left });
    }

    #[test]
    fn test_draw_commits_on_release_only() {
        let mut canvas = Canvas::default();
        canvas.set_mode(ToolMode::Draw(ShapeKind::Ellipse));
        down(&mut canvas, 0.0, 0.0);
        canvas.handle_pointer(PointerEvent::Move { position: Point::new(40.0, 20.0) });
        assert!(canvas.state().preview().is_some());
        assert!(canvas.document.is_empty());
        canvas.handle_pointer(PointerEvent::Up { position: Point::new(50.0, 30.0), button: MouseButton::Left });
        assert_eq!(canvas.document.len(), 1);
        assert_eq!(
            canvas.document.shapes()[0].anchors(),
            Some((Point::ZERO, Point::new(50.0, 30.0)))
        );
        assert_eq!(canvas.history().len(), 2);
        assert!(canvas.take_persist_request());
    }

    #[test]
    fn test_click_without_move_does_not_push_history() {
        let mut canvas = Canvas::default();
        canvas.document.push(create_shape(
            ShapeKind::Rectangle,
            Point::ZERO,
            Point::new(100.0, 100.0),
            &canvas.tools.settings,
        ));
        down(&mut canvas, 50.0, 50.0);
        canvas.handle_pointer(PointerEvent::Up { position: Point::new(50.0, 50.0), button: MouseButton::Left });
        assert!(canvas.selection().is_some());
        assert_eq!(canvas.history().len(), 1);
        assert!(!canvas.take_persist_request());
    }

    #[test]
    fn test_secondary_button_pans_and_restores_editing() {
        let mut canvas = Canvas::default();
        canvas.set_mode(ToolMode::Draw(ShapeKind::Text));
        down(&mut canvas, 10.0, 10.0);
        let InteractionState::EditingText { id } = *canvas.state() else {
            panic!("expected text editing");
        };
        canvas.handle_pointer(PointerEvent::Down { position: Point::new(200.0, 200.0), button: MouseButton::Right });
        canvas.handle_pointer(PointerEvent::Move { position: Point::new(230.0, 190.0) });
        canvas.handle_pointer(PointerEvent::Up { position: Point::new(230.0, 190.0), button: MouseButton::Right });
        assert_eq!(canvas.camera.pan, Vec2::new(30.0, -10.0));
        assert_eq!(*canvas.state(), InteractionState::EditingText { id });
        assert_eq!(canvas.history().len(), 2);
    }

    #[test]
    fn test_typing_into_text() {
        let mut canvas = Canvas::default();
        canvas.set_mode(ToolMode::Draw(ShapeKind::Text));
        down(&mut canvas, 10.0, 10.0);
        for ch in "hi".chars() {
            assert!(canvas.handle_key(KeyEvent::char(ch)));
        }
        canvas.handle_key(KeyEvent::new(Key::Enter));
        canvas.handle_key(KeyEvent::char('x'));
        canvas.handle_key(KeyEvent::new(Key::Backspace));
        match &canvas.document.shapes()[0] {
            Shape::Text(text) => assert_eq!(text.content, "hi\n"),
            other => panic!("expected text, got {other:?}"),
        }
        // creation + 5 edits
        assert_eq!(canvas.history().len(), 7);
    }

    #[test]
    fn test_rotate_via_knob() {
        let mut canvas = Canvas::default();
        let id = canvas.document.push(create_shape(
            ShapeKind::Rectangle,
            Point::new(0.0, 0.0),
            Point::new(100.0, 100.0),
            &canvas.tools.settings,
        ));
        canvas.select(Some(id));
        // Knob sits 30px above the padded frame at the top centre
        down(&mut canvas, 50.0, -36.0);
        assert!(matches!(canvas.state(), InteractionState::Rotating { .. }));
        drag_to(&mut canvas, 150.0, 50.0);
        let rotation = canvas.document.get(id).unwrap().rotation();
        assert!((rotation - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert_eq!(canvas.document.index().bounds_of(id), Some(canvas.document.get(id).unwrap().bounds()));
    }

    #[test]
    fn test_freedraw_gesture() {
        let mut canvas = Canvas::default();
        canvas.set_mode(ToolMode::Draw(ShapeKind::FreeDraw));
        down(&mut canvas, 0.0, 0.0);
        canvas.handle_pointer(PointerEvent::Move { position: Point::new(5.0, 5.0) });
        drag_to(&mut canvas, 10.0, 0.0);
        match &canvas.document.shapes()[0] {
            Shape::FreeDraw(FreeDraw { points, .. }) => assert_eq!(points.len(), 3),
            other => panic!("expected stroke, got {other:?}"),
        }
    }

    #[test]
    fn test_redo_shortcuts() {
        let mut canvas = Canvas::default();
        canvas.set_mode(ToolMode::Draw(ShapeKind::Line));
        down(&mut canvas, 0.0, 0.0);
        drag_to(&mut canvas, 10.0, 10.0);
        assert!(canvas.handle_key(KeyEvent::command('z')));
        assert!(canvas.document.is_empty());
        let shift_z = KeyEvent::with_modifiers(
            Key::Char('Z'),
            Modifiers { ctrl: true, shift: true, ..Modifiers::default() },
        );
        assert!(canvas.handle_key(shift_z));
        assert_eq!(canvas.document.len(), 1);
        assert!(!canvas.handle_key(KeyEvent::command('y')));
    }

    #[test]
    fn test_keyboard_zoom_about_center() {
        let mut canvas = Canvas::default();
        canvas.set_viewport(kurbo::Size::new(800.0, 600.0));
        let center = Point::new(400.0, 300.0);
        let before = canvas.camera.screen_to_world(center);
        assert!(canvas.handle_key(KeyEvent::char('+')));
        let after = canvas.camera.screen_to_world(center);
        assert!((before - after).hypot() < 1e-9);
        assert!((canvas.camera.zoom_x - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_delete_key_removes_selection() {
        let mut canvas = Canvas::default();
        let id = canvas.document.push(create_shape(
            ShapeKind::Circle,
            Point::new(50.0, 50.0),
            Point::new(60.0, 50.0),
            &canvas.tools.settings,
        ));
        canvas.select(Some(id));
        assert!(!canvas.handle_key(KeyEvent::new(Key::Backspace)));
        assert_eq!(canvas.document.len(), 1);
        assert_eq!(canvas.selection(), Some(id));
        assert!(canvas.handle_key(KeyEvent::new(Key::Delete)));
        assert!(canvas.document.is_empty());
        assert!(canvas.selection().is_none());
    }
}
