//! Snapshot-based undo/redo.

use crate::shapes::{Shape, decode_records, encode_shapes};
use std::collections::VecDeque;
use std::sync::Arc;

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// An immutable serialization of the full shape sequence at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Arc<str>);

impl Snapshot {
    /// Serialize the shapes, in order.
    pub fn capture(shapes: &[Shape]) -> Self {
        let records = encode_shapes(shapes);
        let json = serde_json::to_string(&records).unwrap_or_else(|err| {
            log::error!("Failed to serialize snapshot: {err}");
            "[]".to_string()
        });
        Self(json.into())
    }

    /// Rebuild the shape sequence this snapshot was taken from.
    pub fn restore(&self) -> Vec<Shape> {
        match serde_json::from_str::<Vec<serde_json::Value>>(&self.0) {
            Ok(records) => decode_records(records),
            Err(err) => {
                log::error!("Corrupt history snapshot: {err}");
                Vec::new()
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Bounded history with a cursor.
///
/// When non-empty, `cursor < len`. Pushing drops everything after the cursor;
/// overflowing the depth evicts the oldest entry.
#[derive(Clone, Debug)]
pub struct UndoHistory<T: Clone> {
    stack: VecDeque<T>,
    cursor: usize,
    depth: usize,
}

impl<T: Clone> UndoHistory<T> {
    /// Empty history holding at most `depth` entries.
    pub fn new(depth: usize) -> Self {
        Self {
            stack: VecDeque::new(),
            cursor: 0,
            depth: depth.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Index of the current entry, if any.
    pub fn cursor(&self) -> Option<usize> {
        (!self.stack.is_empty()).then_some(self.cursor)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Entry at the cursor.
    pub fn current(&self) -> Option<&T> {
        self.stack.get(self.cursor)
    }

    pub fn entries(&self) -> impl Iterator<Item = &T> {
        self.stack.iter()
    }

    pub fn push_snapshot(&mut self, value: T) {
        if self.cursor + 1 < self.stack.len() {
            self.stack.truncate(self.cursor + 1);
        }
        self.stack.push_back(value);
        while self.stack.len() > self.depth {
            self.stack.pop_front();
        }
        self.cursor = self.stack.len().saturating_sub(1);
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0 && !self.stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.stack.len()
    }

    pub fn undo(&mut self) -> Option<T> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.stack.get(self.cursor).cloned()
    }

    pub fn redo(&mut self) -> Option<T> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.stack.get(self.cursor).cloned()
    }

    /// Drop all entries and start over from `value`.
    pub fn clear_with(&mut self, value: T) {
        self.stack.clear();
        self.stack.push_back(value);
        self.cursor = 0;
    }
}

/// Document history: snapshots of the shape sequence.
pub type History = UndoHistory<Snapshot>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Line, Rectangle};
    use kurbo::Point;

    #[test]
    fn undo_redo_flow() {
        let mut history = UndoHistory::new(10);
        history.push_snapshot(vec![1]);
        history.push_snapshot(vec![1, 2]);
        history.push_snapshot(vec![1, 2, 3]);

        assert_eq!(history.undo(), Some(vec![1, 2]));
        assert_eq!(history.undo(), Some(vec![1]));
        assert_eq!(history.undo(), None);

        assert_eq!(history.redo(), Some(vec![1, 2]));
        history.push_snapshot(vec![9]);
        assert_eq!(history.redo(), None);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn boundaries_are_noops() {
        let mut history: UndoHistory<u32> = UndoHistory::new(5);
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);
        assert_eq!(history.cursor(), None);
        history.push_snapshot(1);
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut history = UndoHistory::new(100);
        for i in 1..=101 {
            history.push_snapshot(i);
        }
        assert_eq!(history.len(), 100);
        assert_eq!(history.entries().next(), Some(&2));
        assert_eq!(history.current(), Some(&101));
        assert_eq!(history.cursor(), Some(99));
    }

    #[test]
    fn overflow_after_undo_keeps_cursor_valid() {
        let mut history = UndoHistory::new(3);
        for i in 0..3 {
            history.push_snapshot(i);
        }
        history.undo();
        history.push_snapshot(10);
        history.push_snapshot(11);
        assert_eq!(history.entries().copied().collect::<Vec<_>>(), vec![1, 10, 11]);
        assert_eq!(history.cursor(), Some(2));
    }

    #[test]
    fn n_undos_then_n_redos_restores_state() {
        let mut history = History::new(DEFAULT_HISTORY_DEPTH);
        let mut shapes = Vec::new();
        history.push_snapshot(Snapshot::capture(&shapes));
        for i in 0..5 {
            let offset = i as f64 * 10.0;
            shapes.push(crate::shapes::Shape::Line(Line::new(
                Point::new(offset, 0.0),
                Point::new(offset, 50.0),
            )));
            history.push_snapshot(Snapshot::capture(&shapes));
        }
        for _ in 0..5 {
            assert!(history.undo().is_some());
        }
        assert!(history.undo().is_none());
        let mut last = None;
        for _ in 0..5 {
            last = history.redo();
        }
        assert_eq!(last.map(|s| s.restore()), Some(shapes));
    }

    #[test]
    fn snapshot_round_trip() {
        let mut rect = Rectangle::new(Point::new(1.0, 2.0), Point::new(3.0, 4.0));
        rect.rotation = 1.25;
        let shapes = vec![crate::shapes::Shape::Rectangle(rect)];
        assert_eq!(Snapshot::capture(&shapes).restore(), shapes);
    }
}
