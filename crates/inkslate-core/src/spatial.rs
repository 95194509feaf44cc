//! Bounding-box index used as the broad phase of hit testing.
//!
//! Boxes live in a uniform grid; boxes covering too many cells go to a flat
//! oversize list instead. Queries return ids in insertion order, and
//! [`SpatialIndex::update`] keeps an entry's place in that order.

use crate::shapes::ShapeId;
use kurbo::{Point, Rect};
use std::collections::{HashMap, HashSet};

/// Side of one grid cell, in world units.
pub const CELL_SIZE: f64 = 128.0;
/// Boxes spanning more cells than this are kept in the oversize list.
pub const MAX_CELLS_PER_ENTRY: usize = 64;

type Cell = (i64, i64);

#[derive(Debug, Clone)]
struct Entry {
    bounds: Rect,
    seq: u64,
    /// Cells this entry was filed under; `None` when oversize.
    cells: Option<Vec<Cell>>,
}

/// Grid index from shape ids to their bounding boxes.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    entries: HashMap<ShapeId, Entry>,
    grid: HashMap<Cell, Vec<ShapeId>>,
    oversize: HashSet<ShapeId>,
    next_seq: u64,
}

fn cell_range(bounds: Rect) -> Option<(Cell, Cell)> {
    if !(bounds.x0.is_finite() && bounds.y0.is_finite() && bounds.x1.is_finite() && bounds.y1.is_finite()) {
        return None;
    }
    let min = ((bounds.x0 / CELL_SIZE).floor() as i64, (bounds.y0 / CELL_SIZE).floor() as i64);
    let max = ((bounds.x1 / CELL_SIZE).floor() as i64, (bounds.y1 / CELL_SIZE).floor() as i64);
    Some((min, max))
}

fn cells_for(bounds: Rect) -> Option<Vec<Cell>> {
    let (min, max) = cell_range(bounds)?;
    // Far-off coordinates can span more cells than i64 counts
    let span = |lo: i64, hi: i64| hi.checked_sub(lo)?.checked_add(1);
    let count = span(min.0, max.0)?.checked_mul(span(min.1, max.1)?)?;
    if count <= 0 || count as usize > MAX_CELLS_PER_ENTRY {
        return None;
    }
    let mut cells = Vec::with_capacity(count as usize);
    for cx in min.0..=max.0 {
        for cy in min.1..=max.1 {
            cells.push((cx, cy));
        }
    }
    Some(cells)
}

fn intersects(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Indexed bounds of an entry.
    pub fn bounds_of(&self, id: ShapeId) -> Option<Rect> {
        self.entries.get(&id).map(|e| e.bounds)
    }

    /// Add an entry at the top of the insertion order. Re-inserting an
    /// existing id moves it to the top.
    pub fn insert(&mut self, id: ShapeId, bounds: Rect) {
        self.remove(id);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.file(id, bounds, seq);
    }

    /// Replace an entry's bounds, keeping its position in the insertion order.
    pub fn update(&mut self, id: ShapeId, bounds: Rect) {
        match self.unfile(id) {
            Some(seq) => self.file(id, bounds, seq),
            None => self.insert(id, bounds),
        }
    }

    /// Remove an entry. Returns whether it was present.
    pub fn remove(&mut self, id: ShapeId) -> bool {
        self.unfile(id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.grid.clear();
        self.oversize.clear();
    }

    fn file(&mut self, id: ShapeId, bounds: Rect, seq: u64) {
        let cells = cells_for(bounds);
        match &cells {
            Some(cells) => {
                for cell in cells {
                    self.grid.entry(*cell).or_default().push(id);
                }
            }
            None => {
                self.oversize.insert(id);
            }
        }
        self.entries.insert(id, Entry { bounds, seq, cells });
    }

    fn unfile(&mut self, id: ShapeId) -> Option<u64> {
        let entry = self.entries.remove(&id)?;
        match entry.cells {
            Some(cells) => {
                for cell in cells {
                    if let Some(ids) = self.grid.get_mut(&cell) {
                        ids.retain(|other| *other != id);
                        if ids.is_empty() {
                            self.grid.remove(&cell);
                        }
                    }
                }
            }
            None => {
                self.oversize.remove(&id);
            }
        }
        Some(entry.seq)
    }

    /// Ids whose boxes intersect `rect` (edges inclusive), in insertion order.
    pub fn query_rect(&self, rect: Rect) -> Vec<ShapeId> {
        let mut found: HashSet<ShapeId> = self.oversize.iter().copied().collect();
        match cells_for(rect) {
            Some(cells) => {
                for cell in cells {
                    if let Some(ids) = self.grid.get(&cell) {
                        found.extend(ids.iter().copied());
                    }
                }
            }
            // Query too large for the grid: scan everything
            None => found.extend(self.entries.keys().copied()),
        }

        let mut hits: Vec<(u64, ShapeId)> = found
            .into_iter()
            .filter_map(|id| {
                let entry = self.entries.get(&id)?;
                intersects(entry.bounds, rect).then_some((entry.seq, id))
            })
            .collect();
        hits.sort_unstable_by_key(|(seq, _)| *seq);
        hits.into_iter().map(|(_, id)| id).collect()
    }

    /// Ids whose boxes lie within `slop` of `point`, in insertion order.
    pub fn query_point(&self, point: Point, slop: f64) -> Vec<ShapeId> {
        let slop = slop.max(0.0);
        self.query_rect(Rect::new(point.x - slop, point.y - slop, point.x + slop, point.y + slop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_query_returns_insertion_order() {
        let mut index = SpatialIndex::new();
        let ids: Vec<_> = (0..5).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            index.insert(*id, Rect::new(0.0, 0.0, 50.0, 50.0));
        }
        assert_eq!(index.query_point(Point::new(10.0, 10.0), 0.0), ids);
    }

    #[test]
    fn test_update_keeps_order_and_moves_box() {
        let mut index = SpatialIndex::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        index.insert(a, Rect::new(0.0, 0.0, 10.0, 10.0));
        index.insert(b, Rect::new(0.0, 0.0, 10.0, 10.0));
        index.update(a, Rect::new(500.0, 500.0, 520.0, 520.0));
        assert_eq!(index.query_point(Point::new(5.0, 5.0), 0.0), vec![b]);
        index.update(a, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(index.query_point(Point::new(5.0, 5.0), 0.0), vec![a, b]);
        assert_eq!(index.bounds_of(a), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_stale_entry_is_a_false_negative() {
        let mut index = SpatialIndex::new();
        let id = Uuid::new_v4();
        index.insert(id, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(index.query_point(Point::new(300.0, 300.0), 1.0).is_empty());
        index.update(id, Rect::new(295.0, 295.0, 305.0, 305.0));
        assert_eq!(index.query_point(Point::new(300.0, 300.0), 1.0), vec![id]);
    }

    #[test]
    fn test_oversize_entries() {
        let mut index = SpatialIndex::new();
        let huge = Uuid::new_v4();
        let small = Uuid::new_v4();
        index.insert(huge, Rect::new(-10_000.0, -10_000.0, 10_000.0, 10_000.0));
        index.insert(small, Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(index.query_point(Point::new(0.5, 0.5), 0.0), vec![huge, small]);
        assert_eq!(index.query_point(Point::new(9_000.0, -9_000.0), 0.0), vec![huge]);
        assert!(index.remove(huge));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_degenerate_and_negative_boxes() {
        let mut index = SpatialIndex::new();
        let dot = Uuid::new_v4();
        index.insert(dot, Rect::new(-200.0, -200.0, -200.0, -200.0));
        assert_eq!(index.query_point(Point::new(-201.0, -199.0), 3.0), vec![dot]);
    }

    #[test]
    fn test_far_off_boxes_go_to_oversize_list() {
        let mut index = SpatialIndex::new();
        let wide = Uuid::new_v4();
        let far = Uuid::new_v4();
        index.insert(wide, Rect::new(-1e21, -1e21, 1e21, 1e21));
        index.insert(far, Rect::new(1e300, 1e300, 1e300, 1e300));
        assert_eq!(index.query_point(Point::new(0.0, 0.0), 1.0), vec![wide]);
        assert_eq!(index.query_rect(Rect::new(-1e21, 0.0, 1e21, 0.0)), vec![wide]);
        assert_eq!(index.query_point(Point::new(1e300, 1e300), 0.0), vec![far]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut index = SpatialIndex::new();
        let id = Uuid::new_v4();
        index.insert(id, Rect::new(0.0, 0.0, 300.0, 300.0));
        assert!(index.remove(id));
        assert!(!index.remove(id));
        assert!(index.query_rect(Rect::new(0.0, 0.0, 300.0, 300.0)).is_empty());
        index.insert(id, Rect::new(0.0, 0.0, 1.0, 1.0));
        index.clear();
        assert!(index.is_empty());
    }
}
