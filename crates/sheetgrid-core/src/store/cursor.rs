//! Bounded traversal over a [`SparseStore`]
//!
//! Column-major traversal walks the store's canonical order directly.
//! Row-major traversal keeps one frontier entry per column bucket inside the
//! bounds and merges them through a min-heap, so each step costs
//! `O(log columns)` instead of a scan across every column.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::{CellBounds, CellKey, SparseStore};

/// Order in which a [`CellCursor`] visits entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalOrder {
    /// Row by row, left to right inside a row (reading order)
    #[default]
    RowMajor,
    /// Column by column, top to bottom (the store's canonical order)
    ColumnMajor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    BeforeStart,
    At(CellKey),
    Exhausted,
}

/// Next unvisited `(row, col)` of a column bucket, plus the bucket's slot
type FrontierEntry = Reverse<(u32, u16, usize)>;

/// Cursor over the populated entries inside a [`CellBounds`]
///
/// The cursor borrows the store, so the store cannot change while a traversal
/// is in progress. Call [`CellCursor::advance`] until it returns `false`, or use
/// the cursor as an [`Iterator`].
///
/// ```
/// use sheetgrid_core::store::{CellBounds, SparseStore};
///
/// let mut store = SparseStore::new();
/// store.set_value(1, 2, 'b').unwrap();
/// store.set_value(1, 1, 'a').unwrap();
/// store.set_value(2, 1, 'c').unwrap();
///
/// let visited: Vec<char> = store.cursor(CellBounds::sheet()).map(|(_, _, v)| *v).collect();
/// assert_eq!(visited, vec!['a', 'b', 'c']);
/// ```
#[derive(Debug, Clone)]
pub struct CellCursor<'a, T> {
    store: &'a SparseStore<T>,
    bounds: CellBounds,
    order: TraversalOrder,
    position: Position,
    frontier: BinaryHeap<FrontierEntry>,
}

impl<'a, T> CellCursor<'a, T> {
    /// Row-major cursor
    pub fn new(store: &'a SparseStore<T>, bounds: CellBounds) -> Self {
        Self::with_order(store, bounds, TraversalOrder::RowMajor)
    }

    /// Cursor with an explicit traversal order
    pub fn with_order(store: &'a SparseStore<T>, bounds: CellBounds, order: TraversalOrder) -> Self {
        Self {
            store,
            bounds,
            order,
            position: Position::BeforeStart,
            frontier: BinaryHeap::new(),
        }
    }

    /// Bounds this cursor was created with
    pub fn bounds(&self) -> &CellBounds {
        &self.bounds
    }

    /// Traversal order
    pub fn order(&self) -> TraversalOrder {
        self.order
    }

    /// Rewind to before the first entry
    pub fn reset(&mut self) {
        self.position = Position::BeforeStart;
        self.frontier.clear();
    }

    /// Move to the next populated entry; `false` once the bounds are exhausted
    ///
    /// Advancing an exhausted cursor keeps returning `false`.
    pub fn advance(&mut self) -> bool {
        let next = match (self.position, self.order) {
            (Position::Exhausted, _) => None,
            (Position::BeforeStart, TraversalOrder::ColumnMajor) => {
                self.store.first_cell_in(&self.bounds)
            }
            (Position::At(key), TraversalOrder::ColumnMajor) => {
                let (row, col) = key.decode();
                self.store.next_cell_in(row, col, &self.bounds)
            }
            (Position::BeforeStart, TraversalOrder::RowMajor) => {
                self.seed_frontier();
                self.pop_frontier()
            }
            (Position::At(_), TraversalOrder::RowMajor) => self.pop_frontier(),
        };
        match next {
            Some((row, col)) => {
                self.position = Position::At(CellKey::from_parts(row, col));
                true
            }
            None => {
                self.position = Position::Exhausted;
                self.frontier.clear();
                false
            }
        }
    }

    /// Push the first in-bounds entry of every column bucket inside the bounds
    fn seed_frontier(&mut self) {
        let store = self.store;
        let bounds = self.bounds;
        self.frontier.clear();
        for (slot, index) in store.buckets_in(bounds.from_col, bounds.to_col) {
            if let Some((row, _)) = index.first_at_or_after(bounds.from_row) {
                if row <= bounds.to_row {
                    self.frontier.push(Reverse((row, index.col, slot)));
                }
            }
        }
    }

    /// Take the smallest `(row, col)` and refill from the same column
    fn pop_frontier(&mut self) -> Option<(u32, u16)> {
        let Reverse((row, col, slot)) = self.frontier.pop()?;
        if row < self.bounds.to_row {
            let next = self
                .store
                .bucket(slot)
                .and_then(|index| index.first_at_or_after(row + 1));
            if let Some((next_row, _)) = next {
                if next_row <= self.bounds.to_row {
                    self.frontier.push(Reverse((next_row, col, slot)));
                }
            }
        }
        Some((row, col))
    }

    /// Encoded address of the current entry
    pub fn key(&self) -> Option<CellKey> {
        match self.position {
            Position::At(key) => Some(key),
            _ => None,
        }
    }

    /// Row of the current entry (0 when not positioned on an entry)
    pub fn row(&self) -> u32 {
        self.key().map_or(0, CellKey::row)
    }

    /// Column of the current entry (0 when not positioned on an entry)
    pub fn column(&self) -> u16 {
        self.key().map_or(0, CellKey::col)
    }

    /// Value of the current entry
    pub fn value(&self) -> Option<&'a T> {
        let (row, col) = self.key()?.decode();
        self.store.get(row, col)
    }
}

impl<'a, T> Iterator for CellCursor<'a, T> {
    type Item = (u32, u16, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.advance() {
            return None;
        }
        let value = self.value()?;
        Some((self.row(), self.column(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MAX_COLS, MAX_ROWS};
    use pretty_assertions::assert_eq;

    fn sample() -> SparseStore<&'static str> {
        let mut store = SparseStore::new();
        store.set_value(5, 3, "X").unwrap();
        store.set_value(5, 7, "Y").unwrap();
        store.set_value(100, 3, "Z").unwrap();
        store.set_value(1, 9, "W").unwrap();
        store
    }

    fn coords<T>(cursor: CellCursor<'_, T>) -> Vec<(u32, u16)> {
        cursor.map(|(r, c, _)| (r, c)).collect()
    }

    #[test]
    fn test_row_major_order() {
        let store = sample();
        assert_eq!(
            coords(store.cursor(CellBounds::sheet())),
            vec![(1, 9), (5, 3), (5, 7), (100, 3)]
        );
    }

    #[test]
    fn test_column_major_order() {
        let store = sample();
        assert_eq!(
            coords(store.cursor_by_column(CellBounds::sheet())),
            vec![(5, 3), (100, 3), (5, 7), (1, 9)]
        );
    }

    #[test]
    fn test_bounded_cursor_skips_outside() {
        let store = sample();
        let bounds = CellBounds::new(2, 3, 99, 8).unwrap();
        assert_eq!(coords(store.cursor(bounds)), vec![(5, 3), (5, 7)]);
        assert_eq!(coords(store.cursor_by_column(bounds)), vec![(5, 3), (5, 7)]);
    }

    #[test]
    fn test_single_column_scenario() {
        let store = sample();
        let mut cursor = store.cursor(CellBounds::column(3));

        assert!(cursor.advance());
        assert_eq!((cursor.row(), cursor.column()), (5, 3));
        assert_eq!(cursor.value(), Some(&"X"));

        assert!(cursor.advance());
        assert_eq!((cursor.row(), cursor.column()), (100, 3));

        assert!(!cursor.advance());
        assert!(!cursor.advance());
        assert_eq!(cursor.value(), None);
    }

    #[test]
    fn test_reset_restarts() {
        let store = sample();
        let mut cursor = store.cursor(CellBounds::sheet());
        while cursor.advance() {}
        cursor.reset();
        assert!(cursor.advance());
        assert_eq!((cursor.row(), cursor.column()), (1, 9));
    }

    #[test]
    fn test_sentinels_visible_only_with_everything() {
        let mut store = SparseStore::new();
        store.set_value(0, 4, 'c').unwrap();
        store.set_value(2, 0, 'r').unwrap();
        store.set_value(2, 2, 'x').unwrap();

        assert_eq!(coords(store.cursor(CellBounds::sheet())), vec![(2, 2)]);
        assert_eq!(
            coords(store.cursor(CellBounds::everything())),
            vec![(0, 4), (2, 0), (2, 2)]
        );
    }

    #[test]
    fn test_corner_cells() {
        let mut store = SparseStore::new();
        store.set_value(MAX_ROWS, MAX_COLS, 1).unwrap();
        store.set_value(MAX_ROWS, 1, 2).unwrap();
        assert_eq!(
            coords(store.cursor(CellBounds::sheet())),
            vec![(MAX_ROWS, 1), (MAX_ROWS, MAX_COLS)]
        );
    }

    #[test]
    fn test_row_major_merges_many_columns() {
        let mut store = SparseStore::new();
        let mut expected = Vec::new();
        for col in 1..=300u16 {
            for row in [1u32, 2, 700] {
                // leave gaps so columns drop out of the merge at different rows
                if (col as u32 + row) % 7 == 0 {
                    continue;
                }
                store.set_value(row, col, (row, col)).unwrap();
                expected.push((row, col));
            }
        }
        expected.sort();

        assert_eq!(coords(store.cursor(CellBounds::sheet())), expected);

        let bounds = CellBounds::new(2, 10, 699, 20).unwrap();
        let inside: Vec<(u32, u16)> = expected
            .iter()
            .copied()
            .filter(|&(r, c)| bounds.contains(r, c))
            .collect();
        assert_eq!(coords(store.cursor(bounds)), inside);
    }

    #[test]
    fn test_reset_mid_traversal() {
        let store = sample();
        let mut cursor = store.cursor(CellBounds::sheet());
        assert!(cursor.advance());
        assert!(cursor.advance());
        assert_eq!(cursor.key(), Some(CellKey::from_parts(5, 3)));

        cursor.reset();
        assert_eq!(cursor.key(), None);
        assert_eq!(coords(cursor), vec![(1, 9), (5, 3), (5, 7), (100, 3)]);
    }

    #[test]
    fn test_empty_store() {
        let store: SparseStore<u8> = SparseStore::new();
        let mut cursor = store.cursor(CellBounds::sheet());
        assert!(!cursor.advance());
        assert_eq!(cursor.row(), 0);
    }
}
