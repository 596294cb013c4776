//! Sparse, coordinate-indexed storage
//!
//! [`SparseStore`] holds one value per occupied `(row, column)` address and
//! nothing for the rest of the 1,048,576 x 16,384 grid. Entries are grouped by
//! column (a sorted list of column buckets), and each column keeps its rows in
//! sorted pages. That gives:
//!
//! - point lookup in `O(log columns + log rows)`
//! - ordered neighbour queries ([`SparseStore::next_cell`], [`SparseStore::prev_cell`])
//!   without scanning
//! - in-place re-keying for row/column insert and delete (see [`Shift`])
//!
//! Row 0 and column 0 are legal keys. They are reserved for metadata records
//! (column records live at `(0, col)`, row records at `(row, 0)`); bounds such
//! as [`CellBounds::sheet`] exclude them from ordinary cell traversal.

mod cursor;
mod key;
mod page;
mod shift;

pub use cursor::{CellCursor, TraversalOrder};
pub use key::{CellBounds, CellKey};
pub use shift::{
    delete_from_range, insert_into_range, shift_span_delete, shift_span_insert,
    validate_column_shift, validate_row_shift, Axis, Shift,
};

pub(crate) use key::{check_col, check_row};

use crate::cell::CellRange;
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use page::ColumnIndex;

/// Sparse two-dimensional store
///
/// `T` is the payload type; absent addresses implicitly hold `T::default()`
/// when read through [`SparseStore::get_value`].
///
/// # Example
///
/// ```
/// use sheetgrid_core::store::SparseStore;
///
/// let mut store = SparseStore::new();
/// store.set_value(5, 3, "X").unwrap();
/// store.set_value(100, 3, "Z").unwrap();
///
/// assert_eq!(store.get_value(5, 3), "X");
/// assert_eq!(store.get_value(6, 3), "");
/// assert_eq!(store.next_cell(5, 3), Some((100, 3)));
/// ```
#[derive(Debug, Clone)]
pub struct SparseStore<T> {
    columns: Vec<ColumnIndex<T>>,
    len: usize,
}

impl<T> Default for SparseStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            len: 0,
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.columns.clear();
        self.len = 0;
    }

    #[inline]
    fn column_pos(&self, col: u16) -> std::result::Result<usize, usize> {
        self.columns.binary_search_by_key(&col, |c| c.col)
    }

    #[inline]
    fn column(&self, col: u16) -> Option<&ColumnIndex<T>> {
        self.column_pos(col).ok().map(|p| &self.columns[p])
    }

    /// Position of the first bucket with column >= `col`
    #[inline]
    fn first_column_from(&self, col: u16) -> usize {
        self.columns.partition_point(|c| c.col < col)
    }

    /// Insert or overwrite the entry at `(row, col)`
    pub fn set_value(&mut self, row: u32, col: u16, value: T) -> Result<()> {
        check_row(row)?;
        check_col(col)?;
        let pos = match self.column_pos(col) {
            Ok(pos) => pos,
            Err(pos) => {
                self.columns.insert(pos, ColumnIndex::new(col));
                pos
            }
        };
        if self.columns[pos].insert(row, value).is_none() {
            self.len += 1;
        }
        Ok(())
    }

    /// Get the entry at `(row, col)` if one exists
    pub fn get(&self, row: u32, col: u16) -> Option<&T> {
        self.column(col)?.get(row)
    }

    /// Get a mutable reference to the entry at `(row, col)`
    pub fn get_mut(&mut self, row: u32, col: u16) -> Option<&mut T> {
        let pos = self.column_pos(col).ok()?;
        self.columns[pos].get_mut(row)
    }

    /// Get the entry at `(row, col)`, creating it with `init` when absent
    pub fn get_or_insert_with<F: FnOnce() -> T>(
        &mut self,
        row: u32,
        col: u16,
        init: F,
    ) -> Result<&mut T> {
        if !self.exists(row, col) {
            self.set_value(row, col, init())?;
        }
        self.get_mut(row, col)
            .ok_or_else(|| Error::invariant(format!("entry r{}c{} vanished after insert", row, col)))
    }

    /// Check whether an entry is stored at `(row, col)`
    ///
    /// Distinguishes "stored with a default-looking value" from "absent".
    pub fn exists(&self, row: u32, col: u16) -> bool {
        self.get(row, col).is_some()
    }

    /// Remove and return the entry at `(row, col)`
    pub fn remove(&mut self, row: u32, col: u16) -> Option<T> {
        let pos = self.column_pos(col).ok()?;
        let value = self.columns[pos].remove(row)?;
        if self.columns[pos].is_empty() {
            self.columns.remove(pos);
        }
        self.len -= 1;
        Some(value)
    }

    /// Highest populated row in a column
    pub fn last_row(&self, col: u16) -> Option<u32> {
        self.column(col)?.last_row()
    }

    /// Highest populated column
    pub fn last_column(&self) -> Option<u16> {
        self.columns.last().map(|c| c.col)
    }

    /// Bounding rectangle of all non-sentinel entries
    pub fn dimension(&self) -> Option<CellRange> {
        let mut bounds: Option<(u32, u16, u32, u16)> = None;
        for index in &self.columns[self.first_column_from(1)..] {
            let Some((first, _)) = index.first_at_or_after(1) else {
                continue;
            };
            let last = index.last_row().unwrap_or(first);
            bounds = Some(match bounds {
                None => (first, index.col, last, index.col),
                Some((r0, c0, r1, _)) => (r0.min(first), c0, r1.max(last), index.col),
            });
        }
        bounds.map(|(r0, c0, r1, c1)| CellRange::from_indices(r0, c0, r1, c1))
    }

    /// Iterate over all entries in canonical (column-major) order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &T)> + '_ {
        self.columns
            .iter()
            .flat_map(|c| c.iter().map(move |(row, v)| (row, c.col, v)))
    }

    /// Encoded addresses of all entries, ascending
    ///
    /// [`CellKey`] ordering is the canonical order, so the keys come out
    /// strictly increasing.
    pub fn keys(&self) -> impl Iterator<Item = CellKey> + '_ {
        self.iter().map(|(row, col, _)| CellKey::from_parts(row, col))
    }

    /// Iterate mutably over all entries in canonical order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, u16, &mut T)> + '_ {
        self.columns.iter_mut().flat_map(|c| {
            let col = c.col;
            c.iter_mut().map(move |(row, v)| (row, col, v))
        })
    }

    /// Iterate over the entries of one column in row order
    pub fn iter_column(&self, col: u16) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.column(col).into_iter().flat_map(|c| c.iter())
    }

    // ==================== Ordered neighbour queries ====================

    /// Next populated address strictly after `(row, col)` in canonical order
    pub fn next_cell(&self, row: u32, col: u16) -> Option<(u32, u16)> {
        self.next_cell_in(row, col, &CellBounds::everything())
    }

    /// Next populated address strictly after `(row, col)` inside `bounds`
    ///
    /// Never returns an address outside `bounds`, even when entries exist
    /// further along.
    pub fn next_cell_in(&self, row: u32, col: u16, bounds: &CellBounds) -> Option<(u32, u16)> {
        if row < MAX_ROWS {
            self.seek_forward(row + 1, col, bounds)
        } else if col < MAX_COLS {
            self.seek_forward(0, col + 1, bounds)
        } else {
            None
        }
    }

    /// Previous populated address strictly before `(row, col)` in canonical order
    pub fn prev_cell(&self, row: u32, col: u16) -> Option<(u32, u16)> {
        self.prev_cell_in(row, col, &CellBounds::everything())
    }

    /// Previous populated address strictly before `(row, col)` inside `bounds`
    ///
    /// `(0, 0)` has no predecessor.
    pub fn prev_cell_in(&self, row: u32, col: u16, bounds: &CellBounds) -> Option<(u32, u16)> {
        if row > 0 {
            self.seek_backward(row - 1, col, bounds)
        } else if col > 0 {
            self.seek_backward(MAX_ROWS, col - 1, bounds)
        } else {
            None
        }
    }

    /// First populated address inside `bounds`
    pub fn first_cell_in(&self, bounds: &CellBounds) -> Option<(u32, u16)> {
        self.seek_forward(bounds.from_row, bounds.from_col, bounds)
    }

    /// Last populated address inside `bounds`
    pub fn last_cell_in(&self, bounds: &CellBounds) -> Option<(u32, u16)> {
        self.seek_backward(bounds.to_row, bounds.to_col, bounds)
    }

    /// First entry at or after `(row, col)` in column-major order, within bounds
    fn seek_forward(&self, row: u32, col: u16, bounds: &CellBounds) -> Option<(u32, u16)> {
        if col > bounds.to_col {
            return None;
        }
        let (row, col) = if col < bounds.from_col {
            (bounds.from_row, bounds.from_col)
        } else {
            (row, col)
        };

        for index in &self.columns[self.first_column_from(col)..] {
            if index.col > bounds.to_col {
                break;
            }
            let from = if index.col == col {
                row.max(bounds.from_row)
            } else {
                bounds.from_row
            };
            if let Some((r, _)) = index.first_at_or_after(from) {
                if r <= bounds.to_row {
                    return Some((r, index.col));
                }
            }
        }
        None
    }

    /// Last entry at or before `(row, col)` in column-major order, within bounds
    fn seek_backward(&self, row: u32, col: u16, bounds: &CellBounds) -> Option<(u32, u16)> {
        if col < bounds.from_col {
            return None;
        }
        let (row, col) = if col > bounds.to_col {
            (bounds.to_row, bounds.to_col)
        } else {
            (row, col)
        };

        let end = self.columns.partition_point(|c| c.col <= col);
        for index in self.columns[..end].iter().rev() {
            if index.col < bounds.from_col {
                break;
            }
            let to = if index.col == col {
                row.min(bounds.to_row)
            } else {
                bounds.to_row
            };
            if let Some((r, _)) = index.last_at_or_before(to) {
                if r >= bounds.from_row {
                    return Some((r, index.col));
                }
            }
        }
        None
    }

    /// Column buckets with column in `from_col..=to_col`, with their slots
    pub(crate) fn buckets_in(
        &self,
        from_col: u16,
        to_col: u16,
    ) -> impl Iterator<Item = (usize, &ColumnIndex<T>)> + '_ {
        let lo = self.first_column_from(from_col);
        let hi = self.columns.partition_point(|c| c.col <= to_col).max(lo);
        self.columns[lo..hi]
            .iter()
            .enumerate()
            .map(move |(i, index)| (lo + i, index))
    }

    #[inline]
    pub(crate) fn bucket(&self, slot: usize) -> Option<&ColumnIndex<T>> {
        self.columns.get(slot)
    }

    /// Create a row-major cursor over `bounds`
    pub fn cursor(&self, bounds: CellBounds) -> CellCursor<'_, T> {
        CellCursor::new(self, bounds)
    }

    /// Create a column-major (canonical order) cursor over `bounds`
    pub fn cursor_by_column(&self, bounds: CellBounds) -> CellCursor<'_, T> {
        CellCursor::with_order(self, bounds, TraversalOrder::ColumnMajor)
    }

    // ==================== Range removal ====================

    /// Remove every entry inside `bounds` without re-keying anything
    pub fn clear_range(&mut self, bounds: &CellBounds) {
        let lo = self.first_column_from(bounds.from_col);
        let mut removed = 0;
        for index in &mut self.columns[lo..] {
            if index.col > bounds.to_col {
                break;
            }
            removed += index.clear_rows(bounds.from_row, bounds.to_row);
        }
        self.finish_structural_change(removed);
    }

    /// Remove all entries in the rectangle starting at `(from_row, from_col)`
    /// spanning `rows` x `cols`
    ///
    /// With `shift` set, entries below the rectangle move up to close the gap
    /// (only within the rectangle's columns). A rectangle covering every row
    /// deletes whole columns and shifts later columns left; one covering every
    /// column deletes whole rows.
    pub fn delete(
        &mut self,
        from_row: u32,
        from_col: u16,
        rows: u32,
        cols: u16,
        shift: bool,
    ) -> Result<()> {
        if rows == 0 || cols == 0 {
            return Err(Error::invalid_argument(format!(
                "cannot delete an empty rectangle ({} rows x {} columns)",
                rows, cols
            )));
        }
        check_row(from_row)?;
        check_col(from_col)?;

        let to_row = from_row.saturating_add(rows - 1).min(MAX_ROWS);
        let to_col = (from_col as u32 + cols as u32 - 1).min(MAX_COLS as u32) as u16;

        if !shift {
            self.clear_range(&CellBounds {
                from_row,
                from_col,
                to_row,
                to_col,
            });
            return Ok(());
        }

        // The sentinel band cannot be shifted into
        if from_row == 0 {
            return Err(Error::RowOutOfBounds(0, MAX_ROWS));
        }
        if from_col == 0 {
            return Err(Error::ColumnOutOfBounds(0, MAX_COLS));
        }

        if from_row == 1 && to_row == MAX_ROWS {
            self.delete_columns(from_col, to_col - from_col + 1)
        } else if from_col == 1 && to_col == MAX_COLS {
            self.delete_rows(from_row, to_row - from_row + 1)
        } else {
            self.delete_rows_in(from_row, to_row - from_row + 1, from_col, to_col)
        }
    }

    /// Drop empty column buckets and fix the entry count after bulk edits
    fn finish_structural_change(&mut self, removed: usize) {
        self.columns.retain(|c| !c.is_empty());
        self.len -= removed;
    }

    // ==================== Row/column re-keying ====================

    /// Insert `count` rows at `at`, only in columns `from_col..=to_col`
    pub fn insert_rows_in(&mut self, at: u32, count: u32, from_col: u16, to_col: u16) -> Result<()> {
        validate_row_shift(at, count)?;
        let lo = self.first_column_from(from_col);
        let mut dropped = 0;
        for index in &mut self.columns[lo..] {
            if index.col > to_col {
                break;
            }
            dropped += index.insert_rows(at, count);
        }
        if dropped > 0 {
            log::debug!(
                "insert of {} rows at {} pushed {} entries past row {}",
                count,
                at,
                dropped,
                MAX_ROWS
            );
        }
        self.finish_structural_change(dropped);
        Ok(())
    }

    /// Delete `count` rows at `at`, only in columns `from_col..=to_col`
    pub fn delete_rows_in(&mut self, at: u32, count: u32, from_col: u16, to_col: u16) -> Result<()> {
        validate_row_shift(at, count)?;
        let lo = self.first_column_from(from_col);
        let mut removed = 0;
        for index in &mut self.columns[lo..] {
            if index.col > to_col {
                break;
            }
            removed += index.delete_rows(at, count);
        }
        self.finish_structural_change(removed);
        Ok(())
    }

    fn shift_columns_right(&mut self, at: u16, count: u16) -> usize {
        let lo = self.first_column_from(at);
        let mut dropped = 0;
        let mut keep = self.columns.len();
        for (i, index) in self.columns[lo..].iter_mut().enumerate() {
            let moved = index.col as u32 + count as u32;
            if moved > MAX_COLS as u32 {
                keep = keep.min(lo + i);
                dropped += index.len();
            } else {
                index.col = moved as u16;
            }
        }
        self.columns.truncate(keep);
        dropped
    }

    fn shift_columns_left(&mut self, at: u16, count: u16) -> usize {
        let end = at as u32 + count as u32;
        let mut removed = 0;
        self.columns.retain(|c| {
            let gone = c.col >= at && (c.col as u32) < end;
            if gone {
                removed += c.len();
            }
            !gone
        });
        let first_after = self.columns.partition_point(|c| (c.col as u32) < end);
        for index in &mut self.columns[first_after..] {
            index.col -= count;
        }
        removed
    }
}

impl<T: Default + Clone> SparseStore<T> {
    /// Get the value at `(row, col)`, or `T::default()` when absent
    pub fn get_value(&self, row: u32, col: u16) -> T {
        self.get(row, col).cloned().unwrap_or_default()
    }
}

impl<T> Shift for SparseStore<T> {
    fn insert_rows(&mut self, at: u32, count: u32) -> Result<()> {
        self.insert_rows_in(at, count, 0, MAX_COLS)
    }

    fn delete_rows(&mut self, at: u32, count: u32) -> Result<()> {
        self.delete_rows_in(at, count, 0, MAX_COLS)
    }

    fn insert_columns(&mut self, at: u16, count: u16) -> Result<()> {
        validate_column_shift(at, count)?;
        let dropped = self.shift_columns_right(at, count);
        if dropped > 0 {
            log::debug!(
                "insert of {} columns at {} pushed {} entries past column {}",
                count,
                at,
                dropped,
                MAX_COLS
            );
        }
        self.len -= dropped;
        Ok(())
    }

    fn delete_columns(&mut self, at: u16, count: u16) -> Result<()> {
        validate_column_shift(at, count)?;
        let removed = self.shift_columns_left(at, count);
        self.len -= removed;
        Ok(())
    }
}
