//! Row and column insert/delete re-keying
//!
//! Every coordinate-indexed collection attached to a worksheet implements
//! [`Shift`] so the worksheet can move them all by the same amount. Spans
//! (column records, merged ranges, protected ranges) use the helpers here so
//! they widen, move or truncate identically wherever they live.

use crate::cell::{CellRange, RangeAddress};
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// Insert/delete rows and columns, re-keying stored coordinates
///
/// `at` is 1-based; `count` must be at least 1. Entries pushed past the sheet
/// limit by an insert are dropped.
pub trait Shift {
    /// Insert `count` empty rows before row `at`
    fn insert_rows(&mut self, at: u32, count: u32) -> Result<()>;

    /// Delete rows `at..at + count`
    fn delete_rows(&mut self, at: u32, count: u32) -> Result<()>;

    /// Insert `count` empty columns before column `at`
    fn insert_columns(&mut self, at: u16, count: u16) -> Result<()>;

    /// Delete columns `at..at + count`
    fn delete_columns(&mut self, at: u16, count: u16) -> Result<()>;
}

/// Reject zero-length or out-of-sheet row shifts
pub fn validate_row_shift(at: u32, count: u32) -> Result<()> {
    if count == 0 || count > MAX_ROWS {
        return Err(Error::invalid_argument(format!(
            "row shift count must be in 1..={}, got {}",
            MAX_ROWS, count
        )));
    }
    if at == 0 || at > MAX_ROWS {
        return Err(Error::RowOutOfBounds(at, MAX_ROWS));
    }
    Ok(())
}

/// Reject zero-length or out-of-sheet column shifts
pub fn validate_column_shift(at: u16, count: u16) -> Result<()> {
    if count == 0 || count > MAX_COLS {
        return Err(Error::invalid_argument(format!(
            "column shift count must be in 1..={}, got {}",
            MAX_COLS, count
        )));
    }
    if at == 0 || at > MAX_COLS {
        return Err(Error::ColumnOutOfBounds(at as u32, MAX_COLS));
    }
    Ok(())
}

/// Move an inclusive span `[start, end]` for an insert of `count` at `at`
///
/// Spans entirely before `at` stay put, spans starting at or after `at` move,
/// and spans containing `at` widen. The result is clamped to `limit`; `None`
/// means the span was pushed entirely past it.
pub fn shift_span_insert(start: u32, end: u32, at: u32, count: u32, limit: u32) -> Option<(u32, u32)> {
    if end < at {
        return Some((start, end));
    }
    let new_start = if start >= at { start + count } else { start };
    if new_start > limit {
        return None;
    }
    Some((new_start, (end + count).min(limit)))
}

/// Move an inclusive span `[start, end]` for a delete of `at..at + count`
///
/// Spans fully inside the deleted block return `None`; spans overlapping one
/// side are truncated; spans after it move back by `count`.
pub fn shift_span_delete(start: u32, end: u32, at: u32, count: u32) -> Option<(u32, u32)> {
    let del_end = at + count - 1;
    if end < at {
        return Some((start, end));
    }
    if start > del_end {
        return Some((start - count, end - count));
    }
    if start >= at && end <= del_end {
        return None;
    }
    let new_start = if start < at { start } else { at };
    let new_end = if end > del_end { end - count } else { at - 1 };
    Some((new_start, new_end))
}

/// Which coordinate of a range a shift applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Row coordinates
    Rows,
    /// Column coordinates
    Columns,
}

impl Axis {
    fn limit(self) -> u32 {
        match self {
            Axis::Rows => MAX_ROWS,
            Axis::Columns => MAX_COLS as u32,
        }
    }

    fn span(self, range: &CellRange) -> (u32, u32) {
        match self {
            Axis::Rows => (range.start.row, range.end.row),
            Axis::Columns => (range.start.col as u32, range.end.col as u32),
        }
    }

    fn with_span(self, range: &CellRange, (start, end): (u32, u32)) -> CellRange {
        let mut out = *range;
        match self {
            Axis::Rows => {
                out.start.row = start;
                out.end.row = end;
            }
            Axis::Columns => {
                out.start.col = start as u16;
                out.end.col = end as u16;
            }
        }
        out
    }
}

/// Apply an insert to one rectangle; `$` anchors are kept as they were
pub fn insert_into_range(range: &CellRange, axis: Axis, at: u32, count: u32) -> Option<CellRange> {
    let (start, end) = axis.span(range);
    shift_span_insert(start, end, at, count, axis.limit()).map(|span| axis.with_span(range, span))
}

/// Apply a delete to one rectangle; `None` when the rectangle is consumed
pub fn delete_from_range(range: &CellRange, axis: Axis, at: u32, count: u32) -> Option<CellRange> {
    let (start, end) = axis.span(range);
    shift_span_delete(start, end, at, count).map(|span| axis.with_span(range, span))
}

fn shift_areas<F>(areas: &mut Vec<CellRange>, f: F)
where
    F: Fn(&CellRange) -> Option<CellRange>,
{
    *areas = areas.iter().filter_map(f).collect();
}

impl Shift for RangeAddress {
    fn insert_rows(&mut self, at: u32, count: u32) -> Result<()> {
        validate_row_shift(at, count)?;
        shift_areas(self.areas_mut(), |r| insert_into_range(r, Axis::Rows, at, count));
        Ok(())
    }

    fn delete_rows(&mut self, at: u32, count: u32) -> Result<()> {
        validate_row_shift(at, count)?;
        shift_areas(self.areas_mut(), |r| delete_from_range(r, Axis::Rows, at, count));
        Ok(())
    }

    fn insert_columns(&mut self, at: u16, count: u16) -> Result<()> {
        validate_column_shift(at, count)?;
        shift_areas(self.areas_mut(), |r| {
            insert_into_range(r, Axis::Columns, at as u32, count as u32)
        });
        Ok(())
    }

    fn delete_columns(&mut self, at: u16, count: u16) -> Result<()> {
        validate_column_shift(at, count)?;
        shift_areas(self.areas_mut(), |r| {
            delete_from_range(r, Axis::Columns, at as u32, count as u32)
        });
        Ok(())
    }
}
