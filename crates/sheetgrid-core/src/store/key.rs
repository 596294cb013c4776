//! Coordinate codec and iteration bounds

use std::fmt;

use crate::cell::CellRange;
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// A `(row, column)` pair packed into one orderable key
///
/// Layout: column in the high 32 bits, row in the low 32 bits, so the derived
/// ordering is column-major (all of column 1 before any of column 2), which is
/// the store's canonical order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey(u64);

impl CellKey {
    /// The smallest key (sentinel row 0, sentinel column 0)
    pub const ORIGIN: CellKey = CellKey(0);

    /// Encode a coordinate, rejecting values outside `0..=MAX`
    pub fn encode(row: u32, col: u16) -> Result<Self> {
        check_row(row)?;
        check_col(col)?;
        Ok(Self::from_parts(row, col))
    }

    #[inline]
    pub(crate) fn from_parts(row: u32, col: u16) -> Self {
        CellKey(((col as u64) << 32) | row as u64)
    }

    /// Decode back into `(row, col)`
    #[inline]
    pub fn decode(self) -> (u32, u16) {
        (self.row(), self.col())
    }

    /// Row component
    #[inline]
    pub fn row(self) -> u32 {
        self.0 as u32
    }

    /// Column component
    #[inline]
    pub fn col(self) -> u16 {
        (self.0 >> 32) as u16
    }

    /// Raw packed value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellKey(r{}c{})", self.row(), self.col())
    }
}

/// Validate a row coordinate (0 is the metadata sentinel)
pub(crate) fn check_row(row: u32) -> Result<()> {
    if row > MAX_ROWS {
        return Err(Error::RowOutOfBounds(row, MAX_ROWS));
    }
    Ok(())
}

/// Validate a column coordinate (0 is the metadata sentinel)
pub(crate) fn check_col(col: u16) -> Result<()> {
    if col > MAX_COLS {
        return Err(Error::ColumnOutOfBounds(col as u32, MAX_COLS));
    }
    Ok(())
}

/// Inclusive rectangle limiting a traversal
///
/// This is a plain value: cursors copy it and never write back to it, so two
/// traversals over the same store can share one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellBounds {
    /// First row (inclusive)
    pub from_row: u32,
    /// First column (inclusive)
    pub from_col: u16,
    /// Last row (inclusive)
    pub to_row: u32,
    /// Last column (inclusive)
    pub to_col: u16,
}

impl CellBounds {
    /// Create validated bounds
    pub fn new(from_row: u32, from_col: u16, to_row: u32, to_col: u16) -> Result<Self> {
        check_row(from_row)?;
        check_row(to_row)?;
        check_col(from_col)?;
        check_col(to_col)?;
        if from_row > to_row || from_col > to_col {
            return Err(Error::InvalidRange(format!(
                "bounds r{}c{}:r{}c{} are inverted",
                from_row, from_col, to_row, to_col
            )));
        }
        Ok(Self {
            from_row,
            from_col,
            to_row,
            to_col,
        })
    }

    /// Every ordinary cell of a worksheet (sentinels excluded)
    pub fn sheet() -> Self {
        Self {
            from_row: 1,
            from_col: 1,
            to_row: MAX_ROWS,
            to_col: MAX_COLS,
        }
    }

    /// The whole key space including sentinel row/column 0
    pub fn everything() -> Self {
        Self {
            from_row: 0,
            from_col: 0,
            to_row: MAX_ROWS,
            to_col: MAX_COLS,
        }
    }

    /// Ordinary cells of one column
    pub fn column(col: u16) -> Self {
        Self {
            from_row: 1,
            from_col: col,
            to_row: MAX_ROWS,
            to_col: col,
        }
    }

    /// Ordinary cells of one row
    pub fn row(row: u32) -> Self {
        Self {
            from_row: row,
            from_col: 1,
            to_row: row,
            to_col: MAX_COLS,
        }
    }

    /// Bounds matching a parsed range
    pub fn from_range(range: &CellRange) -> Self {
        Self {
            from_row: range.start.row,
            from_col: range.start.col,
            to_row: range.end.row,
            to_col: range.end.col,
        }
    }

    /// Check whether a coordinate lies inside the bounds
    #[inline]
    pub fn contains(&self, row: u32, col: u16) -> bool {
        row >= self.from_row && row <= self.to_row && col >= self.from_col && col <= self.to_col
    }
}
