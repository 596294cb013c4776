//! Merged-cell regions

use crate::cell::CellRange;
use crate::error::{Error, Result};
use crate::store::{
    delete_from_range, insert_into_range, validate_column_shift, validate_row_shift, Axis, Shift,
};

/// Non-overlapping list of rectangles, used for merged cells
///
/// Regions keep the order they were added in.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeList {
    ranges: Vec<CellRange>,
}

impl RangeList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region; fails if it overlaps one already present
    pub fn add(&mut self, range: CellRange) -> Result<()> {
        if self.ranges.iter().any(|r| r.overlaps(&range)) {
            return Err(Error::MergedCellConflict(range.to_a1_string()));
        }
        self.ranges.push(range);
        Ok(())
    }

    /// Remove an exact region; returns whether it was present
    pub fn remove(&mut self, range: &CellRange) -> bool {
        let before = self.ranges.len();
        let key = |r: &CellRange| (r.start.row, r.start.col, r.end.row, r.end.col);
        self.ranges.retain(|r| key(r) != key(range));
        self.ranges.len() != before
    }

    /// The region containing a cell
    pub fn find(&self, row: u32, col: u16) -> Option<&CellRange> {
        self.ranges.iter().find(|r| r.contains_cell(row, col))
    }

    /// All regions
    pub fn as_slice(&self) -> &[CellRange] {
        &self.ranges
    }

    /// Number of regions
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Check if there are no regions
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Remove all regions
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    fn apply<F>(&mut self, f: F)
    where
        F: Fn(&CellRange) -> Option<CellRange>,
    {
        let before = self.ranges.len();
        // A region shrunk to a single cell is no longer a merge
        self.ranges = self
            .ranges
            .iter()
            .filter_map(f)
            .filter(|r| r.cell_count() > 1)
            .collect();
        if self.ranges.len() != before {
            log::debug!("{} merged regions dropped by shift", before - self.ranges.len());
        }
    }
}

impl Shift for RangeList {
    fn insert_rows(&mut self, at: u32, count: u32) -> Result<()> {
        validate_row_shift(at, count)?;
        self.apply(|r| insert_into_range(r, Axis::Rows, at, count));
        Ok(())
    }

    fn delete_rows(&mut self, at: u32, count: u32) -> Result<()> {
        validate_row_shift(at, count)?;
        self.apply(|r| delete_from_range(r, Axis::Rows, at, count));
        Ok(())
    }

    fn insert_columns(&mut self, at: u16, count: u16) -> Result<()> {
        validate_column_shift(at, count)?;
        self.apply(|r| insert_into_range(r, Axis::Columns, at as u32, count as u32));
        Ok(())
    }

    fn delete_columns(&mut self, at: u16, count: u16) -> Result<()> {
        validate_column_shift(at, count)?;
        self.apply(|r| delete_from_range(r, Axis::Columns, at as u32, count as u32));
        Ok(())
    }
}

impl<'a> IntoIterator for &'a RangeList {
    type Item = &'a CellRange;
    type IntoIter = std::slice::Iter<'a, CellRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}
