//! Row metadata
//!
//! Row attributes live in a [`RowOverlay`]: a sparse store keyed at the
//! sentinel column, `(row, 0)`. A record exists only for rows that had an
//! attribute set; every other row reads the documented defaults.

use crate::error::{Error, Result};
use crate::store::{validate_column_shift, CellBounds, Shift, SparseStore};
use crate::MAX_ROWS;

/// Deepest outline level a row or column may carry
pub const MAX_OUTLINE_LEVEL: u8 = 7;

/// Row metadata
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowRecord {
    /// Custom height in points (None = sheet default)
    pub height: Option<f64>,
    /// Row is hidden
    pub hidden: bool,
    /// Row is collapsed (in outline)
    pub collapsed: bool,
    /// Outline/grouping level (0-7)
    pub outline_level: u8,
    /// Manual page break after this row
    pub page_break: bool,
    /// Show phonetic guides
    pub phonetic: bool,
    /// Height was set by the user rather than auto-fitted
    pub custom_height: bool,
    /// Merge-group id
    pub merge_id: Option<u32>,
    /// Row-level style index (None = no row style)
    pub style_index: Option<u32>,
}

impl RowRecord {
    /// Create a record carrying all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom height (marks it as user-specified)
    pub fn set_height(&mut self, height: f64) {
        self.height = Some(height);
        self.custom_height = true;
    }

    /// Check if this row has any custom settings
    pub fn has_custom_settings(&self) -> bool {
        *self != Self::default()
    }
}

/// Sparse row-metadata store keyed at `(row, 0)`
#[derive(Debug, Clone, Default)]
pub struct RowOverlay {
    records: SparseStore<RowRecord>,
}

impl RowOverlay {
    /// Create an empty overlay
    pub fn new() -> Self {
        Self::default()
    }

    fn check(row: u32) -> Result<()> {
        if row == 0 || row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS));
        }
        Ok(())
    }

    /// Record for a row, if any attribute was ever set on it
    pub fn get(&self, row: u32) -> Option<&RowRecord> {
        if row == 0 {
            return None;
        }
        self.records.get(row, 0)
    }

    /// Mutable record for a row, if one exists
    pub fn get_mut(&mut self, row: u32) -> Option<&mut RowRecord> {
        if row == 0 {
            return None;
        }
        self.records.get_mut(row, 0)
    }

    /// Record for a row, created with defaults on first access
    pub fn get_or_create(&mut self, row: u32) -> Result<&mut RowRecord> {
        Self::check(row)?;
        self.records.get_or_insert_with(row, 0, RowRecord::new)
    }

    /// Insert a complete record, replacing any existing one
    pub fn insert(&mut self, row: u32, record: RowRecord) -> Result<()> {
        Self::check(row)?;
        self.records.set_value(row, 0, record)
    }

    /// Drop the record for a row so it reads defaults again
    pub fn remove(&mut self, row: u32) -> Option<RowRecord> {
        if row == 0 {
            return None;
        }
        self.records.remove(row, 0)
    }

    /// Effective height, falling back to `default`
    pub fn height(&self, row: u32, default: f64) -> f64 {
        self.get(row).and_then(|r| r.height).unwrap_or(default)
    }

    /// Whether a row is hidden
    pub fn is_hidden(&self, row: u32) -> bool {
        self.get(row).map_or(false, |r| r.hidden)
    }

    /// Outline level of a row (0 when no record exists)
    pub fn outline_level(&self, row: u32) -> u8 {
        self.get(row).map_or(0, |r| r.outline_level)
    }

    /// Number of rows carrying a record
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no row has a record
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest row with a record
    pub fn last_row(&self) -> Option<u32> {
        self.records.last_row(0)
    }

    /// Records in ascending row order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &RowRecord)> + '_ {
        self.records.iter_column(0)
    }

    /// Records whose row lies in `from..=to`
    pub fn range(&self, from: u32, to: u32) -> impl Iterator<Item = (u32, &RowRecord)> + '_ {
        let bounds = CellBounds {
            from_row: from,
            from_col: 0,
            to_row: to,
            to_col: 0,
        };
        self.records
            .cursor_by_column(bounds)
            .map(|(row, _, record)| (row, record))
    }

    fn check_span(from: u32, to: u32) -> Result<()> {
        Self::check(from)?;
        Self::check(to)?;
        if from > to {
            return Err(Error::InvalidRange(format!("rows {}:{} are inverted", from, to)));
        }
        Ok(())
    }

    /// Raise the outline level of `from..=to` by one (capped at 7)
    pub fn group(&mut self, from: u32, to: u32) -> Result<()> {
        Self::check_span(from, to)?;
        for row in from..=to {
            let record = self.get_or_create(row)?;
            record.outline_level = (record.outline_level + 1).min(MAX_OUTLINE_LEVEL);
        }
        Ok(())
    }

    /// Lower the outline level of `from..=to` by one
    pub fn ungroup(&mut self, from: u32, to: u32) -> Result<()> {
        Self::check_span(from, to)?;
        for row in from..=to {
            if let Some(record) = self.get_mut(row) {
                record.outline_level = record.outline_level.saturating_sub(1);
            }
        }
        Ok(())
    }

    /// Hide grouped rows in `from..=to` and flag the summary row below as collapsed
    pub fn collapse(&mut self, from: u32, to: u32) -> Result<()> {
        Self::check_span(from, to)?;
        for row in from..=to {
            if let Some(record) = self.get_mut(row) {
                if record.outline_level > 0 {
                    record.hidden = true;
                }
            }
        }
        if to < MAX_ROWS {
            self.get_or_create(to + 1)?.collapsed = true;
        }
        Ok(())
    }
}

impl Shift for RowOverlay {
    fn insert_rows(&mut self, at: u32, count: u32) -> Result<()> {
        self.records.insert_rows(at, count)
    }

    fn delete_rows(&mut self, at: u32, count: u32) -> Result<()> {
        self.records.delete_rows(at, count)
    }

    fn insert_columns(&mut self, at: u16, count: u16) -> Result<()> {
        validate_column_shift(at, count)
    }

    fn delete_columns(&mut self, at: u16, count: u16) -> Result<()> {
        validate_column_shift(at, count)
    }
}
