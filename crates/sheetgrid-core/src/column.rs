//! Column metadata with range compression
//!
//! A [`ColumnRecord`] governs an inclusive span `min..=max` of columns and is
//! stored once, at the sentinel row, `(0, min)`. Looking up a column with no
//! record of its own means scanning backwards for the nearest record that
//! starts before it and checking whether its span still reaches.
//!
//! Invariant: spans of distinct records never overlap and never exceed
//! [`MAX_COLS`].

use crate::error::{Error, Result};
use crate::row::MAX_OUTLINE_LEVEL;
use crate::store::{
    shift_span_delete, shift_span_insert, validate_column_shift, validate_row_shift, CellBounds,
    Shift, SparseStore,
};
use crate::MAX_COLS;

/// Column metadata governing `min..=max`
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnRecord {
    /// First column governed (inclusive)
    pub min: u16,
    /// Last column governed (inclusive)
    pub max: u16,
    /// Custom width in characters (None = sheet default)
    pub width: Option<f64>,
    /// Column is hidden
    pub hidden: bool,
    /// Best fit (auto-sized)
    pub best_fit: bool,
    /// Column is collapsed (in outline)
    pub collapsed: bool,
    /// Outline/grouping level (0-7)
    pub outline_level: u8,
    /// Column-level style index (None = no column style)
    pub style_index: Option<u32>,
    /// Manual page break after this column
    pub page_break: bool,
    /// Show phonetic guides
    pub phonetic: bool,
}

impl ColumnRecord {
    /// Record with default attributes for a span
    pub fn new(min: u16, max: u16) -> Self {
        Self {
            min,
            max,
            ..Self::default()
        }
    }

    /// Record for a single column
    pub fn single(col: u16) -> Self {
        Self::new(col, col)
    }

    /// Set width
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Set hidden
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Number of columns governed
    pub fn span(&self) -> u16 {
        self.max - self.min + 1
    }

    /// Check whether `col` lies inside the span
    pub fn covers(&self, col: u16) -> bool {
        col >= self.min && col <= self.max
    }

    /// Compare everything except the span
    pub fn same_attributes(&self, other: &ColumnRecord) -> bool {
        let mut other = other.clone();
        other.min = self.min;
        other.max = self.max;
        *self == other
    }

    /// Check if this column has any custom settings
    pub fn has_custom_settings(&self) -> bool {
        !self.same_attributes(&ColumnRecord::default())
    }
}

/// Bounds covering the column records of `from..=to`
fn record_bounds(from: u16, to: u16) -> CellBounds {
    CellBounds {
        from_row: 0,
        from_col: from,
        to_row: 0,
        to_col: to,
    }
}

fn check_col(col: u16) -> Result<()> {
    if col == 0 || col > MAX_COLS {
        return Err(Error::ColumnOutOfBounds(col as u32, MAX_COLS));
    }
    Ok(())
}

fn check_span(from: u16, to: u16) -> Result<()> {
    check_col(from)?;
    check_col(to)?;
    if from > to {
        return Err(Error::InvalidRange(format!(
            "columns {}:{} are inverted",
            from, to
        )));
    }
    Ok(())
}

/// Sparse column-metadata store keyed at `(0, min)`
#[derive(Debug, Clone, Default)]
pub struct ColumnOverlay {
    records: SparseStore<ColumnRecord>,
}

impl ColumnOverlay {
    /// Create an empty overlay
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records (not columns)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no column has a record
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending column order
    pub fn iter(&self) -> impl Iterator<Item = &ColumnRecord> + '_ {
        self.records.iter().map(|(_, _, record)| record)
    }

    /// The record governing `col`, if any
    pub fn get(&self, col: u16) -> Option<&ColumnRecord> {
        if col == 0 || col > MAX_COLS {
            return None;
        }
        if let Some(record) = self.records.get(0, col) {
            return Some(record);
        }
        let (_, start) = self
            .records
            .prev_cell_in(0, col, &record_bounds(1, MAX_COLS))?;
        self.records.get(0, start).filter(|r| r.max >= col)
    }

    /// Effective width, falling back to `default`
    pub fn width(&self, col: u16, default: f64) -> f64 {
        self.get(col).and_then(|r| r.width).unwrap_or(default)
    }

    /// Whether a column is hidden
    pub fn is_hidden(&self, col: u16) -> bool {
        self.get(col).map_or(false, |r| r.hidden)
    }

    /// Make sure a record boundary falls at `col`
    ///
    /// A record spanning across `col` is truncated to end at `col - 1` and a
    /// clone carrying the same attributes is inserted for `col..=max`.
    fn split_at(&mut self, col: u16) -> Result<()> {
        let Some(record) = self.get(col) else {
            return Ok(());
        };
        if record.min == col {
            return Ok(());
        }
        let start = record.min;
        let mut tail = record.clone();
        tail.min = col;
        if let Some(head) = self.records.get_mut(0, start) {
            head.max = col - 1;
        }
        self.records.set_value(0, col, tail)
    }

    /// Merge neighbouring records in `from..=to` that carry equal attributes
    /// and touch end to start
    fn coalesce(&mut self, from: u16, to: u16) {
        let from = from.max(1);
        let lo = self.get(from).map_or(from, |r| r.min);
        let bounds = record_bounds(lo, to.min(MAX_COLS));
        let mut current = self.records.first_cell_in(&bounds).map(|(_, c)| c);
        while let Some(start) = current {
            let Some((_, next_start)) = self.records.next_cell_in(0, start, &bounds) else {
                break;
            };
            let mergeable = match (self.records.get(0, start), self.records.get(0, next_start)) {
                (Some(a), Some(b)) => a.max as u32 + 1 == b.min as u32 && a.same_attributes(b),
                _ => false,
            };
            if !mergeable {
                current = Some(next_start);
                continue;
            }
            if let Some(next) = self.records.remove(0, next_start) {
                if let Some(record) = self.records.get_mut(0, start) {
                    record.max = next.max;
                }
            }
        }
    }

    /// Apply `f` to every column in `from..=to`
    ///
    /// Boundary records are split so exactly one record governs each column of
    /// the span afterwards, gaps get fresh default records, and neighbours left
    /// identical are merged back into one. `f` cannot move a record: changes to
    /// `min`/`max` are discarded. Nothing is modified when the span is invalid.
    pub fn update<F>(&mut self, from: u16, to: u16, mut f: F) -> Result<()>
    where
        F: FnMut(&mut ColumnRecord),
    {
        check_span(from, to)?;
        self.split_at(from)?;
        if to < MAX_COLS {
            self.split_at(to + 1)?;
        }

        let mut col = from as u32;
        while col <= to as u32 {
            let c = col as u16;
            if let Some(record) = self.records.get_mut(0, c) {
                let (min, max) = (record.min, record.max);
                f(record);
                record.min = min;
                record.max = max;
                col = max as u32 + 1;
                continue;
            }
            let gap_end = self
                .records
                .next_cell_in(0, c, &record_bounds(c, to))
                .map_or(to, |(_, next)| next - 1);
            let mut record = ColumnRecord::new(c, gap_end);
            f(&mut record);
            record.min = c;
            record.max = gap_end;
            self.records.set_value(0, c, record)?;
            col = gap_end as u32 + 1;
        }

        self.coalesce(from.saturating_sub(1), to.saturating_add(1));
        Ok(())
    }

    /// Insert a complete record (e.g. while loading); it must not overlap any
    /// existing record
    pub fn insert_record(&mut self, record: ColumnRecord) -> Result<()> {
        check_span(record.min, record.max)?;
        let overlaps = self.get(record.min).is_some()
            || self
                .records
                .first_cell_in(&record_bounds(record.min, record.max))
                .is_some();
        if overlaps {
            return Err(Error::invariant(format!(
                "column record {}:{} overlaps an existing record",
                record.min, record.max
            )));
        }
        self.records.set_value(0, record.min, record)
    }

    /// Change the right edge of the record starting at `min`
    ///
    /// Rejected, leaving the overlay untouched, when `new_max < min`, when it
    /// exceeds [`MAX_COLS`], or when the widened span would run into the next
    /// record.
    pub fn resize(&mut self, min: u16, new_max: u16) -> Result<()> {
        if new_max > MAX_COLS {
            return Err(Error::ColumnOutOfBounds(new_max as u32, MAX_COLS));
        }
        if new_max < min {
            return Err(Error::invariant(format!(
                "column max {} is before min {}",
                new_max, min
            )));
        }
        if self.records.get(0, min).is_none() {
            return Err(Error::invalid_argument(format!(
                "no column record starts at {}",
                min
            )));
        }
        if let Some((_, next)) = self.records.next_cell_in(0, min, &record_bounds(1, MAX_COLS)) {
            if next <= new_max {
                return Err(Error::invariant(format!(
                    "column max {} would overlap the record starting at {}",
                    new_max, next
                )));
            }
        }
        if let Some(record) = self.records.get_mut(0, min) {
            record.max = new_max;
        }
        Ok(())
    }

    /// Drop records so `from..=to` reads defaults again
    pub fn reset(&mut self, from: u16, to: u16) -> Result<()> {
        check_span(from, to)?;
        self.split_at(from)?;
        if to < MAX_COLS {
            self.split_at(to + 1)?;
        }
        self.records.clear_range(&record_bounds(from, to));
        Ok(())
    }

    /// Records with adjacent identical neighbours merged, for serialization
    pub fn compressed(&self) -> Vec<ColumnRecord> {
        let mut out: Vec<ColumnRecord> = Vec::with_capacity(self.len());
        for record in self.iter() {
            match out.last_mut() {
                Some(last)
                    if last.max as u32 + 1 == record.min as u32 && last.same_attributes(record) =>
                {
                    last.max = record.max;
                }
                _ => out.push(record.clone()),
            }
        }
        out
    }

    /// Raise the outline level of `from..=to` by one (capped at 7)
    pub fn group(&mut self, from: u16, to: u16) -> Result<()> {
        self.update(from, to, |r| {
            r.outline_level = (r.outline_level + 1).min(MAX_OUTLINE_LEVEL)
        })
    }
}

impl Shift for ColumnOverlay {
    fn insert_rows(&mut self, at: u32, count: u32) -> Result<()> {
        validate_row_shift(at, count)
    }

    fn delete_rows(&mut self, at: u32, count: u32) -> Result<()> {
        validate_row_shift(at, count)
    }

    fn insert_columns(&mut self, at: u16, count: u16) -> Result<()> {
        self.records.insert_columns(at, count)?;
        for (_, _, record) in self.records.iter_mut() {
            if let Some((min, max)) = shift_span_insert(
                record.min as u32,
                record.max as u32,
                at as u32,
                count as u32,
                MAX_COLS as u32,
            ) {
                record.min = min as u16;
                record.max = max as u16;
            }
        }
        log::debug!("column records shifted for insert of {} at {}", count, at);
        Ok(())
    }

    fn delete_columns(&mut self, at: u16, count: u16) -> Result<()> {
        validate_column_shift(at, count)?;
        let del_end = (at as u32 + count as u32 - 1).min(MAX_COLS as u32) as u16;

        // A record starting inside the deleted block but reaching past it
        // survives; move its key just after the block so the store keeps it.
        if del_end < MAX_COLS {
            let starts: Vec<u16> = self
                .records
                .cursor_by_column(record_bounds(at, del_end))
                .filter(|(_, _, r)| r.max > del_end)
                .map(|(_, col, _)| col)
                .collect();
            for start in starts {
                if let Some(record) = self.records.remove(0, start) {
                    self.records.set_value(0, del_end + 1, record)?;
                }
            }
        }

        self.records.delete_columns(at, count)?;
        for (_, _, record) in self.records.iter_mut() {
            if let Some((min, max)) =
                shift_span_delete(record.min as u32, record.max as u32, at as u32, count as u32)
            {
                record.min = min as u16;
                record.max = max as u16;
            }
        }
        log::debug!("column records shifted for delete of {} at {}", count, at);
        Ok(())
    }
}
