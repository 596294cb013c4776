//! Worksheet type

use crate::cell::{CellAddress, CellData, CellRange, CellValue};
use crate::column::{ColumnOverlay, ColumnRecord};
use crate::comment::{CellComment, CommentCollection};
use crate::error::{Error, Result};
use crate::protection::{self, IgnoredError, ProtectedRange};
use crate::range_list::RangeList;
use crate::row::{RowOverlay, RowRecord, MAX_OUTLINE_LEVEL};
use crate::store::{
    check_col, check_row, validate_column_shift, validate_row_shift, CellBounds, CellCursor, Shift,
    SparseStore,
};
use crate::workbook::{DEFAULT_COLUMN_WIDTH, DEFAULT_ROW_HEIGHT};
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
///
/// Cell data, row records, column records and every coordinate-indexed
/// sidecar (comments, merged regions, protected ranges, ignored errors) live
/// side by side and are shifted together by the [`Shift`] implementation.
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Sheet is visible
    visible: bool,
    /// Sheet is selected
    selected: bool,
    /// Height of rows without a record
    default_row_height: f64,
    /// Width of columns without a record
    default_column_width: f64,
    /// Cell storage
    cells: SparseStore<CellData>,
    /// Row metadata
    rows: RowOverlay,
    /// Column metadata
    columns: ColumnOverlay,
    /// Cell comments
    comments: CommentCollection,
    /// Unique comment authors
    comment_authors: Vec<String>,
    /// Merged regions
    merged: RangeList,
    /// Ranges editable while protected
    protected_ranges: Vec<ProtectedRange>,
    /// Suppressed warnings
    ignored_errors: Vec<IgnoredError>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self::with_defaults(name, DEFAULT_ROW_HEIGHT, DEFAULT_COLUMN_WIDTH)
    }

    /// Create a worksheet with explicit default row height and column width
    pub fn with_defaults<S: Into<String>>(name: S, row_height: f64, column_width: f64) -> Self {
        Self {
            name: name.into(),
            visible: true,
            selected: false,
            default_row_height: row_height,
            default_column_width: column_width,
            cells: SparseStore::new(),
            rows: RowOverlay::new(),
            columns: ColumnOverlay::new(),
            comments: CommentCollection::new(),
            comment_authors: Vec::new(),
            merged: RangeList::new(),
            protected_ranges: Vec::new(),
            ignored_errors: Vec::new(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name (use Workbook::rename_worksheet for validation)
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Check if sheet is visible
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set sheet visibility
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Check if sheet is selected
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Set sheet selection
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Height of rows that carry no record
    pub fn default_row_height(&self) -> f64 {
        self.default_row_height
    }

    /// Width of columns that carry no record
    pub fn default_column_width(&self) -> f64 {
        self.default_column_width
    }

    /// Change the height used for rows without a record
    pub fn set_default_row_height(&mut self, height: f64) -> Result<()> {
        check_row_height(height)?;
        self.default_row_height = height;
        Ok(())
    }

    /// Change the width used for columns without a record
    pub fn set_default_column_width(&mut self, width: f64) -> Result<()> {
        check_column_width(width)?;
        self.default_column_width = width;
        Ok(())
    }

    /// Duplicate this sheet under a new name
    ///
    /// Row and column records are cloned verbatim.
    pub fn copy<S: Into<String>>(&self, name: S) -> Worksheet {
        let mut copy = self.clone();
        copy.name = name.into();
        copy.selected = false;
        copy
    }

    // === Cell Access ===

    /// Get a cell value by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cells.get(addr.row, addr.col))
    }

    /// Get a cell value by row and column indices
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(row, col)
    }

    /// Get a mutable cell by row and column indices
    pub fn cell_at_mut(&mut self, row: u32, col: u16) -> Option<&mut CellData> {
        self.cells.get_mut(row, col)
    }

    /// Get cell value (convenience method)
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get cell value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells.get_value(row, col).value
    }

    /// Get a cell's own style index (0 if the cell does not exist)
    pub fn cell_style_index_at(&self, row: u32, col: u16) -> u32 {
        self.cells.get(row, col).map(|c| c.style_index).unwrap_or(0)
    }

    /// Style that applies to a cell
    ///
    /// The cell's own style wins, then the row's, then the governing column
    /// record's; 0 is the default style.
    pub fn effective_style_index(&self, row: u32, col: u16) -> u32 {
        match self.cell_style_index_at(row, col) {
            0 => self
                .rows
                .get(row)
                .and_then(|r| r.style_index)
                .or_else(|| self.columns.get(col).and_then(|c| c.style_index))
                .unwrap_or(0),
            own => own,
        }
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value by row and column indices
    ///
    /// Setting [`CellValue::Empty`] on an unstyled cell removes it.
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        self.validate_cell_position(row, col)?;
        let value = value.into();
        match self.cells.get_mut(row, col) {
            Some(cell) => {
                cell.value = value;
                if cell.is_empty() {
                    self.cells.remove(row, col);
                }
                Ok(())
            }
            None if value.is_empty() => Ok(()),
            None => self.cells.set_value(row, col, CellData::new(value)),
        }
    }

    /// Set a cell formula by address string
    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_formula_at(addr.row, addr.col, formula)
    }

    /// Set a cell formula by row and column indices
    pub fn set_cell_formula_at(&mut self, row: u32, col: u16, formula: &str) -> Result<()> {
        self.set_cell_value_at(row, col, CellValue::formula(formula))
    }

    /// Set a cell's style index
    pub fn set_cell_style_index_at(&mut self, row: u32, col: u16, style_index: u32) -> Result<()> {
        self.validate_cell_position(row, col)?;
        match self.cells.get_mut(row, col) {
            Some(cell) => {
                cell.style_index = style_index;
                if cell.is_empty() {
                    self.cells.remove(row, col);
                }
                Ok(())
            }
            None if style_index == 0 => Ok(()),
            None => self
                .cells
                .set_value(row, col, CellData::with_style(CellValue::Empty, style_index)),
        }
    }

    /// Clear a cell
    pub fn clear_cell(&mut self, address: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.clear_cell_at(addr.row, addr.col);
        Ok(())
    }

    /// Clear a cell by indices
    pub fn clear_cell_at(&mut self, row: u32, col: u16) {
        self.cells.remove(row, col);
    }

    // === Range Operations ===

    /// Get the used range (bounds of all non-empty cells)
    pub fn used_range(&self) -> Option<CellRange> {
        self.cells.dimension()
    }

    /// Clear all cells in a range
    pub fn clear_range(&mut self, range: &CellRange) {
        self.cells.clear_range(&CellBounds::from_range(range));
    }

    /// Delete the cells of a range, optionally moving the cells below it up
    ///
    /// Only cell data moves; row records, column records and sidecars are
    /// untouched unless the range spans whole rows or columns, in which case
    /// use [`Shift`] on the worksheet instead.
    pub fn delete_range(&mut self, range: &CellRange, shift_up: bool) -> Result<()> {
        self.cells.delete(
            range.start.row,
            range.start.col,
            range.row_count(),
            range.col_count(),
            shift_up,
        )
    }

    /// Set the same value for all cells in a range
    pub fn fill_range<V: Into<CellValue> + Clone>(
        &mut self,
        range: &CellRange,
        value: V,
    ) -> Result<()> {
        let value = value.into();
        for addr in range.cells() {
            self.set_cell_value_at(addr.row, addr.col, value.clone())?;
        }
        Ok(())
    }

    // === Row Operations ===

    /// Row overlay
    pub fn rows(&self) -> &RowOverlay {
        &self.rows
    }

    /// Row record, if any attribute was set on the row
    pub fn row(&self, row: u32) -> Option<&RowRecord> {
        self.rows.get(row)
    }

    /// Row record, created with defaults on first access
    pub fn row_mut(&mut self, row: u32) -> Result<&mut RowRecord> {
        self.rows.get_or_create(row)
    }

    /// Get row height
    pub fn row_height(&self, row: u32) -> f64 {
        self.rows.height(row, self.default_row_height)
    }

    /// Set row height
    pub fn set_row_height(&mut self, row: u32, height: f64) -> Result<()> {
        check_row_height(height)?;
        self.rows.get_or_create(row)?.set_height(height);
        Ok(())
    }

    /// Check if row is hidden
    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.rows.is_hidden(row)
    }

    /// Set row hidden state
    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) -> Result<()> {
        self.rows.get_or_create(row)?.hidden = hidden;
        Ok(())
    }

    /// Set row outline level (0-7)
    pub fn set_row_outline_level(&mut self, row: u32, level: u8) -> Result<()> {
        check_outline_level(level)?;
        self.rows.get_or_create(row)?.outline_level = level;
        Ok(())
    }

    /// Group rows `from..=to` one outline level deeper
    pub fn group_rows(&mut self, from: u32, to: u32) -> Result<()> {
        self.rows.group(from, to)
    }

    /// Undo one level of grouping on rows `from..=to`
    pub fn ungroup_rows(&mut self, from: u32, to: u32) -> Result<()> {
        self.rows.ungroup(from, to)
    }

    /// Hide the grouped rows of `from..=to`
    pub fn collapse_rows(&mut self, from: u32, to: u32) -> Result<()> {
        self.rows.collapse(from, to)
    }

    // === Column Operations ===

    /// Column overlay
    pub fn columns(&self) -> &ColumnOverlay {
        &self.columns
    }

    /// Record governing a column, if any
    pub fn column(&self, col: u16) -> Option<&ColumnRecord> {
        self.columns.get(col)
    }

    /// Apply `f` to the records governing `from..=to`, splitting and
    /// merging records as needed
    pub fn update_columns<F>(&mut self, from: u16, to: u16, f: F) -> Result<()>
    where
        F: FnMut(&mut ColumnRecord),
    {
        self.columns.update(from, to, f)
    }

    /// Add a complete column record (loading path)
    pub fn add_column_record(&mut self, record: ColumnRecord) -> Result<()> {
        self.columns.insert_record(record)
    }

    /// Change the right edge of the column record starting at `min`
    pub fn resize_column_record(&mut self, min: u16, new_max: u16) -> Result<()> {
        self.columns.resize(min, new_max)
    }

    /// Get column width
    pub fn column_width(&self, col: u16) -> f64 {
        self.columns.width(col, self.default_column_width)
    }

    /// Set column width
    pub fn set_column_width(&mut self, col: u16, width: f64) -> Result<()> {
        check_column_width(width)?;
        self.columns.update(col, col, |r| r.width = Some(width))
    }

    /// Check if column is hidden
    pub fn is_column_hidden(&self, col: u16) -> bool {
        self.columns.is_hidden(col)
    }

    /// Set column hidden state
    pub fn set_column_hidden(&mut self, col: u16, hidden: bool) -> Result<()> {
        self.columns.update(col, col, |r| r.hidden = hidden)
    }

    /// Set column outline level (0-7)
    pub fn set_column_outline_level(&mut self, col: u16, level: u8) -> Result<()> {
        check_outline_level(level)?;
        self.columns.update(col, col, |r| r.outline_level = level)
    }

    /// Apply a style to columns `from..=to`
    pub fn set_column_style(&mut self, from: u16, to: u16, style_index: u32) -> Result<()> {
        self.columns
            .update(from, to, |r| r.style_index = Some(style_index))
    }

    /// Group columns `from..=to` one outline level deeper
    pub fn group_columns(&mut self, from: u16, to: u16) -> Result<()> {
        self.columns.group(from, to)
    }

    // === Merged Cells ===

    /// Get merged regions
    pub fn merged_regions(&self) -> &[CellRange] {
        self.merged.as_slice()
    }

    /// Merge cells
    pub fn merge_cells(&mut self, range: &CellRange) -> Result<()> {
        self.validate_cell_position(range.start.row, range.start.col)?;
        self.validate_cell_position(range.end.row, range.end.col)?;
        self.merged.add(*range)
    }

    /// Unmerge cells
    pub fn unmerge_cells(&mut self, range: &CellRange) -> bool {
        self.merged.remove(range)
    }

    /// Merged region containing a cell
    pub fn merged_region_at(&self, row: u32, col: u16) -> Option<&CellRange> {
        self.merged.find(row, col)
    }

    // === Cell Comments ===

    /// Set a comment on a cell by address string
    ///
    /// # Example
    ///
    /// ```rust
    /// use sheetgrid_core::{Worksheet, CellComment};
    ///
    /// let mut ws = Worksheet::new("Test");
    /// ws.set_comment("A1", CellComment::new("Author", "This is a note")).unwrap();
    /// ```
    pub fn set_comment(&mut self, address: &str, comment: CellComment) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_comment_at(addr.row, addr.col, comment)
    }

    /// Set a comment on a cell by row and column indices
    pub fn set_comment_at(&mut self, row: u32, col: u16, comment: CellComment) -> Result<()> {
        self.validate_cell_position(row, col)?;
        if !comment.author.is_empty() && !self.comment_authors.contains(&comment.author) {
            self.comment_authors.push(comment.author.clone());
        }
        self.comments.insert(row, col, comment)?;
        Ok(())
    }

    /// Get a comment from a cell by address string
    pub fn comment(&self, address: &str) -> Result<Option<&CellComment>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.comment_at(addr.row, addr.col))
    }

    /// Get a comment from a cell by row and column indices
    pub fn comment_at(&self, row: u32, col: u16) -> Option<&CellComment> {
        self.comments.get(row, col)
    }

    /// Get a mutable reference to a comment
    pub fn comment_at_mut(&mut self, row: u32, col: u16) -> Option<&mut CellComment> {
        self.comments.get_mut(row, col)
    }

    /// Remove a comment from a cell by address string
    pub fn remove_comment(&mut self, address: &str) -> Result<Option<CellComment>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.remove_comment_at(addr.row, addr.col))
    }

    /// Remove a comment from a cell by row and column indices
    pub fn remove_comment_at(&mut self, row: u32, col: u16) -> Option<CellComment> {
        self.comments.remove(row, col)
    }

    /// Check if a cell has a comment by row and column indices
    pub fn has_comment_at(&self, row: u32, col: u16) -> bool {
        self.comments.get(row, col).is_some()
    }

    /// Get the number of comments in this worksheet
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Iterate over all comments in reading order
    pub fn comments(&self) -> impl Iterator<Item = (u32, u16, &CellComment)> + '_ {
        self.comments.iter()
    }

    /// Get the list of unique comment authors
    pub fn comment_authors(&self) -> &[String] {
        &self.comment_authors
    }

    /// Clear all comments from this worksheet
    pub fn clear_comments(&mut self) {
        self.comments = CommentCollection::new();
        self.comment_authors.clear();
    }

    // === Protected Ranges / Ignored Errors ===

    /// Add a range users may edit while the sheet is protected
    pub fn add_protected_range(&mut self, range: ProtectedRange) {
        self.protected_ranges.push(range);
    }

    /// Protected ranges
    pub fn protected_ranges(&self) -> &[ProtectedRange] {
        &self.protected_ranges
    }

    /// Remove a protected range by name
    pub fn remove_protected_range(&mut self, name: &str) -> Option<ProtectedRange> {
        let pos = self.protected_ranges.iter().position(|p| p.name == name)?;
        Some(self.protected_ranges.remove(pos))
    }

    /// Suppress a warning over some areas
    pub fn add_ignored_error(&mut self, error: IgnoredError) {
        self.ignored_errors.push(error);
    }

    /// Ignored-error regions
    pub fn ignored_errors(&self) -> &[IgnoredError] {
        &self.ignored_errors
    }

    // === Iteration ===

    /// Validate cell position
    fn validate_cell_position(&self, row: u32, col: u16) -> Result<()> {
        if row == 0 {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS));
        }
        if col == 0 {
            return Err(Error::ColumnOutOfBounds(col as u32, MAX_COLS));
        }
        check_row(row)?;
        check_col(col)
    }

    /// Get the number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Check if the worksheet is empty
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over all non-empty cells in reading order (row by row)
    pub fn iter_cells(&self) -> CellCursor<'_, CellData> {
        self.cells.cursor(CellBounds::sheet())
    }

    /// Iterate over the non-empty cells of a range in reading order
    pub fn iter_range(&self, range: &CellRange) -> CellCursor<'_, CellData> {
        self.cells.cursor(CellBounds::from_range(range))
    }

    /// Highest row holding a cell in a column
    pub fn last_row(&self, col: u16) -> Option<u32> {
        self.cells.last_row(col)
    }

    /// Highest column holding a cell
    pub fn last_column(&self) -> Option<u16> {
        self.cells.last_column()
    }

    /// Iterate over all formula cells: (row, col, formula_text)
    pub fn formula_cells(&self) -> impl Iterator<Item = (u32, u16, &str)> + '_ {
        self.cells.iter().filter_map(|(row, col, cell)| {
            cell.value.formula_text().map(|text| (row, col, text))
        })
    }

    /// Set the cached result value of a formula cell
    pub fn set_formula_result(&mut self, row: u32, col: u16, value: CellValue) -> Result<()> {
        let cell = self.cells.get_mut(row, col).ok_or_else(|| {
            Error::InvalidAddress(format!("Cell at ({}, {}) not found", row, col))
        })?;

        match &mut cell.value {
            CellValue::Formula { cached, .. } => {
                *cached = Some(Box::new(value));
                Ok(())
            }
            _ => Err(Error::InvalidAddress(format!(
                "Cell at ({}, {}) is not a formula",
                row, col
            ))),
        }
    }
}

fn check_row_height(height: f64) -> Result<()> {
    if !(0.0..=409.0).contains(&height) {
        return Err(Error::invalid_argument(format!(
            "row height {} outside 0..=409",
            height
        )));
    }
    Ok(())
}

fn check_column_width(width: f64) -> Result<()> {
    if !(0.0..=255.0).contains(&width) {
        return Err(Error::invalid_argument(format!(
            "column width {} outside 0..=255",
            width
        )));
    }
    Ok(())
}

fn check_outline_level(level: u8) -> Result<()> {
    if level > MAX_OUTLINE_LEVEL {
        return Err(Error::invalid_argument(format!(
            "outline level {} exceeds {}",
            level, MAX_OUTLINE_LEVEL
        )));
    }
    Ok(())
}

impl Shift for Worksheet {
    fn insert_rows(&mut self, at: u32, count: u32) -> Result<()> {
        validate_row_shift(at, count)?;
        log::debug!("{}: inserting {} rows at {}", self.name, count, at);
        self.cells.insert_rows(at, count)?;
        self.rows.insert_rows(at, count)?;
        self.columns.insert_rows(at, count)?;
        self.comments.insert_rows(at, count)?;
        self.merged.insert_rows(at, count)?;
        protection::shift_rows(&mut self.protected_ranges, at, count, true)?;
        protection::shift_rows(&mut self.ignored_errors, at, count, true)
    }

    fn delete_rows(&mut self, at: u32, count: u32) -> Result<()> {
        validate_row_shift(at, count)?;
        log::debug!("{}: deleting {} rows at {}", self.name, count, at);
        self.cells.delete_rows(at, count)?;
        self.rows.delete_rows(at, count)?;
        self.columns.delete_rows(at, count)?;
        self.comments.delete_rows(at, count)?;
        self.merged.delete_rows(at, count)?;
        protection::shift_rows(&mut self.protected_ranges, at, count, false)?;
        protection::shift_rows(&mut self.ignored_errors, at, count, false)
    }

    fn insert_columns(&mut self, at: u16, count: u16) -> Result<()> {
        validate_column_shift(at, count)?;
        log::debug!("{}: inserting {} columns at {}", self.name, count, at);
        self.cells.insert_columns(at, count)?;
        self.rows.insert_columns(at, count)?;
        self.columns.insert_columns(at, count)?;
        self.comments.insert_columns(at, count)?;
        self.merged.insert_columns(at, count)?;
        protection::shift_columns(&mut self.protected_ranges, at, count, true)?;
        protection::shift_columns(&mut self.ignored_errors, at, count, true)
    }

    fn delete_columns(&mut self, at: u16, count: u16) -> Result<()> {
        validate_column_shift(at, count)?;
        log::debug!("{}: deleting {} columns at {}", self.name, count, at);
        self.cells.delete_columns(at, count)?;
        self.rows.delete_columns(at, count)?;
        self.columns.delete_columns(at, count)?;
        self.comments.delete_columns(at, count)?;
        self.merged.delete_columns(at, count)?;
        protection::shift_columns(&mut self.protected_ranges, at, count, false)?;
        protection::shift_columns(&mut self.ignored_errors, at, count, false)
    }
}
