//! # sheetgrid-core
//!
//! Core data structures for the sheetgrid spreadsheet engine.
//!
//! This crate provides:
//! - [`store::SparseStore`] - page-indexed sparse storage over the full
//!   1,048,576 x 16,384 grid, with ordered neighbour queries and cursors
//! - [`RowOverlay`] / [`ColumnOverlay`] - row and column metadata, columns
//!   range-compressed into `min..=max` records
//! - [`Shift`] - row/column insert and delete, applied to cells and every
//!   coordinate-indexed sidecar alike
//! - [`Workbook`], [`Worksheet`] - the document model built on top
//!
//! Rows and columns are 1-based. Row 0 and column 0 are sentinels reserved for
//! column and row metadata records inside the store.
//!
//! ## Example
//!
//! ```rust
//! use sheetgrid_core::{Shift, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("A1", "Hello").unwrap();
//! sheet.set_cell_value("A5", 42.0).unwrap();
//! sheet.set_column_width(1, 20.0).unwrap();
//!
//! sheet.insert_rows(3, 2).unwrap();
//! assert_eq!(sheet.get_value("A7").unwrap().as_number(), Some(42.0));
//! ```

pub mod cell;
pub mod column;
pub mod comment;
pub mod error;
pub mod protection;
pub mod range_list;
pub mod row;
pub mod store;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{
    CellAddress, CellData, CellError, CellRange, CellValue, RangeAddress, SharedString, StringPool,
};
pub use column::{ColumnOverlay, ColumnRecord};
pub use comment::{CellComment, CommentCollection};
pub use error::{Error, Result};
pub use protection::{IgnoredError, IgnoredErrorKind, ProtectedRange};
pub use range_list::RangeList;
pub use row::{RowOverlay, RowRecord, MAX_OUTLINE_LEVEL};
pub use store::{CellBounds, CellCursor, CellKey, Shift, SparseStore};
pub use workbook::{Workbook, WorkbookSettings, DEFAULT_COLUMN_WIDTH, DEFAULT_ROW_HEIGHT};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
