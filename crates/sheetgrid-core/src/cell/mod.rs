//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] / [`RangeAddress`] - Rectangular and multi-area ranges
//! - [`CellData`] - Complete cell data including value and style

mod address;
mod value;

pub use address::{CellAddress, CellRange, CellRangeIterator, RangeAddress};
pub use value::{CellData, CellError, CellValue, SharedString, StringPool};
