//! End-to-end tests for sheetgrid-xlsx.
//!
//! Each test builds the workbook it needs in memory, writes it as a real
//! `.xlsx` (to a buffer or a temp file), reads it back with `XlsxReader` and
//! asserts on the reloaded model.

mod common;
mod roundtrip;

// Re-export common utilities for submodules
pub use common::*;
