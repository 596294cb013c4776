//! # sheetgrid-xlsx
//!
//! XLSX (Office Open XML) reader and writer for sheetgrid.
//!
//! Packages are accessed through the [`PackageStore`] trait, so the same
//! reader and writer work against a zip archive on disk or parts held in
//! memory. Row and column records are mapped to `<row>` / `<col>` attributes
//! through [`NodeAccessor`].
//!
//! ```rust
//! use std::io::Cursor;
//! use sheetgrid_core::Workbook;
//! use sheetgrid_xlsx::{XlsxReader, XlsxWriter};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("B2", 3.5).unwrap();
//! sheet.update_columns(3, 8, |c| c.width = Some(20.0)).unwrap();
//!
//! let mut bytes = Cursor::new(Vec::new());
//! XlsxWriter::write(&workbook, &mut bytes).unwrap();
//!
//! bytes.set_position(0);
//! let loaded = XlsxReader::read(bytes).unwrap();
//! let sheet = loaded.worksheet(0).unwrap();
//! assert_eq!(sheet.column_width(5), 20.0);
//! assert_eq!(sheet.columns().len(), 1);
//! ```

pub mod error;
pub mod node;
pub mod package;
pub mod reader;
pub mod writer;

mod comments;
mod relationships;
mod shared_strings;
mod sheet;

pub use error::{XlsxError, XlsxResult};
pub use node::{NodeAccessor, XmlElement};
pub use package::{MemoryPackage, PackageStore, ZipPackage};
pub use reader::XlsxReader;
pub use writer::{WriterOptions, XlsxWriter};
