//! Common utilities for E2E tests.

use std::io::Cursor;
use std::path::PathBuf;

use sheetgrid_core::Workbook;
use sheetgrid_xlsx::{MemoryPackage, WriterOptions, XlsxReader, XlsxWriter};
use tempfile::TempDir;

/// Write a workbook to an in-memory `.xlsx` and read it back
pub fn roundtrip(workbook: &Workbook) -> Workbook {
    roundtrip_with(workbook, &WriterOptions::default())
}

/// [`roundtrip`] with explicit writer options
pub fn roundtrip_with(workbook: &Workbook, options: &WriterOptions) -> Workbook {
    let mut bytes = Cursor::new(Vec::new());
    XlsxWriter::write_with_options(workbook, &mut bytes, options).expect("write workbook");
    bytes.set_position(0);
    XlsxReader::read(bytes).expect("read workbook back")
}

/// Write a workbook and return the XML of one part
pub fn written_part(workbook: &Workbook, part: &str) -> String {
    let mut bytes = Cursor::new(Vec::new());
    XlsxWriter::write(workbook, &mut bytes).expect("write workbook");
    bytes.set_position(0);
    let package = MemoryPackage::from_zip(bytes).expect("open written archive");
    let xml = package
        .part(part)
        .unwrap_or_else(|| panic!("{} should be written", part));
    String::from_utf8_lossy(xml).into_owned()
}

/// A temp directory and a `.xlsx` path inside it
///
/// The directory is removed when the returned guard drops.
pub fn temp_fixture_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("fixture.xlsx");
    (dir, path)
}
