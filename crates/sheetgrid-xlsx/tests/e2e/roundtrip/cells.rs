//! Cell values, formulas and styles.

use crate::{roundtrip, roundtrip_with, temp_fixture_path, written_part};
use sheetgrid_core::{CellError, CellValue, Workbook};
use sheetgrid_xlsx::{WriterOptions, XlsxReader, XlsxWriter};

fn data_types() -> Workbook {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", "Hello").unwrap();
    sheet.set_cell_value("A2", 42.0).unwrap();
    sheet.set_cell_value("A3", -0.125).unwrap();
    sheet.set_cell_value("A4", true).unwrap();
    sheet.set_cell_value("A5", CellError::Na).unwrap();
    sheet.set_cell_value("A6", "  padded  ").unwrap();
    sheet.set_cell_value("A7", "tab\tand\u{1}control").unwrap();
    sheet.set_cell_value("B1", "Hello").unwrap();
    sheet.set_cell_formula("C1", "=SUM(A2:A3)").unwrap();
    sheet
        .set_formula_result(1, 3, CellValue::Number(41.875))
        .unwrap();
    sheet.set_cell_value("XFD1048576", 1.0).unwrap();
    workbook
}

fn text_at(workbook: &Workbook, address: &str) -> Option<String> {
    let value = workbook.worksheet(0).unwrap().get_value(address).unwrap();
    workbook.resolve_text(&value).map(str::to_string)
}

#[test]
fn test_data_types_shared_strings() {
    let reloaded = roundtrip(&data_types());
    let sheet = reloaded.worksheet(0).unwrap();

    assert_eq!(text_at(&reloaded, "A1").as_deref(), Some("Hello"));
    assert_eq!(sheet.get_value("A2").unwrap(), CellValue::Number(42.0));
    assert_eq!(sheet.get_value("A3").unwrap(), CellValue::Number(-0.125));
    assert_eq!(sheet.get_value("A4").unwrap(), CellValue::Boolean(true));
    assert_eq!(sheet.get_value("A5").unwrap(), CellValue::Error(CellError::Na));
    assert_eq!(text_at(&reloaded, "A6").as_deref(), Some("  padded  "));
    assert_eq!(
        text_at(&reloaded, "A7").as_deref(),
        Some("tab\tand\u{1}control")
    );
    // equal strings share one table entry
    assert_eq!(sheet.get_value("A1").unwrap(), sheet.get_value("B1").unwrap());
    assert_eq!(
        sheet.get_value("C1").unwrap(),
        CellValue::Formula {
            text: "SUM(A2:A3)".into(),
            cached: Some(Box::new(CellValue::Number(41.875))),
        }
    );
    assert_eq!(sheet.get_value_at(1_048_576, 16_384), CellValue::Number(1.0));
    assert_eq!(sheet.cell_count(), 10);
}

#[test]
fn test_data_types_inline_strings() {
    let options = WriterOptions {
        shared_strings: false,
        ..WriterOptions::default()
    };
    let reloaded = roundtrip_with(&data_types(), &options);
    let sheet = reloaded.worksheet(0).unwrap();

    assert_eq!(sheet.get_value("A1").unwrap(), CellValue::text("Hello"));
    assert_eq!(sheet.get_value("A6").unwrap(), CellValue::text("  padded  "));
    assert!(reloaded.shared_strings().is_empty());
}

#[test]
fn test_style_indices_survive() {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.set_cell_value("B2", 1.0).unwrap();
    sheet.set_cell_style_index_at(2, 2, 3).unwrap();
    sheet.set_cell_style_index_at(4, 4, 9).unwrap();

    let styles = written_part(&workbook, "xl/styles.xml");
    assert!(styles.contains(r#"<cellXfs count="10">"#));

    let reloaded = roundtrip(&workbook);
    let sheet = reloaded.worksheet(0).unwrap();
    assert_eq!(sheet.cell_style_index_at(2, 2), 3);
    assert_eq!(sheet.cell_style_index_at(4, 4), 9);
    assert_eq!(sheet.get_value_at(4, 4), CellValue::Empty);
}

#[test]
fn test_file_roundtrip() {
    let (_dir, path) = temp_fixture_path();
    let workbook = data_types();
    XlsxWriter::write_file(&workbook, &path).unwrap();

    let reloaded = XlsxReader::read_file(&path).unwrap();
    assert_eq!(reloaded.sheet_count(), 1);
    assert_eq!(reloaded.worksheet(0).unwrap().name(), "Sheet1");
    assert_eq!(text_at(&reloaded, "A1").as_deref(), Some("Hello"));
}

#[test]
fn test_read_rejects_non_xlsx() {
    let (_dir, path) = temp_fixture_path();
    std::fs::write(&path, b"not a zip archive").unwrap();
    assert!(XlsxReader::read_file(&path).is_err());
}
