//! Row and column records.

use crate::{roundtrip, written_part};
use sheetgrid_core::{ColumnRecord, RowRecord, Workbook, WorkbookSettings};

fn columns_of(workbook: &Workbook) -> Vec<(u16, u16, Option<f64>, bool)> {
    workbook
        .worksheet(0)
        .unwrap()
        .columns()
        .iter()
        .map(|c| (c.min, c.max, c.width, c.hidden))
        .collect()
}

#[test]
fn test_column_width_range() {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.update_columns(3, 8, |c| c.width = Some(20.0)).unwrap();

    let reloaded = roundtrip(&workbook);
    let sheet = reloaded.worksheet(0).unwrap();
    assert_eq!(sheet.column_width(5), 20.0);
    assert_eq!(sheet.column_width(9), sheet.default_column_width());
    assert_eq!(columns_of(&reloaded), vec![(3, 8, Some(20.0), false)]);
}

#[test]
fn test_split_column_records_are_written_compressed() {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.add_column_record(ColumnRecord::new(1, 4).with_width(12.0)).unwrap();
    sheet.add_column_record(ColumnRecord::new(5, 9).with_width(12.0)).unwrap();
    sheet.set_column_hidden(10, true).unwrap();

    let xml = written_part(&workbook, "xl/worksheets/sheet1.xml");
    assert!(xml.contains(r#"<col min="1" max="9" width="12" customWidth="1"/>"#));

    let reloaded = roundtrip(&workbook);
    assert_eq!(
        columns_of(&reloaded),
        vec![(1, 9, Some(12.0), false), (10, 10, None, true)]
    );
}

#[test]
fn test_uncompressed_columns_keep_their_split() {
    let mut workbook = Workbook::empty_with_settings(WorkbookSettings {
        compress_columns: false,
        ..WorkbookSettings::default()
    });
    workbook.add_worksheet().unwrap();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.add_column_record(ColumnRecord::new(1, 4).with_width(12.0)).unwrap();
    sheet.add_column_record(ColumnRecord::new(5, 9).with_width(12.0)).unwrap();

    let reloaded = roundtrip(&workbook);
    assert_eq!(
        columns_of(&reloaded),
        vec![(1, 4, Some(12.0), false), (5, 9, Some(12.0), false)]
    );
}

#[test]
fn test_column_update_inside_record() {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.update_columns(1, 10, |c| c.width = Some(10.0)).unwrap();
    sheet.set_column_style(4, 6, 2).unwrap();
    sheet.group_columns(5, 5).unwrap();

    let reloaded = roundtrip(&workbook);
    let sheet = reloaded.worksheet(0).unwrap();
    let spans: Vec<_> = sheet
        .columns()
        .iter()
        .map(|c| (c.min, c.max, c.style_index, c.outline_level))
        .collect();
    assert_eq!(
        spans,
        vec![
            (1, 3, None, 0),
            (4, 4, Some(2), 0),
            (5, 5, Some(2), 1),
            (6, 6, Some(2), 0),
            (7, 10, None, 0),
        ]
    );
    for col in 1..=10 {
        assert_eq!(sheet.column_width(col), 10.0);
    }
}

#[test]
fn test_row_records() {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.set_row_height(2, 30.0).unwrap();
    sheet.set_row_hidden(3, true).unwrap();
    sheet.group_rows(5, 7).unwrap();
    sheet.collapse_rows(5, 7).unwrap();
    sheet.set_cell_value("A3", "under a hidden row").unwrap();
    *sheet.row_mut(100).unwrap() = RowRecord {
        phonetic: true,
        style_index: Some(1),
        ..RowRecord::default()
    };

    let reloaded = roundtrip(&workbook);
    let original = workbook.worksheet(0).unwrap();
    let sheet = reloaded.worksheet(0).unwrap();

    assert_eq!(sheet.row_height(2), 30.0);
    assert_eq!(sheet.row_height(4), sheet.default_row_height());
    assert!(sheet.is_row_hidden(3));
    let records: Vec<_> = sheet.rows().iter().map(|(r, rec)| (r, rec.clone())).collect();
    let expected: Vec<_> = original
        .rows()
        .iter()
        .map(|(r, rec)| (r, rec.clone()))
        .collect();
    assert_eq!(records, expected);
}

#[test]
fn test_default_dimensions() {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.set_default_row_height(21.0).unwrap();
    sheet.set_default_column_width(14.5).unwrap();

    let reloaded = roundtrip(&workbook);
    let sheet = reloaded.worksheet(0).unwrap();
    assert_eq!(sheet.default_row_height(), 21.0);
    assert_eq!(sheet.default_column_width(), 14.5);
    assert_eq!(sheet.column_width(3), 14.5);
}

#[test]
fn test_page_breaks() {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.row_mut(20).unwrap().page_break = true;
    sheet.update_columns(4, 5, |c| c.page_break = true).unwrap();

    let xml = written_part(&workbook, "xl/worksheets/sheet1.xml");
    assert!(xml.contains(r#"<brk id="20" max="16383" man="1"/>"#));
    assert!(xml.contains(r#"<colBreaks count="2" manualBreakCount="2">"#));

    let reloaded = roundtrip(&workbook);
    let sheet = reloaded.worksheet(0).unwrap();
    assert!(sheet.row(20).unwrap().page_break);
    assert_eq!(columns_of(&reloaded), vec![(4, 5, None, false)]);
    assert!(sheet.column(4).unwrap().page_break);
}
