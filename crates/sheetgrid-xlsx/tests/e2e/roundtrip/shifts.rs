//! Row/column shifts applied before saving.

use crate::roundtrip;
use sheetgrid_core::{
    CellComment, CellRange, CellValue, IgnoredError, IgnoredErrorKind, ProtectedRange,
    RangeAddress, Shift, Workbook,
};

fn sample() -> Workbook {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", "header").unwrap();
    sheet.set_cell_value("B5", 5.0).unwrap();
    sheet.set_cell_value("E10", 10.0).unwrap();
    sheet.set_row_height(5, 25.0).unwrap();
    sheet.update_columns(3, 8, |c| c.width = Some(20.0)).unwrap();
    sheet
        .set_comment("E10", CellComment::new("Dana", "bottom right"))
        .unwrap();
    sheet.merge_cells(&CellRange::parse("B5:C6").unwrap()).unwrap();
    sheet.add_protected_range(ProtectedRange::new(
        "Block",
        RangeAddress::parse("B5:E10").unwrap(),
    ));
    sheet.add_ignored_error(IgnoredError::new(
        RangeAddress::parse("E10").unwrap(),
        IgnoredErrorKind::EvalError,
    ));
    workbook
}

#[test]
fn test_insert_rows_then_save() {
    let mut workbook = sample();
    workbook.worksheet_mut(0).unwrap().insert_rows(3, 2).unwrap();

    let reloaded = roundtrip(&workbook);
    let sheet = reloaded.worksheet(0).unwrap();
    assert_eq!(
        reloaded.resolve_text(&sheet.get_value("A1").unwrap()),
        Some("header")
    );
    assert_eq!(sheet.get_value("B7").unwrap(), CellValue::Number(5.0));
    assert_eq!(sheet.get_value("E12").unwrap(), CellValue::Number(10.0));
    assert_eq!(sheet.get_value("B5").unwrap(), CellValue::Empty);
    assert_eq!(sheet.row_height(7), 25.0);
    assert_eq!(sheet.comment_at(12, 5).unwrap().text, "bottom right");
    assert_eq!(sheet.merged_regions()[0].to_a1_string(), "B7:C8");
    assert_eq!(sheet.protected_ranges()[0].ranges.to_sqref(), "B7:E12");
    assert_eq!(sheet.ignored_errors()[0].ranges.to_sqref(), "E12");
}

#[test]
fn test_delete_columns_then_save() {
    let mut workbook = sample();
    workbook
        .worksheet_mut(0)
        .unwrap()
        .delete_columns(2, 2)
        .unwrap();

    let reloaded = roundtrip(&workbook);
    let sheet = reloaded.worksheet(0).unwrap();
    assert_eq!(sheet.get_value("C10").unwrap(), CellValue::Number(10.0));
    assert_eq!(sheet.get_value("B5").unwrap(), CellValue::Empty);
    // 3..=8 loses column 3 to the delete and moves left by two
    let spans: Vec<_> = sheet.columns().iter().map(|c| (c.min, c.max)).collect();
    assert_eq!(spans, vec![(2, 6)]);
    assert_eq!(sheet.comment_at(10, 3).unwrap().author, "Dana");
    // the merge lay entirely inside the deleted columns
    assert!(sheet.merged_regions().is_empty());
    assert_eq!(sheet.protected_ranges()[0].ranges.to_sqref(), "B5:C10");
}

#[test]
fn test_delete_rows_drops_sidecars_in_block() {
    let mut workbook = sample();
    workbook.worksheet_mut(0).unwrap().delete_rows(10, 1).unwrap();

    let reloaded = roundtrip(&workbook);
    let sheet = reloaded.worksheet(0).unwrap();
    assert_eq!(sheet.get_value("E10").unwrap(), CellValue::Empty);
    assert_eq!(sheet.comment_count(), 0);
    assert!(sheet.ignored_errors().is_empty());
    assert_eq!(sheet.protected_ranges()[0].ranges.to_sqref(), "B5:E9");
}
