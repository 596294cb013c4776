//! Merged regions.

use crate::roundtrip;
use sheetgrid_core::{CellRange, Workbook};

#[test]
fn test_merged_regions_roundtrip() {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", "Title").unwrap();
    sheet.merge_cells(&CellRange::parse("A1:D1").unwrap()).unwrap();
    sheet.merge_cells(&CellRange::parse("B3:C10").unwrap()).unwrap();

    let reloaded = roundtrip(&workbook);
    let sheet = reloaded.worksheet(0).unwrap();
    let regions: Vec<String> = sheet
        .merged_regions()
        .iter()
        .map(|r| r.to_a1_string())
        .collect();
    assert_eq!(regions, vec!["A1:D1", "B3:C10"]);
    assert_eq!(
        sheet.merged_region_at(5, 2).map(|r| r.to_a1_string()),
        Some("B3:C10".to_string())
    );
}

#[test]
fn test_overlapping_merge_is_rejected() {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.merge_cells(&CellRange::parse("A1:B2").unwrap()).unwrap();
    assert!(sheet
        .merge_cells(&CellRange::parse("B2:C3").unwrap())
        .is_err());

    let reloaded = roundtrip(&workbook);
    assert_eq!(reloaded.worksheet(0).unwrap().merged_regions().len(), 1);
}
