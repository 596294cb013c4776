//! Protected ranges and ignored errors.

use crate::{roundtrip, written_part};
use sheetgrid_core::{IgnoredError, IgnoredErrorKind, ProtectedRange, RangeAddress, Workbook};

fn sample() -> Workbook {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.add_protected_range(ProtectedRange::new(
        "Inputs",
        RangeAddress::parse("B2:B20 D2:D20").unwrap(),
    ));
    sheet.add_ignored_error(IgnoredError::new(
        RangeAddress::parse("A1:A100").unwrap(),
        IgnoredErrorKind::NumberStoredAsText,
    ));
    sheet.add_ignored_error(IgnoredError::new(
        RangeAddress::parse("F5").unwrap(),
        IgnoredErrorKind::CalculatedColumn,
    ));
    workbook
}

#[test]
fn test_protected_ranges_roundtrip() {
    let workbook = sample();
    let xml = written_part(&workbook, "xl/worksheets/sheet1.xml");
    assert!(xml.contains(
        r#"<protectedRanges><protectedRange sqref="B2:B20 D2:D20" name="Inputs"/></protectedRanges>"#
    ));

    let reloaded = roundtrip(&workbook);
    assert_eq!(
        reloaded.worksheet(0).unwrap().protected_ranges(),
        workbook.worksheet(0).unwrap().protected_ranges()
    );
}

#[test]
fn test_ignored_errors_roundtrip() {
    let workbook = sample();
    let xml = written_part(&workbook, "xl/worksheets/sheet1.xml");
    assert!(xml.contains(r#"<ignoredError sqref="F5" calculatedColumn="1"/>"#));

    let reloaded = roundtrip(&workbook);
    assert_eq!(
        reloaded.worksheet(0).unwrap().ignored_errors(),
        workbook.worksheet(0).unwrap().ignored_errors()
    );
}
