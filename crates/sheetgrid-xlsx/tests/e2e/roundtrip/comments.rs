//! Cell comments.

use crate::{roundtrip, written_part};
use sheetgrid_core::{CellComment, Workbook};

#[test]
fn test_comments_roundtrip() {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet
        .set_comment("A1", CellComment::new("Alice", "Check this"))
        .unwrap();
    sheet
        .set_comment("C5", CellComment::new("Bob", "Line one\nline two"))
        .unwrap();
    sheet
        .set_comment("B2", CellComment::text_only("no author & <markup>"))
        .unwrap();

    let reloaded = roundtrip(&workbook);
    let sheet = reloaded.worksheet(0).unwrap();
    assert_eq!(sheet.comment_count(), 3);
    assert_eq!(
        sheet.comment("A1").unwrap(),
        Some(&CellComment::new("Alice", "Check this"))
    );
    assert_eq!(
        sheet.comment("C5").unwrap(),
        Some(&CellComment::new("Bob", "Line one\nline two"))
    );
    assert_eq!(
        sheet.comment("B2").unwrap(),
        Some(&CellComment::text_only("no author & <markup>"))
    );
    assert_eq!(sheet.comment_authors(), &["Alice".to_string(), "Bob".to_string()]);
}

#[test]
fn test_comment_parts_only_for_sheets_with_comments() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet_with_name("Notes").unwrap();
    workbook
        .worksheet_mut(1)
        .unwrap()
        .set_comment("D4", CellComment::new("Carol", "second sheet"))
        .unwrap();

    let rels = written_part(&workbook, "xl/worksheets/_rels/sheet2.xml.rels");
    assert!(rels.contains(r#"Target="../comments2.xml""#));
    let content_types = written_part(&workbook, "[Content_Types].xml");
    assert!(content_types.contains("/xl/comments2.xml"));
    assert!(!content_types.contains("/xl/comments1.xml"));

    let reloaded = roundtrip(&workbook);
    assert_eq!(reloaded.worksheet(0).unwrap().comment_count(), 0);
    let notes = reloaded.worksheet_by_name("Notes").unwrap();
    assert_eq!(notes.comment_at(4, 4).unwrap().text, "second sheet");
}
