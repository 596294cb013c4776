//! XLSX writer

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use zip::CompressionMethod;

use crate::comments::write_comments;
use crate::error::XlsxResult;
use crate::node::XmlElement;
use crate::package::{MemoryPackage, PackageStore};
use crate::relationships::{
    rels_path_for, write_content_types, write_relationships, Relationship, CT_COMMENTS,
    CT_SHARED_STRINGS, CT_STYLES, CT_WORKBOOK, CT_WORKSHEET, NS_MAIN, NS_RELATIONSHIPS,
    REL_COMMENTS, REL_OFFICE_DOCUMENT, REL_SHARED_STRINGS, REL_STYLES, REL_WORKSHEET,
};
use crate::shared_strings::write_shared_strings;
use crate::sheet::{write_worksheet, SheetStrings};
use sheetgrid_core::{Workbook, Worksheet};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const STYLES_PART: &str = "xl/styles.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Options for [`XlsxWriter::write_with_options`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriterOptions {
    /// Compression applied to every part
    pub compression: CompressionMethod,
    /// Store text in the shared string table instead of inline
    pub shared_strings: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
            shared_strings: true,
        }
    }
}

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file)
    }

    /// Write a workbook to a writer
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        Self::write_with_options(workbook, writer, &WriterOptions::default())
    }

    /// Write a workbook to a writer with explicit options
    pub fn write_with_options<W: Write + Seek>(
        workbook: &Workbook,
        writer: W,
        options: &WriterOptions,
    ) -> XlsxResult<()> {
        let mut package = MemoryPackage::new();
        Self::write_package(workbook, &mut package, options)?;
        package.write_zip(writer, options.compression)?;
        Ok(())
    }

    /// Write every part of a workbook into a package store
    pub fn write_package<P: PackageStore>(
        workbook: &Workbook,
        package: &mut P,
        options: &WriterOptions,
    ) -> XlsxResult<()> {
        let mut overrides: Vec<(String, &str)> = vec![
            (WORKBOOK_PART.to_string(), CT_WORKBOOK),
            (STYLES_PART.to_string(), CT_STYLES),
        ];
        let mut workbook_rels = Vec::new();
        let mut pool = workbook.shared_strings().clone();

        for (i, sheet) in workbook.worksheets().enumerate() {
            let n = i + 1;
            let sheet_part = format!("xl/worksheets/sheet{}.xml", n);

            let mut strings = if options.shared_strings {
                SheetStrings::Shared(&mut pool)
            } else {
                SheetStrings::Inline(workbook.shared_strings())
            };
            let xml = write_worksheet(sheet, workbook.settings().compress_columns, &mut strings);
            package.write_part(&sheet_part, xml.into_bytes())?;

            // Write worksheet relationships if sheet has comments
            if let Some(comments) = write_comments(sheet) {
                let comments_part = format!("xl/comments{}.xml", n);
                package.write_part(&comments_part, comments.into_bytes())?;
                let rels = [Relationship::new(
                    "rId1",
                    REL_COMMENTS,
                    format!("../comments{}.xml", n),
                )];
                package.write_part(
                    &rels_path_for(&sheet_part),
                    write_relationships(&rels).into_bytes(),
                )?;
                overrides.push((comments_part, CT_COMMENTS));
            }

            workbook_rels.push(Relationship::new(
                format!("rId{}", n),
                REL_WORKSHEET,
                format!("worksheets/sheet{}.xml", n),
            ));
            overrides.push((sheet_part, CT_WORKSHEET));
        }

        // Styles relationship
        let mut next_rid = workbook.sheet_count() + 1;
        workbook_rels.push(Relationship::new(
            format!("rId{}", next_rid),
            REL_STYLES,
            "styles.xml",
        ));
        package.write_part(STYLES_PART, styles_xml(style_count(workbook)).into_bytes())?;

        if options.shared_strings && !pool.is_empty() {
            next_rid += 1;
            workbook_rels.push(Relationship::new(
                format!("rId{}", next_rid),
                REL_SHARED_STRINGS,
                "sharedStrings.xml",
            ));
            package.write_part(SHARED_STRINGS_PART, write_shared_strings(&pool).into_bytes())?;
            overrides.push((SHARED_STRINGS_PART.to_string(), CT_SHARED_STRINGS));
        }

        package.write_part(
            &rels_path_for(WORKBOOK_PART),
            write_relationships(&workbook_rels).into_bytes(),
        )?;
        package.write_part(WORKBOOK_PART, workbook_xml(workbook).into_bytes())?;
        package.write_part(
            "_rels/.rels",
            write_relationships(&[Relationship::new("rId1", REL_OFFICE_DOCUMENT, WORKBOOK_PART)])
                .into_bytes(),
        )?;
        package.write_part(
            "[Content_Types].xml",
            write_content_types(&overrides).into_bytes(),
        )?;

        log::info!(
            "wrote workbook with {} sheet(s), {} shared string(s)",
            workbook.sheet_count(),
            if options.shared_strings { pool.len() } else { 0 }
        );
        Ok(())
    }
}

fn workbook_xml(workbook: &Workbook) -> String {
    let mut content = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="{}">"#,
        NS_MAIN, NS_RELATIONSHIPS
    );

    let mut pr = XmlElement::new("workbookPr");
    if workbook.settings().date_1904 {
        pr = pr.with_attribute("date1904", 1);
    }
    pr.write_to(&mut content);

    XmlElement::new("bookViews")
        .with_child(XmlElement::new("workbookView").with_attribute("activeTab", workbook.active_sheet()))
        .write_to(&mut content);

    let mut sheets = XmlElement::new("sheets");
    for (i, sheet) in workbook.worksheets().enumerate() {
        let mut entry = XmlElement::new("sheet")
            .with_attribute("name", sheet.name())
            .with_attribute("sheetId", i + 1)
            .with_attribute("r:id", format!("rId{}", i + 1));
        if !sheet.is_visible() {
            entry = entry.with_attribute("state", "hidden");
        }
        sheets.push_child(entry);
    }
    sheets.write_to(&mut content);

    content.push_str("</workbook>");
    content
}

/// Number of cell formats the style sheet must declare
///
/// Style indices are opaque here; every index in use gets a default format
/// so the references stay valid.
fn style_count(workbook: &Workbook) -> u32 {
    workbook
        .worksheets()
        .map(max_style_index)
        .max()
        .unwrap_or(0)
        + 1
}

fn max_style_index(sheet: &Worksheet) -> u32 {
    let cells = sheet.iter_cells().map(|(_, _, data)| data.style_index);
    let rows = sheet.rows().iter().filter_map(|(_, r)| r.style_index);
    let columns = sheet.columns().iter().filter_map(|c| c.style_index);
    cells.chain(rows).chain(columns).max().unwrap_or(0)
}

fn styles_xml(cell_formats: u32) -> String {
    let mut content = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="{}"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
        NS_MAIN
    );
    let mut xfs = XmlElement::new("cellXfs").with_attribute("count", cell_formats);
    for _ in 0..cell_formats {
        xfs.push_child(
            XmlElement::new("xf")
                .with_attribute("numFmtId", 0)
                .with_attribute("fontId", 0)
                .with_attribute("fillId", 0)
                .with_attribute("borderId", 0)
                .with_attribute("xfId", 0),
        );
    }
    xfs.write_to(&mut content);
    content.push_str(
        r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#,
    );
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::XlsxReader;
    use pretty_assertions::assert_eq;
    use sheetgrid_core::CellValue;
    use std::io::Cursor;

    fn sample() -> Workbook {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", "Hello").unwrap();
        sheet.set_cell_value("B2", 3.25).unwrap();
        sheet.set_cell_style_index_at(2, 2, 4).unwrap();
        workbook
    }

    #[test]
    fn test_write_package_parts() {
        let mut package = MemoryPackage::new();
        XlsxWriter::write_package(&sample(), &mut package, &WriterOptions::default()).unwrap();

        assert_eq!(
            package.part_names(),
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "xl/_rels/workbook.xml.rels",
                "xl/sharedStrings.xml",
                "xl/styles.xml",
                "xl/workbook.xml",
                "xl/worksheets/sheet1.xml",
            ]
        );
        let styles = String::from_utf8(package.part(STYLES_PART).unwrap().to_vec()).unwrap();
        assert!(styles.contains(r#"<cellXfs count="5">"#));
        let content_types =
            String::from_utf8(package.part("[Content_Types].xml").unwrap().to_vec()).unwrap();
        assert!(content_types.contains(r#"PartName="/xl/sharedStrings.xml""#));
    }

    #[test]
    fn test_inline_strings_skip_the_table() {
        let mut package = MemoryPackage::new();
        let options = WriterOptions {
            shared_strings: false,
            ..WriterOptions::default()
        };
        XlsxWriter::write_package(&sample(), &mut package, &options).unwrap();
        assert!(!package.has_part(SHARED_STRINGS_PART));

        let workbook = XlsxReader::read_package(&mut package).unwrap();
        assert_eq!(
            workbook.worksheet(0).unwrap().get_value_at(1, 1),
            CellValue::text("Hello")
        );
    }

    #[test]
    fn test_workbook_settings_roundtrip() {
        let mut workbook = sample();
        workbook.settings_mut().date_1904 = true;
        workbook.add_worksheet_with_name("Second").unwrap();
        workbook.worksheet_mut(1).unwrap().set_visible(false);
        workbook.set_active_sheet(1).unwrap();

        let mut buf = Cursor::new(Vec::new());
        XlsxWriter::write(&workbook, &mut buf).unwrap();
        buf.set_position(0);
        let reloaded = XlsxReader::read(buf).unwrap();

        assert!(reloaded.settings().date_1904);
        assert_eq!(reloaded.active_sheet(), 1);
        assert_eq!(reloaded.worksheet(1).unwrap().name(), "Second");
        assert!(!reloaded.worksheet(1).unwrap().is_visible());
        let sheet = reloaded.worksheet(0).unwrap();
        assert_eq!(
            reloaded.resolve_text(&sheet.get_value_at(1, 1)),
            Some("Hello")
        );
        assert_eq!(sheet.get_value_at(2, 2), CellValue::Number(3.25));
        assert_eq!(sheet.cell_style_index_at(2, 2), 4);
    }
}
