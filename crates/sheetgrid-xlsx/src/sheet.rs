//! Worksheet part (`xl/worksheets/sheetN.xml`)
//!
//! Reading walks the part event by event; elements that carry data (`<c>`,
//! `<row>`, `<col>`) are lifted into [`XmlElement`]s so attribute mapping
//! goes through [`NodeAccessor`].

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::node::{
    column_record_from_node, row_record_from_node, write_column_record, write_row_record,
    NodeAccessor, XmlElement,
};
use crate::relationships::{NS_MAIN, NS_RELATIONSHIPS};
use crate::shared_strings::{decode_excel_escapes, rich_text, text_element};
use sheetgrid_core::{
    CellAddress, CellData, CellError, CellRange, CellValue, IgnoredError, IgnoredErrorKind,
    ProtectedRange, RangeAddress, StringPool, Worksheet, MAX_COLS, MAX_ROWS,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Breaks {
    None,
    Rows,
    Columns,
}

/// Position of the last cell seen, for cells and rows without `r`
#[derive(Debug, Default)]
struct Position {
    row: u32,
    col: u16,
}

/// Load a worksheet part into `sheet`
///
/// `strings` maps each index of the file's shared string table to its index
/// in the workbook pool.
pub(crate) fn read_worksheet(xml: &[u8], sheet: &mut Worksheet, strings: &[u32]) -> XlsxResult<()> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut position = Position::default();
    let mut breaks = Breaks::None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"row" => read_row(&e, sheet, &mut position)?,
                b"c" => {
                    let node = XmlElement::read_subtree(&mut reader, &e)?;
                    read_cell(&node, sheet, &mut position, strings)?;
                }
                b"rowBreaks" => breaks = Breaks::Rows,
                b"colBreaks" => breaks = Breaks::Columns,
                _ => read_empty(&e, sheet, breaks)?,
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"row" => read_row(&e, sheet, &mut position)?,
                b"c" => {
                    let node = XmlElement::from_start(&e)?;
                    read_cell(&node, sheet, &mut position, strings)?;
                }
                _ => read_empty(&e, sheet, breaks)?,
            },
            Event::End(e) => {
                if matches!(e.name().as_ref(), b"rowBreaks" | b"colBreaks") {
                    breaks = Breaks::None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    log::debug!(
        "read sheet '{}': {} cells, {} row records, {} column records",
        sheet.name(),
        sheet.cell_count(),
        sheet.rows().len(),
        sheet.columns().len()
    );
    Ok(())
}

/// Elements whose content lives entirely in their attributes
fn read_empty(e: &BytesStart<'_>, sheet: &mut Worksheet, breaks: Breaks) -> XlsxResult<()> {
    match e.name().as_ref() {
        b"sheetView" => {
            let node = XmlElement::from_start(e)?;
            if node.flag("tabSelected") {
                sheet.set_selected(true);
            }
        }
        b"sheetFormatPr" => {
            let node = XmlElement::from_start(e)?;
            if let Some(height) = node.attribute_f64("defaultRowHeight") {
                if let Err(err) = sheet.set_default_row_height(height) {
                    log::warn!("ignoring defaultRowHeight: {}", err);
                }
            }
            if let Some(width) = node.attribute_f64("defaultColWidth") {
                if let Err(err) = sheet.set_default_column_width(width) {
                    log::warn!("ignoring defaultColWidth: {}", err);
                }
            }
        }
        b"col" => {
            let record = column_record_from_node(&XmlElement::from_start(e)?)?;
            let (min, max) = (record.min, record.max);
            if let Err(err) = sheet.add_column_record(record) {
                log::warn!("skipping <col min=\"{}\" max=\"{}\">: {}", min, max, err);
            }
        }
        b"mergeCell" => {
            let node = XmlElement::from_start(e)?;
            let Some(reference) = node.attribute("ref") else {
                return Ok(());
            };
            let merged = CellRange::parse(reference).and_then(|range| sheet.merge_cells(&range));
            if let Err(err) = merged {
                log::warn!("skipping merged region '{}': {}", reference, err);
            }
        }
        b"protectedRange" => {
            let node = XmlElement::from_start(e)?;
            let name = node.attribute("name").unwrap_or_default();
            match node.attribute("sqref").map(RangeAddress::parse) {
                Some(Ok(ranges)) => sheet.add_protected_range(ProtectedRange::new(name, ranges)),
                Some(Err(err)) => log::warn!("skipping protected range '{}': {}", name, err),
                None => log::warn!("skipping protected range '{}' without sqref", name),
            }
        }
        b"ignoredError" => {
            let node = XmlElement::from_start(e)?;
            let ranges = match node.attribute("sqref").map(RangeAddress::parse) {
                Some(Ok(ranges)) => ranges,
                _ => {
                    log::warn!("skipping ignoredError without a valid sqref");
                    return Ok(());
                }
            };
            for kind in IgnoredErrorKind::ALL {
                if node.flag(kind.as_str()) {
                    sheet.add_ignored_error(IgnoredError::new(ranges.clone(), kind));
                }
            }
        }
        b"brk" => {
            let node = XmlElement::from_start(e)?;
            let Some(id) = node.attribute_i64("id") else {
                return Ok(());
            };
            let applied = match breaks {
                Breaks::Rows if (1..=MAX_ROWS as i64).contains(&id) => {
                    sheet.row_mut(id as u32).map(|r| r.page_break = true)
                }
                Breaks::Columns if (1..=MAX_COLS as i64).contains(&id) => {
                    let col = id as u16;
                    sheet.update_columns(col, col, |r| r.page_break = true)
                }
                _ => {
                    log::debug!("ignoring page break {}", id);
                    Ok(())
                }
            };
            if let Err(err) = applied {
                log::warn!("skipping page break {}: {}", id, err);
            }
        }
        _ => {}
    }
    Ok(())
}

fn read_row(e: &BytesStart<'_>, sheet: &mut Worksheet, position: &mut Position) -> XlsxResult<()> {
    let node = XmlElement::from_start(e)?;
    let row = match node.attribute_parsed::<u32>("r") {
        Some(r) => r,
        None => position.row + 1,
    };
    position.row = row;
    position.col = 0;

    let record = row_record_from_node(&node);
    if record.has_custom_settings() {
        *sheet.row_mut(row)? = record;
    }
    Ok(())
}

fn read_cell(
    node: &XmlElement,
    sheet: &mut Worksheet,
    position: &mut Position,
    strings: &[u32],
) -> XlsxResult<()> {
    let (row, col) = match node.attribute("r") {
        Some(reference) => {
            let addr = CellAddress::parse(reference).map_err(|e| {
                XlsxError::Parse(format!("Invalid cell reference '{}': {}", reference, e))
            })?;
            (addr.row, addr.col)
        }
        None if position.row > 0 => (position.row, position.col.saturating_add(1)),
        None => return Err(XlsxError::Parse("cell without reference outside a row".into())),
    };
    position.row = row;
    position.col = col;

    let kind = node.attribute("t");
    let raw = match kind {
        Some("inlineStr") => node.child("is").map(rich_text),
        _ => node.child("v").map(|v| v.text().to_string()),
    };

    let value = match node.child("f").map(XmlElement::text) {
        Some(formula) if !formula.is_empty() => {
            let cached = raw
                .as_deref()
                .and_then(|v| cell_value(kind, v, strings).ok())
                .filter(|v| !v.is_empty());
            CellValue::Formula {
                text: formula.strip_prefix('=').unwrap_or(formula).to_string(),
                cached: cached.map(Box::new),
            }
        }
        _ => match raw.as_deref() {
            Some(v) => cell_value(kind, v, strings)?,
            None => CellValue::Empty,
        },
    };

    if !value.is_empty() {
        sheet.set_cell_value_at(row, col, value)?;
    }
    if let Some(style) = node.attribute_parsed::<u32>("s").filter(|&s| s != 0) {
        sheet.set_cell_style_index_at(row, col, style)?;
    }
    Ok(())
}

fn cell_value(kind: Option<&str>, raw: &str, strings: &[u32]) -> XlsxResult<CellValue> {
    Ok(match kind {
        Some("s") => {
            let idx: usize = raw
                .trim()
                .parse()
                .map_err(|_| XlsxError::Parse(format!("Invalid shared string index: {}", raw)))?;
            let pooled = strings.get(idx).ok_or_else(|| {
                XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
            })?;
            CellValue::SharedStringRef(*pooled)
        }
        Some("b") => CellValue::Boolean(raw == "1" || raw.eq_ignore_ascii_case("true")),
        Some("e") => CellError::parse(raw)
            .map(CellValue::Error)
            .unwrap_or_else(|| CellValue::text(raw)),
        Some("inlineStr") => CellValue::text(raw),
        Some("str") => CellValue::text(decode_excel_escapes(raw)),
        None | Some("n") => match raw.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::text(raw),
        },
        Some(_) => CellValue::text(raw),
    })
}

/// Where string cells go when a sheet is written
pub(crate) enum SheetStrings<'a> {
    /// Into the shared string table; the pool starts as a copy of the
    /// workbook's so existing references stay valid
    Shared(&'a mut StringPool),
    /// Inline, resolving references against the workbook pool
    Inline(&'a StringPool),
}

impl SheetStrings<'_> {
    fn resolve(&self, index: u32) -> Option<&str> {
        let pool: &StringPool = match self {
            SheetStrings::Shared(pool) => &**pool,
            SheetStrings::Inline(pool) => *pool,
        };
        pool.get(index).map(|s| s.as_str())
    }

    fn string_cell(&mut self, cell: &mut XmlElement, text: &str) {
        match self {
            SheetStrings::Shared(pool) => {
                let index = pool.intern(text);
                cell.set_attribute("t", "s");
                cell.push_child(XmlElement::new("v").with_text(index.to_string()));
            }
            SheetStrings::Inline(_) => inline_string(cell, text),
        }
    }
}

fn inline_string(cell: &mut XmlElement, text: &str) {
    cell.set_attribute("t", "inlineStr");
    cell.push_child(XmlElement::new("is").with_child(text_element(text)));
}

/// Serialize a worksheet
pub(crate) fn write_worksheet(
    sheet: &Worksheet,
    compress_columns: bool,
    strings: &mut SheetStrings<'_>,
) -> String {
    let mut content = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{}" xmlns:r="{}">"#,
        NS_MAIN, NS_RELATIONSHIPS
    );

    let dimension = sheet
        .used_range()
        .map_or_else(|| "A1".to_string(), |r| r.to_a1_string());
    XmlElement::new("dimension")
        .with_attribute("ref", dimension)
        .write_to(&mut content);

    let mut view = XmlElement::new("sheetView");
    view.set_flag("tabSelected", sheet.is_selected());
    view.set_attribute("workbookViewId", 0);
    XmlElement::new("sheetViews")
        .with_child(view)
        .write_to(&mut content);

    XmlElement::new("sheetFormatPr")
        .with_attribute("defaultColWidth", sheet.default_column_width())
        .with_attribute("defaultRowHeight", sheet.default_row_height())
        .write_to(&mut content);

    write_columns(sheet, compress_columns, &mut content);
    write_sheet_data(sheet, strings, &mut content);

    if !sheet.protected_ranges().is_empty() {
        let mut list = XmlElement::new("protectedRanges");
        for range in sheet.protected_ranges() {
            list.push_child(
                XmlElement::new("protectedRange")
                    .with_attribute("sqref", range.ranges.to_sqref())
                    .with_attribute("name", &range.name),
            );
        }
        list.write_to(&mut content);
    }

    let merged = sheet.merged_regions();
    if !merged.is_empty() {
        let mut list = XmlElement::new("mergeCells").with_attribute("count", merged.len());
        for range in merged {
            list.push_child(XmlElement::new("mergeCell").with_attribute("ref", range.to_a1_string()));
        }
        list.write_to(&mut content);
    }

    write_page_breaks(sheet, &mut content);

    if !sheet.ignored_errors().is_empty() {
        let mut list = XmlElement::new("ignoredErrors");
        for ignored in sheet.ignored_errors() {
            list.push_child(
                XmlElement::new("ignoredError")
                    .with_attribute("sqref", ignored.ranges.to_sqref())
                    .with_attribute(ignored.kind.as_str(), 1),
            );
        }
        list.write_to(&mut content);
    }

    content.push_str("</worksheet>");
    content
}

fn write_columns(sheet: &Worksheet, compress: bool, content: &mut String) {
    if sheet.columns().is_empty() {
        return;
    }
    let records = if compress {
        sheet.columns().compressed()
    } else {
        sheet.columns().iter().cloned().collect()
    };
    let mut cols = XmlElement::new("cols");
    for record in &records {
        let mut col = XmlElement::new("col");
        write_column_record(&mut col, record);
        cols.push_child(col);
    }
    cols.write_to(content);
}

/// `<sheetData>`: row records and cells merged row by row
fn write_sheet_data(sheet: &Worksheet, strings: &mut SheetStrings<'_>, content: &mut String) {
    let mut records = sheet.rows().iter().peekable();
    let mut cells = sheet.iter_cells().peekable();

    content.push_str("<sheetData>");
    loop {
        let row = match (records.peek(), cells.peek()) {
            (Some(&(r, _)), Some(&(c, _, _))) => r.min(c),
            (Some(&(r, _)), None) => r,
            (None, Some(&(c, _, _))) => c,
            (None, None) => break,
        };

        let mut element = XmlElement::new("row").with_attribute("r", row);
        if let Some((_, record)) = records.next_if(|&(r, _)| r == row) {
            write_row_record(&mut element, record);
        }
        while let Some((_, col, data)) = cells.next_if(|&(r, _, _)| r == row) {
            if let Some(cell) = cell_element(row, col, data, strings) {
                element.push_child(cell);
            }
        }
        element.write_to(content);
    }
    content.push_str("</sheetData>");
}

fn cell_element(
    row: u32,
    col: u16,
    data: &CellData,
    strings: &mut SheetStrings<'_>,
) -> Option<XmlElement> {
    let reference = CellAddress::new(row, col).to_a1_string();
    let mut cell = XmlElement::new("c").with_attribute("r", &reference);
    if data.style_index != 0 {
        cell.set_attribute("s", data.style_index);
    }

    match &data.value {
        CellValue::Empty => {}
        CellValue::Text(s) => strings.string_cell(&mut cell, s.as_str()),
        CellValue::SharedStringRef(index) => match strings {
            SheetStrings::Shared(_) => {
                cell.set_attribute("t", "s");
                cell.push_child(XmlElement::new("v").with_text(index.to_string()));
            }
            SheetStrings::Inline(pool) => match pool.get(*index) {
                Some(text) => inline_string(&mut cell, text.as_str()),
                None => {
                    log::warn!("{}: dangling shared string {}", reference, index);
                    return None;
                }
            },
        },
        CellValue::RichObjectRef(index) => {
            log::warn!("{}: rich object {} is not written", reference, index);
            if data.style_index == 0 {
                return None;
            }
        }
        CellValue::Formula { text, cached } => {
            cell.push_child(XmlElement::new("f").with_text(text.as_str()));
            if let Some(cached) = cached {
                write_cached(&mut cell, &reference, cached, strings);
            }
        }
        scalar => write_cached(&mut cell, &reference, scalar, strings),
    }
    Some(cell)
}

/// `t` and `<v>` for a plain value or a formula's cached result
fn write_cached(
    cell: &mut XmlElement,
    reference: &str,
    value: &CellValue,
    strings: &SheetStrings<'_>,
) {
    let (kind, text) = match value {
        CellValue::Number(n) if n.is_finite() => (None, n.to_string()),
        CellValue::Number(n) => {
            log::warn!("{}: writing non-finite number {} as #NUM!", reference, n);
            (Some("e"), CellError::Num.as_str().to_string())
        }
        CellValue::Boolean(b) => (Some("b"), (if *b { "1" } else { "0" }).to_string()),
        CellValue::Error(e) => (Some("e"), e.as_str().to_string()),
        CellValue::Text(s) => (Some("str"), s.as_str().to_string()),
        CellValue::SharedStringRef(index) => match strings.resolve(*index) {
            Some(text) => (Some("str"), text.to_string()),
            None => return,
        },
        _ => return,
    };
    if let Some(kind) = kind {
        cell.set_attribute("t", kind);
    }
    cell.push_child(XmlElement::new("v").with_text(text));
}

fn write_page_breaks(sheet: &Worksheet, content: &mut String) {
    let rows: Vec<u32> = sheet
        .rows()
        .iter()
        .filter(|(_, record)| record.page_break)
        .map(|(row, _)| row)
        .collect();
    if !rows.is_empty() {
        write_breaks("rowBreaks", &rows, MAX_COLS as u32 - 1, content);
    }

    let cols: Vec<u32> = sheet
        .columns()
        .iter()
        .filter(|record| record.page_break)
        .flat_map(|record| record.min as u32..=record.max as u32)
        .collect();
    if !cols.is_empty() {
        write_breaks("colBreaks", &cols, MAX_ROWS - 1, content);
    }
}

fn write_breaks(name: &str, ids: &[u32], max: u32, content: &mut String) {
    let mut list = XmlElement::new(name)
        .with_attribute("count", ids.len())
        .with_attribute("manualBreakCount", ids.len());
    for id in ids {
        list.push_child(
            XmlElement::new("brk")
                .with_attribute("id", id)
                .with_attribute("max", max)
                .with_attribute("man", 1),
        );
    }
    list.write_to(content);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetgrid_core::{ColumnRecord, RowRecord};

    fn write_inline(sheet: &Worksheet) -> String {
        let pool = StringPool::new();
        write_worksheet(sheet, true, &mut SheetStrings::Inline(&pool))
    }

    fn reload(xml: &str) -> Worksheet {
        let mut sheet = Worksheet::new("Reloaded");
        read_worksheet(xml.as_bytes(), &mut sheet, &[]).unwrap();
        sheet
    }

    #[test]
    fn test_read_cells() {
        let xml = br#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
  <row r="1">
    <c r="A1" t="s"><v>1</v></c>
    <c r="B1"><v>42.5</v></c>
    <c r="C1" t="b"><v>1</v></c>
    <c r="D1" t="e"><v>#DIV/0!</v></c>
    <c r="E1" t="inlineStr"><is><t xml:space="preserve"> inline </t></is></c>
    <c r="F1" s="3"><f>SUM(B1:B2)</f><v>84</v></c>
    <c r="G1" s="2"/>
  </row>
  <row>
    <c><v>7</v></c>
    <c t="str"><v>line_x000a_break</v></c>
  </row>
</sheetData>
</worksheet>"#;
        let mut sheet = Worksheet::new("Sheet1");
        read_worksheet(xml, &mut sheet, &[10, 11]).unwrap();

        assert_eq!(sheet.get_value_at(1, 1), CellValue::SharedStringRef(11));
        assert_eq!(sheet.get_value_at(1, 2), CellValue::Number(42.5));
        assert_eq!(sheet.get_value_at(1, 3), CellValue::Boolean(true));
        assert_eq!(sheet.get_value_at(1, 4), CellValue::Error(CellError::Div0));
        assert_eq!(sheet.get_value_at(1, 5), CellValue::text(" inline "));
        assert_eq!(
            sheet.get_value_at(1, 6),
            CellValue::Formula {
                text: "SUM(B1:B2)".into(),
                cached: Some(Box::new(CellValue::Number(84.0))),
            }
        );
        assert_eq!(sheet.cell_style_index_at(1, 6), 3);
        assert_eq!(sheet.get_value_at(1, 7), CellValue::Empty);
        assert_eq!(sheet.cell_style_index_at(1, 7), 2);
        // implicit positions continue from the previous row and cell
        assert_eq!(sheet.get_value_at(2, 1), CellValue::Number(7.0));
        assert_eq!(sheet.get_value_at(2, 2), CellValue::text("line\nbreak"));
    }

    #[test]
    fn test_shared_string_index_out_of_bounds() {
        let xml = br#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>5</v></c></row></sheetData></worksheet>"#;
        let mut sheet = Worksheet::new("Sheet1");
        let err = read_worksheet(xml, &mut sheet, &[0]).unwrap_err();
        assert!(matches!(err, XlsxError::Parse(_)));
    }

    #[test]
    fn test_read_layout_and_sidecars() {
        let xml = br#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetViews><sheetView tabSelected="1" workbookViewId="0"><selection activeCell="A1"/></sheetView></sheetViews>
<sheetFormatPr defaultRowHeight="18" defaultColWidth="10"/>
<cols>
  <col min="1" max="3" width="12" customWidth="1"/>
  <col min="2" max="4" width="99"/>
  <col min="6" max="6" hidden="1"/>
</cols>
<sheetData>
  <row r="2" ht="30" customHeight="1"/>
  <row r="3"><c r="A3"><v>1</v></c></row>
</sheetData>
<protectedRanges><protectedRange sqref="A1:B2 D4" name="Inputs"/></protectedRanges>
<mergeCells count="2"><mergeCell ref="A1:B1"/><mergeCell ref="bogus"/></mergeCells>
<rowBreaks count="1" manualBreakCount="1"><brk id="10" max="16383" man="1"/></rowBreaks>
<colBreaks count="1" manualBreakCount="1"><brk id="2" max="1048575" man="1"/></colBreaks>
<ignoredErrors><ignoredError sqref="C1:C9" numberStoredAsText="1" formula="1"/></ignoredErrors>
</worksheet>"#;
        let mut sheet = Worksheet::new("Sheet1");
        read_worksheet(xml, &mut sheet, &[]).unwrap();

        assert!(sheet.is_selected());
        assert_eq!(sheet.default_row_height(), 18.0);
        assert_eq!(sheet.default_column_width(), 10.0);

        // the overlapping record is rejected, the page break splits 1..=3
        assert_eq!(sheet.column_width(3), 12.0);
        assert_eq!(sheet.column_width(4), 10.0);
        assert!(sheet.column(2).unwrap().page_break);
        assert!(!sheet.column(1).unwrap().page_break);
        assert!(sheet.is_column_hidden(6));

        assert_eq!(sheet.row_height(2), 30.0);
        assert_eq!(sheet.row(3), None);
        assert!(sheet.row(10).unwrap().page_break);

        assert_eq!(sheet.merged_regions().len(), 1);
        assert_eq!(sheet.protected_ranges()[0].name, "Inputs");
        assert_eq!(sheet.protected_ranges()[0].ranges.areas().len(), 2);
        let kinds: Vec<_> = sheet.ignored_errors().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![IgnoredErrorKind::NumberStoredAsText, IgnoredErrorKind::Formula]
        );
    }

    #[test]
    fn test_write_sheet_data_merges_rows_and_cells() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 1.5).unwrap();
        sheet.set_cell_value("B3", "x & y").unwrap();
        sheet.set_row_height(2, 25.0).unwrap();
        sheet.set_row_height(3, 40.0).unwrap();

        let xml = write_inline(&sheet);
        assert!(xml.contains(r#"<dimension ref="A1:B3"/>"#));
        assert!(xml.contains(
            r#"<sheetData><row r="1"><c r="A1"><v>1.5</v></c></row><row r="2" ht="25" customHeight="1"/><row r="3" ht="40" customHeight="1"><c r="B3" t="inlineStr"><is><t>x &amp; y</t></is></c></row></sheetData>"#
        ));
    }

    #[test]
    fn test_write_values() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", true).unwrap();
        sheet.set_cell_value("B1", CellError::Ref).unwrap();
        sheet.set_cell_value("C1", f64::INFINITY).unwrap();
        sheet.set_cell_formula("D1", "=A1*2").unwrap();
        sheet
            .set_formula_result(1, 4, CellValue::text("two"))
            .unwrap();
        sheet.set_cell_style_index_at(1, 5, 7).unwrap();

        let mut pool = StringPool::new();
        let xml = write_worksheet(&sheet, true, &mut SheetStrings::Shared(&mut pool));
        assert!(xml.contains(r#"<c r="A1" t="b"><v>1</v></c>"#));
        assert!(xml.contains(r##"<c r="B1" t="e"><v>#REF!</v></c>"##));
        assert!(xml.contains(r##"<c r="C1" t="e"><v>#NUM!</v></c>"##));
        assert!(xml.contains(r#"<c r="D1" t="str"><f>A1*2</f><v>two</v></c>"#));
        assert!(xml.contains(r#"<c r="E1" s="7"/>"#));
        // cached formula text stays out of the shared table
        assert!(pool.is_empty());
    }

    #[test]
    fn test_shared_strings_mode() {
        let mut pool = StringPool::new();
        pool.intern("existing");
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", "fresh").unwrap();
        sheet
            .set_cell_value_at(2, 1, CellValue::SharedStringRef(0))
            .unwrap();

        let mut out = pool.clone();
        let xml = write_worksheet(&sheet, true, &mut SheetStrings::Shared(&mut out));
        assert!(xml.contains(r#"<c r="A1" t="s"><v>1</v></c>"#));
        assert!(xml.contains(r#"<c r="A2" t="s"><v>0</v></c>"#));
        assert_eq!(out.len(), 2);

        let xml = write_worksheet(&sheet, true, &mut SheetStrings::Inline(&pool));
        assert!(xml.contains(r#"<c r="A2" t="inlineStr"><is><t>existing</t></is></c>"#));
    }

    #[test]
    fn test_columns_compressed_on_write() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.add_column_record(ColumnRecord::new(1, 2).with_width(15.0)).unwrap();
        sheet.add_column_record(ColumnRecord::new(3, 5).with_width(15.0)).unwrap();
        sheet.add_column_record(ColumnRecord::new(6, 6).with_hidden(true)).unwrap();

        let xml = write_inline(&sheet);
        assert!(xml.contains(
            r#"<cols><col min="1" max="5" width="15" customWidth="1"/><col min="6" max="6" hidden="1"/></cols>"#
        ));

        let pool = StringPool::new();
        let xml = write_worksheet(&sheet, false, &mut SheetStrings::Inline(&pool));
        assert!(xml.contains(r#"<col min="1" max="2" width="15" customWidth="1"/>"#));
        assert!(xml.contains(r#"<col min="3" max="5" width="15" customWidth="1"/>"#));
    }

    #[test]
    fn test_layout_roundtrip() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_selected(true);
        sheet.set_default_row_height(20.0).unwrap();
        sheet.update_columns(3, 8, |r| r.width = Some(20.0)).unwrap();
        sheet.update_columns(5, 5, |r| r.page_break = true).unwrap();
        *sheet.row_mut(4).unwrap() = RowRecord {
            hidden: true,
            outline_level: 1,
            style_index: Some(2),
            ..RowRecord::default()
        };
        sheet.row_mut(9).unwrap().page_break = true;
        sheet.merge_cells(&CellRange::parse("B2:C3").unwrap()).unwrap();
        sheet.add_protected_range(ProtectedRange::new(
            "Edit",
            RangeAddress::parse("A1:A5").unwrap(),
        ));
        sheet.add_ignored_error(IgnoredError::new(
            RangeAddress::parse("D1:D3 F1").unwrap(),
            IgnoredErrorKind::EvalError,
        ));

        let xml = write_inline(&sheet);
        assert!(xml.contains(
            r#"<rowBreaks count="1" manualBreakCount="1"><brk id="9" max="16383" man="1"/></rowBreaks>"#
        ));
        assert!(xml.contains(r#"<brk id="5" max="1048575" man="1"/>"#));

        let reloaded = reload(&xml);
        assert!(reloaded.is_selected());
        assert_eq!(reloaded.default_row_height(), 20.0);
        let columns: Vec<_> = reloaded.columns().iter().cloned().collect();
        let original: Vec<_> = sheet.columns().iter().cloned().collect();
        assert_eq!(columns, original);
        assert_eq!(reloaded.row(4), sheet.row(4));
        assert!(reloaded.row(9).unwrap().page_break);
        assert_eq!(reloaded.merged_regions(), sheet.merged_regions());
        assert_eq!(reloaded.protected_ranges(), sheet.protected_ranges());
        assert_eq!(reloaded.ignored_errors(), sheet.ignored_errors());
    }
}
