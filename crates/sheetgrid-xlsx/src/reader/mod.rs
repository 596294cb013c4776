//! XLSX reader

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::comments::read_comments;
use crate::error::{XlsxError, XlsxResult};
use crate::node::{NodeAccessor, XmlElement};
use crate::package::{PackageStore, ZipPackage};
use crate::relationships::{
    read_relationships, rels_path_for, resolve_target, Relationship, REL_COMMENTS,
    REL_OFFICE_DOCUMENT, REL_SHARED_STRINGS, REL_WORKSHEET,
};
use crate::shared_strings::read_shared_strings;
use crate::sheet::read_worksheet;
use sheetgrid_core::{Workbook, WorkbookSettings};

const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// A `<sheet>` entry of `workbook.xml`
#[derive(Debug)]
struct SheetEntry {
    name: String,
    rel_id: String,
    visible: bool,
}

/// Workbook-level facts from `workbook.xml`
#[derive(Debug, Default)]
struct WorkbookInfo {
    sheets: Vec<SheetEntry>,
    date_1904: bool,
    active_tab: usize,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut package = ZipPackage::open(reader)?;
        Self::read_package(&mut package)
    }

    /// Read a workbook from any package store
    pub fn read_package<P: PackageStore>(package: &mut P) -> XlsxResult<Workbook> {
        // Verify this is an XLSX file
        if !package.has_part("[Content_Types].xml") {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let workbook_part = Self::workbook_part(package)?;
        let info = Self::read_workbook_xml(&require(package, &workbook_part)?)?;
        let rels = read_relationships(&require(package, &rels_path_for(&workbook_part))?)?;

        let mut workbook = Workbook::empty_with_settings(WorkbookSettings {
            date_1904: info.date_1904,
            ..WorkbookSettings::default()
        });

        // Shared strings land in the workbook pool; cells refer to pool indices
        let strings = match rels.iter().find(|r| r.is(REL_SHARED_STRINGS)) {
            Some(rel) => {
                let part = resolve_target(&workbook_part, &rel.target);
                match package.read_part(&part)? {
                    Some(xml) => read_shared_strings(&xml, workbook.shared_strings_mut())?,
                    None => {
                        log::warn!("shared string table {} is missing", part);
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        for entry in &info.sheets {
            let Some(rel) = rels.iter().find(|r| r.id == entry.rel_id) else {
                log::warn!("sheet '{}' has no relationship {}", entry.name, entry.rel_id);
                continue;
            };
            if !rel.is(REL_WORKSHEET) {
                log::debug!("skipping non-worksheet sheet '{}' ({})", entry.name, rel.rel_type);
                continue;
            }
            let part = resolve_target(&workbook_part, &rel.target);
            let xml = require(package, &part)?;

            let index = workbook.add_worksheet_with_name(&entry.name)?;
            let sheet = workbook
                .worksheet_mut(index)
                .ok_or_else(|| XlsxError::InvalidFormat(format!("sheet {} vanished", index)))?;
            sheet.set_visible(entry.visible);
            read_worksheet(&xml, sheet, &strings)?;

            // Read comments for this worksheet (if present)
            if let Some(sheet_rels) = package.read_part(&rels_path_for(&part))? {
                for rel in read_relationships(&sheet_rels)?
                    .iter()
                    .filter(|r| r.is(REL_COMMENTS))
                {
                    let comments_part = resolve_target(&part, &rel.target);
                    match package.read_part(&comments_part)? {
                        Some(xml) => read_comments(&xml, sheet)?,
                        None => log::warn!("comments part {} is missing", comments_part),
                    }
                }
            }
        }

        // Ensure at least one sheet exists
        if workbook.is_empty() {
            workbook.add_worksheet()?;
        }

        if info.active_tab < workbook.sheet_count() {
            workbook.set_active_sheet(info.active_tab)?;
        } else {
            log::warn!("activeTab {} out of range, keeping the first sheet", info.active_tab);
        }

        log::info!("read workbook with {} sheet(s)", workbook.sheet_count());
        Ok(workbook)
    }

    /// Main workbook part, found through the package relationships
    fn workbook_part<P: PackageStore>(package: &mut P) -> XlsxResult<String> {
        let rels = match package.read_part("_rels/.rels")? {
            Some(xml) => read_relationships(&xml)?,
            None => Vec::new(),
        };
        Ok(rels
            .iter()
            .find(|r| r.is(REL_OFFICE_DOCUMENT))
            .map(|r: &Relationship| resolve_target("", &r.target))
            .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string()))
    }

    fn read_workbook_xml(xml: &[u8]) -> XlsxResult<WorkbookInfo> {
        let mut xml_reader = Reader::from_reader(xml);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut info = WorkbookInfo::default();

        loop {
            match xml_reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) => {
                    let node = XmlElement::from_start(&e)?;
                    match node.name() {
                        "sheet" => {
                            match (node.attribute("name"), node.attribute("r:id")) {
                                (Some(name), Some(rel_id)) => info.sheets.push(SheetEntry {
                                    name: name.to_string(),
                                    rel_id: rel_id.to_string(),
                                    visible: !matches!(
                                        node.attribute("state"),
                                        Some("hidden" | "veryHidden")
                                    ),
                                }),
                                _ => log::warn!("skipping incomplete sheet entry {:?}", node),
                            }
                        }
                        "workbookPr" => info.date_1904 = node.flag("date1904"),
                        "workbookView" => {
                            info.active_tab = node.attribute_parsed("activeTab").unwrap_or(0)
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(info)
    }
}

fn require<P: PackageStore>(package: &mut P, part: &str) -> XlsxResult<Vec<u8>> {
    package
        .read_part(part)?
        .ok_or_else(|| XlsxError::MissingPart(part.to_string()))
}
