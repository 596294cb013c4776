//! Package relationships (`_rels/*.rels`) and content types

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::XlsxResult;
use crate::node::{NodeAccessor, XmlElement};

pub(crate) const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub(crate) const NS_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PACKAGE_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub(crate) const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub(crate) const REL_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
pub(crate) const REL_COMMENTS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";

pub(crate) const CT_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
pub(crate) const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
pub(crate) const CT_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
pub(crate) const CT_SHARED_STRINGS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
pub(crate) const CT_COMMENTS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.comments+xml";

/// One `<Relationship>` entry
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

impl Relationship {
    pub fn new(id: impl Into<String>, rel_type: &str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rel_type: rel_type.to_string(),
            target: target.into(),
        }
    }

    /// Whether the type URI ends with the given short name (`worksheet`)
    ///
    /// Strict-conformance packages use a different URI prefix, so only the
    /// last path segment is compared.
    pub fn is(&self, rel_type: &str) -> bool {
        let short = rel_type.rsplit('/').next().unwrap_or(rel_type);
        self.rel_type.rsplit('/').next() == Some(short)
    }
}

/// Relationship part that belongs to `part`
///
/// `xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`
pub(crate) fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Part name a relationship target points at, relative to its source part
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

pub(crate) fn read_relationships(xml: &[u8]) -> XlsxResult<Vec<Relationship>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut rels = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"Relationship" => {
                let node = XmlElement::from_start(&e)?;
                // External targets (hyperlinks) carry no part
                let external = node.attribute("TargetMode") == Some("External");
                match (
                    node.attribute("Id"),
                    node.attribute("Type"),
                    node.attribute("Target"),
                ) {
                    _ if external => {}
                    (Some(id), Some(rel_type), Some(target)) => {
                        rels.push(Relationship::new(id, rel_type, target))
                    }
                    _ => log::warn!("skipping incomplete relationship {:?}", node),
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

pub(crate) fn write_relationships(rels: &[Relationship]) -> String {
    let mut content = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">"#,
        NS_PACKAGE_RELATIONSHIPS
    );
    for rel in rels {
        XmlElement::new("Relationship")
            .with_attribute("Id", &rel.id)
            .with_attribute("Type", &rel.rel_type)
            .with_attribute("Target", &rel.target)
            .write_to(&mut content);
    }
    content.push_str("</Relationships>");
    content
}

/// `[Content_Types].xml` with an override per part
pub(crate) fn write_content_types(overrides: &[(String, &str)]) -> String {
    let mut content = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="{}"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>"#,
        NS_CONTENT_TYPES
    );
    for (part, content_type) in overrides {
        XmlElement::new("Override")
            .with_attribute("PartName", format!("/{}", part))
            .with_attribute("ContentType", content_type)
            .write_to(&mut content);
    }
    content.push_str("</Types>");
    content
}
