//! Attribute-level access to XML elements
//!
//! Row and column records are persisted as attributes on `<row>` and `<col>`
//! elements. [`NodeAccessor`] is the small typed get/set surface that mapping
//! depends on; [`XmlElement`] is the owned element tree that implements it.

use std::io::BufRead;
use std::str::FromStr;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use sheetgrid_core::{ColumnRecord, RowRecord, MAX_OUTLINE_LEVEL};

/// Typed attribute access on an XML element
///
/// Malformed values read as `None` and are logged at `warn` level; the
/// document keeps loading.
pub trait NodeAccessor {
    /// Element name, used in diagnostics
    fn node_name(&self) -> &str;

    /// Raw attribute value
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Set (or replace) an attribute
    fn set_attribute<V: ToString>(&mut self, name: &str, value: V);

    /// Remove an attribute, returning its old value
    fn remove_attribute(&mut self, name: &str) -> Option<String>;

    /// Integer attribute
    fn attribute_i64(&self, name: &str) -> Option<i64> {
        self.attribute_parsed(name)
    }

    /// Floating point attribute
    fn attribute_f64(&self, name: &str) -> Option<f64> {
        self.attribute_parsed(name)
    }

    /// Boolean attribute (`1`/`0`/`true`/`false`)
    fn attribute_bool(&self, name: &str) -> Option<bool> {
        match self.attribute(name)? {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            other => {
                log::warn!(
                    "ignoring malformed boolean {}@{}=\"{}\"",
                    self.node_name(),
                    name,
                    other
                );
                None
            }
        }
    }

    /// Boolean attribute, absent meaning `false`
    fn flag(&self, name: &str) -> bool {
        self.attribute_bool(name).unwrap_or(false)
    }

    /// Write `name="1"` when `value` is set, drop the attribute otherwise
    fn set_flag(&mut self, name: &str, value: bool) {
        if value {
            self.set_attribute(name, "1");
        } else {
            self.remove_attribute(name);
        }
    }

    /// Attribute parsed with [`FromStr`]
    fn attribute_parsed<T>(&self, name: &str) -> Option<T>
    where
        T: FromStr,
    {
        let raw = self.attribute(name)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!(
                    "ignoring malformed {}@{}=\"{}\"",
                    self.node_name(),
                    name,
                    raw
                );
                None
            }
        }
    }
}

/// Owned XML element: name, ordered attributes, text and children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    /// Create an element without attributes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder form of [`NodeAccessor::set_attribute`]
    pub fn with_attribute<V: ToString>(mut self, name: &str, value: V) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder form of [`XmlElement::set_text`]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder form of [`XmlElement::push_child`]
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Element name (with any namespace prefix)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in document order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Direct text content
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the direct text content
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Child elements
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// Append a child element
    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Concatenated text of every descendant named `name`, in document order
    ///
    /// Rich text splits a string into `<r><t>..</t></r>` runs; this joins them.
    pub fn descendant_text(&self, name: &str) -> String {
        let mut out = String::new();
        self.collect_text(name, &mut out);
        out
    }

    fn collect_text(&self, name: &str, out: &mut String) {
        for child in &self.children {
            if child.name == name {
                out.push_str(&child.text);
            }
            child.collect_text(name, out);
        }
    }

    /// Element (without children) from a start or empty tag
    pub fn from_start(start: &BytesStart<'_>) -> XlsxResult<Self> {
        let mut element = Self::new(String::from_utf8_lossy(start.name().as_ref()));
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    /// Read the element opened by `start` and everything up to its end tag
    pub fn read_subtree<R: BufRead>(
        reader: &mut Reader<R>,
        start: &BytesStart<'_>,
    ) -> XlsxResult<Self> {
        let mut stack = vec![Self::from_start(start)?];
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => stack.push(Self::from_start(&e)?),
                Event::Empty(e) => {
                    let child = Self::from_start(&e)?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(child);
                    }
                }
                Event::Text(t) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&t.unescape()?);
                    }
                }
                Event::CData(c) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&c));
                    }
                }
                Event::End(_) => {
                    let done = stack
                        .pop()
                        .ok_or_else(|| XlsxError::Parse("unbalanced end tag".into()))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(done),
                        None => return Ok(done),
                    }
                }
                Event::Eof => {
                    let name = stack.first().map(|e| e.name.clone()).unwrap_or_default();
                    return Err(XlsxError::Parse(format!(
                        "document ended inside <{}>",
                        name
                    )));
                }
                _ => {}
            }
            buf.clear();
        }
    }

    /// Serialize the element and its children
    pub fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.text.is_empty() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        out.push_str(&escape(self.text.as_str()));
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    /// Serialize to a new string
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }
}

impl NodeAccessor for XmlElement {
    fn node_name(&self) -> &str {
        &self.name
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attribute<V: ToString>(&mut self, name: &str, value: V) {
        let value = value.to_string();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(pos).1)
    }
}

fn outline_level<N: NodeAccessor>(node: &N) -> u8 {
    let Some(level) = node.attribute_i64("outlineLevel") else {
        return 0;
    };
    if !(0..=MAX_OUTLINE_LEVEL as i64).contains(&level) {
        log::warn!(
            "clamping {}@outlineLevel={} to 0..={}",
            node.node_name(),
            level,
            MAX_OUTLINE_LEVEL
        );
    }
    level.clamp(0, MAX_OUTLINE_LEVEL as i64) as u8
}

fn style_index<N: NodeAccessor>(node: &N, name: &str) -> Option<u32> {
    node.attribute_parsed::<u32>(name)
}

/// Row attributes of a `<row>` element
///
/// The row number (`r`) and page breaks are handled by the caller; merge ids
/// are in-memory only and read back as `None`.
pub fn row_record_from_node<N: NodeAccessor>(node: &N) -> RowRecord {
    RowRecord {
        height: node.attribute_f64("ht"),
        hidden: node.flag("hidden"),
        collapsed: node.flag("collapsed"),
        outline_level: outline_level(node),
        page_break: false,
        phonetic: node.flag("ph"),
        custom_height: node.flag("customHeight"),
        merge_id: None,
        // Excel only honours a row style when customFormat is set
        style_index: if node.flag("customFormat") {
            style_index(node, "s")
        } else {
            None
        },
    }
}

/// Write the attributes of a row record onto a `<row>` element
pub fn write_row_record<N: NodeAccessor>(node: &mut N, record: &RowRecord) {
    match record.style_index {
        Some(s) => {
            node.set_attribute("s", s);
            node.set_flag("customFormat", true);
        }
        None => {
            node.remove_attribute("s");
            node.remove_attribute("customFormat");
        }
    }
    match record.height {
        Some(ht) => node.set_attribute("ht", ht),
        None => {
            node.remove_attribute("ht");
        }
    }
    node.set_flag("hidden", record.hidden);
    node.set_flag("customHeight", record.custom_height);
    if record.outline_level > 0 {
        node.set_attribute("outlineLevel", record.outline_level);
    } else {
        node.remove_attribute("outlineLevel");
    }
    node.set_flag("collapsed", record.collapsed);
    node.set_flag("ph", record.phonetic);
}

/// Column record of a `<col>` element
pub fn column_record_from_node<N: NodeAccessor>(node: &N) -> XlsxResult<ColumnRecord> {
    let bound = |name: &str| {
        node.attribute_parsed::<u16>(name).ok_or_else(|| {
            XlsxError::Parse(format!("<{}> without a valid {}", node.node_name(), name))
        })
    };
    let min = bound("min")?;
    let max = bound("max")?;
    Ok(ColumnRecord {
        min,
        max,
        width: node.attribute_f64("width"),
        hidden: node.flag("hidden"),
        best_fit: node.flag("bestFit"),
        collapsed: node.flag("collapsed"),
        outline_level: outline_level(node),
        style_index: style_index(node, "style"),
        page_break: false,
        phonetic: node.flag("phonetic"),
    })
}

/// Write a column record onto a `<col>` element
pub fn write_column_record<N: NodeAccessor>(node: &mut N, record: &ColumnRecord) {
    node.set_attribute("min", record.min);
    node.set_attribute("max", record.max);
    match record.width {
        Some(width) => {
            node.set_attribute("width", width);
            node.set_flag("customWidth", true);
        }
        None => {
            node.remove_attribute("width");
            node.remove_attribute("customWidth");
        }
    }
    match record.style_index {
        Some(s) => node.set_attribute("style", s),
        None => {
            node.remove_attribute("style");
        }
    }
    node.set_flag("hidden", record.hidden);
    node.set_flag("bestFit", record.best_fit);
    if record.outline_level > 0 {
        node.set_attribute("outlineLevel", record.outline_level);
    } else {
        node.remove_attribute("outlineLevel");
    }
    node.set_flag("collapsed", record.collapsed);
    node.set_flag("phonetic", record.phonetic);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(xml: &str) -> XmlElement {
        let mut reader = Reader::from_reader(xml.as_bytes());
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Start(e) => {
                    let start = e.into_owned();
                    return XmlElement::read_subtree(&mut reader, &start).unwrap();
                }
                Event::Empty(e) => return XmlElement::from_start(&e).unwrap(),
                Event::Eof => panic!("no element"),
                _ => {}
            }
            buf.clear();
        }
    }

    #[test]
    fn test_typed_attributes() {
        let node = parse(r#"<row r="7" ht="22.5" hidden="1" collapsed="false" ph="yes"/>"#);
        assert_eq!(node.attribute_i64("r"), Some(7));
        assert_eq!(node.attribute_f64("ht"), Some(22.5));
        assert_eq!(node.attribute_bool("hidden"), Some(true));
        assert_eq!(node.attribute_bool("collapsed"), Some(false));
        // malformed values read as absent
        assert_eq!(node.attribute_bool("ph"), None);
        assert_eq!(node.attribute_i64("ht"), None);
        assert_eq!(node.attribute("missing"), None);
    }

    #[test]
    fn test_set_and_remove() {
        let mut node = XmlElement::new("col").with_attribute("min", 1);
        node.set_attribute("min", 3);
        node.set_flag("hidden", true);
        assert_eq!(node.to_xml(), r#"<col min="3" hidden="1"/>"#);
        assert_eq!(node.remove_attribute("hidden"), Some("1".to_string()));
        node.set_flag("hidden", false);
        assert_eq!(node.to_xml(), r#"<col min="3"/>"#);
    }

    #[test]
    fn test_subtree_and_escaping() {
        let node = parse(
            r#"<comment ref="B2"><text><r><t>a &amp; </t></r><r><t>b</t></r></text></comment>"#,
        );
        assert_eq!(node.attribute("ref"), Some("B2"));
        assert_eq!(node.descendant_text("t"), "a & b");

        let out = XmlElement::new("t")
            .with_attribute("v", "\"<x>\"")
            .with_text("1 < 2")
            .to_xml();
        assert_eq!(out, r#"<t v="&quot;&lt;x&gt;&quot;">1 &lt; 2</t>"#);
    }

    #[test]
    fn test_row_record_mapping() {
        let record = RowRecord {
            height: Some(30.0),
            custom_height: true,
            hidden: true,
            outline_level: 2,
            collapsed: true,
            style_index: Some(4),
            ..RowRecord::default()
        };
        let mut node = XmlElement::new("row").with_attribute("r", 5);
        write_row_record(&mut node, &record);
        assert_eq!(
            node.to_xml(),
            r#"<row r="5" s="4" customFormat="1" ht="30" hidden="1" customHeight="1" outlineLevel="2" collapsed="1"/>"#
        );
        assert_eq!(row_record_from_node(&node), record);
    }

    #[test]
    fn test_row_style_needs_custom_format() {
        let node = parse(r#"<row r="1" s="3"/>"#);
        assert_eq!(row_record_from_node(&node).style_index, None);
    }

    #[test]
    fn test_column_record_mapping() {
        let record = ColumnRecord::new(3, 8).with_width(20.0);
        let mut node = XmlElement::new("col");
        write_column_record(&mut node, &record);
        assert_eq!(
            node.to_xml(),
            r#"<col min="3" max="8" width="20" customWidth="1"/>"#
        );
        assert_eq!(column_record_from_node(&node).unwrap(), record);
    }

    #[test]
    fn test_column_outline_clamped_and_bounds_required() {
        let node = parse(r#"<col min="1" max="2" outlineLevel="12"/>"#);
        assert_eq!(column_record_from_node(&node).unwrap().outline_level, 7);

        let node = parse(r#"<col max="2"/>"#);
        assert!(column_record_from_node(&node).is_err());
    }
}
