//! Shared string table (`xl/sharedStrings.xml`)

use std::borrow::Cow;
use std::fmt::Write as _;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::XlsxResult;
use crate::node::{NodeAccessor, XmlElement};
use crate::relationships::NS_MAIN;
use sheetgrid_core::StringPool;

/// Decode Excel's `_xHHHH_` escape sequences
///
/// Characters XML cannot carry (most control characters) are written this
/// way; `_x005F_` escapes a literal underscore that would otherwise start a
/// sequence. Incomplete sequences are left as they are.
pub(crate) fn decode_excel_escapes(s: &str) -> Cow<'_, str> {
    if !s.contains("_x") {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match escaped_char(tail) {
            Some(c) => {
                out.push(c);
                rest = &tail[7..];
            }
            None => {
                out.push_str("_x");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// The character encoded by a `_xHHHH_` sequence at the start of `s`
fn escaped_char(s: &str) -> Option<char> {
    let bytes = s.as_bytes();
    if !s.starts_with("_x") || bytes.len() < 7 || bytes[6] != b'_' {
        return None;
    }
    let hex = s.get(2..6)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    char::from_u32(u32::from_str_radix(hex, 16).ok()?)
}

fn needs_escape(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}'
    )
}

/// Inverse of [`decode_excel_escapes`]
pub(crate) fn encode_excel_escapes(s: &str) -> Cow<'_, str> {
    if !s.chars().any(needs_escape) && !s.contains("_x") {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for (i, c) in s.char_indices() {
        if needs_escape(c) {
            let _ = write!(out, "_x{:04X}_", c as u32);
        } else if c == '_' && escaped_char(&s[i..]).is_some() {
            out.push_str("_x005F_");
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Plain text of an `<si>` or `<is>` element
///
/// Joins the direct `<t>` and the `<t>` of each rich-text run; phonetic
/// runs (`<rPh>`) are not part of the value.
pub(crate) fn rich_text(element: &XmlElement) -> String {
    let mut out = String::new();
    for child in element.children() {
        match child.name() {
            "t" => out.push_str(child.text()),
            "r" => {
                if let Some(t) = child.child("t") {
                    out.push_str(t.text());
                }
            }
            _ => {}
        }
    }
    decode_excel_escapes(&out).into_owned()
}

/// `<t>` element for a string, preserving edge whitespace
pub(crate) fn text_element(text: &str) -> XmlElement {
    let mut t = XmlElement::new("t").with_text(encode_excel_escapes(text));
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t.set_attribute("xml:space", "preserve");
    }
    t
}

/// Load the table into `pool`
///
/// Returns, for every `<si>` in file order, the pool index it landed at.
/// Duplicates in the file collapse onto one pool entry.
pub(crate) fn read_shared_strings(xml: &[u8], pool: &mut StringPool) -> XlsxResult<Vec<u32>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut indices = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"si" => {
                let si = XmlElement::read_subtree(&mut reader, &e)?;
                indices.push(pool.intern(rich_text(&si)));
            }
            Event::Empty(e) if e.name().as_ref() == b"si" => {
                indices.push(pool.intern(""));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    log::debug!(
        "read {} shared strings ({} unique)",
        indices.len(),
        pool.len()
    );
    Ok(indices)
}

/// Serialize a pool as `sharedStrings.xml`
pub(crate) fn write_shared_strings(pool: &StringPool) -> String {
    let mut content = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="{}" count="{}" uniqueCount="{}">"#,
        NS_MAIN,
        pool.len(),
        pool.len()
    );
    for s in pool.iter() {
        XmlElement::new("si")
            .with_child(text_element(s.as_str()))
            .write_to(&mut content);
    }
    content.push_str("</sst>");
    content
}
