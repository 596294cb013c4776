//! Comments part (`xl/commentsN.xml`)

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::XlsxResult;
use crate::node::{NodeAccessor, XmlElement};
use crate::relationships::NS_MAIN;
use crate::shared_strings::{decode_excel_escapes, text_element};
use sheetgrid_core::{CellAddress, CellComment, Worksheet};

/// Attach the comments of a comments part to `sheet`
pub(crate) fn read_comments(xml: &[u8], sheet: &mut Worksheet) -> XlsxResult<()> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut authors: Vec<String> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"author" => {
                let node = XmlElement::read_subtree(&mut reader, &e)?;
                authors.push(node.text().to_string());
            }
            Event::Empty(e) if e.name().as_ref() == b"author" => authors.push(String::new()),
            Event::Start(e) if e.name().as_ref() == b"comment" => {
                let node = XmlElement::read_subtree(&mut reader, &e)?;
                attach_comment(&node, &authors, sheet);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn attach_comment(node: &XmlElement, authors: &[String], sheet: &mut Worksheet) {
    let Some(reference) = node.attribute("ref") else {
        log::warn!("skipping comment without ref");
        return;
    };
    let address = match CellAddress::parse(reference) {
        Ok(address) => address,
        Err(e) => {
            log::warn!("skipping comment at '{}': {}", reference, e);
            return;
        }
    };
    let author = node
        .attribute_parsed::<usize>("authorId")
        .and_then(|i| authors.get(i))
        .cloned()
        .unwrap_or_default();
    let text = decode_excel_escapes(&node.descendant_text("t")).into_owned();

    if let Err(e) = sheet.set_comment_at(address.row, address.col, CellComment::new(author, text)) {
        log::warn!("skipping comment at '{}': {}", reference, e);
    }
}

/// Serialize the comments of a sheet, `None` when it has none
pub(crate) fn write_comments(sheet: &Worksheet) -> Option<String> {
    if sheet.comment_count() == 0 {
        return None;
    }

    let mut authors: Vec<&str> = sheet.comment_authors().iter().map(String::as_str).collect();
    if sheet.comments().any(|(_, _, c)| !c.has_author()) {
        authors.push("");
    }

    let mut content = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<comments xmlns="{}">"#,
        NS_MAIN
    );

    let mut author_list = XmlElement::new("authors");
    for author in &authors {
        author_list.push_child(XmlElement::new("author").with_text(*author));
    }
    author_list.write_to(&mut content);

    content.push_str("<commentList>");
    for (row, col, comment) in sheet.comments() {
        let author_id = authors
            .iter()
            .position(|a| *a == comment.author)
            .unwrap_or(0);
        XmlElement::new("comment")
            .with_attribute("ref", CellAddress::new(row, col).to_a1_string())
            .with_attribute("authorId", author_id)
            .with_child(XmlElement::new("text").with_child(text_element(&comment.text)))
            .write_to(&mut content);
    }
    content.push_str("</commentList></comments>");

    Some(content)
}
