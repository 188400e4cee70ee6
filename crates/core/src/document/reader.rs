use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Result, RosterError};

use super::node::Element;

/// Parse an XML string into an element tree rooted at the document element.
pub fn parse_xml(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut next_id = 0usize;
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| xml_error(reader.buffer_position() as u64, err))?;
        match event {
            Event::Start(start) => {
                let element = open_element(&start, &mut next_id)
                    .map_err(|err| xml_error(reader.buffer_position() as u64, err))?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&start, &mut next_id)
                    .map_err(|err| xml_error(reader.buffer_position() as u64, err))?;
                close_element(element, &mut stack, &mut root);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    close_element(element, &mut stack, &mut root);
                }
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(|err| xml_error(reader.buffer_position() as u64, err))?;
                if let Some(current) = stack.last_mut() {
                    current.push_text(&value);
                }
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                if let Some(current) = stack.last_mut() {
                    current.push_text(&String::from_utf8_lossy(&bytes));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(RosterError::Xml {
            position: reader.buffer_position() as u64,
            message: format!("unclosed element <{}>", stack[stack.len() - 1].name()),
        });
    }

    root.ok_or_else(|| RosterError::Xml {
        position: 0,
        message: "document has no root element".to_string(),
    })
}

fn open_element(
    start: &BytesStart<'_>,
    next_id: &mut usize,
) -> std::result::Result<Element, quick_xml::Error> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(*next_id, name);
    *next_id += 1;

    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?;
        element.push_attribute(key, value.into_owned());
    }
    Ok(element)
}

fn close_element(element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.push_child(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn xml_error(position: u64, err: impl std::fmt::Display) -> RosterError {
    RosterError::Xml {
        position,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_tree_with_attributes_and_text() -> Result<()> {
        let root = parse_xml(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<roster name="Test &amp; Co" gameSystemName="Warhammer 40,000 10th Edition">
  <costs><cost name="pts" value="85.0"/></costs>
  <rules><rule name="Oath"><description>Re-roll &quot;hits&quot;.</description></rule></rules>
</roster>"#,
        )?;

        assert_eq!(root.name(), "roster");
        assert_eq!(root.attr("name"), Some("Test & Co"));
        let cost = root.grouped("costs", "cost").next().expect("cost element");
        assert_eq!(cost.attr("value"), Some("85.0"));
        let description = root
            .find_first("description")
            .expect("description element");
        assert_eq!(description.text(), "Re-roll \"hits\".");
        Ok(())
    }

    #[test]
    fn ids_follow_document_order() -> Result<()> {
        let root = parse_xml("<a><b/><c><d/></c></a>")?;
        let ids: Vec<_> = std::iter::once(root.id())
            .chain(root.children().map(Element::id))
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(root.find_first("d").map(Element::id), Some(3));
        Ok(())
    }

    #[test]
    fn keeps_cdata_content() -> Result<()> {
        let root = parse_xml("<description><![CDATA[5+ <invulnerable>]]></description>")?;
        assert_eq!(root.text(), "5+ <invulnerable>");
        Ok(())
    }

    #[test]
    fn rejects_malformed_xml() {
        let result = parse_xml("<roster><forces></roster>");
        assert!(matches!(result, Err(RosterError::Xml { .. })));
    }
}
