//! Minimal element tree over `quick_xml::Reader`.
//!
//! The backends' documents are small and their shape drifts, so the codec
//! works on a tree it can query loosely (first descendant with a tag, all
//! descendants with a tag) instead of a strict serde mapping. Attributes are
//! never used by either service and are dropped.

use std::fmt;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A document that the reader rejected or that has no single root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedXml(pub String);

impl fmt::Display for MalformedXml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed XML: {}", self.0)
    }
}

impl std::error::Error for MalformedXml {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Self {
        let local = start.local_name();
        Self {
            name: String::from_utf8_lossy(local.as_ref()).into_owned(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Concatenated text of this element and all of its descendants.
    pub fn text_content(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }

    /// First direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First descendant named `name`, in document order.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants named `name`, in document order. A match is not
    /// searched further, so nested same-named elements are not reported.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut out = Vec::new();
        self.collect(name, &mut out);
        out
    }

    fn collect<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            } else {
                child.collect(name, out);
            }
        }
    }

    /// Text of the first descendant named `name`, if any. The root itself is
    /// considered too, which matters for single-value documents.
    pub fn text_of(&self, name: &str) -> Option<String> {
        if self.name == name {
            return Some(self.text_content());
        }
        self.find(name).map(Element::text_content)
    }
}

/// Parse a whole document into its root element.
pub fn parse_document(xml: &str) -> Result<Element, MalformedXml> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if root.is_some() && stack.is_empty() {
                    return Err(MalformedXml("content after the root element".to_string()));
                }
                stack.push(Element::open(&e));
            }
            Ok(Event::Empty(e)) => {
                let element = Element::open(&e);
                close(element, &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => match stack.pop() {
                Some(element) => close(element, &mut stack, &mut root)?,
                None => return Err(MalformedXml("unexpected closing tag".to_string())),
            },
            Ok(Event::Text(e)) => {
                let raw = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                push_text(&mut stack, raw)?;
            }
            Ok(Event::CData(e)) => {
                let raw = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                push_text(&mut stack, raw)?;
            }
            Ok(Event::GeneralRef(e)) => {
                let resolved = match e.resolve_char_ref() {
                    Ok(Some(ch)) => ch.to_string(),
                    _ => {
                        let name = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                        match name {
                            "amp" => "&".to_string(),
                            "lt" => "<".to_string(),
                            "gt" => ">".to_string(),
                            "quot" => "\"".to_string(),
                            "apos" => "'".to_string(),
                            other => format!("&{other};"),
                        }
                    }
                };
                push_text(&mut stack, &resolved)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(MalformedXml(e.to_string())),
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(MalformedXml(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| MalformedXml("no root element".to_string()))
}

fn close(element: Element, stack: &mut [Element], root: &mut Option<Element>) -> Result<(), MalformedXml> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(MalformedXml("more than one root element".to_string())),
    }
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), MalformedXml> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(MalformedXml("text outside the root element".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements() {
        let doc = parse_document("<?xml version=\"1.0\"?><a><b><c>1</c></b><c>2</c></a>").unwrap();
        assert_eq!(doc.name, "a");
        assert_eq!(doc.find("c").unwrap().text_content(), "1");
        assert_eq!(doc.child("c").unwrap().text_content(), "2");
        assert_eq!(doc.find_all("c").len(), 2);
    }

    #[test]
    fn resolves_entities_and_cdata() {
        let doc = parse_document("<n>A &amp; B &#60;<![CDATA[<raw>]]></n>").unwrap();
        assert_eq!(doc.text_content(), "A & B <<raw>");
    }

    #[test]
    fn strips_namespace_prefix() {
        let doc = parse_document(
            "<soap:Envelope xmlns:soap=\"urn:x\"><soap:Body><faultstring>bad</faultstring></soap:Body></soap:Envelope>",
        )
        .unwrap();
        assert_eq!(doc.name, "Envelope");
        assert_eq!(doc.text_of("faultstring").as_deref(), Some("bad"));
    }

    #[test]
    fn empty_elements_are_children() {
        let doc = parse_document("<r><id/><name>x</name></r>").unwrap();
        assert_eq!(doc.child("id").unwrap().text_content(), "");
    }

    #[test]
    fn rejects_plain_text() {
        assert!(parse_document("Internal Server Error").is_err());
    }

    #[test]
    fn rejects_mismatched_tags() {
        assert!(parse_document("<a><b></a>").is_err());
    }

    #[test]
    fn rejects_unclosed_root() {
        assert!(parse_document("<a><b>1</b>").is_err());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse_document("").is_err());
    }

    #[test]
    fn find_all_does_not_descend_into_matches() {
        let doc = parse_document("<x><route><route/></route><route/></x>").unwrap();
        assert_eq!(doc.find_all("route").len(), 2);
    }
}
