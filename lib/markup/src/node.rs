use crate::error::MarkupError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// The kind of a parsed markup node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupNodeKind {
    Element,
    Text,
    /// A CDATA section; its content is taken verbatim, markers stripped.
    CData,
}

/// A node of the parsed markup tree.
///
/// Trees are created fresh per parse call, consumed once by the resolver to build a
/// component tree, and then discarded; they are never retained or mutated across renders.
/// Offsets are byte offsets into the parsed text and let consumers mask source regions
/// (e.g. through [graphbind_common::RangeSet]).
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupNode {
    pub kind: MarkupNodeKind,
    /// Tag name, empty for text and CDATA nodes.
    pub name: String,
    /// Decoded content of text and CDATA nodes, empty for elements.
    pub text: String,
    /// Raw (still entity-escaped) attribute text in document order.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
    /// Offset of the node's first byte.
    pub start: usize,
    /// Offset just past the opening tag (or past the node for text).
    pub start_tag_end: usize,
    /// Offset of the closing tag, absent for self-closing, text, and CDATA nodes.
    pub end_tag_start: Option<usize>,
}

impl MarkupNode {
    fn text_node(kind: MarkupNodeKind, content: String, start: usize, end: usize) -> Self {
        MarkupNode {
            kind,
            name: String::new(),
            text: content,
            attrs: Vec::new(),
            children: Vec::new(),
            start,
            start_tag_end: end,
            end_tag_start: None,
        }
    }

    /// The decoded content of a text or CDATA node, empty for elements.
    pub fn content(&self) -> &str {
        &self.text
    }

    /// Looks up a raw attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenates the text of this node and all descendants, in document order.
    pub fn raw_text(&self) -> String {
        let mut text = String::new();
        self.collect_raw_text(&mut text);
        text
    }

    fn collect_raw_text(&self, into: &mut String) {
        match self.kind {
            MarkupNodeKind::Text | MarkupNodeKind::CData => into.push_str(&self.text),
            MarkupNodeKind::Element => {
                for child in &self.children {
                    child.collect_raw_text(into);
                }
            }
        }
    }

    /// Serializes this node back to markup text.
    ///
    /// Used to recover the raw source of harvested `<template>` declarations; attributes
    /// are emitted in their original, still-escaped form.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        match self.kind {
            MarkupNodeKind::Text => out.push_str(&quick_xml::escape::escape(&self.text)),
            MarkupNodeKind::CData => {
                out.push_str("<![CDATA[");
                out.push_str(&self.text);
                out.push_str("]]>");
            }
            MarkupNodeKind::Element => {
                out.push('<');
                out.push_str(&self.name);
                for (key, value) in &self.attrs {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(value);
                    out.push('"');
                }
                if self.children.is_empty() {
                    out.push_str("/>");
                } else {
                    out.push('>');
                    for child in &self.children {
                        child.write_markup(out);
                    }
                    out.push_str("</");
                    out.push_str(&self.name);
                    out.push('>');
                }
            }
        }
    }
}

/// Parses markup text into a list of root nodes.
///
/// The markup must be well formed (matching end tags, proper nesting); malformed input is
/// a [MarkupError::Parse]. Comments, processing instructions, and doctype declarations
/// are dropped.
pub fn parse_markup(text: &str) -> Result<Vec<MarkupNode>, MarkupError> {
    let mut reader = Reader::from_str(text);
    let mut roots: Vec<MarkupNode> = Vec::new();
    let mut stack: Vec<MarkupNode> = Vec::new();

    loop {
        let event_start = reader.buffer_position() as usize;
        match reader.read_event() {
            Err(error) => {
                return Err(MarkupError::Parse {
                    position: reader.error_position() as usize,
                    message: error.to_string(),
                });
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(tag)) => {
                let node = element_node(&tag, event_start, reader.buffer_position() as usize)?;
                stack.push(node);
            }
            Ok(Event::Empty(tag)) => {
                let node = element_node(&tag, event_start, reader.buffer_position() as usize)?;
                attach(&mut stack, &mut roots, node);
            }
            Ok(Event::End(_)) => {
                // Name mismatches are already rejected by the reader.
                let Some(mut node) = stack.pop() else {
                    return Err(MarkupError::Parse {
                        position: event_start,
                        message: "unexpected closing tag".to_owned(),
                    });
                };
                node.end_tag_start = Some(event_start);
                attach(&mut stack, &mut roots, node);
            }
            Ok(Event::Text(text)) => {
                let content = text
                    .unescape()
                    .map_err(|error| MarkupError::Parse {
                        position: event_start,
                        message: error.to_string(),
                    })?
                    .into_owned();
                let node = MarkupNode::text_node(
                    MarkupNodeKind::Text,
                    content,
                    event_start,
                    reader.buffer_position() as usize,
                );
                attach(&mut stack, &mut roots, node);
            }
            Ok(Event::CData(data)) => {
                let content = String::from_utf8_lossy(&data.into_inner()).into_owned();
                let node = MarkupNode::text_node(
                    MarkupNodeKind::CData,
                    content,
                    event_start,
                    reader.buffer_position() as usize,
                );
                attach(&mut stack, &mut roots, node);
            }
            Ok(Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_)) => {}
        }
    }

    if let Some(unclosed) = stack.last() {
        return Err(MarkupError::Parse {
            position: unclosed.start,
            message: format!("unclosed tag <{}>", unclosed.name),
        });
    }
    Ok(roots)
}

fn element_node(
    tag: &BytesStart<'_>,
    start: usize,
    start_tag_end: usize,
) -> Result<MarkupNode, MarkupError> {
    let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in tag.attributes() {
        let attr = attr.map_err(|error| MarkupError::Parse {
            position: start,
            message: format!("invalid attribute in <{name}>: {error}"),
        })?;
        attrs.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            String::from_utf8_lossy(&attr.value).into_owned(),
        ));
    }
    Ok(MarkupNode {
        kind: MarkupNodeKind::Element,
        name,
        text: String::new(),
        attrs,
        children: Vec::new(),
        start,
        start_tag_end,
        end_tag_start: None,
    })
}

fn attach(stack: &mut [MarkupNode], roots: &mut Vec<MarkupNode>, node: MarkupNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}
