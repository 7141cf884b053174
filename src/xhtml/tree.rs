//! Minimal owned XML tree.
//!
//! The analyzer output is small enough to hold in memory, and annotation needs to
//! write attributes onto arbitrary spans and then serialize everything else back
//! untouched. This module reads a document into an [`Element`] tree with
//! `quick-xml` and writes it back out.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A node in the XML tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Child element
    Element(Element),
    /// Unescaped character data
    Text(String),
    /// CDATA section content
    CData(String),
    /// Comment content
    Comment(String),
    /// Raw XML declaration content (between `<?` and `?>`)
    Declaration(String),
    /// Raw processing instruction content
    ProcessingInstruction(String),
    /// Raw DOCTYPE content
    DocType(String),
}

/// An XML element with ordered attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Qualified element name as written in the source
    pub name: String,
    /// Attributes in source order
    pub attributes: IndexMap<String, String>,
    /// Child nodes
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Element name without any namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Get an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Set an attribute value, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    /// Iterate over child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Iterate over child elements with the given local name.
    pub fn children_named<'a, 'b>(&'a self, local: &'b str) -> impl Iterator<Item = &'a Element> + 'b
    where
        'a: 'b,
    {
        self.child_elements().filter(move |e| e.local_name() == local)
    }

    /// First child element with the given local name.
    pub fn child_named(&self, local: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.local_name() == local)
    }

    /// Text that precedes the first child element.
    ///
    /// Returns `None` when the element has no leading character data.
    pub fn leading_text(&self) -> Option<String> {
        let mut text: Option<String> = None;
        for child in &self.children {
            match child {
                Node::Text(t) | Node::CData(t) => text.get_or_insert_with(String::new).push_str(t),
                Node::Element(_) => break,
                _ => {},
            }
        }
        text
    }

    /// Visit this element and every descendant element in document order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Element)) {
        visit(self);
        for child in self.child_elements() {
            child.walk(visit);
        }
    }

    /// Mutable variant of [`Element::walk`].
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Element)) {
        visit(self);
        for child in self.children.iter_mut() {
            if let Node::Element(e) = child {
                e.walk_mut(visit);
            }
        }
    }
}

/// A parsed XML document: prolog nodes plus the root element.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlTree {
    /// Nodes before the root element (declaration, doctype, comments)
    pub prolog: Vec<Node>,
    /// The document element
    pub root: Element,
}

impl XmlTree {
    /// Parse an XML document from a string.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut prolog = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    stack.push(element_from_start(&e)?);
                },
                Ok(Event::Empty(e)) => {
                    let element = element_from_start(&e)?;
                    attach(&mut stack, &mut root, &mut prolog, Node::Element(element));
                },
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::MissingElement("matching start tag".to_string()))?;
                    attach(&mut stack, &mut root, &mut prolog, Node::Element(element));
                },
                Ok(Event::Text(e)) => {
                    let text = match e.unescape() {
                        Ok(t) => t.into_owned(),
                        Err(err) => {
                            log::debug!("Keeping raw text after unescape failure: {}", err);
                            String::from_utf8_lossy(&e).into_owned()
                        },
                    };
                    if stack.is_empty() && text.trim().is_empty() {
                        continue;
                    }
                    attach(&mut stack, &mut root, &mut prolog, Node::Text(text));
                },
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    attach(&mut stack, &mut root, &mut prolog, Node::CData(text));
                },
                Ok(Event::Comment(e)) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    attach(&mut stack, &mut root, &mut prolog, Node::Comment(text));
                },
                Ok(Event::Decl(e)) => {
                    prolog.push(Node::Declaration(String::from_utf8_lossy(&e).into_owned()));
                },
                Ok(Event::PI(e)) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    attach(&mut stack, &mut root, &mut prolog, Node::ProcessingInstruction(text));
                },
                Ok(Event::DocType(e)) => {
                    prolog.push(Node::DocType(String::from_utf8_lossy(&e).into_owned()));
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        if !stack.is_empty() {
            return Err(Error::MissingElement(format!("closing tag for <{}>", stack[stack.len() - 1].name)));
        }

        let root = root.ok_or_else(|| Error::MissingElement("document element".to_string()))?;
        Ok(Self { prolog, root })
    }

    /// Serialize the tree back to XML text.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        for node in &self.prolog {
            write_node(node, &mut out);
            out.push('\n');
        }
        write_element(&self.root, &mut out);
        out
    }

    /// Serialize the tree as UTF-8 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_xml().into_bytes()
    }
}

fn element_from_start(e: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        element.attributes.insert(key, value);
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, prolog: &mut Vec<Node>, node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return;
    }
    match node {
        Node::Element(e) if root.is_none() => *root = Some(e),
        Node::Element(e) => {
            log::warn!("Ignoring extra top-level element <{}>", e.name);
        },
        other if root.is_none() => prolog.push(other),
        _ => {},
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(e) => write_element(e, out),
        Node::Text(t) => out.push_str(&partial_escape(t.as_str())),
        Node::CData(t) => {
            out.push_str("<![CDATA[");
            out.push_str(t);
            out.push_str("]]>");
        },
        Node::Comment(t) => {
            out.push_str("<!--");
            out.push_str(t);
            out.push_str("-->");
        },
        Node::Declaration(t) | Node::ProcessingInstruction(t) => {
            out.push_str("<?");
            out.push_str(t);
            out.push_str("?>");
        },
        Node::DocType(t) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(t.trim_start());
            out.push('>');
        },
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }
    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}
