//! Owned, read-only view of the catalog XML document.
//!
//! The document is parsed once with `quick-xml` into a tree of [`Element`]s.
//! Element and attribute names are stored by local name: the catalog uses a
//! default namespace for its own vocabulary and an `xhtml:` prefix for rich
//! text, and extraction never needs to tell them apart by namespace.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};

/// XHTML elements that start a new line when rich text is flattened.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "table", "tr", "td", "th", "h1", "h2", "h3", "h4", "h5",
    "h6", "pre", "blockquote",
];

/// A child node of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A nested element.
    Element(Element),
    /// Character data (text or CDATA), unescaped.
    Text(String),
}

/// An XML element with its attributes and children in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Local name.
    pub name: String,
    /// Attributes by local name, namespace declarations excluded.
    pub attributes: Vec<(String, String)>,
    /// Child nodes.
    pub children: Vec<Node>,
}

impl Element {
    /// Returns the value of attribute `name`.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value of attribute `name`, failing when it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAttribute`] if the attribute is not present.
    pub fn require_attr(&self, name: &str) -> Result<&str> {
        self.attr(name).ok_or_else(|| Error::MissingAttribute {
            element: self.name.clone(),
            attribute: name.to_string(),
        })
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Child elements named `name`.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// First element reached by a slash-separated path of child names.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&Element> {
        self.find_all(path).into_iter().next()
    }

    /// All elements reached by a slash-separated path of child names.
    ///
    /// `"Consequences/Consequence"` yields every `Consequence` child of every
    /// `Consequences` child of `self`, in document order.
    #[must_use]
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        let mut current = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|e| e.elements().filter(move |c| c.name == step))
                .collect();
        }
        current
    }

    /// Concatenated direct text children.
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Text of the whole subtree with markup stripped.
    ///
    /// Wrapper elements are dropped and their text kept; block-level XHTML
    /// elements are separated by line breaks so words on either side of a
    /// paragraph boundary never run together.
    #[must_use]
    pub fn structured_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => {
                    let block = BLOCK_ELEMENTS.contains(&e.name.as_str());
                    if block {
                        out.push('\n');
                    }
                    e.collect_text(out);
                    if block {
                        out.push('\n');
                    }
                }
            }
        }
    }
}

/// The parsed catalog document.
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: Element,
}

impl SourceTree {
    /// Parses a catalog document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Xml`] on malformed input and [`Error::EmptyDocument`]
    /// when no root element is present.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        loop {
            let event = reader.read_event().map_err(|source| Error::Xml {
                position: reader.buffer_position(),
                source,
            })?;
            match event {
                Event::Start(start) => stack.push(open(&start, &reader)?),
                Event::Empty(start) => {
                    let element = open(&start, &reader)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    if let Some(element) = stack.pop() {
                        attach(&mut stack, &mut root, element);
                    }
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = text.unescape().map_err(|source| Error::Xml {
                            position: reader.buffer_position(),
                            source,
                        })?;
                        push_text(parent, &text);
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        push_text(parent, &String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        root.map(|root| Self { root }).ok_or(Error::EmptyDocument)
    }

    /// The document element.
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }
}

fn open(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Element> {
    let xml_error = |source: quick_xml::Error| Error::Xml {
        position: reader.buffer_position(),
        source,
    };
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| xml_error(e.into()))?;
        let key = attribute.key;
        if key.as_ref() == b"xmlns" || key.as_ref().starts_with(b"xmlns:") {
            continue;
        }
        let name = String::from_utf8_lossy(key.local_name().as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(xml_error)?.into_owned();
        attributes.push((name, value));
    }
    Ok(Element {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn push_text(parent: &mut Element, text: &str) {
    if let Some(Node::Text(previous)) = parent.children.last_mut() {
        previous.push_str(text);
    } else {
        parent.children.push(Node::Text(text.to_string()));
    }
}
