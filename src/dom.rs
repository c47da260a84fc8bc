//! Owned HTML document model.
//!
//! Source files are parsed with html5ever into an `RcDom` and immediately
//! copied into the plain owned tree below. Everything downstream (extraction,
//! rendering, tests) works on this tree; the `Rc<RefCell<..>>` handles never
//! leave this module.
//!
//! Rendering follows html5ever's own serializer: no self-closing slashes on
//! void elements, raw-text elements are written verbatim, and text/attribute
//! escaping uses the same minimal entity set. Parsing the output of
//! [`Document::render`] yields the same tree again, which is what lets the
//! compiler re-parse its buffer on every pass without drift.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text children are written without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style",
    "script",
    "xmp",
    "iframe",
    "noembed",
    "noframes",
    "plaintext",
    "noscript",
];

/// The parser drops one leading newline inside these; rendering adds it back.
const LEADING_NEWLINE_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Doctype(String),
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Local tag name as produced by the parser (lowercase for HTML).
    pub name: String,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name, including a namespace prefix (`xlink:href`) when present.
    pub name: String,
    pub value: String,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Whether the whitespace-separated `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.name.as_str())
    }
}

/// Parse an HTML string with the HTML5 algorithm.
///
/// Never fails: like browsers, the parser recovers from any malformed input.
/// Bare fragments are wrapped in `<html><head></head><body>..</body></html>`.
pub fn parse(html: &str) -> Document {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    let mut children = Vec::new();
    copy_children(&dom.document, &mut children);
    Document { children }
}

fn copy_children(handle: &Handle, out: &mut Vec<Node>) {
    for child in handle.children.borrow().iter() {
        if let Some(node) = copy_node(child) {
            out.push(node);
        }
    }
}

fn copy_node(handle: &Handle) -> Option<Node> {
    match &handle.data {
        NodeData::Document => None,
        NodeData::Doctype { name, .. } => Some(Node::Doctype(name.to_string())),
        NodeData::Text { contents } => Some(Node::Text(contents.borrow().to_string())),
        NodeData::Comment { contents } => Some(Node::Comment(contents.to_string())),
        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let attrs = attrs
                .borrow()
                .iter()
                .map(|a| Attribute {
                    name: match &a.name.prefix {
                        Some(prefix) => format!("{}:{}", prefix, a.name.local),
                        None => a.name.local.to_string(),
                    },
                    value: a.value.to_string(),
                })
                .collect();

            let mut children = Vec::new();
            // <template> keeps its parsed children in a separate fragment.
            match template_contents.borrow().as_ref() {
                Some(contents) => copy_children(contents, &mut children),
                None => copy_children(handle, &mut children),
            }

            Some(Node::Element(Element {
                name: name.local.to_string(),
                attrs,
                children,
            }))
        }
        NodeData::ProcessingInstruction { .. } => None,
    }
}

impl Document {
    /// Serialize the whole tree back to HTML.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            push_node(&mut out, node, None);
        }
        out
    }
}

/// Write `node` and its subtree. `parent` decides how text is escaped.
pub(crate) fn push_node(out: &mut String, node: &Node, parent: Option<&Element>) {
    match node {
        Node::Doctype(name) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Node::Text(text) => push_text(out, text, parent),
        Node::Element(el) => {
            push_start_tag(out, el, el.attrs.iter());
            for child in &el.children {
                push_node(out, child, Some(el));
            }
            push_end_tag(out, el);
        }
    }
}

/// Write the start tag of `el` with the given attributes.
///
/// Callers pass a filtered attribute iterator to omit directive attributes.
pub(crate) fn push_start_tag<'a>(
    out: &mut String,
    el: &Element,
    attrs: impl Iterator<Item = &'a Attribute>,
) {
    out.push('<');
    out.push_str(&el.name);
    for attr in attrs {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        escape_into(out, &attr.value, true);
        out.push('"');
    }
    out.push('>');

    if LEADING_NEWLINE_ELEMENTS.contains(&el.name.as_str())
        && let Some(Node::Text(text)) = el.children.first()
        && text.starts_with('\n')
    {
        out.push('\n');
    }
}

/// Write the end tag of `el`; void elements have none.
pub(crate) fn push_end_tag(out: &mut String, el: &Element) {
    if el.is_void() {
        return;
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

pub(crate) fn push_text(out: &mut String, text: &str, parent: Option<&Element>) {
    match parent {
        Some(el) if RAW_TEXT_ELEMENTS.contains(&el.name.as_str()) => out.push_str(text),
        _ => escape_into(out, text, false),
    }
}

fn escape_into(out: &mut String, text: &str, attr_mode: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attr_mode => out.push_str("&quot;"),
            '<' if !attr_mode => out.push_str("&lt;"),
            '>' if !attr_mode => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
