//! Metadata extraction from parsed pages and layouts.
//!
//! One depth-first, read-only walk over a [`Document`] produces two things at
//! once: the page or layout descriptor, and a [`Fragment`] holding the
//! serialized document with every marker element replaced by a token.
//!
//! ## Marker vocabulary
//!
//! | Markup | Token | Recorded |
//! |--------|-------|----------|
//! | `<embed type="ham/partial" src=..>` | `{embed:<src>}` | page and layout |
//! | `<embed type="ham/page">` | `{ham:page}` | never |
//! | `<embed type="ham/layout-js">` | `{ham:js}` | layout only |
//! | `<embed type="ham/layout-css">` | `{ham:css}` | layout only |
//! | `<link type="ham/layout-css">` | `{ham:css}` | layout only |
//!
//! Any element with `class="ham-remove"` is dropped with its subtree. The
//! `data-ham-page-config` attribute is decoded into the descriptor and never
//! reaches the output. `<embed>` elements with any other `type` are ordinary
//! HTML and pass through.

use crate::dom::{self, Document, Element, Node};
use crate::placeholder::{Fragment, Token};
use crate::types::{Embed, EmbedKind, Layout, Page, PageConfig};
use log::warn;

pub const PAGE_CONFIG_ATTR: &str = "data-ham-page-config";
pub const REPLACE_ATTR: &str = "data-ham-replace";
pub const REMOVE_CLASS: &str = "ham-remove";

/// A descriptor together with the tokenized document it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<T> {
    pub fragment: Fragment,
    pub meta: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Page,
    Layout,
}

/// Extract a page: its layout configuration and its partials.
pub fn extract_page(doc: &Document) -> Extracted<Page> {
    let walker = Walker::run(doc, Mode::Page);
    Extracted {
        fragment: walker.fragment,
        meta: Page {
            layout: walker.layout,
            embeds: walker.embeds,
        },
    }
}

/// Extract a layout: its own resources, partials and slot markers.
///
/// The `layout` key of a configuration attribute inside a layout file is
/// ignored; layouts do not nest.
pub fn extract_layout(doc: &Document) -> Extracted<Layout> {
    let walker = Walker::run(doc, Mode::Layout);
    let mut layout = walker.layout;
    layout.embeds = walker.embeds;
    Extracted {
        fragment: walker.fragment,
        meta: layout,
    }
}

struct Walker {
    mode: Mode,
    fragment: Fragment,
    /// HTML written since the last token.
    buf: String,
    layout: Layout,
    embeds: Vec<Embed>,
}

impl Walker {
    fn run(doc: &Document, mode: Mode) -> Self {
        let mut walker = Self {
            mode,
            fragment: Fragment::new(),
            buf: String::new(),
            layout: Layout::default(),
            embeds: Vec::new(),
        };
        for node in &doc.children {
            walker.node(node, None);
        }
        walker.flush();
        walker
    }

    fn flush(&mut self) {
        self.fragment.push_html(&self.buf);
        self.buf.clear();
    }

    fn token(&mut self, token: Token) {
        self.flush();
        self.fragment.push_token(token);
    }

    fn node(&mut self, node: &Node, parent: Option<&Element>) {
        match node {
            Node::Element(el) => self.element(el),
            other => dom::push_node(&mut self.buf, other, parent),
        }
    }

    fn element(&mut self, el: &Element) {
        if el.has_class(REMOVE_CLASS) {
            return;
        }

        if let Some(json) = el.attr(PAGE_CONFIG_ATTR) {
            self.apply_config(json);
        }

        let kind = match el.name.as_str() {
            "embed" => el.attr("type").and_then(EmbedKind::from_type_attr),
            "link" if el.attr("type") == Some(EmbedKind::LayoutCssSlot.as_type_attr()) => {
                Some(EmbedKind::LayoutCssSlot)
            }
            _ => None,
        };
        if let Some(kind) = kind {
            self.directive(el, kind);
            return;
        }

        dom::push_start_tag(
            &mut self.buf,
            el,
            el.attrs.iter().filter(|a| a.name != PAGE_CONFIG_ATTR),
        );
        for child in &el.children {
            self.node(child, Some(el));
        }
        dom::push_end_tag(&mut self.buf, el);
    }

    fn directive(&mut self, el: &Element, kind: EmbedKind) {
        match kind {
            EmbedKind::Partial => {
                let src = el.attr("src").unwrap_or_default();
                if src.is_empty() {
                    warn!("dropping ham/partial embed without a src attribute");
                    return;
                }
                let replace = el.attr(REPLACE_ATTR).map(str::to_string);
                self.token(Token::partial(src, replace.clone()));
                self.embeds.push(Embed::partial(src, replace));
            }
            EmbedKind::PageSlot => self.token(Token::Page),
            EmbedKind::LayoutJsSlot | EmbedKind::LayoutCssSlot => {
                self.token(if kind == EmbedKind::LayoutJsSlot {
                    Token::Js
                } else {
                    Token::Css
                });
                if self.mode == Mode::Layout {
                    self.embeds.push(Embed::slot(kind));
                }
            }
        }
    }

    fn apply_config(&mut self, json: &str) {
        match serde_json::from_str::<PageConfig>(json) {
            Ok(mut config) => {
                if self.mode == Mode::Layout {
                    config.layout = None;
                }
                self.layout.apply_config(config);
            }
            Err(e) => warn!("ignoring malformed {} attribute: {}", PAGE_CONFIG_ATTR, e),
        }
    }
}
