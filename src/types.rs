//! Descriptors shared between the extractor and the compiler.
//!
//! A fresh set is built for every source file on every pass of the resolution
//! loop; nothing here outlives one pass.

use serde::Deserialize;

/// The four embed directives a `<embed type="ham/...">` element can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedKind {
    /// `ham/partial`: splice the contents of `src` here.
    Partial,
    /// `ham/page`: where a layout receives the page content.
    PageSlot,
    /// `ham/layout-js`: where the `<script>` tags go.
    LayoutJsSlot,
    /// `ham/layout-css`: where the `<link rel="stylesheet">` tags go.
    LayoutCssSlot,
}

impl EmbedKind {
    /// Parse the value of an embed's `type` attribute.
    ///
    /// Returns `None` for anything outside the `ham/` vocabulary, so plain
    /// HTML `<embed>` elements pass through untouched.
    pub fn from_type_attr(value: &str) -> Option<Self> {
        match value {
            "ham/partial" => Some(Self::Partial),
            "ham/page" => Some(Self::PageSlot),
            "ham/layout-js" => Some(Self::LayoutJsSlot),
            "ham/layout-css" => Some(Self::LayoutCssSlot),
            _ => None,
        }
    }

    pub fn as_type_attr(self) -> &'static str {
        match self {
            Self::Partial => "ham/partial",
            Self::PageSlot => "ham/page",
            Self::LayoutJsSlot => "ham/layout-js",
            Self::LayoutCssSlot => "ham/layout-css",
        }
    }
}

/// One embed directive found in a page or layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub kind: EmbedKind,
    /// File reference, relative to the owning file's directory. Empty for slots.
    pub src: String,
    /// Raw `data-ham-replace` value (`key:value,key2:value2`), if any.
    pub replace: Option<String>,
}

impl Embed {
    pub fn partial(src: impl Into<String>, replace: Option<String>) -> Self {
        Self {
            kind: EmbedKind::Partial,
            src: src.into(),
            replace,
        }
    }

    pub fn slot(kind: EmbedKind) -> Self {
        Self {
            kind,
            src: String::new(),
            replace: None,
        }
    }
}

/// A layout reference plus the resources that go with it.
///
/// For a page this is filled from the page configuration attribute; for a
/// layout file it holds the layout's own directives and slot markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    /// Path to the layout file, relative to the referencing page's directory.
    pub src: String,
    pub css: Vec<String>,
    pub js: Vec<String>,
    pub js_mod: Vec<String>,
    pub embeds: Vec<Embed>,
}

impl Layout {
    /// Decode a page configuration JSON blob into a fresh layout.
    pub fn from_config_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut layout = Self::default();
        layout.apply_config(serde_json::from_str(json)?);
        Ok(layout)
    }

    /// Overlay the keys present in `config`; absent keys keep their value.
    pub fn apply_config(&mut self, config: PageConfig) {
        if let Some(src) = config.layout {
            self.src = src;
        }
        if let Some(css) = config.css {
            self.css = css;
        }
        if let Some(js) = config.js {
            self.js = js;
        }
        if let Some(js_mod) = config.js_mod {
            self.js_mod = js_mod;
        }
    }

    /// Whether the layout declares a `{ham:css}` or `{ham:js}` slot.
    pub fn has_slot(&self, kind: EmbedKind) -> bool {
        self.embeds.iter().any(|e| e.kind == kind)
    }

    pub fn partials(&self) -> impl Iterator<Item = &Embed> {
        self.embeds.iter().filter(|e| e.kind == EmbedKind::Partial)
    }
}

/// A page and the partials found directly in its body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub layout: Layout,
    pub embeds: Vec<Embed>,
}

/// The JSON object stored in a `data-ham-page-config` attribute.
///
/// Unknown keys are ignored: the attribute lives in hand-written HTML and
/// older projects carry extra keys.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub layout: Option<String>,
    pub css: Option<Vec<String>>,
    pub js: Option<Vec<String>>,
    #[serde(rename = "js-mod")]
    pub js_mod: Option<Vec<String>>,
}
