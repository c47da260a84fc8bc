//! # Ham
//!
//! A static-site template compiler. Pages are plain HTML files; a handful of
//! marker elements and attributes tell the compiler which layout wraps a page,
//! which partials to splice in, and which stylesheets and scripts to link.
//! The output is fully resolved HTML with no runtime templating left.
//!
//! # Architecture: Extract, Splice, Repeat
//!
//! Every page goes through the same loop:
//!
//! ```text
//! 1. Parse     page.html  →  Document        (html5ever, standards-compliant)
//! 2. Extract   Document   →  Fragment + Page (markers become placeholder tokens)
//! 3. Merge     layout + page + partials + <link>/<script> tags
//! 4. Repeat    re-parse and re-extract until no partial is left
//! ```
//!
//! Layouts and partials are read through a build-wide cache, so a layout
//! shared by every page is read from disk once.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`site`] | `Site::build`: compile a project directory into an output directory |
//! | [`compile`] | The build session: per-page resolution loop, writes, asset copy |
//! | [`extract`] | One read-only walk over a document producing a `Fragment` and descriptor |
//! | [`placeholder`] | Placeholder tokens and the `Fragment` segment list they live in |
//! | [`dom`] | Owned HTML tree parsed by html5ever, and its serializer |
//! | [`types`] | `Page`, `Layout`, `Embed` descriptors and the page-config JSON |
//! | [`embed`] | `data-ham-replace` substitution and embed-cycle detection |
//! | [`resources`] | Stylesheet/script resolution, dedupe, stubs, URLs and tags |
//! | [`cache`] | `SourceReader` abstraction and the per-build read cache |
//! | [`assets`] | Verbatim copy of the assets directory |
//! | [`config`] | `ham.json` loading, defaults and validation |
//! | [`output`] | CLI output formatting for build progress |
//!
//! # Design Decisions
//!
//! ## Tokens, Not String Search
//!
//! Markers are turned into typed [`placeholder::Token`]s during extraction, and
//! substitution works on the segment list. Two embeds of the same partial with
//! different replacement values each get their own content, and text that
//! happens to look like `{embed:x}` in a page is never touched.
//!
//! ## Cycles Are Errors
//!
//! Before the first pass the compiler walks the embed graph and fails on a
//! loop (`a.html -> b.html -> a.html`). The `embeds.max_passes` cap is still
//! there, but only as a backstop.
//!
//! ## Pluggable Source Reads
//!
//! Layouts and partials come through a [`cache::SourceReader`]. The build uses
//! the filesystem; tests swap in [`cache::MemoryReader`] and check exactly how
//! often each file was read.

pub mod assets;
pub mod cache;
pub mod compile;
pub mod config;
pub mod dom;
pub mod embed;
pub mod extract;
pub mod output;
pub mod placeholder;
pub mod resources;
pub mod site;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
