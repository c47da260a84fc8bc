//! Stylesheet and script references: resolution, deduplication and markup.
//!
//! A page's resources come from three places, collected in this order:
//!
//! 1. the layout's own configuration (relative to the layout file),
//! 2. the page configuration (relative to the page file),
//! 3. the implicit per-page assets `foo.css` and `foo.ts` next to `foo.html`.
//!
//! Each reference is resolved to a clean path and the set keeps only the
//! first occurrence of each path, so a stylesheet named by both the page and
//! its layout is linked once.
//!
//! ## URLs
//!
//! Output URLs are rooted at `/assets/`. A file inside the project's assets
//! directory keeps its path below it (`assets/css/site.css` becomes
//! `/assets/css/site.css`); a file outside it maps to `/assets/css/<name>` or
//! `/assets/js/<stem>.js` by kind. TypeScript sources are linked by their
//! compiled `.js` name. References that are already URLs (`https://..`,
//! `//cdn..`) are emitted as written.

use crate::types::Layout;
use log::debug;
use maud::html;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// `<link rel="stylesheet">`
    Stylesheet,
    /// `<script src>`
    Script,
    /// `<script type="module" src>`
    Module,
}

impl ResourceKind {
    /// Kind for an entry of a `js` list: TypeScript sources load as modules.
    fn for_script(reference: &str) -> Self {
        if reference.ends_with(".ts") {
            Self::Module
        } else {
            Self::Script
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    /// A project file, resolved and normalised.
    File(PathBuf),
    /// An absolute or protocol-relative URL, kept verbatim.
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub kind: ResourceKind,
    pub location: Location,
}

/// Whether a reference is a URL rather than a file path.
pub fn is_external(reference: &str) -> bool {
    reference.starts_with("//") || reference.contains("://")
}

/// Resolve a file reference written in a file that lives in `base_dir`.
///
/// `/`-rooted references are relative to the project root. The result is
/// lexically normalised (`a/../b` becomes `b`); nothing is read from disk.
pub fn resolve(root: &Path, base_dir: &Path, reference: &str) -> PathBuf {
    match reference.strip_prefix('/') {
        Some(rooted) => path_clean::clean(root.join(rooted)),
        None => path_clean::clean(base_dir.join(reference)),
    }
}

/// Deduplicated, ordered resources of one compiled page.
#[derive(Debug, Clone, Default)]
pub struct ResourceSet {
    items: Vec<Resource>,
    seen: HashSet<Location>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one reference. Returns `false` if its location was already present.
    pub fn add(&mut self, root: &Path, base_dir: &Path, reference: &str, kind: ResourceKind) -> bool {
        let location = if is_external(reference) {
            Location::Url(reference.to_string())
        } else {
            Location::File(resolve(root, base_dir, reference))
        };
        if !self.seen.insert(location.clone()) {
            debug!("skipping duplicate resource {}", reference);
            return false;
        }
        self.items.push(Resource { kind, location });
        true
    }

    /// Add the `css`, `js` and `js-mod` lists of a layout descriptor.
    pub fn add_layout(&mut self, root: &Path, base_dir: &Path, layout: &Layout) {
        for css in &layout.css {
            self.add(root, base_dir, css, ResourceKind::Stylesheet);
        }
        for js in &layout.js {
            self.add(root, base_dir, js, ResourceKind::for_script(js));
        }
        for js in &layout.js_mod {
            self.add(root, base_dir, js, ResourceKind::Module);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Create an empty file for every local resource that does not exist yet.
    ///
    /// Returns the paths created. Existing files are never touched.
    pub fn ensure_stubs(&self) -> io::Result<Vec<PathBuf>> {
        let mut created = Vec::new();
        for resource in &self.items {
            let Location::File(path) = &resource.location else {
                continue;
            };
            if path.exists() {
                continue;
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, "")?;
            created.push(path.clone());
        }
        Ok(created)
    }

    /// `<link>` tags for every stylesheet, one per line.
    pub fn css_markup(&self, urls: &AssetUrls) -> String {
        self.markup(urls, |kind| kind == ResourceKind::Stylesheet)
    }

    /// `<script>` tags for every script and module, one per line.
    pub fn js_markup(&self, urls: &AssetUrls) -> String {
        self.markup(urls, |kind| kind != ResourceKind::Stylesheet)
    }

    fn markup(&self, urls: &AssetUrls, wanted: impl Fn(ResourceKind) -> bool) -> String {
        self.items
            .iter()
            .filter(|r| wanted(r.kind))
            .map(|r| tag(r.kind, &urls.url_for(r)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn tag(kind: ResourceKind, url: &str) -> String {
    let markup = match kind {
        ResourceKind::Stylesheet => html! { link rel="stylesheet" href=(url); },
        ResourceKind::Script => html! { script src=(url) {} },
        ResourceKind::Module => html! { script type="module" src=(url) {} },
    };
    markup.into_string()
}

/// Maps resolved resource paths to the URLs they are served from.
#[derive(Debug, Clone)]
pub struct AssetUrls {
    root: PathBuf,
    assets_dir: PathBuf,
    version: Option<String>,
}

impl AssetUrls {
    /// `assets_dir` is relative to `root`. With a `version`, file URLs get a
    /// `?v=<version>` cache-busting suffix.
    pub fn new(root: &Path, assets_dir: &str, version: Option<String>) -> Self {
        Self {
            root: path_clean::clean(root),
            assets_dir: path_clean::clean(assets_dir),
            version,
        }
    }

    pub fn url_for(&self, resource: &Resource) -> String {
        match &resource.location {
            Location::Url(url) => url.clone(),
            Location::File(path) => {
                let url = self.file_url(path, resource.kind);
                match &self.version {
                    Some(v) => format!("{}?v={}", url, v),
                    None => url,
                }
            }
        }
    }

    fn file_url(&self, path: &Path, kind: ResourceKind) -> String {
        let below_assets = path
            .strip_prefix(&self.root)
            .ok()
            .and_then(|rel| rel.strip_prefix(&self.assets_dir).ok())
            .map(Path::to_path_buf)
            .or_else(|| after_assets_component(path));

        let url = match below_assets {
            Some(rest) => format!("/assets/{}", slash_join(&rest)),
            None => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match kind {
                    ResourceKind::Stylesheet => format!("/assets/css/{}", name),
                    ResourceKind::Script | ResourceKind::Module => {
                        let stem = path
                            .file_stem()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        format!("/assets/js/{}.js", stem)
                    }
                }
            }
        };

        match url.strip_suffix(".ts") {
            Some(base) if kind != ResourceKind::Stylesheet => format!("{}.js", base),
            _ => url,
        }
    }
}

/// The part of `path` after its first `assets` component.
fn after_assets_component(path: &Path) -> Option<PathBuf> {
    let mut components = path.components();
    components.by_ref().find(|c| *c == Component::Normal("assets".as_ref()))?;
    let rest = components.as_path();
    (!rest.as_os_str().is_empty()).then(|| rest.to_path_buf())
}

fn slash_join(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// The implicit per-page assets: `foo.css` and `foo.ts` for `foo.html`.
pub fn page_asset_names(page: &Path) -> Option<(String, String)> {
    let stem = page.file_stem()?.to_string_lossy();
    Some((format!("{}.css", stem), format!("{}.ts", stem)))
}
