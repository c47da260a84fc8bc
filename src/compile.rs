//! Page compilation: layouts, partials and resources resolved into plain HTML.
//!
//! A [`Compiler`] is one build session. It owns the project configuration,
//! the [`ReadCache`] shared by every page of the build, and the cache-busting
//! version stamp.
//!
//! ## Per-page algorithm
//!
//! ```text
//! page.html ──parse──▶ extract_page ──▶ Page + Fragment
//!                                        │
//!             layout ──parse──▶ extract_layout ──▶ Layout + Fragment
//!                                        │
//!   cycle check over the embed graph ────┤
//!                                        ▼
//!   pass 1:  splice partials, page into {ham:page}, tags into {ham:css}/{ham:js}
//!   pass n:  re-parse, re-extract, splice newly exposed partials
//!            ... until a pass splices nothing
//! ```
//!
//! Partials named by the page resolve against the page's directory, partials
//! named by the layout against the layout's directory. Partials exposed by a
//! later pass (partials of partials) belong to the page buffer and resolve
//! against the page's directory.
//!
//! ## Failure modes
//!
//! A missing layout, an embed cycle, or a page still splicing partials after
//! `embeds.max_passes` passes fails the build. An unreadable partial follows
//! `embeds.on_missing`. Pages are written only after they compiled, so a
//! failing page never leaves a partial output file behind.

use crate::assets;
use crate::cache::{CacheStats, FsReader, Lookup, ReadCache, SourceReader};
use crate::config::{ConfigError, MissingEmbedPolicy, ProjectConfig, load_config};
use crate::dom;
use crate::embed::{apply_replacements, find_cycle, parse_replace};
use crate::extract::{Extracted, extract_layout, extract_page};
use crate::placeholder::{Fragment, Token};
use crate::resources::{AssetUrls, ResourceKind, ResourceSet, page_asset_names, resolve};
use crate::types::{Embed, EmbedKind, Layout};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

/// What the parser wraps around a bare page fragment.
const BODY_PREFIX: &str = "<html><head></head><body>";
const BODY_SUFFIX: &str = "</body></html>";

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to walk pages directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Page {}: layout {} not found", page.display(), layout.display())]
    MissingLayout { page: PathBuf, layout: PathBuf },
    #[error("Page {}: embedded file {} not found", page.display(), embed.display())]
    MissingEmbed { page: PathBuf, embed: PathBuf },
    #[error("Page {}: embed cycle {chain}", page.display())]
    EmbedCycle { page: PathBuf, chain: String },
    #[error("Page {}: partials still unresolved after {passes} passes", page.display())]
    PassLimit { page: PathBuf, passes: usize },
}

/// Progress events emitted while a build runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileEvent {
    PageCompiled {
        /// Page path relative to the pages directory.
        page: PathBuf,
        output: PathBuf,
        passes: usize,
        partials: usize,
        resources: usize,
    },
    StubCreated {
        path: PathBuf,
    },
    AssetsCopied {
        files: usize,
    },
}

/// One compiled page, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPage {
    pub html: String,
    /// Resolution passes run, including the final one that found nothing.
    pub passes: usize,
    /// Partials spliced across all passes.
    pub partials: usize,
    /// Distinct stylesheets and scripts linked.
    pub resources: usize,
    /// Empty resource files created for this page.
    pub stubs: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub page: PathBuf,
    pub output: PathBuf,
    pub passes: usize,
    pub partials: usize,
    pub resources: usize,
}

/// Result of a full build.
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    pub pages: Vec<PageSummary>,
    pub stubs_created: usize,
    pub assets_copied: usize,
    pub cache_stats: CacheStats,
}

/// A partial occurrence in the embed graph.
///
/// The replacement directive is part of the identity: the same file embedded
/// with different values expands to different content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EmbedRef {
    path: PathBuf,
    replace: Option<String>,
}

/// The cache-busting version for a build started now.
pub fn build_version() -> String {
    chrono::Local::now().format("%Y%m%d%H%M").to_string()
}

pub struct Compiler<R: SourceReader = FsReader> {
    root: PathBuf,
    output: PathBuf,
    config: ProjectConfig,
    cache: ReadCache<R>,
    version: Option<String>,
    events: Option<Sender<CompileEvent>>,
}

impl Compiler<FsReader> {
    /// Open the project at `working_dir`, which must contain `ham.json`.
    pub fn new(
        working_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> Result<Self, CompileError> {
        let root = std::path::absolute(working_dir.as_ref())?;
        let config = load_config(&root)?;
        Ok(Self::with_config(root, output_dir, config))
    }

    /// Build a compiler from an already-loaded configuration.
    pub fn with_config(
        working_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        config: ProjectConfig,
    ) -> Self {
        let version = config.assets.cache_bust.then(build_version);
        Self {
            root: path_clean::clean(working_dir.as_ref()),
            output: output_dir.as_ref().to_path_buf(),
            config,
            cache: ReadCache::new(FsReader),
            version,
            events: None,
        }
    }
}

impl<R: SourceReader> Compiler<R> {
    /// Swap the backing store for layouts and partials.
    pub fn with_reader<S: SourceReader>(self, reader: S) -> Compiler<S> {
        Compiler {
            root: self.root,
            output: self.output,
            config: self.config,
            cache: ReadCache::new(reader),
            version: self.version,
            events: self.events,
        }
    }

    /// Pin the cache-busting version (`None` disables the `?v=` suffix).
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn with_events(mut self, events: Sender<CompileEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn emit(&self, event: CompileEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is listening.
            let _ = tx.send(event);
        }
    }

    /// Compile every page under the pages directory, then copy the assets.
    pub fn compile(&mut self) -> Result<BuildSummary, CompileError> {
        fs::create_dir_all(&self.output).map_err(|source| CompileError::Write {
            path: self.output.clone(),
            source,
        })?;

        let pages_dir = self.root.join(&self.config.pages_dir);
        let mut summary = BuildSummary::default();

        for entry in WalkDir::new(&pages_dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file()
                || entry.path().extension().is_none_or(|ext| ext != "html")
            {
                continue;
            }

            let compiled = self.compile_page(entry.path())?;
            let rel = entry
                .path()
                .strip_prefix(&pages_dir)
                .unwrap_or(entry.path())
                .to_path_buf();
            let target = self.output.join(&rel);
            write_page(&target, &compiled.html)?;
            debug!("wrote {}", target.display());

            for stub in &compiled.stubs {
                let path = stub.strip_prefix(&self.root).unwrap_or(stub).to_path_buf();
                self.emit(CompileEvent::StubCreated { path });
            }
            self.emit(CompileEvent::PageCompiled {
                page: rel.clone(),
                output: target.clone(),
                passes: compiled.passes,
                partials: compiled.partials,
                resources: compiled.resources,
            });

            summary.stubs_created += compiled.stubs.len();
            summary.pages.push(PageSummary {
                page: rel,
                output: target,
                passes: compiled.passes,
                partials: compiled.partials,
                resources: compiled.resources,
            });
        }

        let assets_src = self.root.join(&self.config.assets_dir);
        let assets_dest = self.output.join("assets");
        summary.assets_copied =
            assets::copy_dir(&assets_src, &assets_dest).map_err(|source| CompileError::Write {
                path: assets_dest.clone(),
                source,
            })?;
        self.emit(CompileEvent::AssetsCopied {
            files: summary.assets_copied,
        });

        summary.cache_stats = self.cache.stats();
        Ok(summary)
    }

    /// Compile one page file to its final HTML without writing it.
    pub fn compile_page(&mut self, page_path: &Path) -> Result<CompiledPage, CompileError> {
        let page_path = path_clean::clean(page_path);
        let page_dir = page_path.parent().unwrap_or(&self.root).to_path_buf();

        let source = self
            .cache
            .reader()
            .read_to_string(&page_path)
            .map_err(|source| CompileError::Read {
                path: page_path.clone(),
                source,
            })?;

        let Extracted {
            fragment: mut page_fragment,
            meta: mut page,
        } = extract_page(&dom::parse(&source));

        if self.config.assets.page_assets
            && let Some((css, ts)) = page_asset_names(&page_path)
        {
            page.layout.css.push(css);
            page.layout.js_mod.push(ts);
        }

        let mut resources = ResourceSet::new();
        let mut roots = Vec::new();

        let (merged, spliced) = if page.layout.src.is_empty() {
            debug!("compiling {} without a layout", page_path.display());
            roots.extend(self.embed_refs(&page_dir, &page.embeds));
            self.check_cycles(&page_path, &page_dir, &roots)?;
            resources.add_layout(&self.root, &page_dir, &page.layout);
            self.splice_partials(page_fragment, &page_dir, &page_path)?
        } else {
            let layout_path = resolve(&self.root, &page_dir, &page.layout.src);
            debug!(
                "compiling {} with {}",
                page_path.display(),
                layout_path.display()
            );
            let lookup = if self.cache.exists(&layout_path) {
                self.cache.read(&layout_path)
            } else {
                Lookup::Missing
            };
            let Lookup::Found(layout_source) = lookup else {
                return Err(CompileError::MissingLayout {
                    page: page_path,
                    layout: layout_path,
                });
            };
            let Extracted {
                fragment: layout_fragment,
                meta: layout,
            } = extract_layout(&dom::parse(&layout_source));
            let layout_dir = layout_path.parent().unwrap_or(&self.root).to_path_buf();

            let layout_partials: Vec<Embed> = layout.partials().cloned().collect();
            roots.extend(self.embed_refs(&page_dir, &page.embeds));
            roots.extend(self.embed_refs(&layout_dir, &layout_partials));
            self.check_cycles(&page_path, &page_dir, &roots)?;

            resources.add_layout(&self.root, &layout_dir, &layout);
            resources.add_layout(&self.root, &page_dir, &page.layout);
            for kind in unslotted_kinds(&layout, &resources) {
                warn!(
                    "layout {} has no {} slot; matching resources of {} are not linked",
                    layout_path.display(),
                    kind.as_type_attr(),
                    page_path.display()
                );
            }

            page_fragment.strip_prefix(BODY_PREFIX);
            page_fragment.strip_suffix(BODY_SUFFIX);

            let (mut merged, layout_spliced) =
                self.splice_partials(layout_fragment, &layout_dir, &page_path)?;
            let (page_fragment, page_spliced) =
                self.splice_partials(page_fragment, &page_dir, &page_path)?;
            if !merged.replace_first(&Token::Page, page_fragment) {
                warn!(
                    "layout {} has no ham/page slot; content of {} dropped",
                    layout_path.display(),
                    page_path.display()
                );
            }
            (merged, layout_spliced + page_spliced)
        };

        self.finish(page_path, page_dir, merged, resources, spliced)
    }

    /// Fill resource slots, then run the re-parse passes to a fixed point.
    fn finish(
        &mut self,
        page_path: PathBuf,
        page_dir: PathBuf,
        merged: Fragment,
        resources: ResourceSet,
        first_pass_spliced: usize,
    ) -> Result<CompiledPage, CompileError> {
        let urls = AssetUrls::new(&self.root, &self.config.assets_dir, self.version.clone());
        let css = resources.css_markup(&urls);
        let js = resources.js_markup(&urls);
        let mut merged = merged.substitute(|token| {
            Ok::<_, CompileError>(match token {
                Token::Css => Some(Fragment::from(css.as_str())),
                Token::Js => Some(Fragment::from(js.as_str())),
                _ => None,
            })
        })?;
        drop_leftover_slots(&mut merged, &page_path);

        let max_passes = self.config.embeds.max_passes;
        let mut html = merged.render();
        let mut passes = 1;
        let mut splicing_passes = usize::from(first_pass_spliced > 0);
        let mut partials = first_pass_spliced;
        let mut found = first_pass_spliced > 0;

        while found {
            passes += 1;
            let Extracted { fragment, meta } = extract_page(&dom::parse(&html));
            if !meta.embeds.is_empty() && splicing_passes >= max_passes {
                return Err(CompileError::PassLimit {
                    page: page_path,
                    passes: splicing_passes,
                });
            }
            let (mut fragment, spliced) = self.splice_partials(fragment, &page_dir, &page_path)?;
            drop_leftover_slots(&mut fragment, &page_path);
            html = fragment.render();

            found = spliced > 0;
            if found {
                splicing_passes += 1;
                partials += spliced;
            }
        }

        // Only a page that compiled leaves stub files behind.
        let stubs = if self.config.assets.create_missing {
            resources.ensure_stubs()?
        } else {
            Vec::new()
        };

        debug!(
            "{}: {} partials in {} passes",
            page_path.display(),
            partials,
            passes
        );
        Ok(CompiledPage {
            html,
            passes,
            partials,
            resources: resources.len(),
            stubs,
        })
    }

    /// Replace every partial token in `fragment` with the file's contents.
    ///
    /// Returns the new fragment and the number of partials spliced, counting
    /// unreadable ones spliced as empty under the `warn` policy.
    fn splice_partials(
        &mut self,
        fragment: Fragment,
        base_dir: &Path,
        page_path: &Path,
    ) -> Result<(Fragment, usize), CompileError> {
        let mut spliced = 0;
        let policy = self.config.embeds.on_missing;
        let root = &self.root;
        let cache = &mut self.cache;

        let fragment = fragment.substitute(|token| {
            let Token::Partial { src, replace } = token else {
                return Ok(None);
            };
            let path = resolve(root, base_dir, src);
            let content = match cache.read(&path) {
                Lookup::Found(content) => content.to_string(),
                Lookup::Missing => match policy {
                    MissingEmbedPolicy::Warn => {
                        warn!(
                            "{}: embedded file {} not found, splicing nothing",
                            page_path.display(),
                            path.display()
                        );
                        String::new()
                    }
                    MissingEmbedPolicy::Error => {
                        return Err(CompileError::MissingEmbed {
                            page: page_path.to_path_buf(),
                            embed: path,
                        });
                    }
                },
            };
            debug!("embedding {}", path.display());
            spliced += 1;
            Ok(Some(match replace {
                Some(directive) => Fragment::from(apply_replacements(
                    &content,
                    &parse_replace(directive),
                )),
                None => Fragment::from(content),
            }))
        })?;
        Ok((fragment, spliced))
    }

    fn embed_refs(&self, base_dir: &Path, embeds: &[Embed]) -> Vec<EmbedRef> {
        embeds
            .iter()
            .map(|e| EmbedRef {
                path: resolve(&self.root, base_dir, &e.src),
                replace: e.replace.clone(),
            })
            .collect()
    }

    /// Fail if the partials reachable from `roots` embed each other in a loop.
    fn check_cycles(
        &mut self,
        page_path: &Path,
        page_dir: &Path,
        roots: &[EmbedRef],
    ) -> Result<(), CompileError> {
        let root = &self.root;
        let cache = &mut self.cache;
        let cycle = find_cycle(roots, |node: &EmbedRef| {
            let Lookup::Found(content) = cache.read(&node.path) else {
                return Vec::new();
            };
            let content = match &node.replace {
                Some(directive) => apply_replacements(&content, &parse_replace(directive)),
                None => content.to_string(),
            };
            extract_page(&dom::parse(&content))
                .meta
                .embeds
                .iter()
                .map(|e| EmbedRef {
                    path: resolve(root, page_dir, &e.src),
                    replace: e.replace.clone(),
                })
                .collect()
        });

        match cycle {
            Some(chain) => Err(CompileError::EmbedCycle {
                page: page_path.to_path_buf(),
                chain: chain
                    .iter()
                    .map(|n| {
                        n.path
                            .strip_prefix(&self.root)
                            .unwrap_or(&n.path)
                            .display()
                            .to_string()
                    })
                    .collect::<Vec<_>>()
                    .join(" -> "),
            }),
            None => Ok(()),
        }
    }
}

/// Slot kinds the page needs but the layout never declares.
fn unslotted_kinds(layout: &Layout, resources: &ResourceSet) -> Vec<EmbedKind> {
    let wants_css = resources.iter().any(|r| r.kind == ResourceKind::Stylesheet);
    let wants_js = resources.iter().any(|r| r.kind != ResourceKind::Stylesheet);
    [
        (EmbedKind::LayoutCssSlot, wants_css),
        (EmbedKind::LayoutJsSlot, wants_js),
    ]
    .into_iter()
    .filter(|&(kind, wanted)| wanted && !layout.has_slot(kind))
    .map(|(kind, _)| kind)
    .collect()
}

/// Slot tokens that survive their pass have nowhere to go.
fn drop_leftover_slots(fragment: &mut Fragment, page_path: &Path) {
    for token in fragment.drop_slots() {
        warn!("{}: dropping unresolved {}", page_path.display(), token);
    }
}

fn write_page(target: &Path, html: &str) -> Result<(), CompileError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|source| CompileError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(target, html).map_err(|source| CompileError::Write {
        path: target.to_path_buf(),
        source,
    })
}
