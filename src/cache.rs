//! Build-scoped read cache for layouts and partials.
//!
//! Most sites share one layout and a handful of partials across every page.
//! The compiler reads them through a [`ReadCache`] owned by the build session,
//! so each file is read from storage once per build no matter how many pages
//! embed it.
//!
//! # Design
//!
//! - **Populated on first read.** A path is read the first time it is asked
//!   for; later lookups return the stored contents without touching storage.
//! - **Failures are not cached.** A read that fails returns
//!   [`Lookup::Missing`] and leaves no entry behind, so a later lookup retries.
//! - **No invalidation.** Files are assumed stable for the duration of one
//!   build. A new build gets a new cache.
//!
//! The backing store is a [`SourceReader`], injected at construction.
//! [`FsReader`] reads the real filesystem; [`MemoryReader`] is an in-memory
//! store for tests and for callers that compile generated sources.

use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Where source files come from.
pub trait SourceReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    fn exists(&self, path: &Path) -> bool;
}

/// Reads from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    /// Bytes that aren't valid UTF-8 are replaced rather than failing the read,
    /// so only genuine I/O errors surface as errors.
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                debug!("{} is not valid UTF-8, decoding lossily", path.display());
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// An in-memory file store.
///
/// Counts reads per path so tests can assert that the cache only touched
/// storage once.
#[derive(Debug, Default)]
pub struct MemoryReader {
    files: HashMap<PathBuf, String>,
    reads: RefCell<HashMap<PathBuf, u32>>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    /// How many times `path` was read from this store.
    pub fn reads(&self, path: &Path) -> u32 {
        self.reads.borrow().get(path).copied().unwrap_or(0)
    }
}

impl SourceReader for MemoryReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        *self
            .reads
            .borrow_mut()
            .entry(path.to_path_buf())
            .or_default() += 1;
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not in memory store", path.display()),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Rc<str>),
    Missing,
}

/// Path → contents, for the lifetime of one build.
#[derive(Debug)]
pub struct ReadCache<R> {
    reader: R,
    entries: HashMap<PathBuf, Rc<str>>,
    stats: CacheStats,
}

impl<R: SourceReader> ReadCache<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Return the contents of `path`, reading it on first use.
    pub fn read(&mut self, path: &Path) -> Lookup {
        if let Some(contents) = self.entries.get(path) {
            self.stats.hit();
            return Lookup::Found(Rc::clone(contents));
        }
        match self.reader.read_to_string(path) {
            Ok(contents) => {
                self.stats.miss();
                let contents: Rc<str> = contents.into();
                self.entries
                    .insert(path.to_path_buf(), Rc::clone(&contents));
                Lookup::Found(contents)
            }
            Err(e) => {
                debug!("read failed for {}: {}", path.display(), e);
                Lookup::Missing
            }
        }
    }

    /// Whether `path` exists, either cached or in the backing store.
    pub fn exists(&self, path: &Path) -> bool {
        self.entries.contains_key(path) || self.reader.exists(path)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }
}

/// Summary of cache performance for a build run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} read ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} read", self.misses)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // ReadCache
    // =========================================================================

    #[test]
    fn first_read_populates_then_hits() {
        let store = MemoryReader::new().with_file("/p/layout.html", "<html></html>");
        let mut cache = ReadCache::new(store);

        let a = cache.read(Path::new("/p/layout.html"));
        let b = cache.read(Path::new("/p/layout.html"));

        assert_eq!(a, Lookup::Found("<html></html>".into()));
        assert_eq!(a, b);
        assert_eq!(cache.reader().reads(Path::new("/p/layout.html")), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn missing_file_is_not_cached() {
        let mut cache = ReadCache::new(MemoryReader::new());
        let path = Path::new("/p/gone.html");

        assert_eq!(cache.read(path), Lookup::Missing);
        assert_eq!(cache.read(path), Lookup::Missing);
        assert_eq!(cache.reader().reads(path), 2);
        assert_eq!(cache.stats().total(), 0);
    }

    #[test]
    fn exists_checks_backing_store() {
        let cache = ReadCache::new(MemoryReader::new().with_file("/a.html", ""));
        assert!(cache.exists(Path::new("/a.html")));
        assert!(!cache.exists(Path::new("/b.html")));
    }

    #[test]
    fn fs_reader_reads_real_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("partial.html");
        fs::write(&path, "<p>hi</p>").unwrap();

        let mut cache = ReadCache::new(FsReader);
        assert!(cache.exists(&path));
        assert_eq!(cache.read(&path), Lookup::Found("<p>hi</p>".into()));

        // Cached contents survive the file changing underneath.
        fs::write(&path, "<p>changed</p>").unwrap();
        assert_eq!(cache.read(&path), Lookup::Found("<p>hi</p>".into()));
    }

    #[test]
    fn fs_reader_decodes_invalid_utf8_lossily() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("latin1.html");
        fs::write(&path, b"Caf\xe9").unwrap();

        assert_eq!(FsReader.read_to_string(&path).unwrap(), "Caf\u{fffd}");
        let mut cache = ReadCache::new(FsReader);
        assert_eq!(cache.read(&path), Lookup::Found("Caf\u{fffd}".into()));
    }

    #[test]
    fn fs_reader_directory_is_not_a_file() {
        let tmp = TempDir::new().unwrap();
        assert!(!FsReader.exists(tmp.path()));
        let mut cache = ReadCache::new(FsReader);
        assert_eq!(cache.read(tmp.path()), Lookup::Missing);
    }

    // =========================================================================
    // CacheStats
    // =========================================================================

    #[test]
    fn cache_stats_display_with_hits() {
        let s = CacheStats { hits: 5, misses: 2 };
        assert_eq!(format!("{}", s), "5 cached, 2 read (7 total)");
    }

    #[test]
    fn cache_stats_display_no_hits() {
        let s = CacheStats { hits: 0, misses: 3 };
        assert_eq!(format!("{}", s), "3 read");
    }
}
