//! Shared test utilities for the ham test suite.
//!
//! Provides the fixture project copy plus lookups over compiled output that
//! panic with the available alternatives when something is missing.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let out = tmp.path().join("public");
//! Compiler::new(tmp.path(), &out).unwrap().compile().unwrap();
//!
//! let index = read_output(&out, "index.html");
//! assert_eq!(count_occurrences(&index, "<link rel=\"stylesheet\""), 2);
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/test-site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/test-site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Output lookups (panic with a clear message on miss)
// =========================================================================

/// Every file under `dir`, relative and sorted.
pub fn output_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect()
}

/// Read a compiled file from the output directory. Panics if absent.
pub fn read_output(out: &Path, rel: &str) -> String {
    std::fs::read_to_string(out.join(rel)).unwrap_or_else(|_| {
        let files = output_files(out);
        panic!("output '{rel}' not found. Available: {files:?}")
    })
}

// =========================================================================
// Markup helpers
// =========================================================================

/// Non-overlapping occurrences of `needle` in `haystack`.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

/// Byte offset of `needle`. Panics with the document if absent.
pub fn position_of(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("'{needle}' not found in:\n{haystack}"))
}
