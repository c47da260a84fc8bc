//! Entry point for building a whole project.
//!
//! [`Site::build`] is what callers outside the crate reach for: it opens the
//! project, compiles every page and copies the assets. All of the work lives
//! in [`crate::compile::Compiler`].

use crate::compile::{BuildSummary, CompileError, CompileEvent, Compiler};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Output directory used when none is given.
pub const DEFAULT_OUTPUT_DIR: &str = "./public";

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Source directory {} does not exist", .0.display())]
    SourceMissing(PathBuf),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

pub struct Site;

impl Site {
    /// Compile the project at `working_dir` into `output_dir`.
    pub fn build(
        working_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> Result<BuildSummary, SiteError> {
        Self::run(working_dir.as_ref(), output_dir.as_ref(), None)
    }

    /// Like [`Site::build`], reporting progress on `events`.
    pub fn build_with_events(
        working_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        events: Sender<CompileEvent>,
    ) -> Result<BuildSummary, SiteError> {
        Self::run(working_dir.as_ref(), output_dir.as_ref(), Some(events))
    }

    fn run(
        working_dir: &Path,
        output_dir: &Path,
        events: Option<Sender<CompileEvent>>,
    ) -> Result<BuildSummary, SiteError> {
        if !working_dir.is_dir() {
            return Err(SiteError::SourceMissing(working_dir.to_path_buf()));
        }
        let mut compiler = Compiler::new(working_dir, output_dir)?;
        if let Some(tx) = events {
            compiler = compiler.with_events(tx);
        }
        Ok(compiler.compile()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    #[test]
    fn missing_source_directory() {
        let tmp = TempDir::new().unwrap();
        let err = Site::build(tmp.path().join("nope"), tmp.path().join("out")).unwrap_err();
        assert!(matches!(err, SiteError::SourceMissing(_)));
    }

    #[test]
    fn directory_without_marker_is_not_a_project() {
        let tmp = TempDir::new().unwrap();
        let err = Site::build(tmp.path(), tmp.path().join("out")).unwrap_err();
        assert!(matches!(
            err,
            SiteError::Compile(CompileError::Config(ConfigError::NotAProject(_)))
        ));
        assert!(err.to_string().contains("is not a valid ham project"));
    }

    #[test]
    fn builds_fixture_site() {
        let tmp = setup_fixtures();
        let out = tmp.path().join("public");
        let summary = Site::build(tmp.path(), &out).unwrap();

        assert_eq!(summary.pages.len(), 2);
        assert!(out.join("index.html").is_file());
        assert!(out.join("about/team.html").is_file());
    }

    #[test]
    fn build_with_events_reports_each_page() {
        let tmp = setup_fixtures();
        let (tx, rx) = std::sync::mpsc::channel();
        Site::build_with_events(tmp.path(), tmp.path().join("public"), tx).unwrap();

        let compiled = rx
            .iter()
            .filter(|e| matches!(e, CompileEvent::PageCompiled { .. }))
            .count();
        assert_eq!(compiled, 2);
    }
}
