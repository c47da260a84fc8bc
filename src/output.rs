//! CLI output formatting for builds.
//!
//! # Output Format
//!
//! Pages are listed as they finish, each followed by an indented detail line.
//! Stub files show up above the page that asked for them:
//!
//! ```text
//!     Created: pages/about/team.css
//! about/team.html → public/about/team.html
//!     1 pass, 0 partials, 3 resources
//! index.html → public/index.html
//!     3 passes, 5 partials, 4 resources
//! Assets: 4 files copied
//!
//! Compiled 2 pages (5 partials, 1 stub)
//! Cache: 3 cached, 6 read (9 total)
//! ```
//!
//! # Architecture
//!
//! Each piece has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::compile::{BuildSummary, CompileEvent};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `2 pages`, `0 passes`.
fn count(n: usize, noun: &str) -> String {
    match n {
        1 => format!("{} {}", n, noun),
        _ if noun.ends_with('s') => format!("{} {}es", n, noun),
        _ => format!("{} {}s", n, noun),
    }
}

/// Format one progress event from a running build.
pub fn format_compile_event(event: &CompileEvent) -> Vec<String> {
    match event {
        CompileEvent::PageCompiled {
            page,
            output,
            passes,
            partials,
            resources,
        } => vec![
            format!("{} \u{2192} {}", page.display(), output.display()),
            format!(
                "{}{}, {}, {}",
                indent(1),
                count(*passes, "pass"),
                count(*partials, "partial"),
                count(*resources, "resource")
            ),
        ],
        CompileEvent::StubCreated { path } => {
            vec![format!("{}Created: {}", indent(1), path.display())]
        }
        CompileEvent::AssetsCopied { files } => {
            if *files == 0 {
                vec!["Assets: none".to_string()]
            } else {
                vec![format!("Assets: {} copied", count(*files, "file"))]
            }
        }
    }
}

/// Format the closing summary of a build.
pub fn format_build_summary(summary: &BuildSummary) -> Vec<String> {
    let partials: usize = summary.pages.iter().map(|p| p.partials).sum();
    let mut details = vec![count(partials, "partial")];
    if summary.stubs_created > 0 {
        details.push(count(summary.stubs_created, "stub"));
    }
    vec![
        format!(
            "Compiled {} ({})",
            count(summary.pages.len(), "page"),
            details.join(", ")
        ),
        format!("Cache: {}", summary.cache_stats),
    ]
}

pub fn print_compile_event(event: &CompileEvent) {
    for line in format_compile_event(event) {
        println!("{}", line);
    }
}

pub fn print_build_summary(summary: &BuildSummary) {
    for line in format_build_summary(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStats;
    use crate::compile::PageSummary;
    use std::path::PathBuf;

    fn page_summary(page: &str, partials: usize) -> PageSummary {
        PageSummary {
            page: PathBuf::from(page),
            output: PathBuf::from("public").join(page),
            passes: 1,
            partials,
            resources: 0,
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn count_pluralizes() {
        assert_eq!(count(0, "page"), "0 pages");
        assert_eq!(count(1, "page"), "1 page");
        assert_eq!(count(2, "pass"), "2 passes");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    // =========================================================================
    // Events
    // =========================================================================

    #[test]
    fn page_compiled_lines() {
        let lines = format_compile_event(&CompileEvent::PageCompiled {
            page: PathBuf::from("about/team.html"),
            output: PathBuf::from("public/about/team.html"),
            passes: 2,
            partials: 1,
            resources: 3,
        });
        assert_eq!(
            lines,
            vec![
                "about/team.html \u{2192} public/about/team.html",
                "    2 passes, 1 partial, 3 resources",
            ]
        );
    }

    #[test]
    fn stub_created_is_indented() {
        let lines = format_compile_event(&CompileEvent::StubCreated {
            path: PathBuf::from("pages/index.css"),
        });
        assert_eq!(lines, vec!["    Created: pages/index.css"]);
    }

    #[test]
    fn assets_copied_lines() {
        assert_eq!(
            format_compile_event(&CompileEvent::AssetsCopied { files: 4 }),
            vec!["Assets: 4 files copied"]
        );
        assert_eq!(
            format_compile_event(&CompileEvent::AssetsCopied { files: 0 }),
            vec!["Assets: none"]
        );
    }

    // =========================================================================
    // Summary
    // =========================================================================

    #[test]
    fn summary_counts_partials_and_stubs() {
        let summary = BuildSummary {
            pages: vec![page_summary("index.html", 3), page_summary("a.html", 2)],
            stubs_created: 1,
            assets_copied: 0,
            cache_stats: CacheStats { hits: 2, misses: 3 },
        };
        assert_eq!(
            format_build_summary(&summary),
            vec![
                "Compiled 2 pages (5 partials, 1 stub)",
                "Cache: 2 cached, 3 read (5 total)",
            ]
        );
    }

    #[test]
    fn summary_omits_zero_stubs() {
        let summary = BuildSummary {
            pages: vec![page_summary("index.html", 0)],
            ..Default::default()
        };
        let lines = format_build_summary(&summary);
        assert_eq!(lines[0], "Compiled 1 page (0 partials)");
    }
}
