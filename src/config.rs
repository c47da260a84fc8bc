//! Project configuration module.
//!
//! A directory is a ham project when it contains a `ham.json` marker file.
//! The marker doubles as the configuration file: an empty file or `{}` means
//! "all defaults", and any key given overrides the stock value.
//!
//! ## Configuration Options
//!
//! ```json
//! {
//!   "pages_dir": "pages",
//!   "assets_dir": "assets",
//!   "assets": {
//!     "cache_bust": true,
//!     "create_missing": true,
//!     "page_assets": true
//!   },
//!   "embeds": {
//!     "on_missing": "warn",
//!     "max_passes": 1000
//!   }
//! }
//! ```
//!
//! - `pages_dir`: directory scanned (recursively) for `.html` pages.
//! - `assets_dir`: directory copied verbatim to `<output>/assets`.
//! - `assets.cache_bust`: append `?v=<build timestamp>` to resource URLs.
//! - `assets.create_missing`: create empty CSS/JS files for references that
//!   don't exist yet.
//! - `assets.page_assets`: link `foo.css` and `foo.ts` for every `foo.html`.
//! - `embeds.on_missing`: `"warn"` splices nothing for an unreadable partial,
//!   `"error"` fails the page.
//! - `embeds.max_passes`: upper bound on resolution passes per page.
//!
//! Unknown keys are rejected so typos surface instead of being ignored.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the marker/config file at the project root.
pub const MARKER_FILE: &str = "ham.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{} is not a valid ham project (no ham.json)", .0.display())]
    NotAProject(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `ham.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Pages directory, relative to the project root.
    pub pages_dir: String,
    /// Assets directory, relative to the project root.
    pub assets_dir: String,
    pub assets: AssetsConfig,
    pub embeds: EmbedsConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            pages_dir: "pages".to_string(),
            assets_dir: "assets".to_string(),
            assets: AssetsConfig::default(),
            embeds: EmbedsConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pages_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "pages_dir must not be empty".into(),
            ));
        }
        if self.assets_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "assets_dir must not be empty".into(),
            ));
        }
        if self.embeds.max_passes == 0 {
            return Err(ConfigError::Validation(
                "embeds.max_passes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    pub cache_bust: bool,
    pub create_missing: bool,
    pub page_assets: bool,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            cache_bust: true,
            create_missing: true,
            page_assets: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbedsConfig {
    pub on_missing: MissingEmbedPolicy,
    pub max_passes: usize,
}

impl Default for EmbedsConfig {
    fn default() -> Self {
        Self {
            on_missing: MissingEmbedPolicy::Warn,
            max_passes: 1000,
        }
    }
}

/// What to do when a partial cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingEmbedPolicy {
    /// Log a warning and splice empty content.
    #[default]
    Warn,
    /// Fail the page.
    Error,
}

/// Parse and validate the contents of a `ham.json` file.
///
/// Whitespace-only content is treated as `{}`.
pub fn parse_config(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig = if content.trim().is_empty() {
        ProjectConfig::default()
    } else {
        serde_json::from_str(content)?
    };
    config.validate()?;
    Ok(config)
}

/// Load config from `ham.json` in the project root.
///
/// Fails with [`ConfigError::NotAProject`] if the marker file is absent.
pub fn load_config(root: &Path) -> Result<ProjectConfig, ConfigError> {
    let path = root.join(MARKER_FILE);
    if !path.is_file() {
        return Err(ConfigError::NotAProject(root.to_path_buf()));
    }
    let content = fs::read_to_string(&path)?;
    parse_config(&content)
}

/// Returns the stock `ham.json` with every key at its default value.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_json() -> String {
    serde_json::to_string_pretty(&ProjectConfig::default())
        .expect("default config must serialize")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ProjectConfig::default();
        assert_eq!(config.pages_dir, "pages");
        assert_eq!(config.assets_dir, "assets");
        assert!(config.assets.cache_bust);
        assert!(config.assets.create_missing);
        assert!(config.assets.page_assets);
        assert_eq!(config.embeds.on_missing, MissingEmbedPolicy::Warn);
        assert_eq!(config.embeds.max_passes, 1000);
    }

    #[test]
    fn parse_partial_config() {
        let json = r#"{ "assets": { "cache_bust": false } }"#;
        let config = parse_config(json).unwrap();
        // Overridden value
        assert!(!config.assets.cache_bust);
        // Default values preserved
        assert!(config.assets.create_missing);
        assert_eq!(config.pages_dir, "pages");
    }

    #[test]
    fn parse_embed_policy() {
        let config = parse_config(r#"{"embeds": {"on_missing": "error", "max_passes": 5}}"#).unwrap();
        assert_eq!(config.embeds.on_missing, MissingEmbedPolicy::Error);
        assert_eq!(config.embeds.max_passes, 5);
    }

    #[test]
    fn empty_and_blank_content_mean_defaults() {
        assert_eq!(parse_config("").unwrap(), ProjectConfig::default());
        assert_eq!(parse_config("  \n").unwrap(), ProjectConfig::default());
        assert_eq!(parse_config("{}").unwrap(), ProjectConfig::default());
    }

    #[test]
    fn unknown_keys_rejected() {
        let result = parse_config(r#"{"page_dir": "src"}"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn unknown_policy_rejected() {
        let result = parse_config(r#"{"embeds": {"on_missing": "ignore"}}"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_rejects_zero_passes() {
        let result = parse_config(r#"{"embeds": {"max_passes": 0}}"#);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_empty_dirs() {
        let mut config = ProjectConfig::default();
        config.pages_dir = " ".into();
        assert!(config.validate().is_err());

        let mut config = ProjectConfig::default();
        config.assets_dir = String::new();
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_requires_marker() {
        let tmp = TempDir::new().unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotAProject(_)));
        assert!(err.to_string().contains("is not a valid ham project"));
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(MARKER_FILE), r#"{"pages_dir": "src/pages"}"#).unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.pages_dir, "src/pages");
    }

    #[test]
    fn load_config_empty_marker_is_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(MARKER_FILE), "").unwrap();
        assert_eq!(load_config(tmp.path()).unwrap(), ProjectConfig::default());
    }

    #[test]
    fn stock_config_parses_back_to_defaults() {
        let json = stock_config_json();
        assert!(json.contains("\"max_passes\": 1000"));
        assert!(json.contains("\"on_missing\": \"warn\""));
        assert_eq!(parse_config(&json).unwrap(), ProjectConfig::default());
    }
}
