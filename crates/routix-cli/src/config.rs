// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Routix project configuration.
//!
//! Configuration is loaded from `routix.toml` at the project root.
//!
//! # Example Configuration
//!
//! ```toml
//! preset = "svench"
//!
//! [source]
//! dir = "src"
//! extensions = [".svench", ".svench.svelte", ".md"]
//!
//! [output]
//! routes = ".svench/routes.js"
//! merged = true
//!
//! [manifest]
//! leading_slash = true
//!
//! [build]
//! debounce_ms = 50
//! ```

use crate::svench::SvenchPreset;
use routix::Options;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file.
pub const CONFIG_FILE: &str = "routix.toml";

/// Main configuration structure loaded from `routix.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Parse preset applied to every file.
    #[serde(default)]
    pub preset: Preset,
    /// Watched sources.
    #[serde(default)]
    pub source: SourceConfig,
    /// Generated files.
    #[serde(default)]
    pub output: OutputConfig,
    /// Manifest formatting.
    #[serde(default)]
    pub manifest: ManifestConfig,
    /// Scheduling.
    #[serde(default)]
    pub build: BuildConfig,
}

/// Parse preset.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Svench pages: ids, titles, sort keys and views as props.
    #[default]
    Svench,
    /// Bare items with no props.
    None,
}

/// Watched sources configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Directory containing page files (default: "src").
    #[serde(default = "default_source_dir")]
    pub dir: String,
    /// Watched extensions (default: Svench page extensions).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Ignored globs relative to `dir`.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

/// Generated files configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Routes file (default: ".svench/routes.js").
    #[serde(default = "default_routes_file")]
    pub routes: Option<String>,
    /// Separate tree file. Setting it disables `merged`.
    #[serde(default)]
    pub tree: Option<String>,
    /// Extras file.
    #[serde(default)]
    pub extras: Option<String>,
    /// Write the tree into the routes file (default: true).
    #[serde(default = "default_true")]
    pub merged: bool,
}

/// Manifest formatting configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ManifestConfig {
    /// Emit an `id` field per entry (default: true).
    #[serde(default = "default_true")]
    pub id: bool,
    /// Prefix paths with `/` (default: true).
    #[serde(default = "default_true")]
    pub leading_slash: bool,
    /// Import the module's default export (default: false).
    #[serde(default)]
    pub import_default: bool,
    /// Name of the lazy import property (default: "import").
    #[serde(default = "default_import_prop")]
    pub import_prop: String,
    /// Keep items marked empty (default: false).
    #[serde(default)]
    pub keep_empty: bool,
}

/// Scheduling configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct BuildConfig {
    /// Quiet period before a rebuild, in milliseconds (default: 50).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Time given to the watcher to notice a change, in milliseconds
    /// (default: 40).
    #[serde(default = "default_watch_delay_ms")]
    pub watch_delay_ms: u64,
}

fn default_source_dir() -> String {
    "src".to_string()
}

fn default_extensions() -> Vec<String> {
    [".svench", ".svench.svelte", ".svench.svx", ".md"]
        .map(String::from)
        .to_vec()
}

fn default_ignore() -> Vec<String> {
    ["**/node_modules/**", "**/.git/**"].map(String::from).to_vec()
}

fn default_routes_file() -> Option<String> {
    Some(".svench/routes.js".to_string())
}

fn default_import_prop() -> String {
    "import".to_string()
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    50
}

fn default_watch_delay_ms() -> u64 {
    40
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dir: default_source_dir(),
            extensions: default_extensions(),
            ignore: default_ignore(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            routes: default_routes_file(),
            tree: None,
            extras: None,
            merged: true,
        }
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            id: true,
            leading_slash: true,
            import_default: false,
            import_prop: default_import_prop(),
            keep_empty: false,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            watch_delay_ms: default_watch_delay_ms(),
        }
    }
}

impl Config {
    /// Loads configuration from `routix.toml` in the current directory.
    ///
    /// If no configuration file exists, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be parsed.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Loads configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Builds library options. Relative paths are resolved against `root`.
    pub fn to_options(&self, root: &Path) -> Options {
        let resolve = |p: &str| -> PathBuf { root.join(p) };

        let mut options = Options::new(resolve(&self.source.dir))
            .with_extensions(&self.source.extensions)
            .with_merged(self.output.merged)
            .with_leading_slash(self.manifest.leading_slash)
            .with_build_debounce(Duration::from_millis(self.build.debounce_ms));
        options.ignore = self.source.ignore.clone();
        options.id = self.manifest.id;
        options.import_default = self.manifest.import_default;
        options.import_prop = self.manifest.import_prop.clone();
        options.keep_empty = self.manifest.keep_empty;
        options.watch_delay = Duration::from_millis(self.build.watch_delay_ms);

        if let Some(routes) = &self.output.routes {
            options = options.with_routes_file(resolve(routes));
        }
        if let Some(tree) = &self.output.tree {
            options = options.with_tree_file(resolve(tree));
        }
        if let Some(extras) = &self.output.extras {
            options = options.with_extras_file(resolve(extras));
        }

        match self.preset {
            Preset::Svench => SvenchPreset::default().apply(options),
            Preset::None => options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_missing() {
        let config = Config::load_from(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.preset, Preset::Svench);
        assert_eq!(config.source.dir, "src");
        assert_eq!(config.output.routes.as_deref(), Some(".svench/routes.js"));
        assert!(config.output.merged);
        assert_eq!(config.build.debounce_ms, 50);
    }

    #[test]
    fn test_parse_sections() {
        let config: Config = toml::from_str(
            r#"
            preset = "none"

            [source]
            dir = "pages"
            extensions = ["md"]

            [output]
            routes = "out/routes.js"
            tree = "out/tree.js"

            [manifest]
            id = false
            import_prop = "load"

            [build]
            debounce_ms = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.preset, Preset::None);
        assert_eq!(config.source.ignore, default_ignore());

        let options = config.to_options(Path::new("/project"));
        assert_eq!(options.dir, PathBuf::from("/project/pages"));
        assert_eq!(options.extensions, vec![".md"]);
        assert_eq!(options.write.tree, Some(PathBuf::from("/project/out/tree.js")));
        assert!(!options.merged);
        assert!(!options.id);
        assert_eq!(options.import_prop, "load");
        assert_eq!(options.build_debounce, Duration::from_millis(10));
    }

    #[test]
    fn test_svench_preset_disables_top_level_id() {
        let options = Config::default().to_options(Path::new("/project"));
        assert!(!options.id);
        assert!(options.sort_children.is_some());
        assert!(options.resolve_conflict.is_some());
    }
}
