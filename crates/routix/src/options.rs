// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Build options and collaborator hooks.
//!
//! [`Options`] carries everything a build session needs: the watched
//! directory, write targets, manifest formatting flags and the pluggable
//! collaborators ([`Parse`], [`ResolveConflict`], [`WriteFile`]).
//!
//! ```rust,ignore
//! use routix::Options;
//!
//! let options = Options::new("src")
//!     .with_extensions(["svench", ".md"])
//!     .with_routes_file(".routix/routes.js")
//!     .with_leading_slash(true);
//! ```

use crate::error::Result;
use crate::item::RouteItem;
use crate::write::{FsWriter, WriteFile};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a parse hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parsed {
    /// Keep the (possibly modified) item.
    Keep,
    /// Drop the file; its event will not trigger a build.
    Cancel,
}

/// Async hook that enriches a freshly discovered item.
///
/// Called for files (`item.is_file == true`) when they are added or updated,
/// and for directory records synthesized by the tree builder.
#[async_trait]
pub trait Parse: Send + Sync {
    /// Inspects and mutates `item`. `previous` is the last accepted version
    /// of the same file, if any.
    async fn parse(
        &self,
        item: &mut RouteItem,
        previous: Option<&RouteItem>,
        options: &Options,
    ) -> Result<Parsed>;
}

/// Parse hook that accepts every item unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

#[async_trait]
impl Parse for Identity {
    async fn parse(
        &self,
        _item: &mut RouteItem,
        _previous: Option<&RouteItem>,
        _options: &Options,
    ) -> Result<Parsed> {
        Ok(Parsed::Keep)
    }
}

/// Resolves two files claiming the same logical path.
///
/// Receives copies of the new and existing items; returning `true` means
/// both copies were adjusted (usually given distinct paths) and should be
/// inserted in place of the originals.
pub trait ResolveConflict: Send + Sync {
    /// Attempts a resolution.
    fn resolve(&self, new_file: &mut RouteItem, existing: &mut RouteItem) -> bool;
}

impl<F> ResolveConflict for F
where
    F: Fn(&mut RouteItem, &mut RouteItem) -> bool + Send + Sync,
{
    fn resolve(&self, new_file: &mut RouteItem, existing: &mut RouteItem) -> bool {
        self(new_file, existing)
    }
}

/// Ordering applied to files, dirs or tree children.
pub type Comparator = Arc<dyn Fn(&RouteItem, &RouteItem) -> Ordering + Send + Sync>;

/// Maps an absolute file path to the specifier used in `import(...)`.
pub type ImportResolver = Arc<dyn Fn(&Path) -> String + Send + Sync>;

/// Output files. A `None` target is not generated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteTargets {
    /// Flat routes list (also receives the tree when `merged` is set).
    pub routes: Option<PathBuf>,
    /// Hierarchical tree.
    pub tree: Option<PathBuf>,
    /// Extras payload keyed by id.
    pub extras: Option<PathBuf>,
}

/// Configuration of a build session.
#[derive(Clone)]
pub struct Options {
    /// Watched directory (absolute once the session starts).
    pub dir: PathBuf,
    /// Watched extensions, each with a leading dot.
    pub extensions: Vec<String>,
    /// Glob patterns of ignored paths, relative to `dir`.
    pub ignore: Vec<String>,
    /// Output files.
    pub write: WriteTargets,
    /// Write routes and tree into the routes file.
    pub merged: bool,
    /// Emit an `id` field for each entry.
    pub id: bool,
    /// Keep watching after the initial scan.
    pub watch: bool,
    /// Grace period given to the watcher to notice a change before
    /// [`on_idle`](crate::Routix::on_idle) resolves.
    pub watch_delay: Duration,
    /// Prefix route paths with `/`.
    pub leading_slash: bool,
    /// Resolve imports to the module's default export.
    pub import_default: bool,
    /// Name of the lazy import property.
    pub import_prop: String,
    /// Keep items marked empty in the routes list.
    pub keep_empty: bool,
    /// Cache tree child lists between builds.
    pub cache_children: bool,
    /// Quiet period before a build starts.
    pub build_debounce: Duration,
    /// Import specifier resolver.
    pub resolve: Option<ImportResolver>,
    /// Parse hook.
    pub parse: Arc<dyn Parse>,
    /// Output writer.
    pub writer: Arc<dyn WriteFile>,
    /// Ordering of the files list.
    pub sort_files: Option<Comparator>,
    /// Ordering of the dirs list.
    pub sort_dirs: Option<Comparator>,
    /// Ordering of tree children.
    pub sort_children: Option<Comparator>,
    /// Conflict resolver.
    pub resolve_conflict: Option<Arc<dyn ResolveConflict>>,
}

impl Options {
    /// Creates options for the given directory with default settings.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extensions: Vec::new(),
            ignore: default_ignore(),
            write: WriteTargets::default(),
            merged: true,
            id: true,
            watch: false,
            watch_delay: Duration::from_millis(40),
            leading_slash: false,
            import_default: false,
            import_prop: "import".to_string(),
            keep_empty: false,
            cache_children: true,
            build_debounce: Duration::from_millis(50),
            resolve: None,
            parse: Arc::new(Identity),
            writer: Arc::new(FsWriter),
            sort_files: None,
            sort_dirs: None,
            sort_children: None,
            resolve_conflict: None,
        }
    }

    /// Sets watched extensions (a leading dot is added when missing).
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = parse_extensions(extensions);
        self
    }

    /// Sets the routes output file.
    pub fn with_routes_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.write.routes = Some(path.into());
        self
    }

    /// Sets the tree output file and disables merged output.
    pub fn with_tree_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.write.tree = Some(path.into());
        self.merged = false;
        self
    }

    /// Sets the extras output file.
    pub fn with_extras_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.write.extras = Some(path.into());
        self
    }

    /// Enables or disables merged routes + tree output.
    pub fn with_merged(mut self, merged: bool) -> Self {
        self.merged = merged;
        self
    }

    /// Enables route path leading slashes.
    pub fn with_leading_slash(mut self, leading_slash: bool) -> Self {
        self.leading_slash = leading_slash;
        self
    }

    /// Enables or disables watch mode.
    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// Sets the build debounce window.
    pub fn with_build_debounce(mut self, debounce: Duration) -> Self {
        self.build_debounce = debounce;
        self
    }

    /// Sets the parse hook.
    pub fn with_parser(mut self, parse: impl Parse + 'static) -> Self {
        self.parse = Arc::new(parse);
        self
    }

    /// Sets the output writer.
    pub fn with_writer(mut self, writer: Arc<dyn WriteFile>) -> Self {
        self.writer = writer;
        self
    }

    /// Sets the conflict resolver.
    pub fn with_conflict_resolver(mut self, resolver: impl ResolveConflict + 'static) -> Self {
        self.resolve_conflict = Some(Arc::new(resolver));
        self
    }

    /// Sets the files comparator.
    pub fn with_sort_files(
        mut self,
        compare: impl Fn(&RouteItem, &RouteItem) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.sort_files = Some(Arc::new(compare));
        self
    }

    /// Sets the tree children comparator.
    pub fn with_sort_children(
        mut self,
        compare: impl Fn(&RouteItem, &RouteItem) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.sort_children = Some(Arc::new(compare));
        self
    }

    /// Whether the routes list is generated.
    pub fn has_routes(&self) -> bool {
        self.write.routes.is_some() || self.has_tree()
    }

    /// Whether the tree is generated.
    pub fn has_tree(&self) -> bool {
        self.merged || self.write.tree.is_some()
    }

    /// Whether the extras manifest is generated.
    pub fn has_extras(&self) -> bool {
        self.write.extras.is_some()
    }

    /// Root path of the tree.
    pub fn root_path(&self) -> &'static str {
        if self.leading_slash {
            "/"
        } else {
            ""
        }
    }

    /// Returns true if `path` ends with one of the watched extensions.
    pub fn is_watched_file(&self, path: &str) -> bool {
        self.extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }

    /// Returns true if `path` is one of the generated output files.
    pub fn is_write_target(&self, path: &Path) -> bool {
        [&self.write.routes, &self.write.tree, &self.write.extras]
            .into_iter()
            .flatten()
            .any(|target| target == path)
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new(".")
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("dir", &self.dir)
            .field("extensions", &self.extensions)
            .field("ignore", &self.ignore)
            .field("write", &self.write)
            .field("merged", &self.merged)
            .field("id", &self.id)
            .field("watch", &self.watch)
            .field("leading_slash", &self.leading_slash)
            .field("build_debounce", &self.build_debounce)
            .finish_non_exhaustive()
    }
}

fn default_ignore() -> Vec<String> {
    vec!["**/node_modules/**".to_string(), "**/.git/**".to_string()]
}

/// Normalizes extensions so that each one starts with a dot.
pub fn parse_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|ext| {
            let ext = ext.as_ref();
            if ext.starts_with('.') {
                ext.to_string()
            } else {
                format!(".{}", ext)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extensions_adds_dot() {
        assert_eq!(
            parse_extensions(["svench", ".md", "svench.svelte"]),
            vec![".svench", ".md", ".svench.svelte"]
        );
    }

    #[test]
    fn test_merged_implies_tree() {
        let options = Options::new("src").with_routes_file("routes.js");
        assert!(options.merged);
        assert!(options.has_tree());
        assert!(options.has_routes());

        let options = options.with_tree_file("tree.js");
        assert!(!options.merged);
        assert!(options.has_tree());
    }

    #[test]
    fn test_is_write_target() {
        let options = Options::new("src")
            .with_routes_file("/out/routes.js")
            .with_extras_file("/out/extras.js");
        assert!(options.is_write_target(Path::new("/out/routes.js")));
        assert!(options.is_write_target(Path::new("/out/extras.js")));
        assert!(!options.is_write_target(Path::new("/out/tree.js")));
    }

    #[test]
    fn test_is_watched_file() {
        let options = Options::new("src").with_extensions(["svench"]);
        assert!(options.is_watched_file("a/b.svench"));
        assert!(!options.is_watched_file("a/b.svelte"));
    }
}
