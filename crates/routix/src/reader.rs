// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Directory scanning and file system watching.
//!
//! The reader feeds a [`BuildHandle`] with file events:
//!
//! - [`scan`] lists the files already present when a session starts
//! - [`FileWatcher`] reports later changes, debounced with
//!   `notify-debouncer-full`
//!
//! Both apply the same [`PathFilter`]: ignore globs, watched extensions and
//! generated outputs.

use crate::build::{posixify, BuildHandle};
use crate::error::{Result, RoutixError};
use crate::item::FileEvent;
use crate::options::Options;
use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Quiet period of the watcher before it reports a batch of events.
const WATCH_DEBOUNCE: Duration = Duration::from_millis(20);

/// Decides which paths under the watched directory are route files.
#[derive(Debug, Clone)]
pub struct PathFilter {
    dir: PathBuf,
    ignore: GlobSet,
    extensions: Vec<String>,
    targets: Vec<PathBuf>,
}

impl PathFilter {
    /// Compiles the ignore globs of `options`.
    pub fn new(options: &Options) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &options.ignore {
            let glob = Glob::new(pattern)
                .map_err(|e| RoutixError::Pattern(format!("{}: {}", pattern, e)))?;
            builder.add(glob);
        }
        let ignore = builder
            .build()
            .map_err(|e| RoutixError::Pattern(e.to_string()))?;

        let targets = [&options.write.routes, &options.write.tree, &options.write.extras]
            .into_iter()
            .flatten()
            .cloned()
            .collect();

        Ok(Self {
            dir: options.dir.clone(),
            ignore,
            extensions: options.extensions.clone(),
            targets,
        })
    }

    /// Path relative to the watched directory, `/`-separated.
    pub fn relative(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.dir).ok()?;
        let relative = posixify(relative);
        (!relative.is_empty()).then_some(relative)
    }

    /// Returns true if the relative path matches an ignore glob.
    pub fn is_ignored(&self, relative: &str) -> bool {
        self.ignore.is_match(relative)
    }

    /// Returns true if `path` is a generated output.
    pub fn is_write_target(&self, path: &Path) -> bool {
        self.targets.iter().any(|t| t == path)
    }

    /// Returns true if the file at `path` should become a route item.
    pub fn accepts(&self, path: &Path, relative: &str) -> bool {
        !self.is_ignored(relative)
            && self.extensions.iter().any(|ext| relative.ends_with(ext.as_str()))
            && !self.is_write_target(path)
    }
}

/// Lists route files under the watched directory, sorted, as relative paths.
pub fn scan(filter: &PathFilter) -> Result<Vec<String>> {
    scan_dir(filter, &filter.dir)
}

fn scan_dir(filter: &PathFilter, dir: &Path) -> Result<Vec<String>> {
    let pattern = format!(
        "{}/**/*",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let entries = glob::glob(&pattern).map_err(|e| RoutixError::Pattern(e.to_string()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                warn!(error = %err, "Skipping unreadable path");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        if let Some(relative) = filter.relative(&path) {
            if filter.accepts(&path, &relative) {
                files.push(relative);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Relative paths of the files reported so far.
pub type KnownFiles = Arc<Mutex<HashSet<String>>>;

/// Watches the directory recursively and forwards changes to a build
/// session.
pub struct FileWatcher {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

impl FileWatcher {
    /// Starts watching `filter`'s directory. `known` holds the files
    /// already reported, so that writes to them become updates.
    pub fn new(filter: PathFilter, build: BuildHandle, known: KnownFiles) -> Result<Self> {
        let dir = filter.dir.clone();
        let dispatcher = Dispatcher {
            filter,
            build,
            known,
        };

        let mut debouncer = new_debouncer(WATCH_DEBOUNCE, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let paths: BTreeSet<PathBuf> = events
                        .iter()
                        .filter(|e| !matches!(e.kind, EventKind::Access(_)))
                        .flat_map(|e| e.paths.iter().cloned())
                        .collect();
                    for path in paths {
                        dispatcher.dispatch(&path);
                    }
                }
                Err(errors) => {
                    for error in errors {
                        warn!(error = %error, "Watch error");
                    }
                }
            }
        })?;

        debouncer.watch(&dir, RecursiveMode::Recursive)?;
        debug!(dir = %dir.display(), "Watching");

        Ok(Self {
            _debouncer: debouncer,
        })
    }
}

struct Dispatcher {
    filter: PathFilter,
    build: BuildHandle,
    known: KnownFiles,
}

impl Dispatcher {
    fn dispatch(&self, path: &Path) {
        let Some(relative) = self.filter.relative(path) else {
            return;
        };
        if self.filter.is_ignored(&relative) {
            return;
        }
        let mut known = self.known.lock().unwrap_or_else(PoisonError::into_inner);

        if path.is_file() {
            if !self.filter.accepts(path, &relative) {
                return;
            }
            if known.insert(relative.clone()) {
                self.build.add(FileEvent::file(relative));
            } else {
                self.build.update(FileEvent::file(relative));
            }
        } else if path.is_dir() {
            // a directory moved in brings its files along
            match scan_dir(&self.filter, path) {
                Ok(files) => {
                    for file in files {
                        if known.insert(file.clone()) {
                            self.build.add(FileEvent::file(file));
                        }
                    }
                }
                Err(err) => warn!(error = %err, "Failed to scan new directory"),
            }
        } else if known.remove(&relative) {
            self.build.remove(FileEvent::file(relative));
        } else {
            let prefix = format!("{}/", relative);
            let gone: Vec<String> = known
                .iter()
                .filter(|f| f.starts_with(&prefix))
                .cloned()
                .collect();
            for file in gone {
                known.remove(&file);
                self.build.remove(FileEvent::file(file));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn filter(dir: &Path) -> PathFilter {
        let options = Options::new(dir)
            .with_extensions(["svench", "md"])
            .with_routes_file(dir.join("routes.md"));
        PathFilter::new(&options).unwrap()
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::create_dir_all(dir.join("b/c")).unwrap();
        fs::create_dir_all(dir.join("node_modules/pkg")).unwrap();
        fs::write(dir.join("b/c/d.svench"), "").unwrap();
        fs::write(dir.join("a.md"), "").unwrap();
        fs::write(dir.join("a.js"), "").unwrap();
        fs::write(dir.join("routes.md"), "").unwrap();
        fs::write(dir.join("node_modules/pkg/x.svench"), "").unwrap();

        let files = scan(&filter(dir)).unwrap();
        assert_eq!(files, vec!["a.md", "b/c/d.svench"]);
    }

    #[test]
    fn test_filter_relative_paths() {
        let filter = filter(Path::new("/src"));
        assert_eq!(filter.relative(Path::new("/src/a/b.md")).as_deref(), Some("a/b.md"));
        assert_eq!(filter.relative(Path::new("/src")), None);
        assert_eq!(filter.relative(Path::new("/elsewhere/a.md")), None);
        assert!(filter.is_ignored(".git/HEAD.md"));
        assert!(filter.accepts(Path::new("/src/a.md"), "a.md"));
        assert!(!filter.accepts(Path::new("/src/routes.md"), "routes.md"));
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        let mut options = Options::new("/src");
        options.ignore = vec!["a[".to_string()];
        assert!(matches!(PathFilter::new(&options), Err(RoutixError::Pattern(_))));
    }
}
