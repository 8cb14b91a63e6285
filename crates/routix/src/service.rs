// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The [`Routix`] service: a build session fed by a directory scan and,
//! optionally, a file watcher.

use crate::build::BuildHandle;
use crate::error::{Result, RoutixError};
use crate::item::{FileEvent, RouteItem};
use crate::options::Options;
use crate::reader::{scan, FileWatcher, KnownFiles, PathFilter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tracing::info;

/// A running route manifest generator.
///
/// ```rust,ignore
/// let routix = Routix::start(
///     Options::new("src")
///         .with_extensions(["svench"])
///         .with_routes_file(".svench/routes.js"),
/// )
/// .await?;
/// routix.on_idle(None).await?;
/// routix.close();
/// ```
pub struct Routix {
    options: Arc<Options>,
    build: BuildHandle,
    filter: PathFilter,
    watcher: Option<FileWatcher>,
}

impl Routix {
    /// Scans `options.dir`, starts watching it when `options.watch` is set
    /// and triggers the first build.
    ///
    /// Relative directory and output paths are resolved against the
    /// current directory.
    pub async fn start(mut options: Options) -> Result<Self> {
        options.dir = absolutize(&options.dir)?;
        for target in [
            &mut options.write.routes,
            &mut options.write.tree,
            &mut options.write.extras,
        ]
        .into_iter()
        .flatten()
        {
            *target = absolutize(target)?;
        }

        if !options.dir.is_dir() {
            return Err(RoutixError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Directory not found: {}", options.dir.display()),
            )));
        }

        let filter = PathFilter::new(&options)?;
        let build = BuildHandle::spawn(options.clone());
        let known = KnownFiles::default();

        let watcher = if options.watch {
            Some(FileWatcher::new(filter.clone(), build.clone(), known.clone())?)
        } else {
            None
        };

        let files = {
            let filter = filter.clone();
            tokio::task::spawn_blocking(move || scan(&filter))
                .await
                .map_err(|e| RoutixError::Io(std::io::Error::other(e)))??
        };

        let count = files.len();
        {
            let mut known = known.lock().unwrap_or_else(PoisonError::into_inner);
            for file in files {
                if known.insert(file.clone()) {
                    build.add(FileEvent::file(file));
                }
            }
        }
        build.start();
        info!(files = count, dir = %options.dir.display(), "Scanned");

        Ok(Self {
            options: Arc::new(options),
            build,
            filter,
            watcher,
        })
    }

    /// Resolved options of this service.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Waits until the manifests are up to date. See
    /// [`BuildHandle::on_idle`].
    pub async fn on_idle(&self, change_timeout: Option<Duration>) -> Result<()> {
        self.build.on_idle(change_timeout).await
    }

    /// Like [`on_idle`](Self::on_idle), first giving the watcher
    /// `watch_delay` to notice a change made just before the call.
    pub async fn on_settled(&self) -> Result<()> {
        let delay = self.watcher.as_ref().map(|_| self.options.watch_delay);
        self.build.on_idle(delay).await
    }

    /// Resolves on the next invalidation.
    pub async fn on_change(&self) -> Result<()> {
        self.build.on_change().await
    }

    /// The accepted item for `filename`, absolute or relative to the
    /// watched directory.
    pub fn get(&self, filename: impl AsRef<Path>) -> Option<RouteItem> {
        self.build.get(filename)
    }

    /// Returns true if `path` is one of the generated outputs.
    pub fn is_write_target(&self, path: impl AsRef<Path>) -> bool {
        absolutize(path.as_ref())
            .map(|p| self.filter.is_write_target(&p))
            .unwrap_or(false)
    }

    /// Returns true if `path` has a watched extension.
    pub fn is_watched_file(&self, path: impl AsRef<Path>) -> bool {
        self.options
            .is_watched_file(&path.as_ref().to_string_lossy())
    }

    /// Handle to the underlying build session.
    pub fn handle(&self) -> &BuildHandle {
        &self.build
    }

    /// Stops watching and shuts the build session down.
    pub fn close(mut self) {
        self.watcher.take();
        self.build.close();
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
