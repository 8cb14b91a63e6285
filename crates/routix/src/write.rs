// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Manifest writers.
//!
//! - [`FsWriter`]: writes to disk, creating parent directories
//! - [`MemoryWriter`]: keeps outputs in memory (tests, embedding)

use crate::error::{Result, RoutixError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Persists generated manifests.
#[async_trait]
pub trait WriteFile: Send + Sync {
    /// Writes `contents` (UTF-8) to `path`, replacing any existing file.
    async fn write_file(&self, path: &Path, contents: &str) -> Result<()>;
}

/// Writes manifests to the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWriter;

#[async_trait]
impl WriteFile for FsWriter {
    async fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        let wrap = |source| RoutixError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(wrap)?;
        }
        tokio::fs::write(path, contents).await.map_err(wrap)
    }
}

/// In-memory writer recording every write.
#[derive(Debug, Default, Clone)]
pub struct MemoryWriter {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
    writes: Arc<Mutex<Vec<PathBuf>>>,
}

impl MemoryWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last contents written to `path`.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path.as_ref())
            .cloned()
    }

    /// Number of writes performed so far (all targets).
    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Targets in write order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl WriteFile for MemoryWriter {
    async fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), contents.to_string());
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_path_buf());
        Ok(())
    }
}
