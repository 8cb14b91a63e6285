// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Route items and file events.

use serde_json::{Map, Value};
use std::path::PathBuf;

/// Extra properties merged into generated manifest objects.
pub type Props = Map<String, Value>;

/// A single file (or directory) mapped to a logical route path.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteItem {
    /// Stable id, a hash of the absolute path (files) or `d:<path>` (dirs).
    pub id: String,
    /// Logical route path (relative path without extension).
    pub path: String,
    /// Path relative to the watched directory, `/`-separated.
    pub relative: String,
    /// Absolute location on disk. Empty for directories.
    pub absolute: PathBuf,
    /// Matched extension, including the leading dot.
    pub extension: String,
    /// Whether this item is backed by a file.
    pub is_file: bool,
    /// Whether this item is the tree root.
    pub is_root: bool,
    /// Properties serialized into the manifests.
    pub props: Props,
    /// Payload of the extras manifest.
    pub extra: Option<Value>,
    /// Marked empty; dropped from the routes list unless `keep_empty` is set.
    pub empty: bool,
    /// Hidden from the tree (still listed in routes).
    pub exclude_from_tree: bool,
    /// Set to `false` by a parse hook to skip rebuilding routes on update.
    pub rebuild: bool,
    /// Set to `false` by a parse hook to skip rebuilding extras on update.
    pub rebuild_extras: bool,
}

impl RouteItem {
    /// Creates a file item. Use [`crate::parse::parse_file`] to derive one
    /// from a watcher event.
    pub fn file(relative: &str, path: &str, absolute: PathBuf, extension: &str) -> Self {
        let id = string_hash_code(&absolute.to_string_lossy());
        Self {
            id,
            path: path.to_string(),
            relative: relative.to_string(),
            absolute,
            extension: extension.to_string(),
            is_file: true,
            is_root: false,
            props: Props::new(),
            extra: None,
            empty: false,
            exclude_from_tree: false,
            rebuild: true,
            rebuild_extras: true,
        }
    }

    /// Creates a directory record for a tree node without a file.
    pub fn directory(path: &str) -> Self {
        Self {
            id: string_hash_code(&format!("d:{}", path)),
            path: path.to_string(),
            relative: String::new(),
            absolute: PathBuf::new(),
            extension: String::new(),
            is_file: false,
            is_root: false,
            props: Props::new(),
            extra: None,
            empty: false,
            exclude_from_tree: false,
            rebuild: true,
            rebuild_extras: true,
        }
    }

    /// Creates the tree root record.
    pub fn root(path: &str) -> Self {
        let mut item = Self::directory(path);
        item.id = String::new();
        item.is_root = true;
        item
    }

    /// Sets a manifest property.
    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }
}

/// A filesystem event as reported by the watcher: a relative path and
/// whether it points at a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// Path relative to the watched directory, `/`-separated.
    pub path: String,
    /// `true` when the entry is a directory (ignored by the builder).
    pub is_dir: bool,
}

impl FileEvent {
    /// A regular file event.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    /// A directory event.
    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
        }
    }
}

/// Reference from a tree node to one of its children, resolved to a
/// `f[i]` / `d[i]` index when the manifests are generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChildRef {
    /// Logical path of the child.
    pub path: String,
    /// Whether the child is a file (`f`) or a directory (`d`).
    pub is_file: bool,
}

/// djb2-flavoured string hash rendered in base 36.
///
/// Iterates UTF-16 code units from the end with 32-bit wrapping arithmetic
/// so ids stay stable across tools that share the manifest format.
pub fn string_hash_code(input: &str) -> String {
    let units: Vec<u16> = input.encode_utf16().collect();
    let mut hash: i32 = 5381;
    for unit in units.iter().rev() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash) ^ i32::from(*unit);
    }
    to_base36(hash as u32)
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
