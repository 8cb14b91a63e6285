// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Normalization of watcher events into route items.

use crate::error::Result;
use crate::item::RouteItem;
use crate::options::{Options, Parsed};
use std::path::Path;

/// Builds a [`RouteItem`] from a path relative to the watched directory.
///
/// The extension is the first configured extension the path ends with,
/// falling back to the filesystem extension. The logical path is the
/// relative path with that extension stripped.
pub fn parse_item(options: &Options, relative: &str) -> RouteItem {
    let extension = options
        .extensions
        .iter()
        .find(|ext| relative.ends_with(ext.as_str()))
        .cloned()
        .or_else(|| {
            Path::new(relative)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{}", e))
        })
        .unwrap_or_default();

    let path = &relative[..relative.len() - extension.len()];
    let mut item = RouteItem::file(relative, path, options.dir.join(relative), &extension);

    if options.leading_slash && !item.path.starts_with('/') {
        item.path.insert(0, '/');
    }

    item
}

/// Normalizes a file and runs the parse hook on it.
///
/// Returns `None` when the hook cancels the file.
pub async fn parse_file(
    options: &Options,
    relative: &str,
    previous: Option<&RouteItem>,
) -> Result<Option<RouteItem>> {
    let mut item = parse_item(options, relative);
    match options.parse.parse(&mut item, previous, options).await? {
        Parsed::Keep => Ok(Some(item)),
        Parsed::Cancel => Ok(None),
    }
}

/// Runs the parse hook on a directory record synthesized by the tree.
pub async fn parse_dir(options: &Options, item: &mut RouteItem) -> Result<()> {
    options.parse.parse(item, None, options).await?;
    Ok(())
}
