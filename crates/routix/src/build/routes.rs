// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Flat routes list.
//!
//! Keeps a `path → item` mapping in insertion order and renders it as
//!
//! ```js
//! const f /* files */ = [
//!   { // f[0]
//!     id: "1os7jmp",
//!     path: "a",
//!     import: () => import("/src/a.js")
//!   }
//! ]
//!
//! const routes = f
//! ```
//!
//! When a tree is built, directory records follow as `const d /* dirs */`
//! and every entry gets a `children` thunk referencing `f[i]` / `d[i]`.

use super::codegen::{entry_ref, indent, indent_collapse, pretty_props, quote};
use super::tree::Prepared;
use crate::error::Result;
use crate::item::{ChildRef, RouteItem};
use crate::options::Options;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    item: RouteItem,
}

/// Maintains the flat `path → item` mapping.
#[derive(Debug, Default)]
pub struct RoutesBuilder {
    routes: HashMap<String, Entry>,
    next_seq: u64,
}

/// Positions assigned to files and dirs in the last generation.
#[derive(Debug, Default, Clone)]
pub struct EntryIndex {
    files: HashMap<String, usize>,
    dirs: HashMap<String, usize>,
}

impl EntryIndex {
    /// Renders a child reference, or `None` if the child was not generated
    /// (e.g. filtered out as empty).
    pub fn resolve(&self, child: &ChildRef) -> Option<String> {
        let map = if child.is_file { &self.files } else { &self.dirs };
        map.get(&child.path).map(|&i| entry_ref(child.is_file, i))
    }

    /// Position of a file in the generated list.
    pub fn file(&self, path: &str) -> Option<usize> {
        self.files.get(path).copied()
    }

    /// Position of a directory in the generated list.
    pub fn dir(&self, path: &str) -> Option<usize> {
        self.dirs.get(path).copied()
    }
}

/// Output of [`RoutesBuilder::generate`].
#[derive(Debug, Clone)]
pub struct GeneratedRoutes {
    /// JavaScript source declaring `f`, optionally `d`, and `routes`.
    pub code: String,
    /// Positions used in `code`.
    pub index: EntryIndex,
}

impl RoutesBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the item at its path. A replaced item keeps
    /// its position.
    pub fn add(&mut self, item: RouteItem) {
        match self.routes.get_mut(&item.path) {
            Some(entry) => entry.item = item,
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.routes.insert(item.path.clone(), Entry { seq, item });
            }
        }
    }

    /// Replaces `previous` with `item`, moving the entry if the path changed.
    pub fn update(&mut self, item: RouteItem, previous: Option<&RouteItem>) {
        if let Some(previous) = previous {
            if previous.path != item.path {
                self.routes.remove(&previous.path);
            }
        }
        self.add(item);
    }

    /// Removes the item at `path`, if any.
    pub fn remove(&mut self, path: &str) {
        self.routes.remove(path);
    }

    /// Looks up an item by logical path.
    pub fn get(&self, path: &str) -> Option<&RouteItem> {
        self.routes.get(path).map(|e| &e.item)
    }

    /// Number of tracked items.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no item is tracked.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Items in insertion order.
    pub fn items(&self) -> Vec<&RouteItem> {
        let mut entries: Vec<&Entry> = self.routes.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| &e.item).collect()
    }

    /// Renders the routes list. `tree` carries the directory records and
    /// child lists when a tree is built.
    pub fn generate(&self, options: &Options, tree: Option<&Prepared>) -> Result<GeneratedRoutes> {
        let mut files: Vec<&RouteItem> = self
            .items()
            .into_iter()
            .filter(|item| options.keep_empty || !item.empty)
            .collect();
        if let Some(compare) = &options.sort_files {
            files.sort_by(|a, b| compare(a, b));
        }

        let mut dirs: Option<Vec<&RouteItem>> = tree.map(|t| t.dirs.iter().collect());
        if let (Some(dirs), Some(compare)) = (dirs.as_mut(), &options.sort_dirs) {
            dirs.sort_by(|a, b| compare(a, b));
        }

        let mut index = EntryIndex::default();
        for (i, file) in files.iter().enumerate() {
            index.files.insert(file.path.clone(), i);
        }
        for (i, dir) in dirs.iter().flatten().enumerate() {
            index.dirs.insert(dir.path.clone(), i);
        }

        let children_of = |item: &RouteItem| -> Option<Vec<String>> {
            tree.map(|t| {
                t.children
                    .get(&item.path)
                    .map(|refs| refs.iter().filter_map(|r| index.resolve(r)).collect())
                    .unwrap_or_default()
            })
        };

        let mut rendered_files = Vec::with_capacity(files.len());
        for (i, file) in files.iter().enumerate() {
            rendered_files.push(render_file(options, i, file, children_of(file))?);
        }

        let mut lines = Vec::new();
        if options.import_default {
            lines.push("const dft = m => m.default".to_string());
        }
        lines.push(indent_collapse(
            0,
            "",
            vec![
                "const f /* files */ = [".to_string(),
                indent(1, ",", rendered_files),
                "]".to_string(),
            ],
        ));

        if let Some(dirs) = &dirs {
            let mut rendered_dirs = Vec::with_capacity(dirs.len());
            for (i, dir) in dirs.iter().enumerate() {
                rendered_dirs.push(render_dir(options, i, dir, children_of(dir).unwrap_or_default())?);
            }
            lines.push(indent_collapse(
                0,
                "",
                vec![
                    "const d /* dirs */ = [".to_string(),
                    indent(1, ",", rendered_dirs),
                    "]".to_string(),
                ],
            ));
            lines.push(indent(
                0,
                "",
                vec![
                    "for (const g of [f, d])".to_string(),
                    indent(
                        1,
                        "",
                        vec!["for (const x of g) x.children = x.children ? x.children() : []".to_string()],
                    ),
                ],
            ));
            lines.push("const routes = [...f, ...d]".to_string());
        } else {
            lines.push("const routes = f".to_string());
        }

        Ok(GeneratedRoutes {
            code: indent(0, "\n", lines),
            index,
        })
    }
}

fn children_line(children: &[String]) -> String {
    format!("children: () => [{}]", children.join(", "))
}

fn render_file(
    options: &Options,
    i: usize,
    item: &RouteItem,
    children: Option<Vec<String>>,
) -> Result<String> {
    let target = match &options.resolve {
        Some(resolve) => resolve(&item.absolute),
        None => item.absolute.to_string_lossy().into_owned(),
    };

    let mut fields = Vec::new();
    if options.id {
        fields.push(format!("id: {}", quote(&item.id)));
    }
    fields.push(format!("path: {}", quote(&item.path)));
    fields.push(format!(
        "{}: () => import({}){}",
        options.import_prop,
        quote(&target),
        if options.import_default { ".then(dft)" } else { "" }
    ));
    fields.extend(pretty_props(&item.props)?);
    if let Some(children) = children.filter(|c| !c.is_empty()) {
        fields.push(children_line(&children));
    }

    Ok(indent(
        1,
        "",
        vec![format!("{{ // f[{}]", i), indent(2, ",", fields), "}".to_string()],
    ))
}

fn render_dir(options: &Options, i: usize, item: &RouteItem, children: Vec<String>) -> Result<String> {
    let mut fields = Vec::new();
    if options.id {
        fields.push(format!("id: {}", quote(&item.id)));
    }
    fields.push(format!("path: {}", quote(&item.path)));
    fields.extend(pretty_props(&item.props)?);
    fields.push(children_line(&children));

    Ok(indent(
        1,
        "",
        vec![format!("{{ // d[{}]", i), indent(2, ",", fields), "}".to_string()],
    ))
}
