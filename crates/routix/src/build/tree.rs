// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Hierarchical route tree.
//!
//! Each path segment maps to a [`Node`]. A node holds an optional entry:
//! the file registered at that path, or a directory record synthesized
//! (and parsed) by [`TreeBuilder::prepare`] when no file claims the node.
//! Child lists are cached on entries and dropped along the ancestor chain
//! whenever a descendant changes.

use super::codegen::{compact_props, indent, quote};
use super::routes::EntryIndex;
use crate::error::{Result, RoutixError};
use crate::item::{ChildRef, RouteItem};
use crate::options::Options;
use crate::parse::parse_dir;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

#[derive(Debug)]
struct Entry {
    item: RouteItem,
    children: Option<Vec<ChildRef>>,
}

impl Entry {
    fn new(item: RouteItem) -> Self {
        Self {
            item,
            children: None,
        }
    }
}

#[derive(Debug, Default)]
struct Node {
    entry: Option<Entry>,
    children: Vec<(String, Node)>,
}

impl Node {
    fn child(&self, segment: &str) -> Option<&Node> {
        self.children.iter().find(|(s, _)| s == segment).map(|(_, n)| n)
    }

    fn child_mut(&mut self, segment: &str) -> Option<&mut Node> {
        self.children
            .iter_mut()
            .find(|(s, _)| s == segment)
            .map(|(_, n)| n)
    }

    fn child_or_insert(&mut self, segment: &str) -> &mut Node {
        let pos = match self.children.iter().position(|(s, _)| s == segment) {
            Some(pos) => pos,
            None => {
                self.children.push((segment.to_string(), Node::default()));
                self.children.len() - 1
            }
        };
        &mut self.children[pos].1
    }

    fn is_excluded(&self) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|e| e.item.exclude_from_tree)
    }

    fn holds_file(&self) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|e| e.item.is_file || e.item.is_root)
    }
}

/// Result of inserting an item into the tree.
#[derive(Debug)]
pub enum PutOutcome {
    /// The item now occupies its node.
    Inserted,
    /// A conflict was resolved: `stale` items must be removed from every
    /// builder and `fresh` items added in their place.
    Resolved {
        /// The two original items.
        stale: Vec<RouteItem>,
        /// Their resolved replacements.
        fresh: Vec<RouteItem>,
    },
}

/// Directory records and child lists collected by [`TreeBuilder::prepare`].
#[derive(Debug, Default, Clone)]
pub struct Prepared {
    /// Every directory record, children before parents.
    pub dirs: Vec<RouteItem>,
    /// Child references keyed by the parent's logical path.
    pub children: HashMap<String, Vec<ChildRef>>,
}

/// Maintains the nested directory structure mirroring route paths.
#[derive(Debug)]
pub struct TreeBuilder {
    root: Node,
    root_path: String,
    leading_slash: bool,
    cache_children: bool,
}

impl TreeBuilder {
    /// Creates a tree holding only the root.
    pub fn new(options: &Options) -> Self {
        let root_path = options.root_path().to_string();
        Self {
            root: Node {
                entry: Some(Entry::new(RouteItem::root(&root_path))),
                children: Vec::new(),
            },
            root_path,
            leading_slash: options.leading_slash,
            cache_children: options.cache_children,
        }
    }

    fn split(&self, path: &str) -> Vec<String> {
        let path = if self.leading_slash {
            path.strip_prefix('/').unwrap_or(path)
        } else {
            path
        };
        path.split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Drops cached child lists from the root down to `path`.
    fn invalidate(&mut self, path: &str) {
        if !self.cache_children {
            return;
        }
        let steps = self.split(path);
        let mut node = &mut self.root;
        if let Some(entry) = node.entry.as_mut() {
            entry.children = None;
        }
        for step in &steps {
            let Some(next) = node.child_mut(step) else {
                break;
            };
            if let Some(entry) = next.entry.as_mut() {
                entry.children = None;
            }
            node = next;
        }
    }

    /// Registers a new item.
    pub fn add(&mut self, item: RouteItem, options: &Options, allow_resolve: bool) -> Result<PutOutcome> {
        self.invalidate(&item.path);
        self.put(item, false, options, allow_resolve)
    }

    /// Replaces `previous` with `item`.
    pub fn update(
        &mut self,
        item: RouteItem,
        previous: Option<&RouteItem>,
        options: &Options,
        allow_resolve: bool,
    ) -> Result<PutOutcome> {
        if let Some(previous) = previous {
            self.remove(previous);
        }
        self.invalidate(&item.path);
        self.put(item, true, options, allow_resolve)
    }

    fn put(
        &mut self,
        item: RouteItem,
        replace: bool,
        options: &Options,
        allow_resolve: bool,
    ) -> Result<PutOutcome> {
        let steps = self.split(&item.path);
        let root_path = self.root_path.clone();
        let mut node = &mut self.root;
        for step in &steps {
            node = node.child_or_insert(step);
        }

        if let Some(existing) = node.entry.as_mut() {
            if existing.item.is_root {
                let mut merged = item;
                merged.is_root = true;
                merged.path = root_path;
                *existing = Entry::new(merged);
                return Ok(PutOutcome::Inserted);
            }

            let is_conflict = existing.item.is_file
                && (!replace || existing.item.absolute != item.absolute);
            if is_conflict {
                if !item.is_file {
                    return Ok(PutOutcome::Inserted);
                }
                let mut new_file = item.clone();
                let mut new_existing = existing.item.clone();
                let resolved = allow_resolve
                    && options
                        .resolve_conflict
                        .as_ref()
                        .is_some_and(|r| r.resolve(&mut new_file, &mut new_existing));
                if resolved {
                    return Ok(PutOutcome::Resolved {
                        stale: vec![existing.item.clone(), item],
                        fresh: vec![new_existing, new_file],
                    });
                }
                return Err(RoutixError::Conflict { path: item.path });
            }
        }

        node.entry = Some(Entry::new(item));
        Ok(PutOutcome::Inserted)
    }

    /// Removes the item at `item.path`, pruning nodes left without file and
    /// children. The root is reset, never removed.
    pub fn remove(&mut self, item: &RouteItem) {
        self.invalidate(&item.path);
        let steps = self.split(&item.path);
        if steps.is_empty() {
            self.root.entry = Some(Entry::new(RouteItem::root(&self.root_path)));
            return;
        }
        remove_at(&mut self.root, &steps);
    }

    /// Materializes directory records, computes missing child lists and
    /// collects everything the routes list needs.
    pub async fn prepare(&mut self, options: &Options) -> Result<Prepared> {
        let mut out = Prepared::default();
        let root_path = self.root_path.clone();
        unfold(&mut self.root, root_path, options, self.cache_children, &mut out).await?;
        Ok(out)
    }

    /// Renders `const tree = { ... }` from a prepared tree.
    pub fn generate(&self, prepared: &Prepared, index: &EntryIndex) -> String {
        let empty = crate::item::Props::new();
        let props = self
            .root
            .entry
            .as_ref()
            .map(|e| &e.item.props)
            .unwrap_or(&empty);

        let refs: Vec<String> = prepared
            .children
            .get(&self.root_path)
            .map(|refs| refs.iter().filter_map(|r| index.resolve(r)).collect())
            .unwrap_or_default();

        let mut fields = vec![
            format!("path: {}", quote(&self.root_path)),
            "isRoot: true".to_string(),
        ];
        fields.extend(compact_props(props));
        fields.push(if refs.is_empty() {
            "children: []".to_string()
        } else {
            indent(
                1,
                "",
                vec!["children: [".to_string(), indent(2, ",", refs), "]".to_string()],
            )
        });

        indent(
            0,
            "",
            vec!["const tree = {".to_string(), indent(1, ",", fields), "}".to_string()],
        )
    }

    /// The item registered (or synthesized) at `path`.
    pub fn entry(&self, path: &str) -> Option<&RouteItem> {
        self.node(path)?.entry.as_ref().map(|e| &e.item)
    }

    /// Child segment names of the node at `path`, in insertion order.
    pub fn segments(&self, path: &str) -> Option<Vec<&str>> {
        self.node(path)
            .map(|n| n.children.iter().map(|(s, _)| s.as_str()).collect())
    }

    /// The cached child list of the node at `path`, if still valid.
    pub fn cached_children(&self, path: &str) -> Option<&[ChildRef]> {
        self.node(path)?.entry.as_ref()?.children.as_deref()
    }

    fn node(&self, path: &str) -> Option<&Node> {
        let mut node = &self.root;
        for step in self.split(path) {
            node = node.child(&step)?;
        }
        Some(node)
    }
}

/// Returns true if `node` should be pruned from its parent.
fn remove_at(node: &mut Node, steps: &[String]) -> bool {
    match steps.split_first() {
        None => node.entry = None,
        Some((step, rest)) => {
            let Some(pos) = node.children.iter().position(|(s, _)| s == step) else {
                return false;
            };
            if remove_at(&mut node.children[pos].1, rest) {
                node.children.remove(pos);
            }
        }
    }
    !node.holds_file() && node.children.is_empty()
}

type UnfoldFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

fn unfold<'a>(
    node: &'a mut Node,
    path: String,
    options: &'a Options,
    cache_children: bool,
    out: &'a mut Prepared,
) -> UnfoldFuture<'a> {
    Box::pin(async move {
        let Node { entry, children } = node;

        if entry.is_none() {
            let mut item = RouteItem::directory(&path[..path.len().saturating_sub(1)]);
            parse_dir(options, &mut item).await?;
            *entry = Some(Entry::new(item));
        }

        for (segment, child) in children.iter_mut() {
            if child.is_excluded() {
                continue;
            }
            let child_path = format!("{}{}/", path, segment);
            unfold(child, child_path, options, cache_children, out).await?;
        }

        let Some(entry) = entry.as_mut() else {
            return Ok(());
        };

        if !cache_children || entry.children.is_none() {
            let mut items: Vec<&RouteItem> = children
                .iter()
                .filter(|(_, c)| !c.is_excluded())
                .filter_map(|(_, c)| c.entry.as_ref().map(|e| &e.item))
                .collect();
            if let Some(compare) = &options.sort_children {
                items.sort_by(|a, b| compare(a, b));
            }
            entry.children = Some(
                items
                    .into_iter()
                    .map(|i| ChildRef {
                        path: i.path.clone(),
                        is_file: i.is_file,
                    })
                    .collect(),
            );
        }

        out.children.insert(
            entry.item.path.clone(),
            entry.children.clone().unwrap_or_default(),
        );
        if !entry.item.is_file && !entry.item.is_root {
            out.dirs.push(entry.item.clone());
        }
        Ok(())
    })
}
