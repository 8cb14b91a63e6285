// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Extras manifest: a JSON object of per-item payloads keyed by id.

use crate::error::Result;
use crate::item::RouteItem;
use serde_json::{Map, Value};

/// Collects `RouteItem::extra` payloads.
#[derive(Debug, Default)]
pub struct ExtrasBuilder {
    extras: Map<String, Value>,
    by_id: bool,
}

impl ExtrasBuilder {
    /// Creates a builder keyed by id (`by_id`) or by logical path.
    pub fn new(by_id: bool) -> Self {
        Self {
            extras: Map::new(),
            by_id,
        }
    }

    fn key(&self, item: &RouteItem) -> String {
        if self.by_id {
            item.id.clone()
        } else {
            item.path.clone()
        }
    }

    /// Records the item's payload. Returns whether the manifest changed.
    pub fn add(&mut self, item: &RouteItem) -> bool {
        let key = self.key(item);
        match &item.extra {
            Some(extra) => {
                self.extras.insert(key, extra.clone());
            }
            None => {
                self.extras.shift_remove(&key);
            }
        }
        true
    }

    /// Records a new payload. Returns `false` when it is unchanged.
    pub fn update(&mut self, item: &RouteItem) -> bool {
        let key = self.key(item);
        if self.extras.get(&key) == item.extra.as_ref() {
            return false;
        }
        self.add(item)
    }

    /// Drops the item's payload. Returns whether the manifest changed.
    pub fn remove(&mut self, item: &RouteItem) -> bool {
        self.extras.shift_remove(&self.key(item)).is_some()
    }

    /// Renders `const extras = {...}`.
    pub fn generate(&self) -> Result<String> {
        Ok(format!(
            "const extras = {}",
            serde_json::to_string_pretty(&self.extras)?
        ))
    }
}
