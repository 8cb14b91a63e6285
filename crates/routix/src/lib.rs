// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! # Routix
//!
//! Incremental route manifest generator.
//!
//! Routix watches a directory of page files and keeps JavaScript manifests
//! describing them up to date: a flat routes list with lazy imports, a
//! nested tree mirroring the directory layout, and an optional extras
//! payload keyed by id.
//!
//! ## Features
//!
//! - Async parse hook to enrich or cancel each file
//! - Debounced rebuilds: a burst of file events produces a single write
//! - Cached tree child lists, invalidated along the changed path only
//! - Pluggable writer, comparators and conflict resolver
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use routix::{Options, Routix};
//!
//! let options = Options::new("src")
//!     .with_extensions(["svench", "md"])
//!     .with_routes_file(".svench/routes.js")
//!     .with_leading_slash(true);
//!
//! let routix = Routix::start(options).await?;
//! routix.on_idle(None).await?;
//! ```

/// Build session, scheduler and manifest generators.
pub mod build;
/// Error types.
pub mod error;
/// Route items and file events.
pub mod item;
/// Build options and collaborator hooks.
pub mod options;
/// File normalization and parse hook invocation.
pub mod parse;
/// Directory scanning and watching.
pub mod reader;
/// The `Routix` service.
pub mod service;
/// Manifest writers.
pub mod write;

pub use build::BuildHandle;
pub use error::{Result, RoutixError};
pub use item::{string_hash_code, ChildRef, FileEvent, Props, RouteItem};
pub use options::{
    parse_extensions, Comparator, Identity, ImportResolver, Options, Parse, Parsed,
    ResolveConflict, WriteTargets,
};
pub use service::Routix;
pub use write::{FsWriter, MemoryWriter, WriteFile};
