// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! Routix CLI library.
//!
//! Command-line front end of the routix manifest generator, with the
//! Svench page preset.
//!
//! # Usage
//!
//! ```bash
//! routix build    # Write the manifests once
//! routix watch    # Rebuild on every change
//! ```
//!
//! # Configuration
//!
//! Projects are configured via `routix.toml` at the project root.

/// CLI commands (build, watch).
pub mod commands;
/// Project configuration from `routix.toml`.
pub mod config;
/// Svench page preset.
pub mod svench;
