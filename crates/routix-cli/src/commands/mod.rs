// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! CLI command implementations.
//!
//! - `build`: Write the route manifests once
//! - `watch`: Keep the manifests in sync with the source directory

/// One-shot build command.
pub mod build;
/// File watch command.
pub mod watch;
