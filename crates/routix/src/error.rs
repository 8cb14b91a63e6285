// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Error types for route manifest generation.
//!
//! # Error Categories
//!
//! - **Parse errors**: raised by a parse hook, collected during a build cycle
//! - **Conflict errors**: two files resolve to the same logical path
//! - **Write errors**: the file writer failed to persist a manifest
//! - **Watch errors**: the filesystem watcher could not be set up
//!
//! Errors raised while processing file events are not returned directly to
//! the caller. They accumulate in the build session and are surfaced by
//! [`Routix::on_idle`](crate::Routix::on_idle), either as-is (a single error)
//! or wrapped in [`RoutixError::Build`] (several errors).

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for routix operations.
#[derive(Error, Debug)]
pub enum RoutixError {
    /// A parse hook rejected a file.
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// Relative path of the file being parsed.
        path: String,
        /// Description of the failure.
        message: String,
    },

    /// Two distinct files map to the same logical route path.
    #[error("File node conflict: {path}")]
    Conflict {
        /// The contested logical path.
        path: String,
    },

    /// A manifest could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// Target file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The filesystem watcher failed.
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// An ignore or scan pattern is invalid.
    #[error("Invalid pattern: {0}")]
    Pattern(String),

    /// Generic filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialized value could not be rendered.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The build session has shut down.
    #[error("Build session closed")]
    Closed,

    /// Several errors were collected during one build cycle.
    #[error("Build errors ({})\n1. {}", errors.len(), errors.first().map(ToString::to_string).unwrap_or_default())]
    Build {
        /// All collected errors, in the order they occurred.
        errors: Vec<RoutixError>,
    },
}

impl RoutixError {
    /// Collapses a list of collected errors into a single error.
    ///
    /// Returns `None` for an empty list and the error itself when there is
    /// exactly one.
    pub fn aggregate(mut errors: Vec<RoutixError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(RoutixError::Build { errors }),
        }
    }

    /// Returns the individual errors carried by this error.
    pub fn errors(&self) -> Vec<&RoutixError> {
        match self {
            RoutixError::Build { errors } => errors.iter().collect(),
            other => vec![other],
        }
    }
}

/// Convenience type alias for Results with [`RoutixError`].
pub type Result<T> = std::result::Result<T, RoutixError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict(path: &str) -> RoutixError {
        RoutixError::Conflict {
            path: path.to_string(),
        }
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(RoutixError::aggregate(Vec::new()).is_none());
    }

    #[test]
    fn test_aggregate_single_is_unwrapped() {
        let err = RoutixError::aggregate(vec![conflict("/a")]).unwrap();
        assert!(matches!(err, RoutixError::Conflict { ref path } if path == "/a"));
    }

    #[test]
    fn test_aggregate_many() {
        let err = RoutixError::aggregate(vec![conflict("/a"), conflict("/b")]).unwrap();
        assert_eq!(err.errors().len(), 2);
        let message = err.to_string();
        assert!(message.starts_with("Build errors (2)"));
        assert!(message.contains("File node conflict: /a"));
    }
}
