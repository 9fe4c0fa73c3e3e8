// Copyright 2025 FIO Exporter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types shared by every stage of the exporter.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering, parsing, publishing or serving
/// fio results.
#[derive(Debug, Error)]
pub enum Error {
    /// The series directory could not be listed.
    #[error("Cannot list series directory {}: {source}", .directory.display())]
    Discovery {
        directory: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A result file could not be read.
    #[error("Cannot read result file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A result file is not a well-formed fio JSON document.
    #[error("Malformed result file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The `runtime` global option is not a number.
    #[error("Invalid runtime {value:?} in {}", .path.display())]
    InvalidRuntime { path: PathBuf, value: String },

    /// A gauge could not be created or updated.
    #[error("Cannot register metric {name}: {reason}")]
    Registry { name: String, reason: String },

    /// The scrape endpoint failed to bind or serve.
    #[error("Metrics endpoint error: {0}")]
    Server(#[source] std::io::Error),
}

/// Result type for exporter operations.
pub type Result<T> = std::result::Result<T, Error>;
