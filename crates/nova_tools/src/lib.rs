//! # Nova Development Tools
//!
//! Command-line tools for development:
//! - Config validation
//! - Scenario replay through the catch-up engine
//! - Catalog cost and duration tables

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod costs;
pub mod scenario;
pub mod validate;

use std::path::PathBuf;

use nova_core::data::UnknownKey;
use nova_core::error::GameError;
use thiserror::Error;

/// Errors raised by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A scenario file is malformed.
    #[error("Failed to parse scenario: {0}")]
    Scenario(#[from] ron::error::SpannedError),

    /// A scenario names a structure or research topic that does not exist.
    #[error("{0}")]
    UnknownKey(#[from] UnknownKey),

    /// Scenario requests must be in chronological order.
    #[error("Request at {at}ms comes before the previous request")]
    OutOfOrder {
        /// Offending instant.
        at: i64,
    },

    /// Output could not be encoded.
    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    /// The core rejected an operation.
    #[error(transparent)]
    Core(#[from] GameError),
}

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;

/// Read a whole text file.
///
/// # Errors
///
/// [`ToolError::Io`] if the file cannot be read.
pub fn read_file(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })
}
