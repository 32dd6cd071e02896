// SPDX-FileCopyrightText: 2026 Heritage Catalog contributors
// SPDX-License-Identifier: MIT

//! Error types for catalog database operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for catalog database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during catalog database operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to open database with context
    #[error("Failed to open database at '{path}': {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Database file not found
    #[error("Database not found at: {0}")]
    DatabaseNotFound(PathBuf),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch { expected: i32, found: i32 },

    /// A required text field was empty after trimming
    #[error("Field '{field}' must not be empty")]
    EmptyField { field: &'static str },

    /// Referenced artifact does not exist
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(i64),
}
