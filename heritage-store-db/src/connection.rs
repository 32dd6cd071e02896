// SPDX-FileCopyrightText: 2026 Heritage Catalog contributors
// SPDX-License-Identifier: MIT

//! Database connection management.

use std::path::Path;

use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::{ARTIFACT_SCHEMA_SQL, LOOKUP_SCHEMA_SQL, SCHEMA_VERSION};
use crate::types::ForeignKeyViolation;

/// Database open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only access to an existing catalog
    ReadOnly,
    /// Read-write access to an existing catalog
    ReadWrite,
    /// Create the database and schema if they don't exist
    Create,
}

/// SQLite connection to the artifact catalog.
pub struct CatalogDb {
    pub(crate) conn: Connection,
}

impl std::fmt::Debug for CatalogDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogDb")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl CatalogDb {
    /// Open or create a database at a custom path.
    ///
    /// Existing databases must carry the current [`SCHEMA_VERSION`].
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let flags = match mode {
            OpenMode::ReadOnly => {
                if !path.exists() {
                    return Err(Error::DatabaseNotFound(path.to_owned()));
                }
                OpenFlags::SQLITE_OPEN_READ_ONLY
            }
            OpenMode::ReadWrite => {
                if !path.exists() {
                    return Err(Error::DatabaseNotFound(path.to_owned()));
                }
                OpenFlags::SQLITE_OPEN_READ_WRITE
            }
            OpenMode::Create => OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        };

        let conn = Connection::open_with_flags(path, flags).map_err(|e| Error::DatabaseOpen {
            path: path.to_owned(),
            source: e,
        })?;
        let db = Self { conn };

        db.configure_connection(mode != OpenMode::ReadOnly)?;
        if mode == OpenMode::Create {
            db.create_schema()?;
        } else {
            db.check_schema_version()?;
        }

        debug!("Opened database at {} ({:?})", path.display(), mode);
        Ok(db)
    }

    /// Create an in-memory database (for testing).
    ///
    /// The database is initialized with the full schema.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.configure_connection(false)?;
        db.create_schema()?;
        debug!("Created in-memory database");
        Ok(db)
    }

    /// Pragmas and SQL functions every connection needs.
    ///
    /// `foreign_keys` is per-connection in SQLite, so it is set on every open.
    fn configure_connection(&self, writable: bool) -> Result<()> {
        if writable {
            self.conn.execute_batch(
                r#"
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                "#,
            )?;
        }
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            "#,
        )?;

        // Unicode-aware lower-casing; SQLite's lower() only folds ASCII.
        self.conn.create_scalar_function(
            "casefold",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let value: Option<String> = ctx.get(0)?;
                Ok(value.map(|s| s.to_lowercase()))
            },
        )?;
        Ok(())
    }

    /// Create the database schema (lookups + artifacts).
    pub fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(LOOKUP_SCHEMA_SQL)?;
        self.conn.execute_batch(ARTIFACT_SCHEMA_SQL)?;
        self.conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        debug!("Created database schema");
        Ok(())
    }

    fn check_schema_version(&self) -> Result<()> {
        let found: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if found != SCHEMA_VERSION {
            return Err(Error::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                found,
            });
        }
        Ok(())
    }

    /// Get raw connection (for advanced usage).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Check if the database has the expected schema tables.
    pub fn has_schema(&self) -> Result<bool> {
        let count: i32 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('artifacts', 'conservation_reports')",
            [],
            |row| row.get(0),
        )?;
        Ok(count == 2)
    }

    /// List rows whose foreign keys don't resolve.
    ///
    /// Empty when the catalog is referentially sound.
    pub fn foreign_key_violations(&self) -> Result<Vec<ForeignKeyViolation>> {
        let mut stmt = self.conn.prepare("PRAGMA foreign_key_check")?;
        let mut rows = stmt.query([])?;
        let mut violations = Vec::new();
        while let Some(row) = rows.next()? {
            violations.push(ForeignKeyViolation {
                table: row.get(0)?,
                rowid: row.get(1)?,
                parent: row.get(2)?,
            });
        }
        Ok(violations)
    }
}
