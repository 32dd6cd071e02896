// SPDX-FileCopyrightText: 2026 Heritage Catalog contributors
// SPDX-License-Identifier: MIT

//! SQLite entity store for the heritage catalog.
//!
//! This crate owns the persisted artifact records, their lookup entities
//! (formats, locations, creators, materials, tags) and the owned children
//! (images, conservation reports). It also hosts the search query builder
//! that composes the catalog's filter predicates into a single SQL query.
//!
//! # Key Features
//!
//! - Schema with referential integrity and cascading deletes
//! - Filtered search with relationship-scoped joins and duplicate elimination
//! - Eager resolution of an artifact window in a bounded number of queries
//! - In-memory database for testing
//! - Write operations for bulk loading and local management
//!
//! # Example
//!
//! ```ignore
//! use heritage_store_db::{ArtifactFilter, CatalogDb, OpenMode};
//!
//! let db = CatalogDb::open("catalog.sqlite", OpenMode::ReadWrite)?;
//!
//! let filter = ArtifactFilter::default().with_tag("gold");
//! let page = db.search_artifacts(&filter, 0, 10)?;
//! for graph in &page.items {
//!     println!("{} ({} tags)", graph.artifact.name, graph.tags.len());
//! }
//! ```

mod connection;
mod error;
mod query;
mod schema;
mod search;
mod types;
mod write;

pub use connection::{CatalogDb, OpenMode};
pub use error::{Error, Result};
pub use schema::SCHEMA_VERSION;
pub use search::{ArtifactFilter, IdFilter, SearchPage};
pub use types::*;
pub use write::*;
