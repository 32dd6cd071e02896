#![warn(clippy::dbg_macro)]

//! Catalog service for cultural-heritage artifacts.
//!
//! Filtered search, lookup by id or name and paginated listing over the
//! `heritage-store-db` catalog, with cached result pages and an actix-web
//! HTTP surface.

pub mod cache;
pub mod config;
pub mod dto;
pub mod error;
pub mod filters;
pub mod fixtures;
pub mod pagination;
pub mod prometheus;
pub mod routes;
pub mod service;

use std::sync::Arc;

use heritage_store_db::{CatalogDb, OpenMode};
use tracing::{info, warn};

use crate::cache::{Cache, MemoryCache, NullCache, RedisCache};
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::fixtures::CatalogFixture;
use crate::service::CatalogService;

/// Open the catalog named by the config, seeding it when it is empty.
pub fn open_catalog(config: &Config) -> Result<CatalogDb> {
    let mut db = CatalogDb::open(&config.database_path, OpenMode::Create)?;

    let violations = db.foreign_key_violations()?;
    for violation in &violations {
        warn!(
            "Dangling reference in {} row {:?} to {}",
            violation.table, violation.rowid, violation.parent
        );
    }
    if violations.is_empty() {
        info!("Catalog integrity check passed");
    }

    if let Some(seed_file) = &config.seed_file {
        if db.count_artifacts()? == 0 {
            info!("Seeding empty catalog from {}", seed_file.display());
            CatalogFixture::load_file(seed_file)?.import_into(&mut db)?;
        } else {
            info!("Catalog already populated, not seeding");
        }
    }

    Ok(db)
}

/// Cache implementation selected by the config: Redis when `cache_url` is
/// set, otherwise the in-process cache.
pub fn build_cache(config: &Config) -> Result<Arc<dyn Cache>> {
    if !config.cache_enabled {
        info!("Result cache disabled");
        return Ok(Arc::new(NullCache));
    }
    match &config.cache_url {
        Some(url) => {
            let cache = RedisCache::new(url).map_err(|e| ConfigError::Invalid {
                reason: format!("cache_url: {e}"),
            })?;
            Ok(Arc::new(cache))
        }
        None => Ok(Arc::new(MemoryCache::new(config.cache_max_entries))),
    }
}

/// The primary connection plus `read_connections - 1` read-only ones.
pub fn build_service(config: &Config, cache: Arc<dyn Cache>) -> Result<CatalogService> {
    let db = open_catalog(config)?;
    let mut service = CatalogService::new(db, cache, config.cache_ttl(), config.default_per_page);
    for _ in 1..config.read_connections {
        let reader = CatalogDb::open(&config.database_path, OpenMode::ReadOnly)?;
        service = service.with_reader(reader);
    }
    info!("Serving catalog over {} connections", service.reader_count());
    Ok(service)
}
