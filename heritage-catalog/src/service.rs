//! Catalog read operations with result caching.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Duration;

use heritage_store_db::{ArtifactFilter, CatalogDb};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::cache::Cache;
use crate::dto::{ArtifactRecord, ConservationReportRecord};
use crate::error::Result;
use crate::filters::{CacheOp, SearchFilters, cache_key};
use crate::pagination::{Page, PageRequest, paginate};

/// Catalog reads over a set of store connections and a result cache.
///
/// Each call borrows one connection; with several connections open on a WAL
/// database, searches run side by side.
pub struct CatalogService {
    readers: Vec<Mutex<CatalogDb>>,
    next_reader: AtomicUsize,
    cache: Arc<dyn Cache>,
    ttl: Duration,
    default_per_page: u32,
}

impl CatalogService {
    pub fn new(db: CatalogDb, cache: Arc<dyn Cache>, ttl: Duration, default_per_page: u32) -> Self {
        CatalogService {
            readers: vec![Mutex::new(db)],
            next_reader: AtomicUsize::new(0),
            cache,
            ttl,
            default_per_page,
        }
    }

    /// Add another connection to the same catalog.
    pub fn with_reader(mut self, db: CatalogDb) -> Self {
        self.readers.push(Mutex::new(db));
        self
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    /// Page request from raw query parameters, using the configured page size.
    pub fn page_request(&self, page: Option<&str>, per_page: Option<&str>) -> PageRequest {
        PageRequest::parse(page, per_page, self.default_per_page)
    }

    /// First idle connection, starting from the next one in turn; waits on
    /// that one when all are busy.
    fn db(&self) -> MutexGuard<'_, CatalogDb> {
        let start = self.next_reader.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        for offset in 0..self.readers.len() {
            let reader = &self.readers[(start + offset) % self.readers.len()];
            match reader.try_lock() {
                Ok(db) => return db,
                // The connection holds no state a panicking reader could corrupt.
                Err(TryLockError::Poisoned(poisoned)) => return poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => {}
            }
        }
        self.readers[start]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn cache_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss for {key}");
                return None;
            }
            Err(e) => {
                warn!("Cache read failed for {key}: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!("Cache hit for {key}");
                Some(value)
            }
            Err(e) => {
                warn!("Discarding undecodable cache entry {key}: {e}");
                None
            }
        }
    }

    fn cache_set<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize cache entry {key}: {e}");
                return;
            }
        };
        if let Err(e) = self.cache.set(key, raw, self.ttl) {
            warn!("Cache write failed for {key}: {e}");
        }
    }

    fn search_page(
        &self,
        filter: &ArtifactFilter,
        request: PageRequest,
    ) -> Result<Page<ArtifactRecord>> {
        let found = self
            .db()
            .search_artifacts(filter, request.offset(), request.limit())?;
        let items = found.items.iter().map(ArtifactRecord::from).collect();
        Ok(Page::from_window(items, found.total, request))
    }

    fn cached_page(
        &self,
        op: CacheOp,
        filters: &SearchFilters,
        request: PageRequest,
    ) -> Result<Page<ArtifactRecord>> {
        let key = cache_key(op, filters, request);
        if let Some(page) = self.cache_get(&key) {
            return Ok(page);
        }
        let page = self.search_page(&filters.to_artifact_filter(), request)?;
        self.cache_set(&key, &page);
        Ok(page)
    }

    /// Every artifact, ordered by id.
    pub fn list_all(&self, request: PageRequest) -> Result<Page<ArtifactRecord>> {
        info!("Listing artifacts, page {}", request.page());
        self.cached_page(CacheOp::List, &SearchFilters::default(), request)
    }

    /// A single artifact. Absent artifacts are `None` and are not cached.
    pub fn get_by_id(&self, id: i64) -> Result<Option<ArtifactRecord>> {
        info!("Fetching artifact {id}");
        let key = cache_key(CacheOp::ById, &SearchFilters::by_id(id), PageRequest::new(1, 1));
        if let Some(record) = self.cache_get(&key) {
            return Ok(Some(record));
        }
        let graph = self.db().get_artifact(id)?;
        let record = ArtifactRecord::from_graph(graph.as_ref());
        if let Some(record) = &record {
            self.cache_set(&key, record);
        }
        Ok(record)
    }

    /// Artifacts whose name contains `name`, case-insensitively.
    ///
    /// A blank name matches nothing.
    pub fn list_by_name(&self, name: &str, request: PageRequest) -> Result<Page<ArtifactRecord>> {
        info!("Listing artifacts named like {name:?}");
        let filters = SearchFilters::by_name(name);
        if filters.name.is_none() {
            return Ok(paginate(Vec::new(), request));
        }
        self.cached_page(CacheOp::ByName, &filters, request)
    }

    pub fn search(
        &self,
        filters: &SearchFilters,
        request: PageRequest,
    ) -> Result<Page<ArtifactRecord>> {
        info!("Searching artifacts with {}", filters.canonical_json());
        self.cached_page(CacheOp::Search, filters, request)
    }

    /// Conservation reports of one artifact, oldest first.
    ///
    /// `None` when the artifact doesn't exist.
    pub fn conservation_reports(&self, id: i64) -> Result<Option<Vec<ConservationReportRecord>>> {
        info!("Fetching conservation reports for artifact {id}");
        let db = self.db();
        if !db.artifact_exists(id)? {
            return Ok(None);
        }
        let reports = db.conservation_reports(id)?;
        Ok(Some(reports.iter().map(ConservationReportRecord::from).collect()))
    }
}
