//! Result cache for serialized catalog pages.
//!
//! The service never fails a request because of the cache: callers treat any
//! [`CacheError`] as a miss.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use redis::Commands;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Cache lock poisoned")]
    Poisoned,
}

/// Key/value store for serialized result pages with per-entry expiry.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
}

/// Cache used when caching is disabled: stores nothing, always misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl Cache for NullCache {
    fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }
}

#[derive(Debug)]
struct Entry {
    value: String,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-process cache bounded by entry count.
///
/// When full, expired entries are purged first; if that frees nothing the
/// entry closest to expiry is evicted.
#[derive(Debug)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        MemoryCache {
            entries: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn get_at(&self, key: &str, now: Instant) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub(crate) fn set_at(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
        now: Instant,
    ) -> Result<(), CacheError> {
        let expires_at = now.checked_add(ttl);
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        if !entries.contains_key(key) && entries.len() >= self.max_entries {
            entries.retain(|_, entry| entry.is_live(now));
            if entries.len() >= self.max_entries {
                // Entries without an expiry sort last.
                let soonest = entries
                    .iter()
                    .min_by_key(|(_, entry)| (entry.expires_at.is_none(), entry.expires_at))
                    .map(|(key, _)| key.clone());
                if let Some(soonest) = soonest {
                    entries.remove(&soonest);
                }
            }
        }
        entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.get_at(key, Instant::now())
    }

    fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.set_at(key, value, ttl, Instant::now())
    }
}

const REDIS_TIMEOUT: Duration = Duration::from_secs(2);

fn unavailable(e: redis::RedisError) -> CacheError {
    CacheError::Unavailable {
        reason: e.to_string(),
    }
}

/// Cache kept in Redis, shared by every server process.
///
/// The connection is opened on first use and dropped after any failed
/// command; the next lookup reconnects.
pub struct RedisCache {
    client: redis::Client,
    conn: Mutex<Option<redis::Connection>>,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Client for `url` (`redis://host:port/db`). No connection is made yet.
    pub fn new(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Unavailable {
            reason: format!("Invalid Redis URL {url}: {e}"),
        })?;
        info!("Using Redis cache at {url}");
        Ok(RedisCache {
            client,
            conn: Mutex::new(None),
        })
    }

    fn connect(&self) -> redis::RedisResult<redis::Connection> {
        let conn = self.client.get_connection_with_timeout(REDIS_TIMEOUT)?;
        conn.set_read_timeout(Some(REDIS_TIMEOUT))?;
        conn.set_write_timeout(Some(REDIS_TIMEOUT))?;
        debug!("Connected to Redis");
        Ok(conn)
    }

    fn with_connection<T>(
        &self,
        command: impl FnOnce(&mut redis::Connection) -> redis::RedisResult<T>,
    ) -> Result<T, CacheError> {
        let mut slot = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => self.connect().map_err(unavailable)?,
        };
        let result = command(&mut conn).map_err(unavailable)?;
        *slot = Some(conn);
        Ok(result)
    }
}

impl Cache for RedisCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.with_connection(|conn| conn.get(key))
    }

    fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        // SET EX rejects 0; such an entry would be expired on arrival anyway.
        let secs = ttl.as_secs();
        if secs == 0 {
            return Ok(());
        }
        self.with_connection(|conn| conn.set_ex(key, value, secs))
    }
}
