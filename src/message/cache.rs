/*!
 * Catalog caching.
 *
 * Two layers sit in front of the database:
 * - `MessageCache`: an external, TTL-bound cache keyed by an opaque string.
 *   `MemoryCache` is the in-process implementation.
 * - `CatalogMemo`: the per-process memo of catalogs already read, keyed by
 *   `(category, locale)`. It never expires and is not touched by writes;
 *   callers clear or invalidate it explicitly.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use super::models::Catalog;
use crate::errors::MessageStoreError;

/// Default lifetime of cached catalogs
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(3600);

/// Get/set cache with per-entry time to live
pub trait MessageCache: Send + Sync {
    /// Cached catalog for `key`, `None` on miss or expiry
    fn get(&self, key: &str) -> Option<Catalog>;

    /// Store `catalog` under `key` for `ttl`
    fn set(&self, key: &str, catalog: Catalog, ttl: Duration);

    /// Cached value, or the result of `compute` stored for `ttl`.
    /// Errors from `compute` are returned and nothing is cached.
    fn get_or_set(
        &self,
        key: &str,
        ttl: Duration,
        compute: &mut dyn FnMut() -> Result<Catalog, MessageStoreError>,
    ) -> Result<Catalog, MessageStoreError> {
        if let Some(catalog) = self.get(key) {
            return Ok(catalog);
        }

        let catalog = compute()?;
        self.set(key, catalog.clone(), ttl);
        Ok(catalog)
    }
}

/// Hex SHA-256 of the JSON array `[identity, category, locale]`
pub fn cache_key(identity: &str, category: &str, locale: &str) -> String {
    // Serializing a slice of strings cannot fail
    let canonical = serde_json::to_string(&[identity, category, locale]).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

struct CacheEntry {
    catalog: Catalog,
    expires_at: Instant,
}

/// In-memory `MessageCache`
pub struct MemoryCache {
    /// Internal cache storage
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
        }
    }

    /// Get cache statistics: hits, misses and hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.entries.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;

        debug!("Message cache cleared");
    }

    /// Get the number of entries in the cache, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl MessageCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Catalog> {
        let entries = self.entries.read();

        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                *self.hits.write() += 1;
                debug!("Cache hit for {}", key);
                Some(entry.catalog.clone())
            }
            _ => {
                *self.misses.write() += 1;
                debug!("Cache miss for {}", key);
                None
            }
        }
    }

    fn set(&self, key: &str, catalog: Catalog, ttl: Duration) {
        let entry = CacheEntry {
            catalog,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().insert(key.to_string(), entry);

        debug!("Cached catalog {} for {}s", key, ttl.as_secs());
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryCache {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
        }
    }
}

/// Process-local memo of catalogs, keyed by `(category, locale)`
#[derive(Default)]
pub struct CatalogMemo {
    catalogs: RwLock<HashMap<(String, String), Catalog>>,
}

impl CatalogMemo {
    /// Create an empty memo
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoized catalog for the pair
    pub fn get(&self, category: &str, locale: &str) -> Option<Catalog> {
        self.catalogs
            .read()
            .get(&(category.to_string(), locale.to_string()))
            .cloned()
    }

    /// Whether the pair has been memoized
    pub fn contains(&self, category: &str, locale: &str) -> bool {
        self.catalogs
            .read()
            .contains_key(&(category.to_string(), locale.to_string()))
    }

    /// Memoize a catalog
    pub fn insert(&self, category: &str, locale: &str, catalog: Catalog) {
        self.catalogs
            .write()
            .insert((category.to_string(), locale.to_string()), catalog);
    }

    /// Forget one pair so the next read goes to the cache or database
    pub fn invalidate(&self, category: &str, locale: &str) -> bool {
        self.catalogs
            .write()
            .remove(&(category.to_string(), locale.to_string()))
            .is_some()
    }

    /// Forget every pair
    pub fn clear(&self) {
        self.catalogs.write().clear();
    }

    /// Number of memoized pairs
    pub fn len(&self) -> usize {
        self.catalogs.read().len()
    }

    /// Whether nothing is memoized
    pub fn is_empty(&self) -> bool {
        self.catalogs.read().is_empty()
    }
}
