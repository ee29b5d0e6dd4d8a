//! Read-through cache over the durable record store.

use std::sync::Arc;
use std::time::Duration;

use passport_core::config::DEFAULT_CACHE_TTL;
use passport_core::{Passport, PassportError, PassportId, PassportResult};

use super::read::CacheRead;
use crate::tasks::BackgroundTasks;
use crate::traits::{FastCache, RecordStore};

/// Default prefix for passport cache keys.
pub const DEFAULT_KEY_PREFIX: &str = "passport:";

/// Configuration for the read-through cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime of a refilled entry.
    pub entry_ttl: Duration,
    /// Prefix prepended to the passport id to form the cache key.
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entry_ttl: DEFAULT_CACHE_TTL,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.entry_ttl = ttl;
        self
    }

    /// Set the key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}

/// Read-through cache.
///
/// Fast-tier failures of any kind (backend error, corrupt entry, refill or
/// invalidation failure) are absorbed and logged. Only durable-tier failures
/// reach the caller.
pub struct ReadThroughCache {
    records: Arc<dyn RecordStore>,
    cache: Arc<dyn FastCache>,
    tasks: BackgroundTasks,
    config: CacheConfig,
}

impl ReadThroughCache {
    pub fn new(
        records: Arc<dyn RecordStore>,
        cache: Arc<dyn FastCache>,
        tasks: BackgroundTasks,
        config: CacheConfig,
    ) -> Self {
        Self {
            records,
            cache,
            tasks,
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Cache key for a passport.
    pub fn key(&self, id: PassportId) -> String {
        format!("{}{}", self.config.key_prefix, id)
    }

    /// Get a passport, preferring the fast tier.
    ///
    /// On a durable-tier read the fast tier is refilled as a detached task;
    /// the response does not wait for it.
    pub async fn get(&self, id: PassportId) -> PassportResult<CacheRead<Passport>> {
        let key = self.key(id);

        if let Some(hit) = self.lookup(&key, id).await {
            tracing::debug!(passport_id = %id, "Passport cache hit");
            return Ok(CacheRead::from_cache(hit));
        }

        let record = self
            .records
            .get_by_id(id)
            .await?
            .ok_or(PassportError::NotFound { id })?;

        self.refill(key, &record);
        Ok(CacheRead::from_storage(record))
    }

    /// Remove a passport's entry as a detached task.
    pub fn invalidate(&self, id: PassportId) {
        let key = self.key(id);
        let cache = Arc::clone(&self.cache);
        self.tasks.spawn("cache_invalidate", async move {
            if let Err(e) = cache.delete(&key).await {
                tracing::warn!(key = %key, error = %e, "Failed to invalidate passport cache entry");
            }
        });
    }

    /// Fast-tier lookup. Anything other than a well-formed snapshot of the
    /// requested passport counts as a miss.
    async fn lookup(&self, key: &str, id: PassportId) -> Option<Passport> {
        let raw = match self.cache.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Passport cache read failed");
                return None;
            }
        };

        match serde_json::from_str::<Passport>(&raw) {
            Ok(passport) if passport.passport_id == id => Some(passport),
            Ok(passport) => {
                tracing::warn!(
                    key = %key,
                    cached_id = %passport.passport_id,
                    "Passport cache entry holds a different record"
                );
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Corrupt passport cache entry");
                None
            }
        }
    }

    fn refill(&self, key: String, record: &Passport) {
        let snapshot = match serde_json::to_string(record) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to serialize passport for cache");
                return;
            }
        };
        let cache = Arc::clone(&self.cache);
        let ttl = self.config.entry_ttl;
        self.tasks.spawn("cache_refill", async move {
            if let Err(e) = cache.set(&key, snapshot, ttl).await {
                tracing::warn!(key = %key, error = %e, "Failed to refill passport cache");
            }
        });
    }
}
