//! Result wrapper for cache reads.

use chrono::{DateTime, Utc};

/// Value returned by the read-through cache along with the tier it came from.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    read_at: DateTime<Utc>,
    was_cache_hit: bool,
}

impl<T> CacheRead<T> {
    /// Wrap a value served from the fast tier.
    pub fn from_cache(value: T) -> Self {
        Self {
            value,
            read_at: Utc::now(),
            was_cache_hit: true,
        }
    }

    /// Wrap a value fetched from the durable tier.
    pub fn from_storage(value: T) -> Self {
        Self {
            value,
            read_at: Utc::now(),
            was_cache_hit: false,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }

    pub fn read_at(&self) -> DateTime<Utc> {
        self.read_at
    }

    /// Transform the value, keeping the read metadata.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> CacheRead<U> {
        CacheRead {
            value: f(self.value),
            read_at: self.read_at,
            was_cache_hit: self.was_cache_hit,
        }
    }
}
