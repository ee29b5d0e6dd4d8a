//! Lifecycle configuration
//!
//! Retention windows, blob placement and event routing are explicit values
//! built once at startup and passed by reference into each component.

use crate::ConfigError;
use std::time::Duration;

/// Default lifetime of an idempotency entry.
pub const DEFAULT_IDEMPOTENCY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default lifetime of a cached passport snapshot.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Default write-once retention requested for published snapshots (10 years).
pub const DEFAULT_BLOB_RETENTION: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Longest write-once retention accepted by `validate` (100 years).
pub const MAX_BLOB_RETENTION: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

const SECS_PER_DAY: u64 = 24 * 60 * 60;

pub const DEFAULT_BLOB_BUCKET: &str = "passports";
pub const DEFAULT_CREATED_CHANNEL: &str = "events:passport_created";
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 1000;

/// Configuration for the passport lifecycle core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassportConfig {
    /// How long a creation fingerprint maps to its passport.
    pub idempotency_ttl: Duration,
    /// How long a refilled cache entry lives.
    pub cache_ttl: Duration,
    /// Bucket published snapshots are written to.
    pub blob_bucket: String,
    /// Write-once retention requested from the blob store.
    pub blob_retention: Duration,
    /// Channel creation events are published on.
    pub created_channel: String,
    /// Page size used when a listing request omits a limit.
    pub default_page_size: usize,
    /// Upper bound applied to any listing limit.
    pub max_page_size: usize,
}

impl Default for PassportConfig {
    fn default() -> Self {
        Self {
            idempotency_ttl: DEFAULT_IDEMPOTENCY_TTL,
            cache_ttl: DEFAULT_CACHE_TTL,
            blob_bucket: DEFAULT_BLOB_BUCKET.to_string(),
            blob_retention: DEFAULT_BLOB_RETENTION,
            created_channel: DEFAULT_CREATED_CHANNEL.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl PassportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create PassportConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PASSPORT_IDEMPOTENCY_TTL_SECS`: Fingerprint retention (default: 86400)
    /// - `PASSPORT_CACHE_TTL_SECS`: Cache entry lifetime (default: 3600)
    /// - `PASSPORT_BLOB_BUCKET`: Bucket for published snapshots (default: passports)
    /// - `PASSPORT_BLOB_RETENTION_DAYS`: Write-once retention (default: 3650)
    /// - `PASSPORT_CREATED_CHANNEL`: Creation event channel (default: events:passport_created)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let idempotency_ttl = env_secs("PASSPORT_IDEMPOTENCY_TTL_SECS")
            .unwrap_or(defaults.idempotency_ttl);

        let cache_ttl = env_secs("PASSPORT_CACHE_TTL_SECS").unwrap_or(defaults.cache_ttl);

        let blob_bucket = std::env::var("PASSPORT_BLOB_BUCKET")
            .ok()
            .map(|s| s.trim().to_string())
            .unwrap_or(defaults.blob_bucket);

        let blob_retention = std::env::var("PASSPORT_BLOB_RETENTION_DAYS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(retention_from_days)
            .unwrap_or(defaults.blob_retention);

        let created_channel = std::env::var("PASSPORT_CREATED_CHANNEL")
            .ok()
            .map(|s| s.trim().to_string())
            .unwrap_or(defaults.created_channel);

        Self {
            idempotency_ttl,
            cache_ttl,
            blob_bucket,
            blob_retention,
            created_channel,
            ..defaults
        }
    }

    pub fn with_idempotency_ttl(mut self, ttl: Duration) -> Self {
        self.idempotency_ttl = ttl;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_blob_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.blob_bucket = bucket.into();
        self
    }

    pub fn with_blob_retention(mut self, retention: Duration) -> Self {
        self.blob_retention = retention;
        self
    }

    pub fn with_created_channel(mut self, channel: impl Into<String>) -> Self {
        self.created_channel = channel.into();
        self
    }

    /// Clamp a caller-supplied listing limit into `1..=max_page_size`.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.idempotency_ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "idempotency_ttl".to_string(),
                value: format!("{:?}", self.idempotency_ttl),
                reason: "idempotency_ttl must be greater than 0".to_string(),
            });
        }

        if self.cache_ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "cache_ttl".to_string(),
                value: format!("{:?}", self.cache_ttl),
                reason: "cache_ttl must be greater than 0".to_string(),
            });
        }

        if self.blob_retention.is_zero() || self.blob_retention > MAX_BLOB_RETENTION {
            return Err(ConfigError::InvalidValue {
                field: "blob_retention".to_string(),
                value: format!("{:?}", self.blob_retention),
                reason: format!("must be between 1s and {:?}", MAX_BLOB_RETENTION),
            });
        }

        if self.blob_bucket.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "blob_bucket".to_string(),
            });
        }

        if self.created_channel.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "created_channel".to_string(),
            });
        }

        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::InvalidValue {
                field: "default_page_size".to_string(),
                value: self.default_page_size.to_string(),
                reason: format!("must be between 1 and {}", self.max_page_size),
            });
        }

        Ok(())
    }
}

/// Days to a duration. Saturates instead of overflowing so an absurd value
/// is caught by `validate` rather than wrapping.
fn retention_from_days(days: u64) -> Duration {
    days.checked_mul(SECS_PER_DAY)
        .map(Duration::from_secs)
        .unwrap_or(Duration::MAX)
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}
