//! Collaborator contracts consumed by the lifecycle core.
//!
//! Every backing tier is externally synchronized. Implementations must be
//! safe to call from many concurrent request tasks and must not rely on the
//! caller holding any lock across an await point.

use std::time::Duration;

use async_trait::async_trait;
use passport_core::{
    OwnerId, Passport, PassportEvent, PassportId, PassportStatus, ProductCategory, StorageResult,
};

// ============================================================================
// DURABLE RECORD STORE
// ============================================================================

/// Authoritative passport storage.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new record. A duplicate identity yields `StorageError::Conflict`.
    async fn save(&self, record: &Passport) -> StorageResult<()>;

    /// Overwrite an existing record unconditionally.
    async fn update(&self, record: &Passport) -> StorageResult<()>;

    /// Overwrite an existing record only if its stored status still equals
    /// `expected`. Returns `false` when another writer got there first.
    async fn update_if_status(
        &self,
        record: &Passport,
        expected: PassportStatus,
    ) -> StorageResult<bool>;

    async fn get_by_id(&self, id: PassportId) -> StorageResult<Option<Passport>>;

    /// All records owned by `owner`, newest first.
    async fn find_by_owner(&self, owner: &OwnerId) -> StorageResult<Vec<Passport>>;

    /// One page of records in `category`, newest first.
    async fn find_by_category(
        &self,
        category: ProductCategory,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Vec<Passport>>;
}

// ============================================================================
// FAST CACHE
// ============================================================================

/// Key/value cache tier holding serialized snapshots with a bounded lifetime.
#[async_trait]
pub trait FastCache: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> StorageResult<()>;

    async fn delete(&self, key: &str) -> StorageResult<()>;
}

// ============================================================================
// IDEMPOTENCY STORE
// ============================================================================

/// Fingerprint to passport identity mapping with a retention window.
///
/// Values are returned as raw strings; the caller decides what an
/// unparseable value means.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    async fn get(&self, fingerprint: &str) -> StorageResult<Option<String>>;

    async fn set(&self, fingerprint: &str, id: PassportId, ttl: Duration) -> StorageResult<()>;
}

// ============================================================================
// IMMUTABLE BLOB STORE
// ============================================================================

/// Object-lock mode requested for a write-once object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionMode {
    /// Privileged operators may lift the lock.
    #[default]
    Governance,
    /// Nobody may lift the lock before expiry.
    Compliance,
}

/// Write-once retention request attached to a blob put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOnceRetention {
    pub mode: RetentionMode,
    pub period: Duration,
}

impl WriteOnceRetention {
    pub fn governance(period: Duration) -> Self {
        Self {
            mode: RetentionMode::Governance,
            period,
        }
    }
}

/// Content-addressed archive for published snapshots.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `bytes` under `bucket/key` and return a stable locator.
    ///
    /// Re-writing byte-identical content is accepted and returns the same
    /// locator. Different content under an existing key is a
    /// `StorageError::WriteOnceViolation`.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        retention: WriteOnceRetention,
    ) -> StorageResult<String>;

    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Option<Vec<u8>>>;
}

// ============================================================================
// EVENT PUBLISHER
// ============================================================================

/// Notification bus for lifecycle events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, channel: &str, event: &PassportEvent) -> StorageResult<()>;
}
