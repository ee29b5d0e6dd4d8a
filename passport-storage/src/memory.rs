//! In-memory reference implementations of every collaborator.
//!
//! Used by tests and by the lifecycle demo binary. Locks are never held
//! across an await point.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use passport_core::{
    OwnerId, Passport, PassportEvent, PassportId, PassportStatus, ProductCategory, StorageError,
    StorageResult,
};
use tokio::sync::broadcast;

use crate::traits::{
    BlobStore, EventPublisher, FastCache, IdempotencyStore, RecordStore, WriteOnceRetention,
};

fn newest_first(records: &mut [Passport]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.passport_id.cmp(&a.passport_id))
    });
}

// ============================================================================
// RECORD STORE
// ============================================================================

/// HashMap-backed durable tier.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<PassportId, Passport>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn save(&self, record: &Passport) -> StorageResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        if records.contains_key(&record.passport_id) {
            return Err(StorageError::Conflict {
                key: record.passport_id.to_string(),
            });
        }
        records.insert(record.passport_id, record.clone());
        Ok(())
    }

    async fn update(&self, record: &Passport) -> StorageResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        match records.get_mut(&record.passport_id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(StorageError::MissingRecord {
                id: record.passport_id,
            }),
        }
    }

    async fn update_if_status(
        &self,
        record: &Passport,
        expected: PassportStatus,
    ) -> StorageResult<bool> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let Some(existing) = records.get_mut(&record.passport_id) else {
            return Err(StorageError::MissingRecord {
                id: record.passport_id,
            });
        };
        if existing.status != expected {
            return Ok(false);
        }
        *existing = record.clone();
        Ok(true)
    }

    async fn get_by_id(&self, id: PassportId) -> StorageResult<Option<Passport>> {
        let records = self.records.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(records.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner: &OwnerId) -> StorageResult<Vec<Passport>> {
        let records = self.records.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut found: Vec<Passport> = records
            .values()
            .filter(|p| &p.manufacturer_id == owner)
            .cloned()
            .collect();
        newest_first(&mut found);
        Ok(found)
    }

    async fn find_by_category(
        &self,
        category: ProductCategory,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Vec<Passport>> {
        let records = self.records.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut found: Vec<Passport> = records
            .values()
            .filter(|p| p.product_category == category)
            .cloned()
            .collect();
        newest_first(&mut found);
        Ok(found.into_iter().skip(offset).take(limit).collect())
    }
}

// ============================================================================
// TTL MAP (shared by cache and idempotency store)
// ============================================================================

#[derive(Debug, Default)]
struct TtlMap {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl TtlMap {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
            match entries.get(key) {
                None => return Ok(None),
                Some((value, expires_at)) if *expires_at > now => return Ok(Some(value.clone())),
                Some(_) => {}
            }
        }
        // Expired: drop it so the map does not grow without bound.
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        if entries.get(key).is_some_and(|(_, expires_at)| *expires_at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    fn set(&self, key: &str, value: String, ttl: Duration) -> StorageResult<()> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .remove(key);
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}

/// Fast tier with per-entry expiry.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: TtlMap,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FastCache for InMemoryCache {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.entries.get(key)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> StorageResult<()> {
        self.entries.set(key, value, ttl)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.entries.delete(key)
    }
}

/// Idempotency entries with per-entry expiry.
#[derive(Debug, Default)]
pub struct InMemoryIdempotencyStore {
    entries: TtlMap,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a raw value, bypassing the typed `set`. Lets callers seed
    /// entries that do not parse as an identity.
    pub fn insert_raw(&self, fingerprint: &str, value: &str, ttl: Duration) -> StorageResult<()> {
        self.entries.set(fingerprint, value.to_string(), ttl)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn get(&self, fingerprint: &str) -> StorageResult<Option<String>> {
        self.entries.get(fingerprint)
    }

    async fn set(&self, fingerprint: &str, id: PassportId, ttl: Duration) -> StorageResult<()> {
        self.entries.set(fingerprint, id.to_string(), ttl)
    }
}

// ============================================================================
// BLOB STORE
// ============================================================================

/// A stored write-once object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub retention: WriteOnceRetention,
    pub retain_until: DateTime<Utc>,
}

/// Write-once object store addressed by `mem://bucket/key` locators.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<(String, String), StoredBlob>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locator(bucket: &str, key: &str) -> String {
        format!("mem://{}/{}", bucket, key)
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredBlob> {
        self.objects
            .read()
            .ok()?
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        retention: WriteOnceRetention,
    ) -> StorageResult<String> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let address = (bucket.to_string(), key.to_string());

        if let Some(existing) = objects.get(&address) {
            if existing.bytes == bytes {
                return Ok(Self::locator(bucket, key));
            }
            return Err(StorageError::WriteOnceViolation {
                key: format!("{}/{}", bucket, key),
            });
        }

        let period = chrono::Duration::from_std(retention.period).map_err(|e| {
            StorageError::Unavailable {
                reason: format!("retention period out of range: {}", e),
            }
        })?;
        let retain_until = Utc::now().checked_add_signed(period).ok_or_else(|| {
            StorageError::Unavailable {
                reason: format!("retention period {:?} overflows the calendar", retention.period),
            }
        })?;
        objects.insert(
            address,
            StoredBlob {
                bytes,
                retention,
                retain_until,
            },
        );
        Ok(Self::locator(bucket, key))
    }

    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let objects = self.objects.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|blob| blob.bytes.clone()))
    }
}

// ============================================================================
// EVENT PUBLISHER
// ============================================================================

/// An event together with the channel it was published on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    pub channel: String,
    pub event: PassportEvent,
}

/// Event bus backed by a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    tx: broadcast::Sender<ChannelEvent>,
}

impl BroadcastEventPublisher {
    /// Create a publisher buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventPublisher {
    async fn publish(&self, channel: &str, event: &PassportEvent) -> StorageResult<()> {
        let event_type = event.event_type();
        match self.tx.send(ChannelEvent {
            channel: channel.to_string(),
            event: event.clone(),
        }) {
            Ok(receivers) => {
                tracing::debug!(
                    channel,
                    event_type,
                    receivers,
                    "Published passport event"
                );
            }
            Err(_) => {
                // No subscribers is not a failure.
                tracing::debug!(channel, event_type, "No subscribers for passport event");
            }
        }
        Ok(())
    }
}
