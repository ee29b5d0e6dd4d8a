//! Fault-injecting wrappers around the in-memory stores.
//!
//! Each wrapper delegates to a real in-memory implementation and exposes
//! switches to fail individual operations, plus call counters so tests can
//! assert which tiers were touched.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use passport_core::{
    OwnerId, Passport, PassportEvent, PassportId, PassportStatus, ProductCategory, StorageError,
    StorageResult,
};
use passport_storage::{
    BlobStore, BroadcastEventPublisher, EventPublisher, FastCache, IdempotencyStore,
    InMemoryBlobStore, InMemoryCache, InMemoryIdempotencyStore, InMemoryRecordStore, RecordStore,
    WriteOnceRetention,
};
use tokio::sync::Barrier;

fn injected(operation: &str) -> StorageError {
    StorageError::Unavailable {
        reason: format!("injected {} failure", operation),
    }
}

/// A boolean switch plus a call counter.
#[derive(Debug, Default)]
pub struct Switch {
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl Switch {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Count a call and report whether it should fail.
    fn hit(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fail.load(Ordering::SeqCst)
    }
}

// ============================================================================
// RECORD STORE
// ============================================================================

/// Record store that can fail, and can hold the next round of reads at a
/// barrier so concurrent writers all load the same snapshot.
#[derive(Debug, Default)]
pub struct FaultyRecordStore {
    pub inner: InMemoryRecordStore,
    pub save: Switch,
    pub update: Switch,
    pub get: Switch,
    read_gate: Mutex<Option<Arc<Barrier>>>,
}

impl FaultyRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold reads until `parties` of them have arrived. The gate opens for
    /// good once it trips, so follow-up reads pass straight through.
    pub fn arm_read_gate(&self, parties: usize) {
        if let Ok(mut gate) = self.read_gate.lock() {
            *gate = Some(Arc::new(Barrier::new(parties)));
        }
    }

    fn disarm_read_gate(&self) {
        if let Ok(mut gate) = self.read_gate.lock() {
            *gate = None;
        }
    }
}

#[async_trait]
impl RecordStore for FaultyRecordStore {
    async fn save(&self, record: &Passport) -> StorageResult<()> {
        if self.save.hit() {
            return Err(injected("save"));
        }
        self.inner.save(record).await
    }

    async fn update(&self, record: &Passport) -> StorageResult<()> {
        if self.update.hit() {
            return Err(injected("update"));
        }
        self.inner.update(record).await
    }

    async fn update_if_status(
        &self,
        record: &Passport,
        expected: PassportStatus,
    ) -> StorageResult<bool> {
        if self.update.hit() {
            return Err(injected("update"));
        }
        self.inner.update_if_status(record, expected).await
    }

    async fn get_by_id(&self, id: PassportId) -> StorageResult<Option<Passport>> {
        if self.get.hit() {
            return Err(injected("get"));
        }
        let found = self.inner.get_by_id(id).await?;
        let gate = self
            .read_gate
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .clone();
        if let Some(gate) = gate {
            gate.wait().await;
            self.disarm_read_gate();
        }
        Ok(found)
    }

    async fn find_by_owner(&self, owner: &OwnerId) -> StorageResult<Vec<Passport>> {
        self.inner.find_by_owner(owner).await
    }

    async fn find_by_category(
        &self,
        category: ProductCategory,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Vec<Passport>> {
        self.inner.find_by_category(category, limit, offset).await
    }
}

// ============================================================================
// FAST CACHE
// ============================================================================

#[derive(Debug, Default)]
pub struct FaultyCache {
    pub inner: InMemoryCache,
    pub get: Switch,
    pub set: Switch,
    pub delete: Switch,
}

impl FaultyCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FastCache for FaultyCache {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        if self.get.hit() {
            return Err(injected("cache get"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> StorageResult<()> {
        if self.set.hit() {
            return Err(injected("cache set"));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        if self.delete.hit() {
            return Err(injected("cache delete"));
        }
        self.inner.delete(key).await
    }
}

// ============================================================================
// IDEMPOTENCY STORE
// ============================================================================

/// Idempotency store that can fail, and can hold every lookup at a barrier
/// until `parties` lookups are in flight.
#[derive(Debug, Default)]
pub struct FaultyIdempotencyStore {
    pub inner: InMemoryIdempotencyStore,
    pub get: Switch,
    pub set: Switch,
    lookup_gate: Mutex<Option<Arc<Barrier>>>,
}

impl FaultyIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make lookups wait until `parties` of them have arrived, forcing
    /// concurrent requests to all miss before any of them registers.
    pub fn with_lookup_gate(parties: usize) -> Self {
        Self {
            lookup_gate: Mutex::new(Some(Arc::new(Barrier::new(parties)))),
            ..Self::default()
        }
    }

    /// Let subsequent lookups through without waiting.
    pub fn disarm_lookup_gate(&self) {
        if let Ok(mut gate) = self.lookup_gate.lock() {
            *gate = None;
        }
    }
}

#[async_trait]
impl IdempotencyStore for FaultyIdempotencyStore {
    async fn get(&self, fingerprint: &str) -> StorageResult<Option<String>> {
        if self.get.hit() {
            return Err(injected("idempotency get"));
        }
        let found = self.inner.get(fingerprint).await?;
        let gate = self
            .lookup_gate
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        Ok(found)
    }

    async fn set(&self, fingerprint: &str, id: PassportId, ttl: Duration) -> StorageResult<()> {
        if self.set.hit() {
            return Err(injected("idempotency set"));
        }
        self.inner.set(fingerprint, id, ttl).await
    }
}

// ============================================================================
// BLOB STORE
// ============================================================================

#[derive(Debug, Default)]
pub struct FaultyBlobStore {
    pub inner: InMemoryBlobStore,
    pub put: Switch,
}

impl FaultyBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for FaultyBlobStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        retention: WriteOnceRetention,
    ) -> StorageResult<String> {
        if self.put.hit() {
            return Err(injected("blob put"));
        }
        self.inner.put(bucket, key, bytes, retention).await
    }

    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(bucket, key).await
    }
}

// ============================================================================
// EVENT PUBLISHER
// ============================================================================

#[derive(Debug, Default)]
pub struct FaultyEventPublisher {
    pub inner: BroadcastEventPublisher,
    pub publish: Switch,
}

impl FaultyEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventPublisher for FaultyEventPublisher {
    async fn publish(&self, channel: &str, event: &PassportEvent) -> StorageResult<()> {
        if self.publish.hit() {
            return Err(injected("event publish"));
        }
        self.inner.publish(channel, event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_switch_counts_and_fails() {
        let cache = FaultyCache::new();
        cache
            .set("k", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        cache.get.set_failing(true);
        assert!(cache.get("k").await.is_err());
        cache.get.set_failing(false);
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(cache.get.calls(), 2);
        assert_eq!(cache.set.calls(), 1);
    }

    #[tokio::test]
    async fn test_read_gate_holds_until_all_arrive_then_opens() {
        let store = FaultyRecordStore::new();
        let passport = Passport::draft(
            OwnerId::from("mfg-1"),
            "Acme",
            ProductCategory::BatteryIndustrial,
            serde_json::json!({"k": "v"}).into(),
        );
        store.inner.save(&passport).await.unwrap();
        let id = passport.passport_id;

        store.arm_read_gate(2);
        let (a, b) = tokio::join!(store.get_by_id(id), store.get_by_id(id));
        assert_eq!(a.unwrap().unwrap().status, PassportStatus::Draft);
        assert_eq!(b.unwrap().unwrap().status, PassportStatus::Draft);

        // A lone read after the gate tripped does not wait.
        assert!(store.get_by_id(id).await.unwrap().is_some());
        assert_eq!(store.get.calls(), 3);
    }

    #[tokio::test]
    async fn test_blob_failure_writes_nothing() {
        let blobs = FaultyBlobStore::new();
        blobs.put.set_failing(true);
        let retention = WriteOnceRetention::governance(Duration::from_secs(60));
        assert!(blobs
            .put("b", "k", b"x".to_vec(), retention)
            .await
            .is_err());
        assert!(blobs.inner.is_empty());
    }
}
