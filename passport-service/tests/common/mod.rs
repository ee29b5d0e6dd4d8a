//! Shared harness for service integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use passport_core::{OwnerId, PassportConfig};
use passport_schema::SchemaRegistry;
use passport_service::{PassportService, ServiceStores};
use passport_test_utils::{
    FaultyBlobStore, FaultyCache, FaultyEventPublisher, FaultyIdempotencyStore, FaultyRecordStore,
};

pub const OWNER: &str = "mfg-1";
pub const OWNER_NAME: &str = "Acme Cells";
pub const BATTERY: &str = "BATTERY_INDUSTRIAL";
pub const TEXTILE: &str = "TEXTILE_APPAREL";

pub fn owner() -> OwnerId {
    OwnerId::from(OWNER)
}

/// A service wired against fault-injecting in-memory stores.
pub struct Harness {
    pub records: Arc<FaultyRecordStore>,
    pub cache: Arc<FaultyCache>,
    pub idempotency: Arc<FaultyIdempotencyStore>,
    pub blobs: Arc<FaultyBlobStore>,
    pub events: Arc<FaultyEventPublisher>,
    pub service: PassportService,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(PassportConfig::default(), FaultyIdempotencyStore::new())
    }

    pub fn with_config(config: PassportConfig) -> Self {
        Self::build(config, FaultyIdempotencyStore::new())
    }

    pub fn with_idempotency(idempotency: FaultyIdempotencyStore) -> Self {
        Self::build(PassportConfig::default(), idempotency)
    }

    fn build(config: PassportConfig, idempotency: FaultyIdempotencyStore) -> Self {
        let records = Arc::new(FaultyRecordStore::new());
        let cache = Arc::new(FaultyCache::new());
        let idempotency = Arc::new(idempotency);
        let blobs = Arc::new(FaultyBlobStore::new());
        let events = Arc::new(FaultyEventPublisher::new());
        let schemas = Arc::new(SchemaRegistry::builtin().expect("builtin schemas compile"));

        let stores = ServiceStores {
            records: records.clone(),
            cache: cache.clone(),
            idempotency: idempotency.clone(),
            blobs: blobs.clone(),
            events: events.clone(),
        };
        let service = PassportService::new(config, schemas, stores).expect("valid config");

        Self {
            records,
            cache,
            idempotency,
            blobs,
            events,
            service,
        }
    }
}
