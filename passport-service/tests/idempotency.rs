//! Duplicate submission handling.

mod common;

use std::time::Duration;

use common::{owner, Harness, BATTERY, OWNER_NAME};
use passport_core::{new_passport_id, OwnerId, PassportConfig, ProductCategory};
use passport_service::Fingerprint;
use passport_test_utils::{fixtures, FaultyIdempotencyStore};
use serde_json::json;

#[tokio::test]
async fn test_identical_retry_replays_first_passport() {
    let h = Harness::new();
    let raw = fixtures::battery_bytes();

    let first = h.service.create(&owner(), OWNER_NAME, BATTERY, &raw).await.unwrap();
    let second = h.service.create(&owner(), OWNER_NAME, BATTERY, &raw).await.unwrap();

    assert!(!first.replayed);
    assert!(second.replayed);
    assert_eq!(first.passport.passport_id, second.passport.passport_id);
    assert_eq!(first.passport, second.passport);
    assert_eq!(h.records.save.calls(), 1);
    assert_eq!(h.records.inner.len(), 1);
}

#[tokio::test]
async fn test_replay_returns_current_state() {
    let h = Harness::new();
    let raw = fixtures::battery_bytes();

    let first = h.service.create(&owner(), OWNER_NAME, BATTERY, &raw).await.unwrap();
    h.service.publish(first.passport.passport_id).await.unwrap();

    let replay = h.service.create(&owner(), OWNER_NAME, BATTERY, &raw).await.unwrap();
    assert!(replay.replayed);
    assert!(replay.passport.is_published());
}

#[tokio::test]
async fn test_fingerprint_inputs_separate_requests() {
    let h = Harness::new();
    let raw = fixtures::battery_bytes();

    let a = h.service.create(&owner(), OWNER_NAME, BATTERY, &raw).await.unwrap();
    let b = h
        .service
        .create(&OwnerId::from("mfg-2"), "Other", BATTERY, &raw)
        .await
        .unwrap();

    // Same document, different byte layout.
    let reformatted = serde_json::to_vec_pretty(&fixtures::battery_payload()).unwrap();
    let c = h
        .service
        .create(&owner(), OWNER_NAME, BATTERY, &reformatted)
        .await
        .unwrap();

    assert!(!b.replayed);
    assert!(!c.replayed);
    assert_ne!(a.passport.passport_id, b.passport.passport_id);
    assert_ne!(a.passport.passport_id, c.passport.passport_id);
    assert_eq!(h.records.inner.len(), 3);
}

#[tokio::test]
async fn test_concurrent_misses_each_create_then_converge() {
    let h = Harness::with_idempotency(FaultyIdempotencyStore::with_lookup_gate(2));
    let raw = fixtures::battery_bytes();
    let owner = owner();

    let (a, b) = tokio::join!(
        h.service.create(&owner, OWNER_NAME, BATTERY, &raw),
        h.service.create(&owner, OWNER_NAME, BATTERY, &raw),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(!a.replayed && !b.replayed);
    assert_ne!(a.passport.passport_id, b.passport.passport_id);
    assert_eq!(h.records.inner.len(), 2);

    h.idempotency.disarm_lookup_gate();
    let retry = h.service.create(&owner, OWNER_NAME, BATTERY, &raw).await.unwrap();
    assert!(retry.replayed);
    let id = retry.passport.passport_id;
    assert!(id == a.passport.passport_id || id == b.passport.passport_id);
    assert_eq!(h.records.inner.len(), 2);
}

#[tokio::test]
async fn test_lookup_failure_degrades_to_create() {
    let h = Harness::new();
    h.idempotency.get.set_failing(true);
    let raw = fixtures::battery_bytes();

    let first = h.service.create(&owner(), OWNER_NAME, BATTERY, &raw).await.unwrap();
    let second = h.service.create(&owner(), OWNER_NAME, BATTERY, &raw).await.unwrap();

    assert!(!first.replayed && !second.replayed);
    assert_eq!(h.records.inner.len(), 2);
}

#[tokio::test]
async fn test_registration_failure_is_not_fatal() {
    let h = Harness::new();
    h.idempotency.set.set_failing(true);

    let outcome = h
        .service
        .create(&owner(), OWNER_NAME, BATTERY, &fixtures::battery_bytes())
        .await
        .unwrap();

    assert!(!outcome.replayed);
    assert_eq!(h.idempotency.set.calls(), 1);
    assert!(h.idempotency.inner.is_empty());
    assert_eq!(h.records.inner.len(), 1);
}

#[tokio::test]
async fn test_dangling_or_corrupt_entry_is_a_miss() {
    let h = Harness::new();
    let raw = fixtures::battery_bytes();
    let fingerprint = Fingerprint::compute(&owner(), ProductCategory::BatteryIndustrial, &raw);
    let ttl = Duration::from_secs(60);

    h.idempotency
        .inner
        .insert_raw(fingerprint.as_str(), &new_passport_id().to_string(), ttl)
        .unwrap();
    let created = h.service.create(&owner(), OWNER_NAME, BATTERY, &raw).await.unwrap();
    assert!(!created.replayed);

    // Registration repaired the entry.
    let replay = h.service.create(&owner(), OWNER_NAME, BATTERY, &raw).await.unwrap();
    assert!(replay.replayed);
    assert_eq!(replay.passport.passport_id, created.passport.passport_id);

    h.idempotency
        .inner
        .insert_raw(fingerprint.as_str(), "not-a-passport-id", ttl)
        .unwrap();
    let recreated = h.service.create(&owner(), OWNER_NAME, BATTERY, &raw).await.unwrap();
    assert!(!recreated.replayed);
    assert_eq!(h.records.inner.len(), 2);
}

#[tokio::test]
async fn test_expired_entry_allows_new_passport() {
    let config = PassportConfig::default().with_idempotency_ttl(Duration::from_millis(20));
    let h = Harness::with_config(config);
    let raw = fixtures::to_bytes(&json!({
        "batteryModel": "Short Lived",
        "chemistry": "SODIUM_ION",
        "ratedCapacity": 10,
        "carbonFootprint": {"totalCarbonFootprint": 1.0},
        "materialComposition": [{"material": "Sodium", "massPercentage": 20}]
    }));

    let first = h.service.create(&owner(), OWNER_NAME, BATTERY, &raw).await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    let second = h.service.create(&owner(), OWNER_NAME, BATTERY, &raw).await.unwrap();

    assert!(!second.replayed);
    assert_ne!(first.passport.passport_id, second.passport.passport_id);
}
