//! Publish workflow under storage faults and concurrency.

mod common;

use common::{owner, Harness, BATTERY, OWNER_NAME};
use passport_core::{
    content_hash_hex, new_passport_id, AttributeTree, PassportError, PassportId, PassportStatus,
};
use passport_service::blob_key;
use passport_storage::{InMemoryBlobStore, RecordStore, RetentionMode};
use passport_test_utils::fixtures;
use serde_json::json;

async fn draft(h: &Harness) -> PassportId {
    h.service
        .create(&owner(), OWNER_NAME, BATTERY, &fixtures::battery_bytes())
        .await
        .unwrap()
        .passport
        .passport_id
}

async fn stored_status(h: &Harness, id: PassportId) -> PassportStatus {
    h.records.inner.get_by_id(id).await.unwrap().unwrap().status
}

#[tokio::test]
async fn test_snapshot_is_canonical_and_content_addressed() {
    let h = Harness::new();
    let id = draft(&h).await;

    let published = h.service.publish(id).await.unwrap();

    let expected = AttributeTree::from(fixtures::battery_payload())
        .canonical_bytes()
        .unwrap();
    let key = blob_key(id, &content_hash_hex(&expected));
    let object = h.blobs.inner.object("passports", &key).unwrap();
    assert_eq!(object.bytes, expected);
    assert_eq!(object.retention.mode, RetentionMode::Governance);
    assert!(object.retain_until > published.published_at.unwrap());

    assert_eq!(
        published.immutability_hash.as_deref(),
        Some(content_hash_hex(&expected).as_str())
    );
    assert_eq!(
        published.storage_location.as_deref(),
        Some(InMemoryBlobStore::locator("passports", &key).as_str())
    );
}

#[tokio::test]
async fn test_unknown_passport_is_not_found() {
    let h = Harness::new();
    let err = h.service.publish(new_passport_id()).await.unwrap_err();
    assert!(matches!(err, PassportError::NotFound { .. }));
    assert_eq!(h.blobs.put.calls(), 0);
}

#[tokio::test]
async fn test_blob_failure_leaves_draft_untouched() {
    let h = Harness::new();
    let id = draft(&h).await;
    h.blobs.put.set_failing(true);

    let err = h.service.publish(id).await.unwrap_err();
    assert!(matches!(err, PassportError::StorageFailure(_)));
    assert_eq!(err.code().http_status(), 500);
    assert!(h.blobs.inner.is_empty());
    assert_eq!(h.records.update.calls(), 0);
    assert_eq!(stored_status(&h, id).await, PassportStatus::Draft);

    h.blobs.put.set_failing(false);
    let published = h.service.publish(id).await.unwrap();
    assert_eq!(published.status, PassportStatus::Published);
}

#[tokio::test]
async fn test_record_failure_after_snapshot_is_inconsistent() {
    let h = Harness::new();
    let id = draft(&h).await;
    h.records.update.set_failing(true);

    let err = h.service.publish(id).await.unwrap_err();
    let (locator, hash) = match &err {
        PassportError::InconsistentPublish {
            id: failed,
            locator,
            hash,
            ..
        } => {
            assert_eq!(*failed, id);
            (locator.clone(), hash.clone())
        }
        other => panic!("unexpected error: {:?}", other),
    };
    assert_eq!(err.code().http_status(), 500);
    assert!(!err.client_message().contains(&locator));

    assert!(h.blobs.inner.object("passports", &blob_key(id, &hash)).is_some());
    assert_eq!(stored_status(&h, id).await, PassportStatus::Draft);

    // The retry writes identical bytes, which the write-once store accepts.
    h.records.update.set_failing(false);
    let published = h.service.publish(id).await.unwrap();
    assert_eq!(published.immutability_hash.as_deref(), Some(hash.as_str()));
    assert_eq!(published.storage_location.as_deref(), Some(locator.as_str()));
    assert_eq!(h.blobs.inner.len(), 1);
}

#[tokio::test]
async fn test_edit_after_inconsistent_publish_can_still_publish() {
    let h = Harness::new();
    let id = draft(&h).await;
    h.records.update.set_failing(true);

    let stranded = match h.service.publish(id).await.unwrap_err() {
        PassportError::InconsistentPublish { hash, .. } => hash,
        other => panic!("unexpected error: {:?}", other),
    };
    h.records.update.set_failing(false);

    let mut revised = fixtures::battery_payload();
    revised["batteryModel"] = json!("PowerCell 9001");
    h.service
        .update_draft(id, &owner(), &fixtures::to_bytes(&revised))
        .await
        .unwrap();

    let published = h.service.publish(id).await.unwrap();
    let hash = published.immutability_hash.clone().unwrap();
    assert_ne!(hash, stranded);
    assert_eq!(published.attributes.as_value()["batteryModel"], "PowerCell 9001");

    // Both snapshots are retained; the record points at the new one.
    assert_eq!(h.blobs.inner.len(), 2);
    assert!(h.blobs.inner.object("passports", &blob_key(id, &stranded)).is_some());
    let current = h.blobs.inner.object("passports", &blob_key(id, &hash)).unwrap();
    assert_eq!(content_hash_hex(&current.bytes), hash);
    assert_eq!(stored_status(&h, id).await, PassportStatus::Published);
}

#[tokio::test]
async fn test_concurrent_publishes_have_one_winner() {
    let h = Harness::new();
    let id = draft(&h).await;

    // Both publishers load the Draft before either commits.
    h.records.arm_read_gate(2);
    let (a, b) = tokio::join!(h.service.publish(id), h.service.publish(id));

    assert_eq!(h.blobs.put.calls(), 2);
    assert_eq!(h.records.update.calls(), 2);
    assert_eq!(h.blobs.inner.len(), 1);

    let outcomes = [a, b];
    let winners: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    let loser = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(loser, PassportError::AlreadyPublished { id: got } if *got == id));

    let stored = h.records.inner.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.immutability_hash, winners[0].immutability_hash);
    assert_eq!(stored.published_at, winners[0].published_at);
}

#[tokio::test]
async fn test_concurrent_revokes_have_one_winner() {
    let h = Harness::new();
    let id = draft(&h).await;
    let owner = owner();

    h.records.arm_read_gate(2);
    let (a, b) = tokio::join!(h.service.revoke(id, &owner), h.service.revoke(id, &owner));

    assert_eq!(h.records.update.calls(), 2);
    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(
        loser,
        PassportError::InvalidTransition {
            status: PassportStatus::Revoked,
            action: "revoke",
            ..
        }
    ));
    assert_eq!(stored_status(&h, id).await, PassportStatus::Revoked);
}

#[tokio::test]
async fn test_update_racing_publish_loses_to_sealed_record() {
    let h = Harness::new();
    let id = draft(&h).await;
    let mut revised = fixtures::battery_payload();
    revised["batteryModel"] = json!("PowerCell 9001");
    let revised = fixtures::to_bytes(&revised);
    let owner = owner();

    // Publish is polled last, so it is the first to resume past the gate
    // and commits before the update does.
    h.records.arm_read_gate(2);
    let (update, publish) = tokio::join!(
        h.service.update_draft(id, &owner, &revised),
        h.service.publish(id),
    );

    let published = publish.unwrap();
    let err = update.unwrap_err();
    assert!(matches!(err, PassportError::AlreadyPublished { .. }));
    assert_eq!(h.records.update.calls(), 2);

    let stored = h.records.inner.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.immutability_hash, published.immutability_hash);
    assert_eq!(stored.attributes.as_value()["batteryModel"], "PowerCell 9000");
}

#[tokio::test]
async fn test_second_publish_keeps_original_seal() {
    let h = Harness::new();
    let id = draft(&h).await;

    let first = h.service.publish(id).await.unwrap();
    let err = h.service.publish(id).await.unwrap_err();
    assert!(matches!(err, PassportError::AlreadyPublished { .. }));
    assert_eq!(h.blobs.put.calls(), 1);

    let stored = h.records.inner.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.published_at, first.published_at);
    assert_eq!(stored.immutability_hash, first.immutability_hash);
    assert_eq!(stored.storage_location, first.storage_location);
}
