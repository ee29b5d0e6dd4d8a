//! Publish workflow: the one-way transition from `Draft` to `Published`.
//!
//! Steps run strictly in order, each a precondition for the next:
//!
//! 1. fetch the record from the durable tier (never the cache)
//! 2. reject anything that cannot move to `Published`
//! 3. serialize attributes canonically and hash the bytes
//! 4. write the bytes to the write-once blob store, keyed by id and hash
//! 5. seal the in-memory record
//! 6. commit with a conditional write guarded on `status = Draft`
//! 7. invalidate the cache entry in the background
//!
//! A failure at step 4 leaves nothing behind. A failure at step 6 leaves a
//! committed blob and an unsealed record, and is reported as
//! [`PassportError::InconsistentPublish`] so it can be reconciled. The
//! stranded snapshot never blocks a later publish: a retry with unchanged
//! attributes re-puts identical bytes under the same key, and a draft edited
//! in between hashes to a different key.

use std::sync::Arc;

use chrono::Utc;
use passport_core::{
    content_hash_hex, Passport, PassportConfig, PassportError, PassportId, PassportResult,
    PassportStatus,
};
use passport_storage::{BlobStore, ReadThroughCache, RecordStore, WriteOnceRetention};

/// Object key for one snapshot of a passport.
///
/// Each distinct attribute payload gets its own write-once object.
pub fn blob_key(id: PassportId, hash: &str) -> String {
    format!("passports/{}/{}.json", id, hash)
}

/// Executes the publish state transition.
pub struct PublishWorkflow {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    cache: Arc<ReadThroughCache>,
    config: Arc<PassportConfig>,
}

impl PublishWorkflow {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        cache: Arc<ReadThroughCache>,
        config: Arc<PassportConfig>,
    ) -> Self {
        Self {
            records,
            blobs,
            cache,
            config,
        }
    }

    pub async fn publish(&self, id: PassportId) -> PassportResult<Passport> {
        let mut record = self
            .records
            .get_by_id(id)
            .await?
            .ok_or(PassportError::NotFound { id })?;

        if !record.status.can_transition_to(PassportStatus::Published) {
            return Err(status_error(&record, "publish"));
        }

        let snapshot = record.attributes.canonical_bytes().map_err(|e| {
            PassportError::Internal {
                reason: format!("failed to serialize attributes of {}: {}", id, e),
            }
        })?;
        let hash = content_hash_hex(&snapshot);

        let key = blob_key(id, &hash);
        let retention = WriteOnceRetention::governance(self.config.blob_retention);
        let locator = self
            .blobs
            .put(&self.config.blob_bucket, &key, snapshot, retention)
            .await
            .map_err(|e| {
                tracing::error!(
                    passport_id = %id,
                    bucket = %self.config.blob_bucket,
                    key = %key,
                    error = %e,
                    "Failed to write published snapshot"
                );
                PassportError::StorageFailure(e)
            })?;

        record.mark_published(hash.clone(), locator.clone(), Utc::now())?;

        match self
            .records
            .update_if_status(&record, PassportStatus::Draft)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(passport_id = %id, "Lost publish race to a concurrent writer");
                return Err(reconcile_lost_race(self.records.as_ref(), id, "publish").await);
            }
            Err(e) => {
                tracing::error!(
                    passport_id = %id,
                    locator = %locator,
                    hash = %hash,
                    error = %e,
                    "Snapshot committed but passport record was not updated"
                );
                return Err(PassportError::InconsistentPublish {
                    id,
                    locator,
                    hash,
                    source: e,
                });
            }
        }

        self.cache.invalidate(id);

        tracing::info!(passport_id = %id, hash = %hash, locator = %locator, "Passport published");
        Ok(record)
    }
}

/// Error for a record whose current status forbids `action`.
pub(crate) fn status_error(record: &Passport, action: &'static str) -> PassportError {
    match record.status {
        PassportStatus::Published => PassportError::AlreadyPublished {
            id: record.passport_id,
        },
        status => PassportError::InvalidTransition {
            id: record.passport_id,
            status,
            action,
        },
    }
}

/// Classify a conditional write that found the record already moved on.
pub(crate) async fn reconcile_lost_race(
    records: &dyn RecordStore,
    id: PassportId,
    action: &'static str,
) -> PassportError {
    match records.get_by_id(id).await {
        Ok(Some(current)) => status_error(&current, action),
        Ok(None) => PassportError::NotFound { id },
        Err(e) => PassportError::from(e),
    }
}
