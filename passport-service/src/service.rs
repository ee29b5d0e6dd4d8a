//! Passport lifecycle service.
//!
//! Composes the idempotency coordinator, schema registry, read-through
//! cache, redaction engine and publish workflow behind one facade. The
//! facade is transport-neutral: callers hand it a resolved owner or
//! [`Viewer`] and map [`PassportError::code`] onto their own protocol.

use std::sync::Arc;

use chrono::Utc;
use passport_core::{
    OwnerId, Passport, PassportConfig, PassportError, PassportId, PassportResult,
    PassportStatus, ProductCategory, Viewer,
};
use passport_schema::SchemaRegistry;
use passport_storage::{
    BackgroundTasks, BlobStore, CacheConfig, CacheRead, EventPublisher, FastCache,
    IdempotencyStore, ReadThroughCache, RecordStore,
};

use crate::events::EventEmitter;
use crate::idempotency::{IdempotencyCoordinator, Resolution};
use crate::publish::{reconcile_lost_race, status_error, PublishWorkflow};
use crate::redaction::RedactionEngine;

/// Backing collaborators the service is wired against.
#[derive(Clone)]
pub struct ServiceStores {
    pub records: Arc<dyn RecordStore>,
    pub cache: Arc<dyn FastCache>,
    pub idempotency: Arc<dyn IdempotencyStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub events: Arc<dyn EventPublisher>,
}

/// Result of a creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOutcome {
    pub passport: Passport,
    /// True when an identical earlier request already created this passport.
    pub replayed: bool,
}

/// Transport-neutral passport lifecycle API.
pub struct PassportService {
    config: Arc<PassportConfig>,
    schemas: Arc<SchemaRegistry>,
    records: Arc<dyn RecordStore>,
    idempotency: IdempotencyCoordinator,
    cache: Arc<ReadThroughCache>,
    redaction: RedactionEngine,
    publisher: PublishWorkflow,
    events: EventEmitter,
    tasks: BackgroundTasks,
}

impl PassportService {
    /// Wire the service. Fails if `config` does not validate.
    pub fn new(
        config: PassportConfig,
        schemas: Arc<SchemaRegistry>,
        stores: ServiceStores,
    ) -> PassportResult<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let tasks = BackgroundTasks::new();

        let cache = Arc::new(ReadThroughCache::new(
            Arc::clone(&stores.records),
            stores.cache,
            tasks.clone(),
            CacheConfig::new().with_ttl(config.cache_ttl),
        ));

        Ok(Self {
            idempotency: IdempotencyCoordinator::new(
                stores.idempotency,
                Arc::clone(&stores.records),
                config.idempotency_ttl,
            ),
            redaction: RedactionEngine::new(Arc::clone(&schemas)),
            publisher: PublishWorkflow::new(
                Arc::clone(&stores.records),
                stores.blobs,
                Arc::clone(&cache),
                Arc::clone(&config),
            ),
            events: EventEmitter::new(stores.events, tasks.clone(), config.created_channel.clone()),
            records: stores.records,
            cache,
            schemas,
            config,
            tasks,
        })
    }

    pub fn config(&self) -> &PassportConfig {
        &self.config
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Handle for the detached side effects this service spawns.
    pub fn background_tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    /// Wait for outstanding cache refills, invalidations and event publishes.
    pub async fn drain(&self) {
        self.tasks.wait_idle().await;
    }

    // ========================================================================
    // CREATE
    // ========================================================================

    /// Create a `Draft` passport from a raw payload, or replay the passport
    /// an identical earlier request created.
    pub async fn create(
        &self,
        owner: &OwnerId,
        owner_name: &str,
        category: &str,
        raw: &[u8],
    ) -> PassportResult<CreateOutcome> {
        let category = self.schemas.resolve_category(category)?;

        let fingerprint = match self
            .idempotency
            .resolve_or_reserve(owner, category, raw)
            .await
        {
            Resolution::Existing(passport) => {
                return Ok(CreateOutcome {
                    passport,
                    replayed: true,
                })
            }
            Resolution::Reserved(fingerprint) => fingerprint,
        };

        let attributes = self.schemas.validate(category, raw)?;
        let passport = Passport::draft(owner.clone(), owner_name, category, attributes);

        if let Err(e) = self.records.save(&passport).await {
            tracing::error!(
                passport_id = %passport.passport_id,
                owner = %owner,
                error = %e,
                "Failed to persist passport"
            );
            return Err(e.into());
        }

        self.idempotency
            .register(&fingerprint, passport.passport_id)
            .await;
        self.events.passport_created(&passport);

        tracing::info!(
            passport_id = %passport.passport_id,
            owner = %owner,
            category = %category,
            "Passport created"
        );
        Ok(CreateOutcome {
            passport,
            replayed: false,
        })
    }

    // ========================================================================
    // READ
    // ========================================================================

    /// Read a passport as `viewer` sees it.
    pub async fn get(&self, id: PassportId, viewer: &Viewer) -> PassportResult<Passport> {
        self.read(id, viewer).await.map(CacheRead::into_value)
    }

    /// Like [`get`](Self::get), keeping the cache metadata.
    pub async fn read(&self, id: PassportId, viewer: &Viewer) -> PassportResult<CacheRead<Passport>> {
        let read = self.cache.get(id).await?;
        Ok(read.map(|passport| self.redaction.redact(passport, viewer)))
    }

    /// Every passport the owner created, unredacted, newest first.
    pub async fn list_by_owner(&self, owner: &OwnerId) -> PassportResult<Vec<Passport>> {
        Ok(self.records.find_by_owner(owner).await?)
    }

    /// One page of a category, redacted for `viewer`, newest first.
    pub async fn list_by_category(
        &self,
        category: ProductCategory,
        limit: Option<usize>,
        offset: usize,
        viewer: &Viewer,
    ) -> PassportResult<Vec<Passport>> {
        let limit = self.config.page_size(limit);
        let page = self
            .records
            .find_by_category(category, limit, offset)
            .await?;
        Ok(page
            .into_iter()
            .map(|passport| self.redaction.redact(passport, viewer))
            .collect())
    }

    // ========================================================================
    // TRANSITIONS
    // ========================================================================

    /// Seal a draft into its immutable published form.
    pub async fn publish(&self, id: PassportId) -> PassportResult<Passport> {
        self.publisher.publish(id).await
    }

    /// Replace a draft's attributes. Only the owner may do this.
    pub async fn update_draft(
        &self,
        id: PassportId,
        owner: &OwnerId,
        raw: &[u8],
    ) -> PassportResult<Passport> {
        let mut passport = self.load_owned(id, owner).await?;
        if !passport.status.is_mutable() {
            return Err(status_error(&passport, "update"));
        }

        let attributes = self.schemas.validate(passport.product_category, raw)?;
        passport.replace_attributes(attributes, Utc::now())?;
        self.commit_draft_change(&passport, "update").await?;

        tracing::info!(passport_id = %id, "Passport draft updated");
        Ok(passport)
    }

    /// Withdraw a draft. Published passports cannot be revoked here.
    pub async fn revoke(&self, id: PassportId, owner: &OwnerId) -> PassportResult<Passport> {
        let mut passport = self.load_owned(id, owner).await?;
        passport.revoke(Utc::now())?;
        self.commit_draft_change(&passport, "revoke").await?;

        tracing::info!(passport_id = %id, "Passport revoked");
        Ok(passport)
    }

    async fn load_owned(&self, id: PassportId, owner: &OwnerId) -> PassportResult<Passport> {
        let passport = self
            .records
            .get_by_id(id)
            .await?
            .ok_or(PassportError::NotFound { id })?;
        if !passport.is_owned_by(owner) {
            tracing::warn!(passport_id = %id, caller = %owner, "Non-owner attempted a passport change");
            return Err(PassportError::Forbidden { id });
        }
        Ok(passport)
    }

    /// Conditionally persist a change made to a `Draft`, then invalidate.
    async fn commit_draft_change(
        &self,
        passport: &Passport,
        action: &'static str,
    ) -> PassportResult<()> {
        let id = passport.passport_id;
        let applied = self
            .records
            .update_if_status(passport, PassportStatus::Draft)
            .await?;
        if !applied {
            return Err(reconcile_lost_race(self.records.as_ref(), id, action).await);
        }
        self.cache.invalidate(id);
        Ok(())
    }
}
