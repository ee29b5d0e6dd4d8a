//! Idempotent creation.
//!
//! A creation request is fingerprinted from (owner, category, exact payload
//! bytes). A fingerprint that already maps to a loadable passport replays
//! that passport instead of creating a new one.
//!
//! The digest input is `owner | category | payload` with literal `|`
//! separators, not a plain concatenation, so `("ab", "c")` and `("a", "bc")`
//! cannot collide. Fingerprints are therefore not interchangeable with ones
//! computed over the bare concatenation.
//!
//! This is a best-effort dedupe, not a lock. Two identical requests that
//! both miss before either registers will each create a record; the later
//! registration wins and subsequent retries converge on it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use passport_core::{OwnerId, Passport, PassportId, ProductCategory};
use passport_storage::{IdempotencyStore, RecordStore};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hex-encoded SHA-256 over owner, category and payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(owner: &OwnerId, category: ProductCategory, raw: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(owner.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(category.as_db_str().as_bytes());
        hasher.update(b"|");
        hasher.update(raw);
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of an idempotency lookup.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A previous identical request already created this passport.
    Existing(Passport),
    /// No usable prior result; create, then [`IdempotencyCoordinator::register`].
    Reserved(Fingerprint),
}

/// Deduplicates creation requests against previously created passports.
pub struct IdempotencyCoordinator {
    store: Arc<dyn IdempotencyStore>,
    records: Arc<dyn RecordStore>,
    ttl: Duration,
}

impl IdempotencyCoordinator {
    pub fn new(
        store: Arc<dyn IdempotencyStore>,
        records: Arc<dyn RecordStore>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            records,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a prior result for this request.
    ///
    /// Never fails: any problem reading or following the entry degrades to
    /// [`Resolution::Reserved`] so a valid submission is never blocked.
    pub async fn resolve_or_reserve(
        &self,
        owner: &OwnerId,
        category: ProductCategory,
        raw: &[u8],
    ) -> Resolution {
        let fingerprint = Fingerprint::compute(owner, category, raw);

        let stored = match self.store.get(fingerprint.as_str()).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                tracing::debug!(fingerprint = %fingerprint, "Idempotency miss");
                return Resolution::Reserved(fingerprint);
            }
            Err(e) => {
                tracing::warn!(fingerprint = %fingerprint, error = %e, "Idempotency lookup failed");
                return Resolution::Reserved(fingerprint);
            }
        };

        let id: PassportId = match Uuid::parse_str(&stored) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    fingerprint = %fingerprint,
                    stored = %stored,
                    error = %e,
                    "Idempotency entry is not a passport id"
                );
                return Resolution::Reserved(fingerprint);
            }
        };

        match self.records.get_by_id(id).await {
            Ok(Some(existing)) => {
                tracing::info!(
                    fingerprint = %fingerprint,
                    passport_id = %id,
                    "Idempotency hit, replaying existing passport"
                );
                Resolution::Existing(existing)
            }
            Ok(None) => {
                tracing::warn!(
                    fingerprint = %fingerprint,
                    passport_id = %id,
                    "Idempotency entry points at a missing passport"
                );
                Resolution::Reserved(fingerprint)
            }
            Err(e) => {
                tracing::warn!(
                    fingerprint = %fingerprint,
                    passport_id = %id,
                    error = %e,
                    "Failed to load passport for idempotency hit"
                );
                Resolution::Reserved(fingerprint)
            }
        }
    }

    /// Map the fingerprint to a newly created passport.
    ///
    /// Best-effort: the passport already exists in the durable tier, so a
    /// failure here is logged and otherwise ignored.
    pub async fn register(&self, fingerprint: &Fingerprint, id: PassportId) {
        if let Err(e) = self.store.set(fingerprint.as_str(), id, self.ttl).await {
            tracing::warn!(
                fingerprint = %fingerprint,
                passport_id = %id,
                error = %e,
                "Failed to register idempotency key"
            );
        }
    }
}
