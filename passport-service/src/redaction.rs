//! Per-request field redaction.
//!
//! Runs on every response path, after retrieval, on a copy of the record.
//! The cached and durable copies are never redacted.

use std::sync::Arc;

use passport_core::{Passport, Viewer};
use passport_schema::SchemaRegistry;

/// Applies category access policies to outgoing passports.
#[derive(Debug, Clone)]
pub struct RedactionEngine {
    schemas: Arc<SchemaRegistry>,
}

impl RedactionEngine {
    pub fn new(schemas: Arc<SchemaRegistry>) -> Self {
        Self { schemas }
    }

    /// Return the view of `record` that `viewer` is allowed to see.
    ///
    /// The authenticated owner sees everything. Everyone else loses every
    /// top-level attribute the category marks restricted.
    pub fn redact(&self, mut record: Passport, viewer: &Viewer) -> Passport {
        if viewer.is_owner_of(&record.manufacturer_id) {
            return record;
        }

        let Some(policy) = self.schemas.policy(record.product_category) else {
            tracing::debug!(
                passport_id = %record.passport_id,
                category = %record.product_category,
                "No access policy for category"
            );
            return record;
        };

        if policy.is_empty() {
            return record;
        }

        if !record.attributes.is_object() {
            tracing::warn!(
                passport_id = %record.passport_id,
                "Passport attributes are not an object, skipping redaction"
            );
            return record;
        }

        for field in policy.restricted_fields() {
            record.attributes.remove_key(field);
        }
        record
    }
}
