//! Passport entity and the viewer it is read by

use crate::{
    new_passport_id, AttributeTree, PassportError, PassportId, PassportResult, PassportStatus,
    ProductCategory, Timestamp, ViewContext,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// OWNER
// ============================================================================

/// Identity of the manufacturer that owns a passport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for OwnerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// VIEWER
// ============================================================================

/// Resolved (view context, identity) pair supplied by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewer {
    pub context: ViewContext,
    pub identity: Option<OwnerId>,
}

impl Viewer {
    /// Anonymous public reader.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Authenticated reader with a verified identity.
    pub fn authenticated(identity: impl Into<OwnerId>) -> Self {
        Self {
            context: ViewContext::Restricted,
            identity: Some(identity.into()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.context == ViewContext::Restricted && self.identity.is_some()
    }

    /// Full access requires an authenticated viewer whose identity is the owner.
    pub fn is_owner_of(&self, owner: &OwnerId) -> bool {
        self.is_authenticated() && self.identity.as_ref() == Some(owner)
    }
}

// ============================================================================
// PASSPORT
// ============================================================================

/// A regulated product record.
///
/// `immutability_hash` and `storage_location` are only ever set together by
/// [`Passport::mark_published`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passport {
    pub passport_id: PassportId,
    pub product_category: ProductCategory,
    pub status: PassportStatus,
    pub manufacturer_id: OwnerId,
    pub manufacturer_name: String,
    pub attributes: AttributeTree,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immutability_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
}

impl Passport {
    /// Build a fresh `Draft` record with a new identity.
    pub fn draft(
        owner: OwnerId,
        owner_name: impl Into<String>,
        category: ProductCategory,
        attributes: AttributeTree,
    ) -> Self {
        let now = Utc::now();
        Self {
            passport_id: new_passport_id(),
            product_category: category,
            status: PassportStatus::Draft,
            manufacturer_id: owner,
            manufacturer_name: owner_name.into(),
            attributes,
            created_at: now,
            updated_at: now,
            published_at: None,
            immutability_hash: None,
            storage_location: None,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == PassportStatus::Published
    }

    pub fn is_owned_by(&self, owner: &OwnerId) -> bool {
        &self.manufacturer_id == owner
    }

    /// Seal the record: status, hash, locator and publish time in one step.
    pub fn mark_published(
        &mut self,
        hash: String,
        locator: String,
        at: Timestamp,
    ) -> PassportResult<()> {
        self.ensure_transition(PassportStatus::Published, "publish")?;
        self.status = PassportStatus::Published;
        self.immutability_hash = Some(hash);
        self.storage_location = Some(locator);
        self.published_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    /// Withdraw a draft before it is ever published.
    pub fn revoke(&mut self, at: Timestamp) -> PassportResult<()> {
        self.ensure_transition(PassportStatus::Revoked, "revoke")?;
        self.status = PassportStatus::Revoked;
        self.updated_at = at;
        Ok(())
    }

    /// Replace the attribute payload of a draft. Category never changes.
    pub fn replace_attributes(
        &mut self,
        attributes: AttributeTree,
        at: Timestamp,
    ) -> PassportResult<()> {
        match self.status {
            PassportStatus::Draft => {
                self.attributes = attributes;
                self.updated_at = at;
                Ok(())
            }
            PassportStatus::Published => Err(PassportError::AlreadyPublished {
                id: self.passport_id,
            }),
            status => Err(PassportError::InvalidTransition {
                id: self.passport_id,
                status,
                action: "update",
            }),
        }
    }

    fn ensure_transition(&self, next: PassportStatus, action: &'static str) -> PassportResult<()> {
        if self.status.can_transition_to(next) {
            return Ok(());
        }
        if self.status == PassportStatus::Published {
            return Err(PassportError::AlreadyPublished {
                id: self.passport_id,
            });
        }
        Err(PassportError::InvalidTransition {
            id: self.passport_id,
            status: self.status,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft() -> Passport {
        Passport::draft(
            OwnerId::from("mfg-1"),
            "Acme Cells",
            ProductCategory::BatteryIndustrial,
            AttributeTree::from(json!({"batteryModel": "X1"})),
        )
    }

    #[test]
    fn test_draft_defaults() {
        let p = draft();
        assert_eq!(p.status, PassportStatus::Draft);
        assert!(p.immutability_hash.is_none());
        assert!(p.storage_location.is_none());
        assert!(p.published_at.is_none());
        assert_eq!(p.created_at, p.updated_at);
    }

    #[test]
    fn test_mark_published_sets_all_seal_fields() {
        let mut p = draft();
        let at = Utc::now();
        p.mark_published("abc".to_string(), "mem://b/k".to_string(), at)
            .unwrap();
        assert!(p.is_published());
        assert_eq!(p.immutability_hash.as_deref(), Some("abc"));
        assert_eq!(p.storage_location.as_deref(), Some("mem://b/k"));
        assert_eq!(p.published_at, Some(at));
    }

    #[test]
    fn test_mark_published_twice_fails_without_mutation() {
        let mut p = draft();
        p.mark_published("h1".to_string(), "l1".to_string(), Utc::now())
            .unwrap();
        let before = p.clone();
        let err = p
            .mark_published("h2".to_string(), "l2".to_string(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, PassportError::AlreadyPublished { .. }));
        assert_eq!(p, before);
    }

    #[test]
    fn test_revoke_only_from_draft() {
        let mut p = draft();
        p.revoke(Utc::now()).unwrap();
        assert_eq!(p.status, PassportStatus::Revoked);
        let err = p.revoke(Utc::now()).unwrap_err();
        assert!(matches!(err, PassportError::InvalidTransition { .. }));
        let err = p
            .mark_published("h".to_string(), "l".to_string(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, PassportError::InvalidTransition { .. }));
    }

    #[test]
    fn test_replace_attributes_rejected_after_publish() {
        let mut p = draft();
        p.mark_published("h".to_string(), "l".to_string(), Utc::now())
            .unwrap();
        let err = p
            .replace_attributes(AttributeTree::from(json!({})), Utc::now())
            .unwrap_err();
        assert!(matches!(err, PassportError::AlreadyPublished { .. }));
        assert_eq!(p.attributes.as_value(), &json!({"batteryModel": "X1"}));
    }

    #[test]
    fn test_serde_uses_camel_case_and_omits_unset() {
        let p = draft();
        let value = serde_json::to_value(&p).unwrap();
        assert!(value.get("passportId").is_some());
        assert_eq!(value["productCategory"], "BATTERY_INDUSTRIAL");
        assert_eq!(value["status"], "DRAFT");
        assert_eq!(value["manufacturerId"], "mfg-1");
        assert!(value.get("immutabilityHash").is_none());

        let back: Passport = serde_json::from_value(value).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_viewer_ownership() {
        let owner = OwnerId::from("mfg-1");
        assert!(Viewer::authenticated("mfg-1").is_owner_of(&owner));
        assert!(!Viewer::authenticated("mfg-2").is_owner_of(&owner));
        assert!(!Viewer::anonymous().is_owner_of(&owner));

        let public_with_identity = Viewer {
            context: ViewContext::Public,
            identity: Some(owner.clone()),
        };
        assert!(!public_with_identity.is_owner_of(&owner));
    }
}
