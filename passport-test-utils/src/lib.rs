//! Passport Test Utilities
//!
//! Shared test infrastructure for the passport workspace:
//! - Proptest generators for owners, viewers and attribute payloads
//! - Fixtures for valid and invalid category payloads
//! - Fault-injecting wrappers around the in-memory stores

pub mod faults;

pub use faults::{
    FaultyBlobStore, FaultyCache, FaultyEventPublisher, FaultyIdempotencyStore, FaultyRecordStore,
};

// Re-export in-memory stores and core types for convenience
pub use passport_core::{
    AttributeTree, OwnerId, Passport, PassportError, PassportStatus, ProductCategory, StorageError,
    ViewContext, Viewer,
};
pub use passport_storage::{
    BroadcastEventPublisher, InMemoryBlobStore, InMemoryCache, InMemoryIdempotencyStore,
    InMemoryRecordStore,
};

use serde_json::{json, Value};

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Canonical payloads per category.

    use super::*;

    /// Restricted fields of the battery schema.
    pub const BATTERY_RESTRICTED: [&str; 3] = [
        "disassemblyInstructions",
        "materialComposition",
        "supplyChainDueDiligence",
    ];

    /// Restricted fields of the textile schema.
    pub const TEXTILE_RESTRICTED: [&str; 1] = ["supplyChainDetails"];

    /// A battery payload that satisfies the schema, including restricted fields.
    pub fn battery_payload() -> Value {
        json!({
            "batteryModel": "PowerCell 9000",
            "chemistry": "LITHIUM_IRON_PHOSPHATE",
            "ratedCapacity": 100,
            "carbonFootprint": {
                "totalCarbonFootprint": 50.5,
                "shareOfRenewables": 90
            },
            "materialComposition": [
                {"material": "Lithium", "massPercentage": 5},
                {"material": "Cobalt", "massPercentage": 12}
            ],
            "manufacturingPlant": "Plant 7",
            "disassemblyInstructions": {"steps": ["remove casing", "isolate cells"]}
        })
    }

    /// A textile payload that satisfies the schema, including restricted fields.
    pub fn textile_payload() -> Value {
        json!({
            "garmentType": "T-Shirt",
            "fiberComposition": [{"fiber": "Cotton", "percentage": 100}],
            "countryOfOrigin": "PT",
            "supplyChainDetails": {"spinningFactory": "Secret Factory"}
        })
    }

    /// A battery payload missing every required field but the model.
    pub fn invalid_battery_payload() -> Value {
        json!({"batteryModel": "Only a model"})
    }

    /// Serialize a payload the way a client would submit it.
    pub fn to_bytes(payload: &Value) -> Vec<u8> {
        serde_json::to_vec(payload).unwrap_or_default()
    }

    pub fn battery_bytes() -> Vec<u8> {
        to_bytes(&battery_payload())
    }

    pub fn textile_bytes() -> Vec<u8> {
        to_bytes(&textile_payload())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for passport inputs.

    use super::*;
    use proptest::prelude::*;

    /// Generate an owner identity.
    pub fn arb_owner() -> impl Strategy<Value = OwnerId> {
        "mfg-[a-z0-9]{1,8}".prop_map(OwnerId::from)
    }

    pub fn arb_view_context() -> impl Strategy<Value = ViewContext> {
        prop_oneof![Just(ViewContext::Public), Just(ViewContext::Restricted)]
    }

    /// Any viewer: anonymous, or any context with an optional identity.
    pub fn arb_viewer() -> impl Strategy<Value = Viewer> {
        (arb_view_context(), proptest::option::of(arb_owner()))
            .prop_map(|(context, identity)| Viewer { context, identity })
    }

    pub fn arb_supported_category() -> impl Strategy<Value = ProductCategory> {
        prop_oneof![
            Just(ProductCategory::BatteryIndustrial),
            Just(ProductCategory::TextileApparel),
        ]
    }

    /// Leaf JSON values for attribute trees.
    pub fn arb_json_leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
        ]
    }

    /// Attribute object mixing arbitrary keys with `restricted` keys, each
    /// restricted key present or absent at random.
    pub fn arb_attributes_with(
        restricted: &'static [&'static str],
    ) -> impl Strategy<Value = AttributeTree> {
        let extra = proptest::collection::btree_map("[a-z]{1,10}", arb_json_leaf(), 0..6);
        let present = proptest::collection::vec(any::<bool>(), restricted.len());
        (extra, present, arb_json_leaf()).prop_map(move |(extra, present, secret)| {
            let mut map = serde_json::Map::new();
            for (key, value) in extra {
                map.insert(key, value);
            }
            for (field, keep) in restricted.iter().zip(present) {
                if keep {
                    map.insert((*field).to_string(), json!({"secret": secret.clone()}));
                }
            }
            AttributeTree::from(Value::Object(map))
        })
    }
}
