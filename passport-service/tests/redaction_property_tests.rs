//! Property tests for viewer-dependent redaction through the read path.

mod common;

use common::{Harness, OWNER};
use passport_core::{OwnerId, Passport, ProductCategory, Viewer};
use passport_storage::RecordStore;
use passport_test_utils::{fixtures, generators};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_non_owner_never_sees_restricted_fields(
        attributes in generators::arb_attributes_with(&fixtures::BATTERY_RESTRICTED),
        viewer in generators::arb_viewer(),
    ) {
        prop_assume!(!viewer.is_owner_of(&OwnerId::from(OWNER)));
        let rt = runtime();
        let h = Harness::new();
        let passport = Passport::draft(
            OwnerId::from(OWNER),
            "Acme Cells",
            ProductCategory::BatteryIndustrial,
            attributes.clone(),
        );
        let id = passport.passport_id;

        let seen = rt.block_on(async {
            h.records.inner.save(&passport).await.unwrap();
            h.service.get(id, &viewer).await.unwrap()
        });

        for field in fixtures::BATTERY_RESTRICTED {
            prop_assert!(!seen.attributes.contains_key(field));
        }
        for key in attributes.top_level_keys() {
            if !fixtures::BATTERY_RESTRICTED.contains(&key) {
                prop_assert!(seen.attributes.contains_key(key));
            }
        }
    }

    #[test]
    fn prop_owner_sees_everything(
        attributes in generators::arb_attributes_with(&fixtures::BATTERY_RESTRICTED),
    ) {
        let rt = runtime();
        let h = Harness::new();
        let passport = Passport::draft(
            OwnerId::from(OWNER),
            "Acme Cells",
            ProductCategory::BatteryIndustrial,
            attributes.clone(),
        );
        let id = passport.passport_id;

        let seen = rt.block_on(async {
            h.records.inner.save(&passport).await.unwrap();
            h.service.get(id, &Viewer::authenticated(OWNER)).await.unwrap()
        });

        prop_assert_eq!(seen.attributes, attributes);
    }
}
