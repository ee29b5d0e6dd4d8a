//! Compiled schema registry.
//!
//! Built once at startup and shared read-only (typically behind an `Arc`)
//! by every request path. No interior mutability.

use std::collections::HashMap;
use std::fmt;

use jsonschema::Validator;
use passport_core::{AttributeTree, ProductCategory, ValidationError};
use serde_json::Value;

use crate::definitions::builtin_sources;
use crate::policy::{derive_policy, AccessPolicy};
use crate::SchemaError;

struct CompiledSchema {
    validator: Validator,
    policy: AccessPolicy,
}

/// Category schemas and their derived access policies.
pub struct SchemaRegistry {
    schemas: HashMap<ProductCategory, CompiledSchema>,
}

impl SchemaRegistry {
    /// Compile the schemas embedded in this crate.
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_sources(builtin_sources())
    }

    /// Compile schemas from raw JSON documents.
    pub fn from_sources<'a, I>(sources: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (ProductCategory, &'a str)>,
    {
        let mut documents = Vec::new();
        for (category, source) in sources {
            let document: Value =
                serde_json::from_str(source).map_err(|e| SchemaError::InvalidDocument {
                    category,
                    reason: e.to_string(),
                })?;
            documents.push((category, document));
        }
        Self::from_documents(documents)
    }

    /// Compile already-parsed schema documents.
    pub fn from_documents<I>(documents: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (ProductCategory, Value)>,
    {
        let mut schemas = HashMap::new();
        for (category, document) in documents {
            if schemas.contains_key(&category) {
                return Err(SchemaError::DuplicateCategory { category });
            }

            let validator =
                jsonschema::draft202012::new(&document).map_err(|e| SchemaError::Compile {
                    category,
                    reason: e.to_string(),
                })?;
            let policy = derive_policy(category, &document)?;

            tracing::debug!(
                category = %category,
                restricted = policy.len(),
                "Compiled passport schema"
            );
            schemas.insert(category, CompiledSchema { validator, policy });
        }
        Ok(Self { schemas })
    }

    /// Whether intake is possible for `category`.
    pub fn supports(&self, category: ProductCategory) -> bool {
        self.schemas.contains_key(&category)
    }

    /// Supported categories in declaration order.
    pub fn categories(&self) -> Vec<ProductCategory> {
        let mut categories: Vec<_> = self.schemas.keys().copied().collect();
        categories.sort();
        categories
    }

    /// Parse a caller-supplied category name into a supported category.
    pub fn resolve_category(&self, raw: &str) -> Result<ProductCategory, ValidationError> {
        let unsupported = || ValidationError::UnsupportedCategory {
            category: raw.to_string(),
        };
        let category: ProductCategory = raw.parse().map_err(|_| unsupported())?;
        if !self.supports(category) {
            tracing::warn!(category = %raw, "Unsupported product category");
            return Err(unsupported());
        }
        Ok(category)
    }

    /// Validate raw payload bytes against the category schema, returning the
    /// parsed attribute tree on success.
    pub fn validate(
        &self,
        category: ProductCategory,
        raw: &[u8],
    ) -> Result<AttributeTree, ValidationError> {
        let Some(schema) = self.schemas.get(&category) else {
            tracing::warn!(category = %category, "Unsupported product category");
            return Err(ValidationError::UnsupportedCategory {
                category: category.to_string(),
            });
        };

        let attributes = AttributeTree::parse(raw).map_err(|e| {
            tracing::warn!(category = %category, error = %e, "Malformed passport payload");
            ValidationError::MalformedJson {
                detail: e.to_string(),
            }
        })?;

        let violations: Vec<String> = schema
            .validator
            .iter_errors(attributes.as_value())
            .map(|e| e.to_string())
            .collect();

        if !violations.is_empty() {
            let err = ValidationError::SchemaViolation { violations };
            tracing::warn!(
                category = %category,
                detail = %err.detail(),
                "Passport payload failed schema validation"
            );
            return Err(err);
        }

        Ok(attributes)
    }

    /// Access policy for one category.
    pub fn policy(&self, category: ProductCategory) -> Option<&AccessPolicy> {
        self.schemas.get(&category).map(|s| &s.policy)
    }

    /// Every category's policy, keyed by category.
    pub fn policies(&self) -> HashMap<ProductCategory, AccessPolicy> {
        self.schemas
            .iter()
            .map(|(category, schema)| (*category, schema.policy.clone()))
            .collect()
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("categories", &self.categories())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::builtin().expect("builtin schemas compile")
    }

    fn battery_payload() -> Value {
        json!({
            "batteryModel": "PowerCell 9000",
            "chemistry": "LITHIUM_ION",
            "ratedCapacity": 100,
            "carbonFootprint": {"totalCarbonFootprint": 50.5, "shareOfRenewables": 90},
            "materialComposition": [{"material": "Lithium", "massPercentage": 5}]
        })
    }

    #[test]
    fn test_builtin_categories() {
        let registry = registry();
        assert_eq!(
            registry.categories(),
            vec![ProductCategory::BatteryIndustrial, ProductCategory::TextileApparel]
        );
        assert!(!registry.supports(ProductCategory::ConsumerElectronic));
    }

    #[test]
    fn test_valid_battery_payload() {
        let raw = serde_json::to_vec(&battery_payload()).unwrap();
        let attributes = registry()
            .validate(ProductCategory::BatteryIndustrial, &raw)
            .unwrap();
        assert_eq!(attributes.as_value(), &battery_payload());
    }

    #[test]
    fn test_missing_required_fields() {
        let raw = br#"{"batteryModel": "Only a model"}"#;
        let err = registry()
            .validate(ProductCategory::BatteryIndustrial, raw)
            .unwrap_err();
        assert_eq!(err.to_string(), "schema validation failed");
        assert!(err.detail().contains("chemistry"));
    }

    #[test]
    fn test_wrong_type_is_violation() {
        let mut payload = battery_payload();
        payload["ratedCapacity"] = json!("a lot");
        let raw = serde_json::to_vec(&payload).unwrap();
        let err = registry()
            .validate(ProductCategory::BatteryIndustrial, &raw)
            .unwrap_err();
        assert!(matches!(err, ValidationError::SchemaViolation { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = registry()
            .validate(ProductCategory::TextileApparel, b"{\"garmentType\": ")
            .unwrap_err();
        assert_eq!(err.to_string(), "malformed JSON");
        assert!(!err.detail().is_empty());
    }

    #[test]
    fn test_unsupported_category() {
        let err = registry()
            .validate(ProductCategory::ConsumerElectronic, b"{}")
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedCategory { .. }));

        let registry = registry();
        assert!(registry.resolve_category("CONSUMER_ELECTRONIC").is_err());
        assert!(registry.resolve_category("NOT_A_CATEGORY").is_err());
        assert_eq!(
            registry.resolve_category("TEXTILE_APPAREL"),
            Ok(ProductCategory::TextileApparel)
        );
    }

    #[test]
    fn test_builtin_policies() {
        let policies = registry().policies();
        let battery = &policies[&ProductCategory::BatteryIndustrial];
        assert!(battery.is_restricted("disassemblyInstructions"));
        assert!(battery.is_restricted("materialComposition"));
        assert!(battery.is_restricted("supplyChainDueDiligence"));
        assert!(!battery.is_restricted("batteryModel"));

        let textile = &policies[&ProductCategory::TextileApparel];
        assert_eq!(
            textile.restricted_fields().collect::<Vec<_>>(),
            vec!["supplyChainDetails"]
        );
    }

    #[test]
    fn test_compile_failure_is_reported() {
        let err = SchemaRegistry::from_documents(vec![(
            ProductCategory::TextileApparel,
            json!({"type": 12}),
        )])
        .unwrap_err();
        assert!(matches!(err, SchemaError::Compile { .. }));
    }

    #[test]
    fn test_invalid_document_is_reported() {
        let err =
            SchemaRegistry::from_sources(vec![(ProductCategory::TextileApparel, "{oops")])
                .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDocument { .. }));
    }

    #[test]
    fn test_duplicate_category_is_rejected() {
        let err = SchemaRegistry::from_documents(vec![
            (ProductCategory::TextileApparel, json!({"type": "object"})),
            (ProductCategory::TextileApparel, json!({"type": "object"})),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateCategory {
                category: ProductCategory::TextileApparel
            }
        );
    }

    proptest! {
        #[test]
        fn prop_arbitrary_bytes_never_panic(raw in proptest::collection::vec(any::<u8>(), 0..256)) {
            let registry = registry();
            match registry.validate(ProductCategory::TextileApparel, &raw) {
                Ok(tree) => prop_assert!(tree.is_object()),
                Err(err) => {
                    let expected_kind = matches!(
                        err,
                        ValidationError::MalformedJson { .. } | ValidationError::SchemaViolation { .. }
                    );
                    prop_assert!(expected_kind);
                }
            }
        }
    }
}
