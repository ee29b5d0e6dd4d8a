//! Access policy derivation from schema metadata.

use std::collections::BTreeSet;

use passport_core::ProductCategory;
use serde_json::Value;

use crate::SchemaError;

/// Property-level keyword carrying the access tag.
pub const ACCESS_KEYWORD: &str = "access";

/// Visibility of a top-level attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessTag {
    #[default]
    Public,
    Restricted,
}

impl AccessTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessTag::Public => "public",
            AccessTag::Restricted => "restricted",
        }
    }

    /// Read the tag off a property definition. A missing keyword is `Public`.
    fn from_property(property: &Value) -> Result<Self, String> {
        match property.get(ACCESS_KEYWORD) {
            None => Ok(AccessTag::Public),
            Some(Value::String(tag)) => match tag.as_str() {
                "public" => Ok(AccessTag::Public),
                "restricted" => Ok(AccessTag::Restricted),
                other => Err(other.to_string()),
            },
            Some(other) => Err(other.to_string()),
        }
    }
}

/// Restricted top-level field names for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    restricted: BTreeSet<String>,
}

impl AccessPolicy {
    pub fn new<I, S>(restricted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            restricted: restricted.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_restricted(&self, field: &str) -> bool {
        self.restricted.contains(field)
    }

    /// Restricted fields in lexical order.
    pub fn restricted_fields(&self) -> impl Iterator<Item = &str> {
        self.restricted.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.restricted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restricted.is_empty()
    }
}

/// Collect every top-level property tagged `restricted`.
pub fn derive_policy(category: ProductCategory, schema: &Value) -> Result<AccessPolicy, SchemaError> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(AccessPolicy::default());
    };

    let mut restricted = BTreeSet::new();
    for (name, definition) in properties {
        let tag = AccessTag::from_property(definition).map_err(|tag| {
            SchemaError::InvalidAccessTag {
                category,
                property: name.clone(),
                tag,
            }
        })?;
        if tag == AccessTag::Restricted {
            restricted.insert(name.clone());
        }
    }

    Ok(AccessPolicy { restricted })
}
