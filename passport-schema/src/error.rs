//! Startup errors raised while loading category schemas

use passport_core::ProductCategory;
use thiserror::Error;

/// Failure building the schema registry. Always fatal: a process that
/// cannot compile its schemas cannot serve.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema for {category} is not valid JSON: {reason}")]
    InvalidDocument {
        category: ProductCategory,
        reason: String,
    },

    #[error("Schema for {category} failed to compile: {reason}")]
    Compile {
        category: ProductCategory,
        reason: String,
    },

    #[error("Schema for {category} declares unknown access tag {tag} on property {property}")]
    InvalidAccessTag {
        category: ProductCategory,
        property: String,
        tag: String,
    },

    #[error("Schema for {category} registered more than once")]
    DuplicateCategory { category: ProductCategory },
}
