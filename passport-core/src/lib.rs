//! Passport Core - Entity Types
//!
//! Pure data structures shared by every other crate in the workspace.
//! This crate performs no I/O: storage, schema validation and the lifecycle
//! workflows live in their own crates and depend on the types defined here.

pub mod attributes;
pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod event;
pub mod identity;

pub use attributes::AttributeTree;
pub use config::PassportConfig;
pub use entities::{OwnerId, Passport, Viewer};
pub use enums::{
    PassportStatus, PassportStatusParseError, ProductCategory, ProductCategoryParseError,
    ViewContext, ViewContextParseError,
};
pub use error::{
    ConfigError, ErrorCode, PassportError, PassportResult, StorageError, StorageResult,
    ValidationError,
};
pub use event::{PassportCreated, PassportEvent};
pub use identity::{
    compute_content_hash, content_hash_hex, new_passport_id, ContentHash, PassportId, Timestamp,
};
