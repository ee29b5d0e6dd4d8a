//! Passport Schema - Payload Validation and Access Policies
//!
//! Category schemas are compiled exactly once into an immutable
//! [`SchemaRegistry`]. The same schema documents feed two consumers:
//!
//! - the payload validator, which checks submitted attributes against the
//!   category's JSON Schema (Draft 2020-12)
//! - the access policy deriver, which reads the per-property `access` tag
//!   (`public` | `restricted`, default `public`) into an [`AccessPolicy`]
//!
//! Schema changes require a restart; there is no reload path.

pub mod definitions;
pub mod error;
pub mod policy;
pub mod registry;

pub use error::SchemaError;
pub use policy::{derive_policy, AccessPolicy, AccessTag, ACCESS_KEYWORD};
pub use registry::SchemaRegistry;
