//! Read-through passport cache.
//!
//! The fast tier always holds the full, unredacted record. Reads prefer the
//! fast tier, fall back to the durable tier on a miss or a corrupt entry, and
//! refill the fast tier in the background. Every read returns a
//! [`CacheRead`] so callers can tell which tier answered.

pub mod read;
pub mod read_through;

pub use read::CacheRead;
pub use read_through::{CacheConfig, ReadThroughCache};
