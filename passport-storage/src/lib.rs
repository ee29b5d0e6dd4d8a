//! Passport Storage - Collaborator Traits and Adapters
//!
//! Defines the narrow contracts the lifecycle core consumes (durable record
//! store, fast cache, idempotency store, write-once blob store, event bus),
//! in-memory implementations of each, the detached task runner and the
//! read-through cache built on top of them.

pub mod cache;
pub mod memory;
pub mod tasks;
pub mod traits;

pub use cache::{CacheConfig, CacheRead, ReadThroughCache};
pub use memory::{
    BroadcastEventPublisher, ChannelEvent, InMemoryBlobStore, InMemoryCache,
    InMemoryIdempotencyStore, InMemoryRecordStore, StoredBlob,
};
pub use tasks::BackgroundTasks;
pub use traits::{
    BlobStore, EventPublisher, FastCache, IdempotencyStore, RecordStore, RetentionMode,
    WriteOnceRetention,
};
