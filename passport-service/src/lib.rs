//! Passport Service - Lifecycle Core
//!
//! Manages a regulated product record ("passport") from intake to its
//! immutable published form:
//!
//! - idempotent creation under duplicate submissions ([`idempotency`])
//! - cached reads with per-request field redaction ([`redaction`])
//! - a one-shot, content-addressed publish ([`publish`])
//!
//! Transport, authentication and persistence engines are external; the
//! service consumes them through the traits in `passport-storage`.

pub mod events;
pub mod idempotency;
pub mod publish;
pub mod redaction;
pub mod service;
pub mod telemetry;

pub use events::EventEmitter;
pub use idempotency::{Fingerprint, IdempotencyCoordinator, Resolution};
pub use publish::{blob_key, PublishWorkflow};
pub use redaction::RedactionEngine;
pub use service::{CreateOutcome, PassportService, ServiceStores};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig, TelemetryError};
