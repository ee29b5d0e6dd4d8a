//! Fire-and-forget lifecycle notifications.

use std::sync::Arc;

use chrono::Utc;
use passport_core::{Passport, PassportCreated, PassportEvent};
use passport_storage::{BackgroundTasks, EventPublisher};

/// Publishes lifecycle events as detached tasks. Failures are logged and
/// never reach the operation that produced the event.
#[derive(Clone)]
pub struct EventEmitter {
    publisher: Arc<dyn EventPublisher>,
    tasks: BackgroundTasks,
    created_channel: String,
}

impl EventEmitter {
    pub fn new(
        publisher: Arc<dyn EventPublisher>,
        tasks: BackgroundTasks,
        created_channel: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            tasks,
            created_channel: created_channel.into(),
        }
    }

    pub fn created_channel(&self) -> &str {
        &self.created_channel
    }

    /// Announce a newly created passport.
    pub fn passport_created(&self, passport: &Passport) {
        let event = PassportEvent::Created(PassportCreated {
            tenant_id: passport.manufacturer_id.clone(),
            passport_id: passport.passport_id,
            timestamp: Utc::now(),
        });
        self.emit(self.created_channel.clone(), event);
    }

    fn emit(&self, channel: String, event: PassportEvent) {
        let publisher = Arc::clone(&self.publisher);
        self.tasks.spawn("event_publish", async move {
            if let Err(e) = publisher.publish(&channel, &event).await {
                tracing::error!(
                    channel = %channel,
                    event_type = event.event_type(),
                    passport_id = %event.passport_id(),
                    error = %e,
                    "Failed to publish passport event"
                );
            }
        });
    }
}
