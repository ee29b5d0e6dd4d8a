//! Lifecycle notifications emitted to the event bus.

use crate::{OwnerId, PassportId, Timestamp};
use serde::{Deserialize, Serialize};

/// Payload published when a new passport is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassportCreated {
    pub tenant_id: OwnerId,
    pub passport_id: PassportId,
    pub timestamp: Timestamp,
}

/// Events emitted by the lifecycle core. Fire-and-forget: publishing never
/// affects the outcome of the operation that produced the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PassportEvent {
    Created(PassportCreated),
}

impl PassportEvent {
    /// Get the event type name for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            PassportEvent::Created(_) => "passport_created",
        }
    }

    pub fn passport_id(&self) -> PassportId {
        match self {
            PassportEvent::Created(created) => created.passport_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_created_wire_shape() {
        let event = PassportEvent::Created(PassportCreated {
            tenant_id: OwnerId::from("mfg-1"),
            passport_id: Uuid::nil(),
            timestamp: Utc::now(),
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["tenant_id"], "mfg-1");
        assert_eq!(value["passport_id"], Uuid::nil().to_string());
        assert!(value.get("timestamp").is_some());
        assert_eq!(event.event_type(), "passport_created");
    }
}
