//! Response Events
//!
//! Envelope for the JSON payload a successful invocation hands to the host
//! platform. Exactly one event per successful invocation; failures emit
//! nothing and propagate as errors instead.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Channel half the host hands to the invoker to receive events
pub type EventSink = tokio::sync::mpsc::UnboundedSender<BlockEvent>;

/// One emitted response event
#[derive(Debug, Clone, Serialize)]
pub struct BlockEvent {
    /// Unique id of the invocation that produced this event
    pub invocation_id: Uuid,
    /// Registry key of the block that ran
    pub endpoint: String,
    pub emitted_at: DateTime<Utc>,
    /// Parsed response body; always a JSON object, `{}` for empty responses
    pub payload: Value,
}

impl BlockEvent {
    pub fn new(endpoint: &str, payload: Value) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            endpoint: endpoint.to_string(),
            emitted_at: Utc::now(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_events_get_distinct_invocation_ids() {
        let a = BlockEvent::new("compute.firewalls.get", json!({}));
        let b = BlockEvent::new("compute.firewalls.get", json!({}));
        assert_ne!(a.invocation_id, b.invocation_id);
    }

    #[test]
    fn test_event_serializes_with_payload() {
        let event = BlockEvent::new("compute.firewalls.get", json!({"name": "allow-ssh"}));
        let serialized = serde_json::to_value(&event).unwrap();
        assert_eq!(serialized["endpoint"], "compute.firewalls.get");
        assert_eq!(serialized["payload"]["name"], "allow-ssh");
        assert!(serialized["invocation_id"].is_string());
    }

    #[test]
    fn test_sink_delivers_events() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink: EventSink = tx;
        sink.send(BlockEvent::new("run.workerPools.list", json!({})))
            .unwrap();

        tokio_test::block_on(async {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.endpoint, "run.workerPools.list");
        });
    }
}
