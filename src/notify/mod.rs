pub mod sinks;
pub mod worker;

pub use sinks::{LogSink, PgOutbox};
pub use worker::{deliver_with_retry, spawn_delivery_worker};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::errors::AppError;

/// Event emitted after a decision commits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    pub event_type: String,
    pub proposal_id: String,
    pub recipients: Vec<String>,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

/// Fire-and-forget hand-off. Must not block; delivery and its retries happen
/// elsewhere.
pub trait NotificationDispatcher: Send + Sync {
    fn enqueue(&self, event: DomainEvent) -> Result<(), AppError>;
}

/// Final destination of a notification.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, event: &DomainEvent) -> Result<(), AppError>;
}

/// Dispatcher backed by an unbounded channel drained by
/// [`spawn_delivery_worker`].
#[derive(Debug, Clone)]
pub struct QueueDispatcher {
    tx: mpsc::UnboundedSender<DomainEvent>,
}

impl QueueDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DomainEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (QueueDispatcher { tx }, rx)
    }
}

impl NotificationDispatcher for QueueDispatcher {
    fn enqueue(&self, event: DomainEvent) -> Result<(), AppError> {
        self.tx
            .send(event)
            .map_err(|e| AppError::Internal(format!("notification queue closed, dropped {}", e.0.event_type)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> DomainEvent {
        DomainEvent {
            event_type: "proposal.approved".into(),
            proposal_id: "P-1".into(),
            recipients: vec!["U-1".into()],
            payload: serde_json::json!({}),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn enqueue_fails_once_receiver_is_gone() {
        let (dispatcher, rx) = QueueDispatcher::new();
        dispatcher.enqueue(event()).unwrap();
        drop(rx);
        assert!(dispatcher.enqueue(event()).is_err());
    }
}
