use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::RetryPolicy;
use super::{DomainEvent, NotificationSink};

/// Deliver one event, retrying with exponential backoff. Returns whether it
/// was eventually delivered.
pub async fn deliver_with_retry(sink: &dyn NotificationSink, event: &DomainEvent, policy: &RetryPolicy) -> bool {
    for attempt in 1..=policy.max_attempts {
        match sink.deliver(event).await {
            Ok(()) => return true,
            Err(e) if attempt < policy.max_attempts => {
                let delay = policy.backoff(attempt);
                log::warn!(
                    "Delivery of {} for {} failed (attempt {attempt}): {e}; retrying in {delay:?}",
                    event.event_type,
                    event.proposal_id
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                log::error!(
                    "Giving up on {} for {} after {attempt} attempts: {e}",
                    event.event_type,
                    event.proposal_id
                );
            }
        }
    }
    false
}

/// Drain the dispatcher queue until every sender is dropped.
pub fn spawn_delivery_worker(
    mut rx: mpsc::UnboundedReceiver<DomainEvent>,
    sink: Arc<dyn NotificationSink>,
    policy: RetryPolicy,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        log::info!("Notification worker started");
        while let Some(event) = rx.recv().await {
            deliver_with_retry(sink.as_ref(), &event, &policy).await;
        }
        log::info!("Notification worker stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::notify::{NotificationDispatcher, QueueDispatcher};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Fails the first `failures` deliveries, then records.
    struct FlakySink {
        failures: Mutex<u32>,
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationSink for FlakySink {
        async fn deliver(&self, event: &DomainEvent) -> Result<(), AppError> {
            {
                let mut left = self.failures.lock().unwrap();
                if *left > 0 {
                    *left -= 1;
                    return Err(AppError::Internal("smtp down".into()));
                }
            }
            self.delivered.lock().unwrap().push(event.event_type.clone());
            Ok(())
        }
    }

    fn event(kind: &str) -> DomainEvent {
        DomainEvent {
            event_type: kind.into(),
            proposal_id: "P-1".into(),
            recipients: vec!["U-1".into()],
            payload: serde_json::json!({}),
            occurred_at: chrono::Utc::now(),
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy { max_attempts, base_backoff: Duration::from_millis(1) }
    }

    #[tokio::test]
    async fn retries_until_delivered() {
        let sink = FlakySink { failures: Mutex::new(2), delivered: Mutex::new(vec![]) };
        assert!(deliver_with_retry(&sink, &event("proposal.rejected"), &policy(3)).await);
        assert_eq!(*sink.delivered.lock().unwrap(), ["proposal.rejected"]);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let sink = FlakySink { failures: Mutex::new(5), delivered: Mutex::new(vec![]) };
        assert!(!deliver_with_retry(&sink, &event("proposal.rejected"), &policy(3)).await);
        assert_eq!(*sink.failures.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn worker_drains_queue_in_order() {
        let sink = Arc::new(FlakySink { failures: Mutex::new(0), delivered: Mutex::new(vec![]) });
        let (dispatcher, rx) = QueueDispatcher::new();
        let handle = spawn_delivery_worker(rx, sink.clone(), policy(1));
        dispatcher.enqueue(event("proposal.forwarded")).unwrap();
        dispatcher.enqueue(event("proposal.approved")).unwrap();
        drop(dispatcher);
        handle.await.unwrap();
        assert_eq!(*sink.delivered.lock().unwrap(), ["proposal.forwarded", "proposal.approved"]);
    }
}
