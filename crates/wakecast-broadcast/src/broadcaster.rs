use crate::registry::SubscriberRegistry;
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use wakecast_core::WakeEvent;

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Pushes wake events to every registered subscriber.
#[derive(Clone)]
pub struct EventBroadcaster {
    registry: Arc<SubscriberRegistry>,
}

impl EventBroadcaster {
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver `event` to a snapshot of the registry.
    ///
    /// Sends run concurrently and this returns once every one has resolved.
    /// Subscribers whose send fails are removed from the registry; the
    /// remaining deliveries are unaffected.
    pub async fn broadcast(&self, event: &WakeEvent) -> BroadcastReport {
        let subscribers = self.registry.snapshot();
        if subscribers.is_empty() {
            return BroadcastReport::default();
        }

        let message = match event.to_json() {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(phrase = %event.phrase, "failed to serialize wake event: {e}");
                return BroadcastReport::default();
            }
        };

        let sends = subscribers.iter().map(|subscriber| {
            let message = message.as_str();
            async move { (subscriber.id(), subscriber.send_text(message).await) }
        });

        let mut report = BroadcastReport::default();
        for (id, result) in join_all(sends).await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(subscriber_id = id, "dropping subscriber: {e}");
                    self.registry.remove(id);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Spawn the dispatch task that broadcasts each event received on `rx`, in
    /// order. The task ends once every sender is dropped.
    pub fn start(self, mut rx: mpsc::UnboundedReceiver<WakeEvent>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                tracing::info!(
                    phrase = %event.phrase,
                    "broadcasting wake to {} subscriber(s)",
                    self.registry.len()
                );
                let report = self.broadcast(&event).await;
                tracing::debug!(
                    delivered = report.delivered,
                    failed = report.failed,
                    "broadcast complete"
                );
            }
            tracing::debug!("wake event channel closed, dispatcher stopping");
        })
    }
}
