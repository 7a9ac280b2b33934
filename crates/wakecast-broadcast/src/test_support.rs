use crate::subscriber::{Subscriber, SubscriberId};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use wakecast_core::BroadcastError;

/// In-memory subscriber recording every delivered frame, optionally failing
/// every send.
pub struct RecordingSubscriber {
    id: SubscriberId,
    connected_at: Instant,
    fail: bool,
    received: Mutex<Vec<String>>,
}

impl RecordingSubscriber {
    pub fn new(id: SubscriberId) -> Arc<Self> {
        Arc::new(Self {
            id,
            connected_at: Instant::now(),
            fail: false,
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(id: SubscriberId) -> Arc<Self> {
        Arc::new(Self {
            id,
            connected_at: Instant::now(),
            fail: true,
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl Subscriber for RecordingSubscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn connected_at(&self) -> Instant {
        self.connected_at
    }

    async fn send_text(&self, text: &str) -> Result<(), BroadcastError> {
        if self.fail {
            return Err(BroadcastError::SendFailed("connection reset".to_string()));
        }
        self.received.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
