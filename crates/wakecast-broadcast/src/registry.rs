use crate::subscriber::{Subscriber, SubscriberId};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The set of currently connected subscribers.
///
/// Every operation holds the lock for a single map mutation or copy, and the
/// lock is never held across an `.await`.
pub struct SubscriberRegistry {
    members: Mutex<BTreeMap<SubscriberId, Arc<dyn Subscriber>>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate an identity for a new connection.
    pub fn next_id(&self) -> SubscriberId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn add(&self, subscriber: Arc<dyn Subscriber>) {
        self.lock().insert(subscriber.id(), subscriber);
    }

    /// Returns `true` if the subscriber was still registered.
    pub fn remove(&self, id: SubscriberId) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Point-in-time copy ordered by connection order.
    pub fn snapshot(&self) -> Vec<Arc<dyn Subscriber>> {
        self.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<SubscriberId, Arc<dyn Subscriber>>> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
