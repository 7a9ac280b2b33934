pub mod acceptor;
pub mod broadcaster;
pub mod registry;
pub mod subscriber;
#[cfg(test)]
pub(crate) mod test_support;

pub use acceptor::ConnectionAcceptor;
pub use broadcaster::{BroadcastReport, EventBroadcaster};
pub use registry::SubscriberRegistry;
pub use subscriber::{Subscriber, SubscriberId, WsSubscriber};
