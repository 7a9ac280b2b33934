use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use wakecast_core::BroadcastError;

/// Identity of a subscriber for the lifetime of its connection.
pub type SubscriberId = u64;

/// A connected client awaiting wake notifications.
#[async_trait]
pub trait Subscriber: Send + Sync {
    fn id(&self) -> SubscriberId;
    fn connected_at(&self) -> Instant;
    /// Deliver one text frame.
    async fn send_text(&self, text: &str) -> Result<(), BroadcastError>;
}

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Write half of an accepted WebSocket connection.
pub struct WsSubscriber {
    id: SubscriberId,
    peer: SocketAddr,
    connected_at: Instant,
    sink: Mutex<WsSink>,
}

impl WsSubscriber {
    pub fn new(id: SubscriberId, peer: SocketAddr, sink: WsSink) -> Self {
        Self {
            id,
            peer,
            connected_at: Instant::now(),
            sink: Mutex::new(sink),
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

#[async_trait]
impl Subscriber for WsSubscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn connected_at(&self) -> Instant {
        self.connected_at
    }

    async fn send_text(&self, text: &str) -> Result<(), BroadcastError> {
        self.sink
            .lock()
            .await
            .send(Message::text(text.to_owned()))
            .await
            .map_err(|e| BroadcastError::SendFailed(format!("{}: {e}", self.peer)))
    }
}
