use crate::registry::SubscriberRegistry;
use crate::subscriber::{Subscriber, WsSubscriber};
use futures_util::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use wakecast_core::BroadcastError;

/// Accepts WebSocket subscribers and keeps the registry in sync with live
/// connections.
pub struct ConnectionAcceptor {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionAcceptor {
    /// Bind `addr` and spawn the accept loop. Returns once the socket is bound.
    pub async fn serve(addr: &str, registry: Arc<SubscriberRegistry>) -> Result<Self, BroadcastError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| BroadcastError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| BroadcastError::Bind {
            addr: addr.to_string(),
            source,
        })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(accept_loop(listener, registry, shutdown_rx));
        tracing::info!("websocket server listening on ws://{}", local_addr);

        Ok(Self {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting new connections. Connections already accepted keep
    /// running.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    registry: Arc<SubscriberRegistry>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                tracing::info!("acceptor stopped");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        tokio::spawn(handle_connection(stream, peer, Arc::clone(&registry)));
                    }
                    Err(e) => {
                        tracing::warn!("accept failed: {e}");
                    }
                }
            }
        }
    }
}

/// Register the connection, then drain and discard inbound frames until the
/// peer goes away.
async fn handle_connection(stream: TcpStream, peer: SocketAddr, registry: Arc<SubscriberRegistry>) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(%peer, "{}", BroadcastError::Handshake(e.to_string()));
            return;
        }
    };

    let (sink, mut inbound) = ws.split();
    let subscriber = Arc::new(WsSubscriber::new(registry.next_id(), peer, sink));
    let id = subscriber.id();
    registry.add(subscriber.clone());
    tracing::info!(
        subscriber_id = id,
        %peer,
        subscribers = registry.len(),
        "client connected"
    );

    while let Some(frame) = inbound.next().await {
        if let Err(e) = frame {
            tracing::debug!(subscriber_id = id, "connection error: {e}");
            break;
        }
    }

    registry.remove(id);
    tracing::info!(
        subscriber_id = id,
        connected_for = ?subscriber.connected_at().elapsed(),
        subscribers = registry.len(),
        "client disconnected"
    );
}
