use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use wakecast_broadcast::{ConnectionAcceptor, EventBroadcaster, SubscriberRegistry};
use wakecast_core::WakeEvent;

async fn wait_for_len(registry: &SubscriberRegistry, expected: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while registry.len() != expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("registry never reached {expected} (is {})", registry.len()));
}

async fn start() -> (Arc<SubscriberRegistry>, ConnectionAcceptor, String) {
    let registry = Arc::new(SubscriberRegistry::new());
    let acceptor = ConnectionAcceptor::serve("127.0.0.1:0", Arc::clone(&registry))
        .await
        .unwrap();
    let url = format!("ws://{}", acceptor.local_addr());
    (registry, acceptor, url)
}

#[tokio::test]
async fn test_two_clients_receive_wake_message() {
    let (registry, mut acceptor, url) = start().await;
    let (mut client_a, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    let (mut client_b, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    wait_for_len(&registry, 2).await;

    let broadcaster = EventBroadcaster::new(Arc::clone(&registry));
    let report = broadcaster.broadcast(&WakeEvent::new("hey pluto")).await;
    assert_eq!(report.delivered, 2);

    for client in [&mut client_a, &mut client_b] {
        let msg = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out")
            .expect("stream ended")
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"type": "wake", "phrase": "hey pluto"}));
    }

    acceptor.shutdown().await;
}

#[tokio::test]
async fn test_disconnect_removes_subscriber() {
    let (registry, mut acceptor, url) = start().await;
    let (mut client, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    wait_for_len(&registry, 1).await;

    client.close(None).await.unwrap();
    drop(client);
    wait_for_len(&registry, 0).await;

    let broadcaster = EventBroadcaster::new(Arc::clone(&registry));
    let report = broadcaster.broadcast(&WakeEvent::new("hey pluto")).await;
    assert_eq!(report.delivered, 0);

    acceptor.shutdown().await;
}

#[tokio::test]
async fn test_dropped_connection_without_close_frame_is_removed() {
    let (registry, mut acceptor, url) = start().await;
    let (client, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    wait_for_len(&registry, 1).await;

    // Vanish without a close handshake or any data.
    drop(client);
    wait_for_len(&registry, 0).await;

    let broadcaster = EventBroadcaster::new(Arc::clone(&registry));
    let report = broadcaster.broadcast(&WakeEvent::new("hey pluto")).await;
    assert_eq!(report.delivered, 0);
    assert_eq!(report.failed, 0);

    acceptor.shutdown().await;
}

#[tokio::test]
async fn test_inbound_messages_are_ignored() {
    let (registry, mut acceptor, url) = start().await;
    let (mut client, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    wait_for_len(&registry, 1).await;

    client.send(Message::text("hello server".to_string())).await.unwrap();
    client.send(Message::binary(vec![1u8, 2, 3])).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(registry.len(), 1);

    // Still subscribed after sending junk.
    let broadcaster = EventBroadcaster::new(Arc::clone(&registry));
    broadcaster.broadcast(&WakeEvent::new("hey pluto")).await;
    let msg = tokio::time::timeout(Duration::from_secs(2), client.next())
        .await
        .expect("timed out")
        .expect("stream ended")
        .unwrap();
    assert_eq!(msg.to_text().unwrap(), r#"{"type":"wake","phrase":"hey pluto"}"#);

    acceptor.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_stops_accepting_but_keeps_existing() {
    let (registry, mut acceptor, url) = start().await;
    let (mut client, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    wait_for_len(&registry, 1).await;

    acceptor.shutdown().await;

    let late = tokio::time::timeout(
        Duration::from_millis(500),
        tokio_tungstenite::connect_async(url.as_str()),
    )
    .await;
    assert!(!matches!(late, Ok(Ok(_))), "connected after shutdown");

    // The existing subscriber is untouched.
    assert_eq!(registry.len(), 1);
    let broadcaster = EventBroadcaster::new(Arc::clone(&registry));
    assert_eq!(broadcaster.broadcast(&WakeEvent::new("hey pluto")).await.delivered, 1);
    assert!(client.next().await.is_some());
}

#[tokio::test]
async fn test_bind_conflict_is_reported() {
    let (_registry, mut acceptor, _url) = start().await;
    let addr = acceptor.local_addr().to_string();
    let result = ConnectionAcceptor::serve(&addr, Arc::new(SubscriberRegistry::new())).await;
    assert!(matches!(result, Err(wakecast_core::BroadcastError::Bind { .. })));
    acceptor.shutdown().await;
}
