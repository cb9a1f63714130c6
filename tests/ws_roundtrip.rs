//! End-to-end coverage for the WebSocket listener over loopback.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use streammux::config::SocketConfig;
use streammux::frame::{FrameEncoder, FrameHeader};
use streammux::message::{Message, MessageKind};
use streammux::server::WsStreamServer;
use streammux::session::SessionRegistry;

/// Poll the registry until a message arrives or the test times out.
async fn recv_message(registry: &SessionRegistry) -> Message {
    timeout(Duration::from_secs(5), async {
        loop {
            if let Some(message) = registry.recv() {
                return message;
            }
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for an inbound message")
}

#[tokio::test]
async fn frames_flow_over_websocket() {
    let registry = Arc::new(SessionRegistry::new());
    let server = WsStreamServer::bind(
        ([127, 0, 0, 1], 0).into(),
        Arc::clone(&registry),
        SocketConfig::default(),
    )
    .expect("bind websocket server");

    let url = format!("ws://{}", server.local_addr());
    let (mut websocket, _response) = connect_async(url).await.expect("websocket handshake");

    let connect = recv_message(&registry).await;
    assert_eq!(connect.kind(), &MessageKind::Connect);
    let id = connect.id();

    let mut encoder = FrameEncoder::new();
    let header = FrameHeader::new(21, 22, 23, 2);
    let frame = encoder.encode(&header, b"over websocket").unwrap();
    websocket
        .send(WsMessage::Binary(frame.to_vec()))
        .await
        .expect("send binary frame");

    let inbound = recv_message(&registry).await;
    assert_eq!(inbound.id(), id);
    assert_eq!(inbound.header(), Some(&header));
    assert_eq!(inbound.into_body().unwrap().as_ref(), b"over websocket");

    // Reply through the registry; the client sees one binary message.
    let reply = encoder.encode(&header, b"ack").unwrap();
    assert!(registry.send(Message::frame(id, header, reply.clone())));
    let echoed = timeout(Duration::from_secs(5), websocket.next())
        .await
        .expect("timed out reading the reply")
        .expect("stream ended early")
        .expect("read the reply");
    assert_eq!(echoed, WsMessage::Binary(reply.to_vec()));

    websocket.close(None).await.expect("close websocket");
    let disconnect = recv_message(&registry).await;
    assert_eq!(disconnect.id(), id);
    assert_eq!(disconnect.kind(), &MessageKind::Disconnect);

    server.close().await;
}

#[tokio::test]
async fn frames_split_across_binary_messages_decode_once_complete() {
    let registry = Arc::new(SessionRegistry::new());
    let server = WsStreamServer::bind(
        ([127, 0, 0, 1], 0).into(),
        Arc::clone(&registry),
        SocketConfig::default(),
    )
    .expect("bind websocket server");

    let url = format!("ws://{}", server.local_addr());
    let (mut websocket, _response) = connect_async(url).await.expect("websocket handshake");
    let connect = recv_message(&registry).await;
    assert_eq!(connect.kind(), &MessageKind::Connect);

    let mut encoder = FrameEncoder::new();
    let header = FrameHeader::new(5, 6, 7, 1);
    let frame = encoder.encode(&header, b"chunked").unwrap();

    // The frame protocol rides above WebSocket message boundaries: a frame
    // may span several binary messages.
    websocket
        .send(WsMessage::Binary(frame[..4].to_vec()))
        .await
        .expect("send first chunk");
    sleep(Duration::from_millis(50)).await;
    assert!(registry.recv().is_none());

    websocket
        .send(WsMessage::Binary(frame[4..].to_vec()))
        .await
        .expect("send second chunk");
    let inbound = recv_message(&registry).await;
    assert_eq!(inbound.header(), Some(&header));
    assert_eq!(inbound.into_body().unwrap().as_ref(), b"chunked");

    server.close().await;
}
