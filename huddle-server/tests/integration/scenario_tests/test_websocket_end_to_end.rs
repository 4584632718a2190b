use anyhow::Result;
use huddle_core::utils::default_ice_servers;
use huddle_core::{ClientMessage, RoomId, ServerMessage};
use huddle_server::{SignalingService, serve};
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::integration::init_tracing;
use crate::utils::WsTestClient;

async fn start_server() -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let service = SignalingService::new(default_ice_servers());
    tokio::spawn(async move {
        let _ = serve(listener, service, std::future::pending()).await;
    });
    Ok(addr)
}

async fn greet(client: &mut WsTestClient) -> Result<huddle_core::PeerId> {
    let peer_id = match client.recv().await? {
        ServerMessage::Welcome { peer_id } => peer_id,
        other => anyhow::bail!("expected welcome, got {other:?}"),
    };
    match client.recv().await? {
        ServerMessage::IceConfig { ice_servers } => assert!(!ice_servers.is_empty()),
        other => anyhow::bail!("expected ice-config, got {other:?}"),
    }
    Ok(peer_id)
}

#[tokio::test]
async fn test_websocket_end_to_end() -> Result<()> {
    init_tracing();

    let addr = start_server().await?;
    let mut alice = WsTestClient::connect(addr).await?;
    let mut bob = WsTestClient::connect(addr).await?;
    let alice_id = greet(&mut alice).await?;
    let bob_id = greet(&mut bob).await?;
    assert_ne!(alice_id, bob_id);

    let room = RoomId::from("e2e");
    alice
        .send(&ClientMessage::JoinCall { room: room.clone() })
        .await?;
    assert!(matches!(
        alice.recv().await?,
        ServerMessage::UserJoined { peer_id, .. } if peer_id == alice_id
    ));

    bob.send(&ClientMessage::JoinCall { room: room.clone() })
        .await?;
    for client in [&mut alice, &mut bob] {
        match client.recv().await? {
            ServerMessage::UserJoined { peer_id, members } => {
                assert_eq!(peer_id, bob_id);
                assert_eq!(members, vec![alice_id, bob_id]);
            }
            other => anyhow::bail!("expected user-joined, got {other:?}"),
        }
    }

    let payload = json!({ "kind": "offer", "sdp": "v=0" });
    alice
        .send(&ClientMessage::Signal {
            to: bob_id,
            payload: payload.clone(),
        })
        .await?;
    assert_eq!(
        bob.recv().await?,
        ServerMessage::Signal {
            from: alice_id,
            payload
        }
    );

    bob.send(&ClientMessage::ChatMessage {
        text: "hello".into(),
        sender_name: "Bob".into(),
    })
    .await?;
    let chat = ServerMessage::ChatMessage {
        text: "hello".into(),
        sender_name: "Bob".into(),
        sender_id: bob_id,
    };
    assert_eq!(alice.recv().await?, chat);
    assert_eq!(bob.recv().await?, chat);

    bob.send_raw("{not json").await?;
    assert!(matches!(bob.recv().await?, ServerMessage::Error { .. }));

    bob.close().await?;
    assert_eq!(alice.recv().await?, ServerMessage::UserLeft { peer_id: bob_id });

    Ok(())
}

#[tokio::test]
async fn test_health_endpoint_reports_ok() -> Result<()> {
    init_tracing();

    let addr = start_server().await?;
    let mut stream = tokio::net::TcpStream::connect(addr).await?;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await?;
    let mut response = String::new();
    stream.read_to_string(&mut response).await?;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");

    Ok(())
}

#[tokio::test]
async fn test_serve_stops_on_shutdown_signal() -> Result<()> {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let service = SignalingService::new(default_ice_servers());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(serve(listener, service.clone(), async move {
        let _ = stop_rx.await;
    }));

    let _ = stop_tx.send(());
    let finished = tokio::time::timeout(Duration::from_secs(5), server).await??;
    assert!(finished.is_ok());
    assert_eq!(service.rooms().room_count(), 0);
    Ok(())
}
