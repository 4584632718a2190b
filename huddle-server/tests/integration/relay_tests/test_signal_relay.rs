use huddle_core::{PeerId, RoomId, ServerMessage};
use serde_json::json;

use crate::integration::{create_test_service, init_tracing};
use crate::utils::TestPeer;

#[tokio::test]
async fn test_payload_forwarded_verbatim_with_sender() {
    init_tracing();

    let service = create_test_service();
    let room = RoomId::from("relay");
    let mut p1 = TestPeer::connect(&service).await;
    let mut p2 = TestPeer::connect(&service).await;

    service.join(p1.peer_id, room.clone());
    service.join(p2.peer_id, room.clone());
    // p1: own join + p2's join; p2: its join.
    p1.recv().await;
    p1.recv().await;
    p2.recv().await;

    let offer = json!({ "kind": "offer", "sdp": "v=0\r\no=- 1 2 IN IP4 0.0.0.0\r\n" });
    service.relay(p1.peer_id, p2.peer_id, offer.clone()).await;

    match p2.recv().await {
        ServerMessage::Signal { from, payload } => {
            assert_eq!(from, p1.peer_id);
            assert_eq!(payload, offer);
        }
        other => panic!("expected signal, got {other:?}"),
    }
    p1.expect_silence().await;

    // The relay never looks inside the payload.
    let garbage = json!({ "whatever": [1, 2, 3] });
    service.relay(p2.peer_id, p1.peer_id, garbage.clone()).await;
    match p1.recv().await {
        ServerMessage::Signal { from, payload } => {
            assert_eq!(from, p2.peer_id);
            assert_eq!(payload, garbage);
        }
        other => panic!("expected signal, got {other:?}"),
    }
}

#[tokio::test]
async fn test_signal_dropped_outside_shared_room() {
    init_tracing();

    let service = create_test_service();
    let mut lobby = TestPeer::connect(&service).await;
    let mut a = TestPeer::connect(&service).await;
    let mut b = TestPeer::connect(&service).await;

    service.join(a.peer_id, RoomId::from("room-a"));
    service.join(b.peer_id, RoomId::from("room-b"));
    a.recv().await;
    b.recv().await;

    // Sender with no room.
    service.relay(lobby.peer_id, a.peer_id, json!({"kind": "offer", "sdp": "x"})).await;
    // Target in a different room.
    service.relay(a.peer_id, b.peer_id, json!({"kind": "offer", "sdp": "y"})).await;
    // Target that never existed.
    service.relay(a.peer_id, PeerId::new(), json!({"kind": "offer", "sdp": "z"})).await;

    a.expect_silence().await;
    b.expect_silence().await;
    lobby.expect_silence().await;
}
