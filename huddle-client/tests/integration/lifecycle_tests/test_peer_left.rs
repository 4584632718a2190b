use huddle_client::SessionEvent;
use huddle_core::ServerMessage;

use crate::integration::{TestClient, init_tracing};
use crate::utils::{Call, peer};

#[tokio::test]
async fn test_departure_removes_exactly_one_entry() {
    init_tracing();

    let (me, b, c) = (peer(1), peer(2), peer(3));
    let mut client = TestClient::new(me).await;
    client.user_joined(me, &[b, c, me]).await;
    client.take_events();
    assert_eq!(client.orchestrator.entry_count(), 2);

    client.receive(ServerMessage::UserLeft { peer_id: b }).await;

    assert_eq!(client.orchestrator.entry_count(), 1);
    assert!(client.orchestrator.entry_state(&b).is_none());
    assert!(client.orchestrator.entry_state(&c).is_some());

    let gone = client.factory.connection(b).await;
    assert_eq!(gone.count(|call| *call == Call::Close).await, 1);
    let kept = client.factory.connection(c).await;
    assert_eq!(kept.count(|call| *call == Call::Close).await, 0);

    assert_eq!(
        client.take_events(),
        vec![SessionEvent::PeerLeft { peer_id: b }]
    );

    // A repeated notice does not touch anything else.
    client.receive(ServerMessage::UserLeft { peer_id: b }).await;
    assert_eq!(client.orchestrator.entry_count(), 1);
    assert_eq!(gone.count(|call| *call == Call::Close).await, 1);
}

#[tokio::test]
async fn test_remote_streams_follow_tracks_and_departures() {
    init_tracing();

    use huddle_client::media::TrackKind;
    use huddle_client::peer::{ConnectionEvent, RemoteTrack};

    let (me, b) = (peer(1), peer(2));
    let mut client = TestClient::new(me).await;
    client.user_joined(b, &[me, b]).await;
    assert!(client.orchestrator.remote_streams().is_empty());

    let video = RemoteTrack::new("v1", "stream-b", TrackKind::Video);
    for _ in 0..2 {
        client
            .orchestrator
            .handle_connection_event(ConnectionEvent::RemoteTrack {
                remote: b,
                track: video.clone(),
            })
            .await
            .unwrap();
    }

    let streams = client.orchestrator.remote_streams();
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].peer_id, b);
    assert_eq!(streams[0].tracks, vec![video]);

    client.receive(ServerMessage::UserLeft { peer_id: b }).await;
    assert!(client.orchestrator.remote_streams().is_empty());
}
