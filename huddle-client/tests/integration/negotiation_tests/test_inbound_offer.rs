use huddle_client::SessionEvent;
use huddle_client::peer::{ConnectionEvent, ConnectionState, NegotiationState, SdpKind};
use huddle_core::SignalEnvelope;
use serde_json::json;

use crate::integration::{TestClient, init_tracing};
use crate::utils::{Call, answer, offer, peer, signal_from};

#[tokio::test]
async fn test_offer_from_unknown_sender_is_answered() {
    init_tracing();

    let (me, sender) = (peer(1), peer(2));
    let mut client = TestClient::new(me).await;

    client.receive(signal_from(sender, offer())).await;

    assert_eq!(client.orchestrator.entry_count(), 1);
    assert_eq!(
        client.orchestrator.entry_state(&sender),
        Some(NegotiationState::OfferReceived)
    );

    let conn = client.factory.connection(sender).await;
    let steps: Vec<Call> = conn
        .calls()
        .await
        .into_iter()
        .filter(|c| !matches!(c, Call::AddTrack { .. }))
        .collect();
    assert_eq!(
        steps,
        vec![
            Call::SetRemote(SdpKind::Offer),
            Call::CreateAnswer,
            Call::SetLocal(SdpKind::Answer),
        ]
    );

    let signals = client.sink.signals_to(sender).await;
    assert!(matches!(signals.as_slice(), [SignalEnvelope::Answer { .. }]));

    client
        .orchestrator
        .handle_connection_event(ConnectionEvent::StateChanged {
            remote: sender,
            state: ConnectionState::Connected,
        })
        .await
        .unwrap();
    assert_eq!(
        client.orchestrator.entry_state(&sender),
        Some(NegotiationState::Connected)
    );
    assert_eq!(
        client.take_events(),
        vec![SessionEvent::PeerConnected { peer_id: sender }]
    );
}

#[tokio::test]
async fn test_answer_completes_our_offer_once() {
    init_tracing();

    let (me, other) = (peer(3), peer(4));
    let mut client = TestClient::new(me).await;
    client.user_joined(me, &[other, me]).await;

    client.receive(signal_from(other, answer())).await;
    client.receive(signal_from(other, answer())).await;

    let conn = client.factory.connection(other).await;
    assert_eq!(
        conn.count(|c| *c == Call::SetRemote(SdpKind::Answer)).await,
        1
    );
    assert_eq!(
        client.orchestrator.entry_state(&other),
        Some(NegotiationState::OfferSent)
    );
}

#[tokio::test]
async fn test_answer_without_offer_is_ignored() {
    init_tracing();

    let mut client = TestClient::new(peer(1)).await;
    client.receive(signal_from(peer(9), answer())).await;

    assert_eq!(client.orchestrator.entry_count(), 0);
    assert_eq!(client.factory.created_count().await, 0);
    assert!(client.take_events().is_empty());
}

#[tokio::test]
async fn test_malformed_payload_is_a_negotiation_failure() {
    init_tracing();

    let (me, sender) = (peer(1), peer(2));
    let mut client = TestClient::new(me).await;

    client
        .receive(huddle_core::ServerMessage::Signal {
            from: sender,
            payload: json!({ "sdp": { "type": "offer" } }),
        })
        .await;

    assert_eq!(client.orchestrator.entry_count(), 0);
    assert!(matches!(
        client.take_events().as_slice(),
        [SessionEvent::NegotiationFailed { peer_id, .. }] if *peer_id == sender
    ));
}

#[tokio::test]
async fn test_ice_config_reaches_the_factory() {
    init_tracing();

    let mut client = TestClient::new(peer(1)).await;
    let servers = vec![huddle_core::IceServerConfig {
        urls: vec!["turn:turn.example.org:3478".into()],
        username: Some("user".into()),
        credential: Some("secret".into()),
    }];

    client
        .receive(huddle_core::ServerMessage::IceConfig {
            ice_servers: servers.clone(),
        })
        .await;

    assert_eq!(client.factory.ice_servers().await, servers);
}

#[tokio::test]
async fn test_renegotiation_offer_keeps_pair_connected() {
    init_tracing();

    let (me, sender) = (peer(1), peer(2));
    let mut client = TestClient::new(me).await;

    client.receive(signal_from(sender, offer())).await;
    client
        .orchestrator
        .handle_connection_event(ConnectionEvent::StateChanged {
            remote: sender,
            state: ConnectionState::Connected,
        })
        .await
        .unwrap();
    client.take_events();

    client.receive(signal_from(sender, offer())).await;

    assert_eq!(client.sink.answers_to(sender).await, 2);
    assert_eq!(client.factory.connections_to(sender).await.len(), 1);
    assert_eq!(
        client.orchestrator.entry_state(&sender),
        Some(NegotiationState::Connected)
    );
    assert!(client.take_events().is_empty());
}
