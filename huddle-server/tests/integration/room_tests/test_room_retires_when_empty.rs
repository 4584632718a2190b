use huddle_core::{PeerId, RoomId, ServerMessage};
use huddle_server::RoomCommand;

use crate::integration::{create_test_registry, init_tracing};
use crate::utils::{SIGNAL_TIMEOUT_MS, wait_until};

#[tokio::test]
async fn test_room_and_history_dropped_when_last_member_leaves() {
    init_tracing();

    let (registry, output, _rx) = create_test_registry();
    let room = RoomId::from("ephemeral");
    let p1 = PeerId::new();

    registry.dispatch(&room, RoomCommand::Join { peer_id: p1 });
    registry.dispatch(
        &room,
        RoomCommand::Chat {
            peer_id: p1,
            sender_name: "P1".into(),
            text: "before".into(),
        },
    );
    assert_eq!(registry.snapshot(&room).await.unwrap().history.len(), 1);

    registry.dispatch(&room, RoomCommand::Leave { peer_id: p1 });

    let retired = wait_until(SIGNAL_TIMEOUT_MS, || {
        let registry = registry.clone();
        let room = room.clone();
        async move { !registry.contains(&room) }
    })
    .await;
    assert!(retired, "empty room should retire");
    assert!(registry.snapshot(&room).await.is_none());
    assert_eq!(registry.room_count(), 0);

    // Coming back starts a fresh room: no replay of the old chat.
    let p2 = PeerId::new();
    registry.dispatch(&room, RoomCommand::Join { peer_id: p2 });
    let snapshot = registry.snapshot(&room).await.unwrap();
    assert_eq!(snapshot.members, vec![p2]);
    assert!(snapshot.history.is_empty());

    let replayed = output
        .count_matching(|to, msg| *to == p2 && matches!(msg, ServerMessage::ChatMessage { .. }))
        .await;
    assert_eq!(replayed, 0);
}

#[tokio::test]
async fn test_shutdown_releases_every_room() {
    init_tracing();

    let (registry, _output, _rx) = create_test_registry();
    for name in ["one", "two", "three"] {
        registry.dispatch(
            &RoomId::from(name),
            RoomCommand::Join {
                peer_id: PeerId::new(),
            },
        );
    }
    assert_eq!(registry.room_count(), 3);

    registry.shutdown();

    assert_eq!(registry.room_count(), 0);
    assert!(registry.snapshot(&RoomId::from("one")).await.is_none());
}
