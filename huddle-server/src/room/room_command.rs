use huddle_core::{ChatMessage, PeerId};
use tokio::sync::oneshot;

/// Commands a room actor receives from the signaling layer.
#[derive(Debug)]
pub enum RoomCommand {
    /// Participant enters the room.
    Join { peer_id: PeerId },

    /// Chat text from a member, to be stored and fanned out.
    Chat {
        peer_id: PeerId,
        sender_name: String,
        text: String,
    },

    /// Explicit leave or lost transport.
    Leave { peer_id: PeerId },

    /// Read-only view of the room state.
    Snapshot { reply: oneshot::Sender<RoomSnapshot> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub members: Vec<PeerId>,
    pub history: Vec<ChatMessage>,
}
