use crate::peer::RemoteTrack;
use huddle_core::{ChatMessage, PeerId, RoomId};

/// What the rendering layer shows for one remote participant.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteStream {
    pub peer_id: PeerId,
    pub tracks: Vec<RemoteTrack>,
}

/// Notifications for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The relay confirmed our own join.
    Joined {
        peer_id: PeerId,
        room: RoomId,
        members: Vec<PeerId>,
    },
    PeerJoined { peer_id: PeerId },
    RemoteTrack { peer_id: PeerId, track: RemoteTrack },
    PeerConnected { peer_id: PeerId },
    PeerLeft { peer_id: PeerId },
    Chat(ChatMessage),
    NegotiationFailed { peer_id: PeerId, reason: String },
    Disconnected,
}
