use crate::room::{RoomCommand, RoomRegistry};
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use dashmap::DashMap;
use huddle_core::{ClientMessage, IceServerConfig, PeerId, RoomId, ServerMessage};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

struct PeerSession {
    tx: mpsc::UnboundedSender<ServerMessage>,
    room: Option<RoomId>,
}

struct SignalingInner {
    peers: DashMap<PeerId, PeerSession>,
    ice_servers: Vec<IceServerConfig>,
}

#[async_trait]
impl SignalingOutput for SignalingInner {
    async fn send(&self, peer_id: &PeerId, msg: ServerMessage) {
        if let Some(peer) = self.peers.get(peer_id) {
            if let Err(e) = peer.tx.send(msg) {
                error!("Failed to queue frame for {}: {:?}", peer_id, e.0);
            }
        } else {
            warn!("Attempted to send signal to disconnected user {}", peer_id);
        }
    }
}

/// Entry point for everything a participant connection asks of the relay.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    rooms: RoomRegistry,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        let inner = Arc::new(SignalingInner {
            peers: DashMap::new(),
            ice_servers,
        });
        let rooms = RoomRegistry::new(inner.clone());
        Self { inner, rooms }
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn peer_count(&self) -> usize {
        self.inner.peers.len()
    }

    /// Registers a new connection and greets it with its id and ICE config.
    pub fn connect(&self, tx: mpsc::UnboundedSender<ServerMessage>) -> PeerId {
        let peer_id = PeerId::new();

        let _ = tx.send(ServerMessage::Welcome { peer_id });
        let _ = tx.send(ServerMessage::IceConfig {
            ice_servers: self.get_ice_servers(),
        });

        self.inner.peers.insert(peer_id, PeerSession { tx, room: None });
        peer_id
    }

    pub async fn handle_message(&self, peer_id: PeerId, msg: ClientMessage) {
        match msg {
            ClientMessage::JoinCall { room } => self.join(peer_id, room),
            ClientMessage::Signal { to, payload } => self.relay(peer_id, to, payload).await,
            ClientMessage::ChatMessage { text, sender_name } => {
                self.chat(peer_id, text, sender_name)
            }
            ClientMessage::LeaveCall {} => self.leave(peer_id),
        }
    }

    /// Tells a participant its last frame was not understood.
    pub async fn reply_error(&self, peer_id: PeerId, message: String) {
        self.inner
            .send(&peer_id, ServerMessage::Error { message })
            .await;
    }

    pub fn join(&self, peer_id: PeerId, room: RoomId) {
        let previous = {
            let Some(mut session) = self.inner.peers.get_mut(&peer_id) else {
                warn!("Join from unregistered peer {}", peer_id);
                return;
            };
            if session.room.as_ref() == Some(&room) {
                debug!("Peer {} is already in '{}'", peer_id, room);
                return;
            }
            session.room.replace(room.clone())
        };

        if let Some(previous) = previous {
            info!("Peer {} moves from '{}' to '{}'", peer_id, previous, room);
            self.rooms.dispatch(&previous, RoomCommand::Leave { peer_id });
        }
        self.rooms.dispatch(&room, RoomCommand::Join { peer_id });
    }

    /// Forwards a negotiation payload untouched. Dropped unless sender and
    /// target share a room.
    pub async fn relay(&self, from: PeerId, to: PeerId, payload: Value) {
        let Some(room) = self.room_of(&from) else {
            debug!("Dropping signal from {} which has not joined a room", from);
            return;
        };
        if self.room_of(&to).as_ref() != Some(&room) {
            warn!("Dropping signal {} -> {}: target not in '{}'", from, to, room);
            return;
        }

        debug!("Relaying signal {} -> {} in '{}'", from, to, room);
        self.inner
            .send(&to, ServerMessage::Signal { from, payload })
            .await;
    }

    pub fn chat(&self, peer_id: PeerId, text: String, sender_name: String) {
        let Some(room) = self.room_of(&peer_id) else {
            debug!("Dropping chat from {} which has not joined a room", peer_id);
            return;
        };
        self.rooms.dispatch(
            &room,
            RoomCommand::Chat {
                peer_id,
                sender_name,
                text,
            },
        );
    }

    pub fn leave(&self, peer_id: PeerId) {
        let room = self
            .inner
            .peers
            .get_mut(&peer_id)
            .and_then(|mut session| session.room.take());

        if let Some(room) = room {
            self.rooms.dispatch(&room, RoomCommand::Leave { peer_id });
        }
    }

    /// Transport gone: leave the room and forget the connection.
    pub fn disconnect(&self, peer_id: PeerId) {
        self.leave(peer_id);
        self.inner.peers.remove(&peer_id);
        info!("Peer {} disconnected", peer_id);
    }

    fn room_of(&self, peer_id: &PeerId) -> Option<RoomId> {
        self.inner
            .peers
            .get(peer_id)
            .and_then(|session| session.room.clone())
    }
}
