use crate::room::room_command::{RoomCommand, RoomSnapshot};
use crate::room::room_registry::RegistryInner;
use crate::signaling::SignalingOutput;
use huddle_core::{ChatMessage, PeerId, RoomId, ServerMessage};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Actor owning one room's membership and chat history.
///
/// Commands are handled strictly one at a time, so everything a member sees
/// from this room arrives in the order the room produced it.
pub struct Room {
    id: RoomId,
    generation: u64,
    /// Current members in join order.
    members: Vec<PeerId>,
    /// Chat since the room last went from empty to occupied.
    history: Vec<ChatMessage>,
    command_rx: mpsc::UnboundedReceiver<RoomCommand>,
    output: Arc<dyn SignalingOutput>,
    registry: Weak<RegistryInner>,
}

impl Room {
    pub(crate) fn new(
        id: RoomId,
        generation: u64,
        command_rx: mpsc::UnboundedReceiver<RoomCommand>,
        output: Arc<dyn SignalingOutput>,
        registry: Weak<RegistryInner>,
    ) -> Self {
        Self {
            id,
            generation,
            members: Vec::new(),
            history: Vec::new(),
            command_rx,
            output,
            registry,
        }
    }

    /// Main loop. Runs until the room retires or the registry goes away.
    pub async fn run(mut self) {
        info!("Room '{}' event loop started", self.id);

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;

            if self.members.is_empty() && self.try_retire() {
                info!("Room '{}' is empty, retiring", self.id);
                break;
            }
        }

        info!("Room '{}' event loop finished", self.id);
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { peer_id } => self.join(peer_id).await,

            RoomCommand::Chat {
                peer_id,
                sender_name,
                text,
            } => {
                if !self.members.contains(&peer_id) {
                    warn!(
                        "Dropping chat from {} who is not a member of '{}'",
                        peer_id, self.id
                    );
                    return;
                }

                let msg = ChatMessage {
                    sender_name,
                    text,
                    sender_id: peer_id,
                };
                self.history.push(msg.clone());
                self.output
                    .broadcast(&self.members, ServerMessage::from(msg))
                    .await;
            }

            RoomCommand::Leave { peer_id } => self.leave(peer_id).await,

            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(RoomSnapshot {
                    members: self.members.clone(),
                    history: self.history.clone(),
                });
            }
        }
    }

    async fn join(&mut self, peer_id: PeerId) {
        if !self.members.contains(&peer_id) {
            self.members.push(peer_id);
        }
        info!(
            "Peer {} joined '{}' ({} members)",
            peer_id,
            self.id,
            self.members.len()
        );

        let joined = ServerMessage::UserJoined {
            peer_id,
            members: self.members.clone(),
        };
        self.output.broadcast(&self.members, joined).await;

        // Replay goes to the joiner only and is queued before any chat that
        // this room handles later.
        for msg in &self.history {
            self.output
                .send(&peer_id, ServerMessage::from(msg.clone()))
                .await;
        }
        if !self.history.is_empty() {
            debug!(
                "Replayed {} chat messages to {}",
                self.history.len(),
                peer_id
            );
        }
    }

    async fn leave(&mut self, peer_id: PeerId) {
        let Some(pos) = self.members.iter().position(|m| *m == peer_id) else {
            debug!("Leave for {} who is not in '{}'", peer_id, self.id);
            return;
        };
        self.members.remove(pos);
        info!(
            "Peer {} left '{}' ({} members)",
            peer_id,
            self.id,
            self.members.len()
        );

        self.output
            .broadcast(&self.members, ServerMessage::UserLeft { peer_id })
            .await;

        if self.members.is_empty() {
            self.history.clear();
        }
    }

    /// Removes this room from the registry if nothing is queued for it.
    ///
    /// Dispatch holds the same map shard while it enqueues, so an empty queue
    /// observed here stays empty.
    fn try_retire(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return true;
        };
        registry
            .rooms
            .remove_if(&self.id, |_, handle| {
                handle.generation == self.generation && self.command_rx.is_empty()
            })
            .is_some()
    }
}
