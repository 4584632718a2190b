use async_trait::async_trait;
use huddle_core::{PeerId, ServerMessage};

/// Sink the rooms use to reach connected participants.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Deliver one frame to one participant.
    async fn send(&self, peer_id: &PeerId, msg: ServerMessage);

    /// Deliver the same frame to every listed participant, in list order.
    async fn broadcast(&self, peers: &[PeerId], msg: ServerMessage) {
        for peer_id in peers {
            self.send(peer_id, msg.clone()).await;
        }
    }
}
