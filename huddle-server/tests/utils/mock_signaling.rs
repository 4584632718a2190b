use async_trait::async_trait;
use huddle_core::{PeerId, ServerMessage};
use huddle_server::SignalingOutput;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Mock SignalingOutput that captures every outgoing frame.
#[derive(Clone)]
pub struct MockSignalingOutput {
    tx: mpsc::UnboundedSender<(PeerId, ServerMessage)>,
    sent: Arc<Mutex<Vec<(PeerId, ServerMessage)>>>,
}

impl MockSignalingOutput {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(PeerId, ServerMessage)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let output = Self {
            tx,
            sent: Arc::new(Mutex::new(Vec::new())),
        };
        (output, rx)
    }

    /// Frames delivered to one participant, in delivery order.
    pub async fn sent_to(&self, peer_id: &PeerId) -> Vec<ServerMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(to, _)| to == peer_id)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub async fn count_matching(&self, pred: impl Fn(&PeerId, &ServerMessage) -> bool) -> usize {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(to, msg)| pred(to, msg))
            .count()
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send(&self, peer_id: &PeerId, msg: ServerMessage) {
        tracing::debug!("[MockSignaling] send to {}: {:?}", peer_id, msg);
        self.sent.lock().await.push((*peer_id, msg.clone()));
        let _ = self.tx.send((*peer_id, msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_signaling_captures_frames() {
        let (output, mut rx) = MockSignalingOutput::new();
        let peer_id = PeerId::new();

        output
            .send(&peer_id, ServerMessage::UserLeft { peer_id })
            .await;

        let (to, msg) = rx.recv().await.unwrap();
        assert_eq!(to, peer_id);
        assert!(matches!(msg, ServerMessage::UserLeft { .. }));
        assert_eq!(output.sent_to(&peer_id).await.len(), 1);
    }
}
