use crate::error::TransportError;
use async_trait::async_trait;
use huddle_core::ClientMessage;

/// Outgoing half of the signaling channel.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send(&self, msg: ClientMessage) -> Result<(), TransportError>;

    /// Severs the channel. Later sends fail with `TransportError::Closed`.
    async fn close(&self);
}
