use super::SignalSink;
use crate::error::TransportError;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// WebSocket connection to the relay.
///
/// Outgoing frames go through a channel drained by a writer task; incoming
/// frames are decoded by a reader task and delivered on the receiver
/// returned from `connect`. That receiver closes when the socket does.
pub struct WsSignalClient {
    tx: mpsc::UnboundedSender<Message>,
}

impl WsSignalClient {
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ServerMessage>), TransportError> {
        let (ws_stream, _) = connect_async(url).await?;
        info!("Connected to relay at {}", url);
        let (mut write, mut read) = ws_stream.split();

        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();

        tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if write.send(msg).await.is_err() || closing {
                    break;
                }
            }
            debug!("Signaling writer finished");
        });

        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Signaling socket error: {}", e);
                        break;
                    }
                };
                match ServerMessage::decode(text.as_str()) {
                    Ok(msg) => {
                        if incoming_tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Undecodable frame from relay: {}", e),
                }
            }
            info!("Signaling channel closed");
        });

        Ok((Self { tx: outgoing_tx }, incoming_rx))
    }
}

#[async_trait]
impl SignalSink for WsSignalClient {
    async fn send(&self, msg: ClientMessage) -> Result<(), TransportError> {
        let json = msg.encode()?;
        self.tx
            .send(Message::Text(json.into()))
            .map_err(|_| TransportError::Closed)
    }

    async fn close(&self) {
        let _ = self.tx.send(Message::Close(None));
    }
}
