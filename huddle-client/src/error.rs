use huddle_core::ProtocolError;
use thiserror::Error;

/// Signaling channel problems. Always fatal to the session.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("signaling channel closed")]
    Closed,
}

/// Failure of one negotiation step with one remote participant.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("WebRTC error: {0}")]
    WebRtc(#[from] webrtc::Error),

    #[error("bad signal payload: {0}")]
    Payload(#[from] ProtocolError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("connection failed")]
    ConnectionFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("permission denied for {0}")]
    PermissionDenied(String),

    #[error("{0} unavailable")]
    DeviceUnavailable(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("session has ended")]
    Ended,
}
