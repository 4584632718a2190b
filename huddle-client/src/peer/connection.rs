use crate::error::NegotiationError;
use crate::media::{LocalTrack, TrackKind};
use async_trait::async_trait;
use huddle_core::{IceServerConfig, PeerId, SignalEnvelope};
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::track::track_remote::TrackRemote;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }

    pub fn into_envelope(self) -> SignalEnvelope {
        match self.kind {
            SdpKind::Offer => SignalEnvelope::Offer { sdp: self.sdp },
            SdpKind::Answer => SignalEnvelope::Answer { sdp: self.sdp },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

impl IceCandidate {
    pub fn into_envelope(self) -> SignalEnvelope {
        SignalEnvelope::IceCandidate {
            candidate: self.candidate,
            sdp_mid: self.sdp_mid,
            sdp_m_line_index: self.sdp_m_line_index,
        }
    }
}

/// Transport-level state of a connection, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Incoming media from a remote participant.
#[derive(Clone)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: TrackKind,
    /// RTP source, absent for backends that do not carry real media.
    pub source: Option<Arc<TrackRemote>>,
}

impl RemoteTrack {
    pub fn new(id: impl Into<String>, stream_id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            stream_id: stream_id.into(),
            kind,
            source: None,
        }
    }
}

impl std::fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("id", &self.id)
            .field("stream_id", &self.stream_id)
            .field("kind", &self.kind)
            .finish()
    }
}

impl PartialEq for RemoteTrack {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.stream_id == other.stream_id && self.kind == other.kind
    }
}

/// Raised by connection objects, consumed by the orchestrator loop.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    LocalCandidate {
        remote: PeerId,
        candidate: IceCandidate,
    },
    RemoteTrack {
        remote: PeerId,
        track: RemoteTrack,
    },
    StateChanged {
        remote: PeerId,
        state: ConnectionState,
    },
}

impl ConnectionEvent {
    pub fn remote(&self) -> PeerId {
        match self {
            ConnectionEvent::LocalCandidate { remote, .. }
            | ConnectionEvent::RemoteTrack { remote, .. }
            | ConnectionEvent::StateChanged { remote, .. } => *remote,
        }
    }
}

/// One direct connection to one remote participant.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn add_track(&self, track: Arc<LocalTrack>) -> Result<(), NegotiationError>;

    /// Swaps the outgoing video in place, without renegotiation.
    async fn replace_video_track(&self, track: Arc<LocalTrack>) -> Result<(), NegotiationError>;

    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError>;

    async fn create_answer(&self) -> Result<SessionDescription, NegotiationError>;

    async fn set_local_description(&self, desc: SessionDescription)
    -> Result<(), NegotiationError>;

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), NegotiationError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError>;

    async fn close(&self) -> Result<(), NegotiationError>;
}

#[async_trait]
pub trait PeerConnectionFactory: Send + Sync {
    /// Builds a connection to `remote`. Its events go to `events`.
    async fn create(
        &self,
        remote: PeerId,
        events: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> Result<Arc<dyn PeerConnection>, NegotiationError>;

    /// ICE servers for connections created from now on.
    async fn update_ice_servers(&self, ice_servers: Vec<IceServerConfig>);
}
