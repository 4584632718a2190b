use super::connection::{IceCandidate, PeerConnection, RemoteTrack};
use huddle_core::PeerId;
use std::sync::Arc;

/// Where a pair stands in the offer/answer exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Created,
    LocalTracksAttached,
    OfferSent,
    OfferReceived,
    Connected,
    Failed,
}

/// Client-side record of the connection to one remote participant.
pub struct PeerEntry {
    pub remote: PeerId,
    /// Distinguishes this entry from earlier ones for the same remote.
    pub serial: u64,
    pub connection: Arc<dyn PeerConnection>,
    pub state: NegotiationState,
    remote_description_set: bool,
    closed: bool,
    pending_candidates: Vec<IceCandidate>,
    tracks: Vec<RemoteTrack>,
}

impl PeerEntry {
    pub fn new(remote: PeerId, serial: u64, connection: Arc<dyn PeerConnection>) -> Self {
        Self {
            remote,
            serial,
            connection,
            state: NegotiationState::Created,
            remote_description_set: false,
            closed: false,
            pending_candidates: Vec::new(),
            tracks: Vec::new(),
        }
    }

    pub fn has_remote_description(&self) -> bool {
        self.remote_description_set
    }

    /// Marks the remote description applied and hands back the candidates
    /// that arrived before it, in arrival order.
    pub fn remote_description_applied(&mut self) -> Vec<IceCandidate> {
        self.remote_description_set = true;
        std::mem::take(&mut self.pending_candidates)
    }

    pub fn queue_candidate(&mut self, candidate: IceCandidate) {
        self.pending_candidates.push(candidate);
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    /// Records a remote track. `false` if it was already known.
    pub fn add_remote_track(&mut self, track: RemoteTrack) -> bool {
        if self.tracks.iter().any(|t| t.id == track.id) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    pub fn remote_tracks(&self) -> &[RemoteTrack] {
        &self.tracks
    }

    pub fn is_failed(&self) -> bool {
        self.state == NegotiationState::Failed
    }

    /// The connection to close, handed out only once per entry.
    pub fn connection_to_close(&mut self) -> Option<Arc<dyn PeerConnection>> {
        if self.closed {
            return None;
        }
        self.closed = true;
        Some(self.connection.clone())
    }
}
