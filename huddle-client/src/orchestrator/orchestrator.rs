use super::command::SessionCommand;
use super::event::{RemoteStream, SessionEvent};
use crate::error::{NegotiationError, TransportError};
use crate::media::{LocalMedia, LocalTrack};
use crate::peer::{
    ConnectionEvent, ConnectionState, IceCandidate, NegotiationState, PeerConnection,
    PeerConnectionFactory, PeerEntry, SessionDescription,
};
use crate::signaling::SignalSink;
use huddle_core::{ChatMessage, ClientMessage, PeerId, RoomId, ServerMessage, SignalEnvelope};
use serde_json::Value;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

enum Input {
    Server(Option<ServerMessage>),
    Connection(u64, ConnectionEvent),
    Command(Option<SessionCommand>),
}

/// Owns one connection entry per remote participant and drives the
/// offer/answer/ICE exchange for each of them.
///
/// Everything runs on one task: relay frames, connection events and local
/// commands are handled one at a time, so negotiation steps for the same
/// pair never race. A failure with one remote only affects that entry.
pub struct Orchestrator {
    room: RoomId,
    display_name: String,
    local_id: Option<PeerId>,
    entries: HashMap<PeerId, PeerEntry>,
    next_serial: u64,
    factory: Arc<dyn PeerConnectionFactory>,
    signals: Arc<dyn SignalSink>,
    media: LocalMedia,
    connection_tx: mpsc::UnboundedSender<(u64, ConnectionEvent)>,
    connection_rx: mpsc::UnboundedReceiver<(u64, ConnectionEvent)>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl Orchestrator {
    pub fn new(
        room: RoomId,
        display_name: String,
        factory: Arc<dyn PeerConnectionFactory>,
        signals: Arc<dyn SignalSink>,
        media: LocalMedia,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (connection_tx, connection_rx) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();

        let orchestrator = Self {
            room,
            display_name,
            local_id: None,
            entries: HashMap::new(),
            next_serial: 0,
            factory,
            signals,
            media,
            connection_tx,
            connection_rx,
            events,
        };
        (orchestrator, events_rx)
    }

    pub fn local_id(&self) -> Option<PeerId> {
        self.local_id
    }

    pub fn media(&self) -> &LocalMedia {
        &self.media
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entry_state(&self, remote: &PeerId) -> Option<NegotiationState> {
        self.entries.get(remote).map(|entry| entry.state)
    }

    pub fn pending_candidates(&self, remote: &PeerId) -> usize {
        self.entries
            .get(remote)
            .map_or(0, |entry| entry.pending_candidates())
    }

    /// Remote participants that are sending media, ordered by id.
    pub fn remote_streams(&self) -> Vec<RemoteStream> {
        let mut streams: Vec<RemoteStream> = self
            .entries
            .values()
            .filter(|entry| !entry.remote_tracks().is_empty())
            .map(|entry| RemoteStream {
                peer_id: entry.remote,
                tracks: entry.remote_tracks().to_vec(),
            })
            .collect();
        streams.sort_by_key(|stream| stream.peer_id);
        streams
    }

    /// Main loop. Ends on hang-up or when the signaling channel is lost.
    pub async fn run(
        mut self,
        mut server_rx: mpsc::UnboundedReceiver<ServerMessage>,
        mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    ) {
        info!("Session loop started for room '{}'", self.room);

        loop {
            let input = tokio::select! {
                msg = server_rx.recv() => Input::Server(msg),
                Some((serial, event)) = self.connection_rx.recv() => Input::Connection(serial, event),
                cmd = command_rx.recv() => Input::Command(cmd),
            };

            let step = match input {
                Input::Server(Some(msg)) => self
                    .handle_server_message(msg)
                    .await
                    .map(ControlFlow::Continue),
                Input::Server(None) => Err(TransportError::Closed),
                Input::Connection(serial, event) => {
                    if self.is_stale(serial, &event) {
                        debug!("Dropping event from replaced connection to {}", event.remote());
                        Ok(ControlFlow::Continue(()))
                    } else {
                        self.handle_connection_event(event)
                            .await
                            .map(ControlFlow::Continue)
                    }
                }
                Input::Command(Some(cmd)) => self.handle_command(cmd).await,
                Input::Command(None) => {
                    self.hang_up().await;
                    Ok(ControlFlow::Break(()))
                }
            };

            match step {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(())) => break,
                Err(e) => {
                    error!("Signaling channel lost: {}", e);
                    self.teardown().await;
                    self.emit(SessionEvent::Disconnected);
                    break;
                }
            }
        }

        info!("Session loop finished for room '{}'", self.room);
    }

    pub async fn handle_server_message(&mut self, msg: ServerMessage) -> Result<(), TransportError> {
        match msg {
            ServerMessage::Welcome { peer_id } => {
                info!("Relay assigned id {}, joining '{}'", peer_id, self.room);
                self.local_id = Some(peer_id);
                self.signals
                    .send(ClientMessage::JoinCall {
                        room: self.room.clone(),
                    })
                    .await?;
            }
            ServerMessage::IceConfig { ice_servers } => {
                self.factory.update_ice_servers(ice_servers).await;
            }
            ServerMessage::UserJoined { peer_id, members } => {
                self.on_user_joined(peer_id, members).await?;
            }
            ServerMessage::UserLeft { peer_id } => self.on_user_left(peer_id).await,
            ServerMessage::Signal { from, payload } => self.on_signal(from, payload).await?,
            ServerMessage::ChatMessage {
                text,
                sender_name,
                sender_id,
            } => self.emit(SessionEvent::Chat(ChatMessage {
                sender_name,
                text,
                sender_id,
            })),
            ServerMessage::Error { message } => warn!("Relay rejected a frame: {}", message),
        }
        Ok(())
    }

    pub async fn handle_connection_event(
        &mut self,
        event: ConnectionEvent,
    ) -> Result<(), TransportError> {
        match event {
            ConnectionEvent::LocalCandidate { remote, candidate } => {
                match self.entries.get(&remote) {
                    Some(entry) if !entry.is_failed() => {
                        self.send_signal(remote, candidate.into_envelope()).await?;
                    }
                    _ => debug!("Dropping local candidate for {}", remote),
                }
            }
            ConnectionEvent::RemoteTrack { remote, track } => {
                let Some(entry) = self.entries.get_mut(&remote) else {
                    debug!("Track from {} without an entry", remote);
                    return Ok(());
                };
                if entry.add_remote_track(track.clone()) {
                    self.emit(SessionEvent::RemoteTrack {
                        peer_id: remote,
                        track,
                    });
                }
            }
            ConnectionEvent::StateChanged { remote, state } => match state {
                ConnectionState::Connected => {
                    let Some(entry) = self.entries.get_mut(&remote) else {
                        return Ok(());
                    };
                    if entry.state != NegotiationState::Connected {
                        entry.state = NegotiationState::Connected;
                        info!("Connected to {}", remote);
                        self.emit(SessionEvent::PeerConnected { peer_id: remote });
                    }
                }
                ConnectionState::Failed => {
                    if self.entries.get(&remote).is_some_and(|e| !e.is_failed()) {
                        self.fail_entry(remote, NegotiationError::ConnectionFailed);
                        let closing = self
                            .entries
                            .get_mut(&remote)
                            .and_then(PeerEntry::connection_to_close);
                        if let Some(connection) = closing {
                            close_connection(remote, connection).await;
                        }
                    }
                }
                other => debug!("Connection to {} is {:?}", remote, other),
            },
        }
        Ok(())
    }

    pub async fn handle_command(
        &mut self,
        cmd: SessionCommand,
    ) -> Result<ControlFlow<()>, TransportError> {
        match cmd {
            SessionCommand::SendChat { text } => {
                if text.trim().is_empty() {
                    debug!("Ignoring blank chat message");
                } else {
                    self.signals
                        .send(ClientMessage::ChatMessage {
                            text,
                            sender_name: self.display_name.clone(),
                        })
                        .await?;
                }
            }
            SessionCommand::ToggleVideo => {
                if let Some(track) = self.media.toggle_video().await {
                    self.replace_video(track).await;
                }
            }
            SessionCommand::ToggleAudio => {
                let on = self.media.toggle_audio();
                info!("Microphone {}", if on { "on" } else { "muted" });
            }
            SessionCommand::ToggleScreenShare => {
                if let Some(track) = self.media.toggle_screen_share().await {
                    self.replace_video(track).await;
                }
            }
            SessionCommand::ScreenShareEnded => {
                if let Some(track) = self.media.screen_share_ended().await {
                    self.replace_video(track).await;
                }
            }
            SessionCommand::RemoteStreams { reply } => {
                let _ = reply.send(self.remote_streams());
            }
            SessionCommand::HangUp => {
                self.hang_up().await;
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    async fn on_user_joined(
        &mut self,
        joiner: PeerId,
        members: Vec<PeerId>,
    ) -> Result<(), TransportError> {
        let Some(me) = self.local_id else {
            warn!("Membership update before welcome, ignoring");
            return Ok(());
        };

        // Only the newcomer offers; everyone else waits for its offer.
        for remote in members.iter().copied().filter(|m| *m != me) {
            self.ensure_entry(remote).await;
            if joiner == me {
                self.start_offer(remote).await?;
            }
        }

        if joiner == me {
            info!("Joined '{}' with {} members", self.room, members.len());
            self.emit(SessionEvent::Joined {
                peer_id: me,
                room: self.room.clone(),
                members,
            });
        } else {
            info!("{} joined '{}'", joiner, self.room);
            self.emit(SessionEvent::PeerJoined { peer_id: joiner });
        }
        Ok(())
    }

    async fn on_user_left(&mut self, remote: PeerId) {
        if let Some(entry) = self.entries.remove(&remote) {
            release(entry).await;
            info!("{} left, {} connections remain", remote, self.entries.len());
        }
        self.emit(SessionEvent::PeerLeft { peer_id: remote });
    }

    async fn on_signal(&mut self, from: PeerId, payload: Value) -> Result<(), TransportError> {
        if Some(from) == self.local_id {
            return Ok(());
        }

        let envelope = match SignalEnvelope::from_payload(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.fail_entry(from, e.into());
                return Ok(());
            }
        };
        debug!("Received {} from {}", envelope.kind(), from);

        match envelope {
            SignalEnvelope::Offer { sdp } => self.on_offer(from, sdp).await?,
            SignalEnvelope::Answer { sdp } => self.on_answer(from, sdp).await,
            SignalEnvelope::IceCandidate {
                candidate,
                sdp_mid,
                sdp_m_line_index,
            } => {
                self.on_remote_candidate(
                    from,
                    IceCandidate {
                        candidate,
                        sdp_mid,
                        sdp_m_line_index,
                    },
                )
                .await
            }
        }
        Ok(())
    }

    async fn on_offer(&mut self, from: PeerId, sdp: String) -> Result<(), TransportError> {
        match self.entry_state(&from) {
            Some(NegotiationState::OfferSent) => {
                // Both sides offered. The lower id gives way.
                if self.local_id.is_some_and(|me| me < from) {
                    info!("Offer collision with {}, answering theirs", from);
                    if let Some(entry) = self.entries.remove(&from) {
                        release(entry).await;
                    }
                } else {
                    info!("Offer collision with {}, keeping ours", from);
                    return Ok(());
                }
            }
            Some(NegotiationState::Failed) => {
                debug!("Ignoring offer from {} after failure", from);
                return Ok(());
            }
            _ => {}
        }

        if !self.ensure_entry(from).await {
            return Ok(());
        }
        let Some(connection) = self.begin_answer(&from) else {
            return Ok(());
        };

        if let Err(e) = connection
            .set_remote_description(SessionDescription::offer(sdp))
            .await
        {
            self.fail_entry(from, e);
            return Ok(());
        }
        if !self.flush_candidates(from).await {
            return Ok(());
        }

        let answer = async {
            let answer = connection.create_answer().await?;
            connection.set_local_description(answer.clone()).await?;
            Ok::<_, NegotiationError>(answer)
        }
        .await;

        match answer {
            Ok(answer) => {
                info!("Answering offer from {}", from);
                self.send_signal(from, answer.into_envelope()).await
            }
            Err(e) => {
                self.fail_entry(from, e);
                Ok(())
            }
        }
    }

    /// A connected pair answering a renegotiation offer stays connected;
    /// no second state change will arrive to restore it.
    fn begin_answer(&mut self, from: &PeerId) -> Option<Arc<dyn PeerConnection>> {
        let entry = self.entries.get_mut(from)?;
        if entry.state != NegotiationState::Connected {
            entry.state = NegotiationState::OfferReceived;
        }
        Some(entry.connection.clone())
    }

    async fn on_answer(&mut self, from: PeerId, sdp: String) {
        let Some(entry) = self.entries.get(&from) else {
            warn!("Answer from {} without a pending offer", from);
            return;
        };
        if entry.state != NegotiationState::OfferSent || entry.has_remote_description() {
            warn!("Unexpected answer from {} in state {:?}", from, entry.state);
            return;
        }

        let connection = entry.connection.clone();
        match connection
            .set_remote_description(SessionDescription::answer(sdp))
            .await
        {
            Ok(()) => {
                debug!("Applied answer from {}", from);
                self.flush_candidates(from).await;
            }
            Err(e) => self.fail_entry(from, e),
        }
    }

    async fn on_remote_candidate(&mut self, from: PeerId, candidate: IceCandidate) {
        if !self.ensure_entry(from).await {
            return;
        }
        let Some(entry) = self.entries.get_mut(&from) else {
            return;
        };

        if !entry.has_remote_description() {
            entry.queue_candidate(candidate);
            debug!(
                "Queued candidate from {} ({} waiting)",
                from,
                entry.pending_candidates()
            );
            return;
        }

        let connection = entry.connection.clone();
        let connected = entry.state == NegotiationState::Connected;
        if let Err(e) = connection.add_ice_candidate(candidate).await {
            if connected {
                // The pair already has a working path; one bad candidate
                // does not take it down.
                warn!("Skipping candidate from {}: {}", from, e);
            } else {
                self.fail_entry(from, e);
            }
        }
    }

    /// Applies candidates that arrived before the remote description.
    /// Returns `false` if the entry failed on the way.
    async fn flush_candidates(&mut self, remote: PeerId) -> bool {
        let Some(entry) = self.entries.get_mut(&remote) else {
            return false;
        };
        let pending = entry.remote_description_applied();
        let connection = entry.connection.clone();

        if !pending.is_empty() {
            debug!("Applying {} queued candidates from {}", pending.len(), remote);
        }
        for candidate in pending {
            if let Err(e) = connection.add_ice_candidate(candidate).await {
                self.fail_entry(remote, e);
                return false;
            }
        }
        true
    }

    /// Creates the entry for `remote` unless one exists. Returns whether a
    /// usable (not failed) entry is in place afterwards.
    async fn ensure_entry(&mut self, remote: PeerId) -> bool {
        if let Some(entry) = self.entries.get(&remote) {
            return !entry.is_failed();
        }

        let serial = self.next_serial;
        self.next_serial += 1;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let forward = self.connection_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if forward.send((serial, event)).is_err() {
                    break;
                }
            }
        });

        let connection = match self.factory.create(remote, tx).await {
            Ok(connection) => connection,
            Err(e) => {
                self.fail_entry(remote, e);
                return false;
            }
        };

        let mut entry = PeerEntry::new(remote, serial, connection.clone());
        let attached = async {
            for track in self.media.tracks() {
                connection.add_track(track).await?;
            }
            Ok::<_, NegotiationError>(())
        }
        .await;

        let usable = match attached {
            Ok(()) => {
                entry.state = NegotiationState::LocalTracksAttached;
                true
            }
            Err(e) => {
                error!("Could not attach local media for {}: {}", remote, e);
                entry.state = NegotiationState::Failed;
                self.emit(SessionEvent::NegotiationFailed {
                    peer_id: remote,
                    reason: e.to_string(),
                });
                false
            }
        };

        self.entries.insert(remote, entry);
        debug!("Created entry for {} ({} total)", remote, self.entries.len());
        usable
    }

    async fn start_offer(&mut self, remote: PeerId) -> Result<(), TransportError> {
        let Some(entry) = self.entries.get(&remote) else {
            return Ok(());
        };
        if entry.state != NegotiationState::LocalTracksAttached {
            debug!("Not offering to {} in state {:?}", remote, entry.state);
            return Ok(());
        }

        let connection = entry.connection.clone();
        let offer = async {
            let offer = connection.create_offer().await?;
            connection.set_local_description(offer.clone()).await?;
            Ok::<_, NegotiationError>(offer)
        }
        .await;

        match offer {
            Ok(offer) => {
                if let Some(entry) = self.entries.get_mut(&remote) {
                    entry.state = NegotiationState::OfferSent;
                }
                info!("Sending offer to {}", remote);
                self.send_signal(remote, offer.into_envelope()).await
            }
            Err(e) => {
                self.fail_entry(remote, e);
                Ok(())
            }
        }
    }

    /// Puts `track` on every live connection without renegotiating.
    async fn replace_video(&mut self, track: Arc<LocalTrack>) {
        for entry in self.entries.values().filter(|entry| !entry.is_failed()) {
            if let Err(e) = entry.connection.replace_video_track(track.clone()).await {
                error!("Could not replace video for {}: {}", entry.remote, e);
            }
        }
        debug!(
            "Outgoing video is now '{}' on {} connections",
            track.label(),
            self.entries.len()
        );
    }

    async fn send_signal(
        &self,
        to: PeerId,
        envelope: SignalEnvelope,
    ) -> Result<(), TransportError> {
        let payload = envelope.to_payload()?;
        self.signals
            .send(ClientMessage::Signal { to, payload })
            .await
    }

    fn fail_entry(&mut self, remote: PeerId, err: NegotiationError) {
        error!("Negotiation with {} failed: {}", remote, err);
        if let Some(entry) = self.entries.get_mut(&remote) {
            entry.state = NegotiationState::Failed;
        }
        self.emit(SessionEvent::NegotiationFailed {
            peer_id: remote,
            reason: err.to_string(),
        });
    }

    fn is_stale(&self, serial: u64, event: &ConnectionEvent) -> bool {
        self.entries
            .get(&event.remote())
            .is_none_or(|entry| entry.serial != serial)
    }

    async fn hang_up(&mut self) {
        info!("Hanging up");
        self.teardown().await;
        if let Err(e) = self.signals.send(ClientMessage::LeaveCall {}).await {
            debug!("Could not announce leave: {}", e);
        }
        self.signals.close().await;
        self.emit(SessionEvent::Disconnected);
    }

    async fn teardown(&mut self) {
        self.media.stop_all();
        for (_, entry) in self.entries.drain() {
            release(entry).await;
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

async fn release(mut entry: PeerEntry) {
    if let Some(connection) = entry.connection_to_close() {
        close_connection(entry.remote, connection).await;
    }
}

async fn close_connection(remote: PeerId, connection: Arc<dyn PeerConnection>) {
    if let Err(e) = connection.close().await {
        debug!("Closing connection to {}: {}", remote, e);
    }
}
