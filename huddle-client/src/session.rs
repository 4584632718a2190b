use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::media::{LocalMedia, MediaSource};
use crate::orchestrator::{Orchestrator, RemoteStream, SessionCommand, SessionEvent};
use crate::peer::{PeerConnectionFactory, RtcConnectionFactory};
use crate::signaling::{SignalSink, WsSignalClient};
use huddle_core::ServerMessage;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

/// Entry point for joining a call.
pub struct Session;

impl Session {
    /// Connects to the relay, acquires local media and starts negotiating
    /// with everyone in `config.room`.
    pub async fn connect(
        config: ClientConfig,
        source: Arc<dyn MediaSource>,
    ) -> Result<SessionHandle, SessionError> {
        let (sink, server_rx) = WsSignalClient::connect(&config.server_url).await?;
        let factory = Arc::new(RtcConnectionFactory::new(config.ice_servers.clone()));
        Ok(Self::start(config, Arc::new(sink), server_rx, factory, source).await)
    }

    /// Starts a session over an already established signaling channel.
    pub async fn start(
        config: ClientConfig,
        signals: Arc<dyn SignalSink>,
        server_rx: mpsc::UnboundedReceiver<ServerMessage>,
        factory: Arc<dyn PeerConnectionFactory>,
        source: Arc<dyn MediaSource>,
    ) -> SessionHandle {
        let media = LocalMedia::start(source).await;
        let (orchestrator, events) =
            Orchestrator::new(config.room, config.display_name, factory, signals, media);

        let (commands, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(orchestrator.run(server_rx, command_rx));
        info!("Session started");

        SessionHandle {
            commands,
            events,
            task,
        }
    }
}

/// Control surface of a running session.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn send_chat(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.command(SessionCommand::SendChat { text: text.into() })
    }

    pub fn toggle_video(&self) -> Result<(), SessionError> {
        self.command(SessionCommand::ToggleVideo)
    }

    pub fn toggle_audio(&self) -> Result<(), SessionError> {
        self.command(SessionCommand::ToggleAudio)
    }

    pub fn toggle_screen_share(&self) -> Result<(), SessionError> {
        self.command(SessionCommand::ToggleScreenShare)
    }

    pub fn screen_share_ended(&self) -> Result<(), SessionError> {
        self.command(SessionCommand::ScreenShareEnded)
    }

    pub async fn remote_streams(&self) -> Result<Vec<RemoteStream>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.command(SessionCommand::RemoteStreams { reply })?;
        rx.await.map_err(|_| SessionError::Ended)
    }

    /// Next notification, `None` once the session is over and drained.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Ends the call and waits for the session loop to finish.
    pub async fn hang_up(self) -> Result<(), SessionError> {
        let _ = self.commands.send(SessionCommand::HangUp);
        self.task.await.map_err(|_| SessionError::Ended)
    }

    fn command(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.commands.send(cmd).map_err(|_| SessionError::Ended)
    }
}
