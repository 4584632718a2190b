use super::event::RemoteStream;
use tokio::sync::oneshot;

/// Local user actions, sent to the orchestrator loop.
#[derive(Debug)]
pub enum SessionCommand {
    /// Blank text is ignored.
    SendChat { text: String },
    ToggleVideo,
    ToggleAudio,
    ToggleScreenShare,
    /// Screen capture was stopped from outside the session.
    ScreenShareEnded,
    RemoteStreams {
        reply: oneshot::Sender<Vec<RemoteStream>>,
    },
    HangUp,
}
