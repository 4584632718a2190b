use super::local_track::LocalTrack;
use super::placeholder::{black_video_track, silent_audio_track};
use super::source::MediaSource;
use std::sync::Arc;
use tracing::{debug, info, warn};

const PLACEHOLDER_WIDTH: u32 = 640;
const PLACEHOLDER_HEIGHT: u32 = 480;

/// The outgoing audio and video of one session plus the user's toggles.
///
/// There is always exactly one video and one audio track. Video changes
/// (camera off, screen share) swap the video track and hand the new one back
/// to the caller, which installs it on every connection. Audio is never
/// swapped, only enabled or disabled.
pub struct LocalMedia {
    source: Arc<dyn MediaSource>,
    video: Arc<LocalTrack>,
    audio: Arc<LocalTrack>,
    video_on: bool,
    audio_on: bool,
    screen_on: bool,
}

impl LocalMedia {
    /// Acquires camera and microphone, falling back to placeholders for
    /// whatever the source cannot provide.
    pub async fn start(source: Arc<dyn MediaSource>) -> Self {
        let (video, video_on) = match source.camera().await {
            Ok(track) => (track, true),
            Err(e) => {
                warn!("No camera, sending black video: {}", e);
                (black_video_track(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT), false)
            }
        };
        let (audio, audio_on) = match source.microphone().await {
            Ok(track) => (track, true),
            Err(e) => {
                warn!("No microphone, sending silence: {}", e);
                (silent_audio_track(), false)
            }
        };
        info!(
            "Local media ready (video: {}, audio: {})",
            video_on, audio_on
        );

        Self {
            source,
            video,
            audio,
            video_on,
            audio_on,
            screen_on: false,
        }
    }

    pub fn video_track(&self) -> Arc<LocalTrack> {
        self.video.clone()
    }

    pub fn audio_track(&self) -> Arc<LocalTrack> {
        self.audio.clone()
    }

    /// Tracks attached to every new connection.
    pub fn tracks(&self) -> Vec<Arc<LocalTrack>> {
        vec![self.audio.clone(), self.video.clone()]
    }

    pub fn video_enabled(&self) -> bool {
        self.video_on
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_on
    }

    pub fn screen_sharing(&self) -> bool {
        self.screen_on
    }

    /// Camera on/off. Returns the video track to install, if it changed.
    ///
    /// While the screen is shared only the flag flips; it decides what
    /// comes back once sharing stops.
    pub async fn toggle_video(&mut self) -> Option<Arc<LocalTrack>> {
        if self.screen_on {
            self.video_on = !self.video_on;
            debug!("Camera preference set to {} during screen share", self.video_on);
            return None;
        }

        if self.video_on {
            self.video_on = false;
            return Some(self.install_video(black_video_track(
                PLACEHOLDER_WIDTH,
                PLACEHOLDER_HEIGHT,
            )));
        }

        match self.source.camera().await {
            Ok(track) => {
                self.video_on = true;
                Some(self.install_video(track))
            }
            Err(e) => {
                warn!("Camera unavailable, video stays off: {}", e);
                None
            }
        }
    }

    /// Mute/unmute. Never replaces the track.
    pub fn toggle_audio(&mut self) -> bool {
        self.audio_on = !self.audio_on;
        self.audio.set_enabled(self.audio_on);
        self.audio_on
    }

    pub async fn toggle_screen_share(&mut self) -> Option<Arc<LocalTrack>> {
        if self.screen_on {
            self.screen_on = false;
            return Some(self.restore_video().await);
        }

        match self.source.screen().await {
            Ok(track) => {
                self.screen_on = true;
                Some(self.install_video(track))
            }
            Err(e) => {
                warn!("Screen capture unavailable: {}", e);
                None
            }
        }
    }

    /// The capture was stopped outside the session (e.g. by the OS).
    pub async fn screen_share_ended(&mut self) -> Option<Arc<LocalTrack>> {
        if !self.screen_on {
            return None;
        }
        self.screen_on = false;
        Some(self.restore_video().await)
    }

    pub fn stop_all(&self) {
        self.video.stop();
        self.audio.stop();
    }

    async fn restore_video(&mut self) -> Arc<LocalTrack> {
        if self.video_on {
            match self.source.camera().await {
                Ok(track) => return self.install_video(track),
                Err(e) => {
                    warn!("Camera unavailable after screen share: {}", e);
                    self.video_on = false;
                }
            }
        }
        self.install_video(black_video_track(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT))
    }

    fn install_video(&mut self, track: Arc<LocalTrack>) -> Arc<LocalTrack> {
        let previous = std::mem::replace(&mut self.video, track.clone());
        previous.stop();
        debug!("Video track {} replaced by {}", previous.id(), track.id());
        track
    }
}
