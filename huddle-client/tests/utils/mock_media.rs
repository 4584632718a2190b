use async_trait::async_trait;
use huddle_client::MediaError;
use huddle_client::media::{LocalTrack, MediaSource, TrackKind, TrackSettings};
use std::sync::Arc;

/// Capture devices with configurable availability.
#[derive(Debug, Clone, Copy)]
pub struct MockMediaSource {
    pub camera: bool,
    pub microphone: bool,
    pub screen: bool,
}

impl MockMediaSource {
    pub fn all_devices() -> Self {
        Self {
            camera: true,
            microphone: true,
            screen: true,
        }
    }

    fn track(
        available: bool,
        kind: TrackKind,
        label: &str,
    ) -> Result<Arc<LocalTrack>, MediaError> {
        if !available {
            return Err(MediaError::PermissionDenied(label.to_owned()));
        }
        Ok(Arc::new(LocalTrack::new(kind, label, TrackSettings::default())))
    }
}

#[async_trait]
impl MediaSource for MockMediaSource {
    async fn camera(&self) -> Result<Arc<LocalTrack>, MediaError> {
        Self::track(self.camera, TrackKind::Video, "camera")
    }

    async fn microphone(&self) -> Result<Arc<LocalTrack>, MediaError> {
        Self::track(self.microphone, TrackKind::Audio, "microphone")
    }

    async fn screen(&self) -> Result<Arc<LocalTrack>, MediaError> {
        Self::track(self.screen, TrackKind::Video, "screen")
    }
}
