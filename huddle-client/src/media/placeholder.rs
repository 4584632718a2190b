use super::local_track::{LocalTrack, TrackKind, TrackSettings};
use std::sync::Arc;

pub const BLACK_VIDEO_LABEL: &str = "black";
pub const SILENT_AUDIO_LABEL: &str = "silence";

/// Disabled, blank video track sent while the camera is off so that every
/// connection keeps a video sender to swap tracks into.
pub fn black_video_track(width: u32, height: u32) -> Arc<LocalTrack> {
    let track = LocalTrack::new(
        TrackKind::Video,
        BLACK_VIDEO_LABEL,
        TrackSettings {
            width: Some(width),
            height: Some(height),
        },
    );
    track.set_enabled(false);
    Arc::new(track)
}

/// Disabled audio placeholder.
pub fn silent_audio_track() -> Arc<LocalTrack> {
    let track = LocalTrack::new(TrackKind::Audio, SILENT_AUDIO_LABEL, TrackSettings::default());
    track.set_enabled(false);
    Arc::new(track)
}
