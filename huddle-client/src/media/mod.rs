mod local_media;
mod local_track;
mod placeholder;
mod source;

pub use local_media::LocalMedia;
pub use local_track::{LocalTrack, TrackKind, TrackSettings};
pub use placeholder::{black_video_track, silent_audio_track};
pub use source::{MediaSource, NoCapture};
