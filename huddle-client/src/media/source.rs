use super::local_track::LocalTrack;
use crate::error::MediaError;
use async_trait::async_trait;
use std::sync::Arc;

/// Capture subsystem: hands out live local tracks on demand.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn camera(&self) -> Result<Arc<LocalTrack>, MediaError>;

    async fn microphone(&self) -> Result<Arc<LocalTrack>, MediaError>;

    async fn screen(&self) -> Result<Arc<LocalTrack>, MediaError>;
}

/// Source for hosts without capture devices.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapture;

#[async_trait]
impl MediaSource for NoCapture {
    async fn camera(&self) -> Result<Arc<LocalTrack>, MediaError> {
        Err(MediaError::DeviceUnavailable("camera".into()))
    }

    async fn microphone(&self) -> Result<Arc<LocalTrack>, MediaError> {
        Err(MediaError::DeviceUnavailable("microphone".into()))
    }

    async fn screen(&self) -> Result<Arc<LocalTrack>, MediaError> {
        Err(MediaError::DeviceUnavailable("screen".into()))
    }
}
