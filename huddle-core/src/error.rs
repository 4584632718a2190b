use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid participant id '{0}'")]
    InvalidPeerId(String),

    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
}
