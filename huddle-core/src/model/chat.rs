use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

/// One entry of a room's chat history. Appended, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender_name: String,
    pub text: String,
    pub sender_id: PeerId,
}
