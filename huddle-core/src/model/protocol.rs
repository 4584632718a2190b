use crate::error::ProtocolError;
use crate::model::{ChatMessage, IceServerConfig, PeerId, RoomId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinCall { room: RoomId },
    Signal { to: PeerId, payload: Value },
    ChatMessage { text: String, sender_name: String },
    LeaveCall {},
}

/// Frames the relay sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ServerMessage {
    Welcome {
        peer_id: PeerId,
    },
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    UserJoined {
        peer_id: PeerId,
        members: Vec<PeerId>,
    },
    UserLeft {
        peer_id: PeerId,
    },
    Signal {
        from: PeerId,
        payload: Value,
    },
    ChatMessage {
        text: String,
        sender_name: String,
        sender_id: PeerId,
    },
    Error {
        message: String,
    },
}

impl From<ChatMessage> for ServerMessage {
    fn from(msg: ChatMessage) -> Self {
        ServerMessage::ChatMessage {
            text: msg.text,
            sender_name: msg.sender_name,
            sender_id: msg.sender_id,
        }
    }
}

impl ClientMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl ServerMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
