mod chat;
mod peer;
mod protocol;
mod room;
mod signaling;

pub use chat::ChatMessage;
pub use peer::PeerId;
pub use protocol::{ClientMessage, ServerMessage};
pub use room::RoomId;
pub use signaling::{IceServerConfig, SignalEnvelope};
