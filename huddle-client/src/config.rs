use huddle_core::utils::default_ice_servers;
use huddle_core::{IceServerConfig, RoomId};
use serde::Deserialize;

/// Everything a client needs to take part in a call.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// WebSocket endpoint of the relay, e.g. `ws://127.0.0.1:3000/ws`.
    pub server_url: String,
    pub room: RoomId,
    pub display_name: String,
    /// Used until the relay sends its own `ice-config`.
    #[serde(default = "default_ice_servers")]
    pub ice_servers: Vec<IceServerConfig>,
}

impl ClientConfig {
    pub fn new(
        server_url: impl Into<String>,
        room: impl Into<RoomId>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            room: room.into(),
            display_name: display_name.into(),
            ice_servers: default_ice_servers(),
        }
    }
}
