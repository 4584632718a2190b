mod app;
mod config;
mod room;
mod signaling;

pub use app::{router, serve};
pub use config::ServerConfig;
pub use room::*;
pub use signaling::*;
