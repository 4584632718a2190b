mod config;
mod error;
pub mod media;
pub mod orchestrator;
pub mod peer;
mod session;
pub mod signaling;

pub use config::ClientConfig;
pub use error::*;
pub use orchestrator::{Orchestrator, RemoteStream, SessionCommand, SessionEvent};
pub use session::{Session, SessionHandle};
