mod command;
mod event;
mod orchestrator;

pub use command::SessionCommand;
pub use event::{RemoteStream, SessionEvent};
pub use orchestrator::Orchestrator;
