mod connection;
mod entry;
mod rtc;

pub use connection::*;
pub use entry::{NegotiationState, PeerEntry};
pub use rtc::{RtcConnectionFactory, RtcPeerConnection};
