mod signal_sink;
mod ws_client;

pub use signal_sink::SignalSink;
pub use ws_client::WsSignalClient;
