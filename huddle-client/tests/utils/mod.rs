pub mod mock_media;

pub use mock_connection::*;
pub use mock_media::*;
pub use mock_signal_sink::*;
pub use signal_helpers::*;
