//! Minimal STOMP 1.2 frame codec for the text frames the relay speaks over
//! WebSocket.

mod error;
mod frame;

pub use error::StompError;
pub use frame::{Command, Frame, decode_frames};
