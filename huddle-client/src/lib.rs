//! Mesh video-room engine: relay signaling, local media and one peer
//! connection per remote participant, driven on a single-threaded event loop.

pub mod config;
pub mod directory;
pub mod error;
pub mod media;
#[cfg(not(target_arch = "wasm32"))]
pub mod native;
pub mod peer;
pub mod room;
pub mod runtime;
pub mod signaling;

pub use config::ClientConfig;
pub use directory::{CreatedRoom, InvitedRoom, RoomDirectory, RoomInfo};
pub use error::{ClientError, DirectoryError, MediaError, NegotiationError, TransportError};
pub use media::{LocalMediaState, MediaController};
pub use peer::{PeerSession, PeerSessionRegistry, SessionState};
pub use room::{Platform, RoomCoordinator, RoomEvents};
pub use runtime::{Executor, TaskHandle};
pub use signaling::{ChannelState, SignalingChannel};
