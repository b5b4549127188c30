mod connection;
mod registry;
mod session;

pub use connection::{
    PeerConnection, PeerConnectionEvent, PeerConnectionFactory, PeerConnectionState,
    PeerEventSender, RemoteStream, RemoteTrack, RtcConfig, SenderId,
};
pub use registry::PeerSessionRegistry;
pub use session::{PeerSession, SessionState};
