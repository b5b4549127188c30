mod chat;
mod message;
mod participant;
mod peer;
mod room;
mod signaling;

pub use chat::{ChatKind, ChatMessage};
pub use message::SignalingMessage;
pub use participant::{ConnectionStatus, Participant};
pub use peer::PeerId;
pub use room::{ParticipantInfo, Presence, RoomId, RoomNotification, RoomStatusRequest};
pub use signaling::{
    IceCandidate, IceServerConfig, PeerSignal, SdpKind, SessionDescription,
};
