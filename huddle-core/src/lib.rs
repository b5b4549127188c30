pub mod destinations;
pub mod model;
pub mod stomp;
pub mod utils;

pub use model::{
    ChatKind, ChatMessage, ConnectionStatus, IceCandidate, IceServerConfig, Participant,
    ParticipantInfo, PeerId, PeerSignal, Presence, RoomId, RoomNotification, RoomStatusRequest,
    SdpKind, SessionDescription, SignalingMessage,
};
