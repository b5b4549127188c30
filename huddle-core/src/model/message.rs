use crate::destinations;
use crate::model::chat::ChatMessage;
use crate::model::room::{Presence, RoomStatusRequest};
use crate::model::signaling::PeerSignal;
use serde::Serialize;

/// Everything a client publishes to the relay, paired with its routing key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SignalingMessage {
    Join(Presence),
    Leave(Presence),
    StatusRequest(RoomStatusRequest),
    Chat(ChatMessage),
    Peer(PeerSignal),
}

impl SignalingMessage {
    pub fn destination(&self) -> &'static str {
        match self {
            SignalingMessage::Join(_) => destinations::ROOM_JOIN,
            SignalingMessage::Leave(_) => destinations::ROOM_LEAVE,
            SignalingMessage::StatusRequest(_) => destinations::ROOM_STATUS,
            SignalingMessage::Chat(_) => destinations::CHAT_SEND,
            SignalingMessage::Peer(signal) => signal.destination(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<PeerSignal> for SignalingMessage {
    fn from(signal: PeerSignal) -> Self {
        SignalingMessage::Peer(signal)
    }
}
