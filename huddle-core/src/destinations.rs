//! Relay destinations used by the conference client.
//!
//! `/app/*` destinations are handled by the relay application, `/topic/*` are
//! room broadcasts and `/user/queue/*` are private per-user queues.

use crate::model::RoomId;

pub const ROOM_JOIN: &str = "/app/room.join";
pub const ROOM_LEAVE: &str = "/app/room.leave";
pub const ROOM_STATUS: &str = "/app/room.status";
pub const CHAT_SEND: &str = "/app/chat.send";

pub const WEBRTC_OFFER: &str = "/app/webrtc.offer";
pub const WEBRTC_ANSWER: &str = "/app/webrtc.answer";
pub const WEBRTC_ICE_CANDIDATE: &str = "/app/webrtc.ice-candidate";

pub const USER_SIGNALING_QUEUE: &str = "/user/queue/webrtc";
pub const USER_ROOM_STATUS_QUEUE: &str = "/user/queue/room-status";

pub fn participants_topic(room_id: &RoomId) -> String {
    format!("/topic/room/{}/participants", room_id)
}

pub fn chat_topic(room_id: &RoomId) -> String {
    format!("/topic/room/{}/chat", room_id)
}
