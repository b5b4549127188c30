use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use crate::utils::timestamp_now;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatKind {
    Chat,
    System,
}

/// A chat line on the room chat topic. `System` lines are produced by the
/// relay (join/leave notices) with `userId = "system"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(rename = "type")]
    pub kind: ChatKind,
    pub room_id: RoomId,
    pub user_id: PeerId,
    #[serde(default)]
    pub username: Option<String>,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_count: Option<u32>,
}

impl ChatMessage {
    pub fn new(room_id: RoomId, user_id: PeerId, username: Option<String>, content: String) -> Self {
        Self {
            kind: ChatKind::Chat,
            room_id,
            user_id,
            username,
            content,
            timestamp: Some(timestamp_now()),
            participant_count: None,
        }
    }
}
