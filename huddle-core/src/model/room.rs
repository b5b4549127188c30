use crate::model::peer::PeerId;
use crate::utils::timestamp_now;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Join / leave announcement sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    pub room_id: RoomId,
    pub user_id: PeerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub timestamp: String,
}

impl Presence {
    pub fn new(room_id: RoomId, user_id: PeerId, username: Option<String>) -> Self {
        Self {
            room_id,
            user_id,
            username,
            timestamp: timestamp_now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatusRequest {
    pub room_id: RoomId,
    pub user_id: PeerId,
    pub timestamp: String,
}

impl RoomStatusRequest {
    pub fn new(room_id: RoomId, user_id: PeerId) -> Self {
        Self {
            room_id,
            user_id,
            timestamp: timestamp_now(),
        }
    }
}

/// A participant entry in a room listing. The relay sends either bare ids or
/// session objects, depending on the notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParticipantInfo {
    Id(PeerId),
    Detailed {
        #[serde(rename = "userId")]
        user_id: PeerId,
        #[serde(default)]
        username: Option<String>,
    },
}

impl ParticipantInfo {
    pub fn id(&self) -> &PeerId {
        match self {
            ParticipantInfo::Id(id) => id,
            ParticipantInfo::Detailed { user_id, .. } => user_id,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            ParticipantInfo::Id(_) => None,
            ParticipantInfo::Detailed { username, .. } => username.as_deref(),
        }
    }
}

impl From<&str> for ParticipantInfo {
    fn from(id: &str) -> Self {
        ParticipantInfo::Id(PeerId::from(id))
    }
}

/// Membership notifications broadcast on the room participants topic and
/// delivered privately on the room-status queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum RoomNotification {
    UserJoined {
        user_id: PeerId,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        participant_count: Option<u32>,
    },
    UserLeft {
        user_id: PeerId,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        participant_count: Option<u32>,
    },
    RoomStatus {
        #[serde(default)]
        participant_count: Option<u32>,
        #[serde(default)]
        participants: Vec<ParticipantInfo>,
    },
}

impl RoomNotification {
    pub fn participant_count(&self) -> Option<u32> {
        match self {
            RoomNotification::UserJoined {
                participant_count, ..
            }
            | RoomNotification::UserLeft {
                participant_count, ..
            }
            | RoomNotification::RoomStatus {
                participant_count, ..
            } => *participant_count,
        }
    }
}
