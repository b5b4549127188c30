use crate::model::peer::PeerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// A remote member of the room as seen by this client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: PeerId,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
    pub connection_status: ConnectionStatus,
}

impl Participant {
    pub fn new(id: PeerId, display_name: Option<String>) -> Self {
        let display_name = display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| id.to_string());
        Self {
            id,
            display_name,
            joined_at: Utc::now(),
            connection_status: ConnectionStatus::Connected,
        }
    }
}
