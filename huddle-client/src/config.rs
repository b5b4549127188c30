use crate::error::ClientError;
use crate::media::MediaConstraints;
use huddle_core::utils::{
    DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, DEFAULT_STUN_ADDR_3, DEFAULT_STUN_ADDR_4,
};
use huddle_core::{IceServerConfig, PeerId, RoomId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed backoff between signaling reconnect attempts.
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 5_000;

/// Period of the signaling liveness check.
pub const DEFAULT_LIVENESS_INTERVAL_MS: u64 = 10_000;

/// Delay between a join notification and the offer towards the newcomer,
/// giving the newcomer time to finish its own media setup.
pub const DEFAULT_JOIN_OFFER_DELAY_MS: u64 = 1_500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    pub signaling_url: String,
    pub room_id: RoomId,
    /// Generated when absent.
    pub user_id: Option<PeerId>,
    pub username: Option<String>,
    pub ice_servers: Vec<IceServerConfig>,
    pub reconnect_interval_ms: u64,
    pub liveness_interval_ms: u64,
    pub join_offer_delay_ms: u64,
    pub media: MediaConstraints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: String::new(),
            room_id: RoomId::from(""),
            user_id: None,
            username: None,
            ice_servers: default_ice_servers(),
            reconnect_interval_ms: DEFAULT_RECONNECT_INTERVAL_MS,
            liveness_interval_ms: DEFAULT_LIVENESS_INTERVAL_MS,
            join_offer_delay_ms: DEFAULT_JOIN_OFFER_DELAY_MS,
            media: MediaConstraints::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(signaling_url: impl Into<String>, room_id: impl Into<RoomId>) -> Self {
        Self {
            signaling_url: signaling_url.into(),
            room_id: room_id.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.room_id.as_str().trim().is_empty() {
            return Err(ClientError::Config("room id is empty".into()));
        }
        if self.reconnect_interval_ms == 0 {
            return Err(ClientError::Config("reconnect interval must be positive".into()));
        }
        if self.liveness_interval_ms == 0 {
            return Err(ClientError::Config("liveness interval must be positive".into()));
        }
        Ok(())
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval_ms)
    }

    pub fn join_offer_delay(&self) -> Duration {
        Duration::from_millis(self.join_offer_delay_ms)
    }
}

pub fn default_ice_servers() -> Vec<IceServerConfig> {
    [
        DEFAULT_STUN_ADDR,
        DEFAULT_STUN_ADDR_2,
        DEFAULT_STUN_ADDR_3,
        DEFAULT_STUN_ADDR_4,
    ]
    .into_iter()
    .map(IceServerConfig::stun)
    .collect()
}
