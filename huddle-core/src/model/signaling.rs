use crate::destinations;
use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: &str) -> Self {
        Self {
            urls: vec![url.to_string()],
            username: None,
            credential: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default)]
    pub sdp_m_line_index: Option<u16>,
}

/// Peer-targeted negotiation messages, relayed by the server to the private
/// queue of `target_user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum PeerSignal {
    Offer {
        user_id: PeerId,
        target_user_id: PeerId,
        offer: SessionDescription,
    },
    Answer {
        user_id: PeerId,
        target_user_id: PeerId,
        answer: SessionDescription,
    },
    IceCandidate {
        user_id: PeerId,
        target_user_id: PeerId,
        candidate: IceCandidate,
    },
}

impl PeerSignal {
    pub fn sender(&self) -> &PeerId {
        match self {
            PeerSignal::Offer { user_id, .. }
            | PeerSignal::Answer { user_id, .. }
            | PeerSignal::IceCandidate { user_id, .. } => user_id,
        }
    }

    pub fn target(&self) -> &PeerId {
        match self {
            PeerSignal::Offer { target_user_id, .. }
            | PeerSignal::Answer { target_user_id, .. }
            | PeerSignal::IceCandidate { target_user_id, .. } => target_user_id,
        }
    }

    pub fn destination(&self) -> &'static str {
        match self {
            PeerSignal::Offer { .. } => destinations::WEBRTC_OFFER,
            PeerSignal::Answer { .. } => destinations::WEBRTC_ANSWER,
            PeerSignal::IceCandidate { .. } => destinations::WEBRTC_ICE_CANDIDATE,
        }
    }
}
