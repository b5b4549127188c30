use crate::error::NegotiationError;
use crate::media::{LocalTrack, TrackKind};
use async_trait::async_trait;
use futures::channel::mpsc;
use huddle_core::{IceCandidate, IceServerConfig, SessionDescription};
use serde::Serialize;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct RtcConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

/// Handle to an RTP sender returned by [`PeerConnection::add_track`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SenderId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub stream_id: String,
    pub track_id: String,
    pub kind: TrackKind,
}

/// The first remote stream of a peer, as handed to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStream {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PeerConnectionEvent {
    /// A local candidate was gathered and should be trickled to the peer.
    IceCandidate(IceCandidate),
    RemoteTrack(RemoteTrack),
    StateChanged(PeerConnectionState),
}

pub type PeerEventSender = mpsc::UnboundedSender<PeerConnectionEvent>;

/// One ICE-capable media connection to a remote peer.
#[async_trait(?Send)]
pub trait PeerConnection {
    async fn create_offer(&self) -> Result<String, NegotiationError>;

    async fn create_answer(&self) -> Result<String, NegotiationError>;

    async fn set_local_description(
        &self,
        description: &SessionDescription,
    ) -> Result<(), NegotiationError>;

    async fn set_remote_description(
        &self,
        description: &SessionDescription,
    ) -> Result<(), NegotiationError>;

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<(), NegotiationError>;

    async fn add_track(&self, track: &LocalTrack) -> Result<SenderId, NegotiationError>;

    /// Swaps the track of an existing sender without renegotiation.
    /// `None` stops sending on that sender.
    async fn replace_track(
        &self,
        sender: SenderId,
        track: Option<&LocalTrack>,
    ) -> Result<(), NegotiationError>;

    /// Synchronous so it can run during page teardown.
    fn close(&self);
}

#[async_trait(?Send)]
pub trait PeerConnectionFactory {
    async fn create(
        &self,
        config: &RtcConfig,
        events: PeerEventSender,
    ) -> Result<Rc<dyn PeerConnection>, NegotiationError>;
}
