use crate::error::NegotiationError;
use crate::media::{LocalTrack, TrackKind};
use crate::peer::{
    PeerConnection, PeerConnectionEvent, PeerConnectionFactory, PeerConnectionState,
    PeerEventSender, RemoteTrack, RtcConfig, SenderId,
};
use anyhow::Context;
use async_trait::async_trait;
use huddle_core::{IceCandidate, SdpKind, SessionDescription};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

const LOCAL_STREAM_ID: &str = "huddle";

#[derive(Debug, Default, Clone, Copy)]
pub struct WebrtcPeerFactory;

#[async_trait(?Send)]
impl PeerConnectionFactory for WebrtcPeerFactory {
    async fn create(
        &self,
        config: &RtcConfig,
        events: PeerEventSender,
    ) -> Result<Rc<dyn PeerConnection>, NegotiationError> {
        let connection = WebrtcPeerConnection::new(config, events)
            .await
            .map_err(|e| NegotiationError::CreateConnection(format!("{:#}", e)))?;
        Ok(Rc::new(connection))
    }
}

struct SenderSlot {
    sender: Arc<RTCRtpSender>,
    track: Option<Arc<TrackLocalStaticSample>>,
}

/// `RTCPeerConnection` behind the engine's [`PeerConnection`] seam. Local
/// tracks become sample tracks that the embedding application feeds.
pub struct WebrtcPeerConnection {
    peer_connection: Arc<RTCPeerConnection>,
    senders: RefCell<Vec<SenderSlot>>,
}

impl WebrtcPeerConnection {
    pub async fn new(config: &RtcConfig, events: PeerEventSender) -> anyhow::Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("failed to create RTCPeerConnection")?,
        );

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("Peer connection state changed: {:?}", s);
                    let state = match s {
                        RTCPeerConnectionState::Connecting => PeerConnectionState::Connecting,
                        RTCPeerConnectionState::Connected => PeerConnectionState::Connected,
                        RTCPeerConnectionState::Disconnected => PeerConnectionState::Disconnected,
                        RTCPeerConnectionState::Failed => PeerConnectionState::Failed,
                        RTCPeerConnectionState::Closed => PeerConnectionState::Closed,
                        _ => PeerConnectionState::New,
                    };
                    let _ = tx.unbounded_send(PeerConnectionEvent::StateChanged(state));
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx.unbounded_send(PeerConnectionEvent::IceCandidate(IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                }));
            })
        }));

        let track_tx = events;
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();
            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    RTPCodecType::Video => TrackKind::Video,
                    _ => return,
                };
                debug!("Remote {:?} track {} arrived", kind, track.id());
                let _ = tx.unbounded_send(PeerConnectionEvent::RemoteTrack(RemoteTrack {
                    stream_id: track.stream_id(),
                    track_id: track.id(),
                    kind,
                }));
            })
        }));

        Ok(Self {
            peer_connection,
            senders: RefCell::new(Vec::new()),
        })
    }

    pub fn inner(&self) -> &Arc<RTCPeerConnection> {
        &self.peer_connection
    }

    /// Sample track currently bound to `sender`, for writing media into.
    pub fn sample_track(&self, sender: SenderId) -> Option<Arc<TrackLocalStaticSample>> {
        self.senders
            .borrow()
            .get(sender.0)
            .and_then(|slot| slot.track.clone())
    }

    fn sample_track_for(track: &LocalTrack) -> Arc<TrackLocalStaticSample> {
        let mime_type = match track.kind() {
            TrackKind::Audio => MIME_TYPE_OPUS,
            TrackKind::Video => MIME_TYPE_VP8,
        };
        Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_owned(),
                ..Default::default()
            },
            track.id(),
            LOCAL_STREAM_ID.to_owned(),
        ))
    }

    fn to_rtc_description(
        description: &SessionDescription,
    ) -> Result<RTCSessionDescription, webrtc::Error> {
        match description.kind {
            SdpKind::Offer => RTCSessionDescription::offer(description.sdp.clone()),
            SdpKind::Answer => RTCSessionDescription::answer(description.sdp.clone()),
        }
    }
}

#[async_trait(?Send)]
impl PeerConnection for WebrtcPeerConnection {
    async fn create_offer(&self) -> Result<String, NegotiationError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(|e| NegotiationError::CreateDescription(e.to_string()))?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String, NegotiationError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(|e| NegotiationError::CreateDescription(e.to_string()))?;
        Ok(answer.sdp)
    }

    async fn set_local_description(
        &self,
        description: &SessionDescription,
    ) -> Result<(), NegotiationError> {
        let desc = Self::to_rtc_description(description)
            .map_err(|e| NegotiationError::ApplyDescription(e.to_string()))?;
        self.peer_connection
            .set_local_description(desc)
            .await
            .map_err(|e| NegotiationError::ApplyDescription(e.to_string()))
    }

    async fn set_remote_description(
        &self,
        description: &SessionDescription,
    ) -> Result<(), NegotiationError> {
        let desc = Self::to_rtc_description(description)
            .map_err(|e| NegotiationError::ApplyDescription(e.to_string()))?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(|e| NegotiationError::ApplyDescription(e.to_string()))
    }

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<(), NegotiationError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate.clone(),
            sdp_mid: candidate.sdp_mid.clone(),
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| NegotiationError::AddCandidate(e.to_string()))
    }

    async fn add_track(&self, track: &LocalTrack) -> Result<SenderId, NegotiationError> {
        let sample = Self::sample_track_for(track);
        let sender = self
            .peer_connection
            .add_track(Arc::clone(&sample) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(|e| NegotiationError::Track(e.to_string()))?;

        let mut senders = self.senders.borrow_mut();
        senders.push(SenderSlot {
            sender,
            track: Some(sample),
        });
        Ok(SenderId(senders.len() - 1))
    }

    async fn replace_track(
        &self,
        sender: SenderId,
        track: Option<&LocalTrack>,
    ) -> Result<(), NegotiationError> {
        let rtp_sender = self
            .senders
            .borrow()
            .get(sender.0)
            .map(|slot| slot.sender.clone())
            .ok_or_else(|| NegotiationError::Track(format!("unknown sender {}", sender.0)))?;

        let sample = track.map(Self::sample_track_for);
        rtp_sender
            .replace_track(
                sample
                    .clone()
                    .map(|s| s as Arc<dyn TrackLocal + Send + Sync>),
            )
            .await
            .map_err(|e| NegotiationError::Track(e.to_string()))?;

        if let Some(slot) = self.senders.borrow_mut().get_mut(sender.0) {
            slot.track = sample;
        }
        Ok(())
    }

    fn close(&self) {
        let peer_connection = self.peer_connection.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = peer_connection.close().await {
                        warn!("Failed to close peer connection: {}", e);
                    }
                });
            }
            Err(_) => warn!("No tokio runtime to close the peer connection on"),
        }
    }
}
