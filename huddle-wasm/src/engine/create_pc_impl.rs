use async_trait::async_trait;
use huddle_client::NegotiationError;
use huddle_client::media::{LocalTrack, TrackKind};
use huddle_client::peer::{
    PeerConnection, PeerConnectionEvent, PeerConnectionFactory, PeerConnectionState,
    PeerEventSender, RemoteTrack, RtcConfig, SenderId,
};
use huddle_core::{IceCandidate, SdpKind, SessionDescription};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    MediaStream, MediaStreamTrack, RtcConfiguration, RtcIceCandidateInit, RtcIceServer,
    RtcPeerConnection, RtcPeerConnectionIceEvent, RtcPeerConnectionState, RtcRtpSender,
    RtcSdpType, RtcSessionDescriptionInit, RtcTrackEvent,
};

use crate::engine::js_error;
use crate::engine::media_impl::WebMediaTrack;
use crate::engine::remote_streams_impl::RemoteStreams;

pub struct WebPeerFactory {
    remote_streams: RemoteStreams,
}

impl WebPeerFactory {
    pub fn new(remote_streams: RemoteStreams) -> Self {
        Self { remote_streams }
    }
}

#[async_trait(?Send)]
impl PeerConnectionFactory for WebPeerFactory {
    async fn create(
        &self,
        config: &RtcConfig,
        events: PeerEventSender,
    ) -> Result<Rc<dyn PeerConnection>, NegotiationError> {
        let pc = WebPeerConnection::new(config, events, self.remote_streams.clone())
            .map_err(|e| NegotiationError::CreateConnection(js_error(&e)))?;
        Ok(Rc::new(pc))
    }
}

struct PcCallbacks {
    _onicecandidate: Closure<dyn FnMut(RtcPeerConnectionIceEvent)>,
    _ontrack: Closure<dyn FnMut(RtcTrackEvent)>,
    _onconnectionstatechange: Closure<dyn FnMut(JsValue)>,
}

/// `RTCPeerConnection` behind the engine's connection seam.
pub struct WebPeerConnection {
    pc: RtcPeerConnection,
    senders: RefCell<Vec<RtcRtpSender>>,
    remote_streams: RemoteStreams,
    /// Key of this connection's entries in `remote_streams`.
    stream_owner: u64,
    _callbacks: PcCallbacks,
}

impl WebPeerConnection {
    fn new(
        config: &RtcConfig,
        events: PeerEventSender,
        remote_streams: RemoteStreams,
    ) -> Result<Self, JsValue> {
        let rtc_config = RtcConfiguration::new();
        let ice_servers_arr = js_sys::Array::new();
        for server_config in &config.ice_servers {
            let rtc_ice_server = RtcIceServer::new();

            let urls = js_sys::Array::new();
            for url in &server_config.urls {
                urls.push(&JsValue::from_str(url));
            }
            rtc_ice_server.set_urls(&urls);

            if let Some(username) = &server_config.username {
                rtc_ice_server.set_username(username);
            }
            if let Some(credential) = &server_config.credential {
                rtc_ice_server.set_credential(credential);
            }
            ice_servers_arr.push(&rtc_ice_server);
        }
        rtc_config.set_ice_servers(&ice_servers_arr);

        let pc = RtcPeerConnection::new_with_configuration(&rtc_config)?;
        let stream_owner = remote_streams.register_owner();

        let onicecandidate = {
            let events = events.clone();
            Closure::<dyn FnMut(RtcPeerConnectionIceEvent)>::wrap(Box::new(
                move |ev: RtcPeerConnectionIceEvent| {
                    let Some(candidate) = ev.candidate() else {
                        return;
                    };
                    // An empty candidate marks the end of gathering.
                    if candidate.candidate().is_empty() {
                        return;
                    }
                    let _ = events.unbounded_send(PeerConnectionEvent::IceCandidate(IceCandidate {
                        candidate: candidate.candidate(),
                        sdp_mid: candidate.sdp_mid(),
                        sdp_m_line_index: candidate.sdp_m_line_index(),
                    }));
                },
            ))
        };
        pc.set_onicecandidate(Some(onicecandidate.as_ref().unchecked_ref()));

        let ontrack = {
            let events = events.clone();
            let remote_streams = remote_streams.clone();
            Closure::<dyn FnMut(RtcTrackEvent)>::wrap(Box::new(move |ev: RtcTrackEvent| {
                let track = ev.track();
                let kind = match track.kind().as_str() {
                    "audio" => TrackKind::Audio,
                    "video" => TrackKind::Video,
                    _ => return,
                };
                let stream = ev.streams().get(0).dyn_into::<MediaStream>().ok();
                let stream_id = match stream {
                    Some(stream) => {
                        let id = stream.id();
                        remote_streams.insert(stream_owner, id.clone(), stream);
                        id
                    }
                    // Streamless tracks get a stream of their own.
                    None => {
                        let id = track.id();
                        if let Ok(stream) = MediaStream::new() {
                            stream.add_track(&track);
                            remote_streams.insert(stream_owner, id.clone(), stream);
                        }
                        id
                    }
                };
                let _ = events.unbounded_send(PeerConnectionEvent::RemoteTrack(RemoteTrack {
                    stream_id,
                    track_id: track.id(),
                    kind,
                }));
            }))
        };
        pc.set_ontrack(Some(ontrack.as_ref().unchecked_ref()));

        let onconnectionstatechange = {
            let pc = pc.clone();
            Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |_| {
                let state = match pc.connection_state() {
                    RtcPeerConnectionState::New => PeerConnectionState::New,
                    RtcPeerConnectionState::Connecting => PeerConnectionState::Connecting,
                    RtcPeerConnectionState::Connected => PeerConnectionState::Connected,
                    RtcPeerConnectionState::Disconnected => PeerConnectionState::Disconnected,
                    RtcPeerConnectionState::Failed => PeerConnectionState::Failed,
                    RtcPeerConnectionState::Closed => PeerConnectionState::Closed,
                    _ => return,
                };
                let _ = events.unbounded_send(PeerConnectionEvent::StateChanged(state));
            }))
        };
        pc.set_onconnectionstatechange(Some(onconnectionstatechange.as_ref().unchecked_ref()));

        Ok(Self {
            pc,
            senders: RefCell::new(Vec::new()),
            remote_streams,
            stream_owner,
            _callbacks: PcCallbacks {
                _onicecandidate: onicecandidate,
                _ontrack: ontrack,
                _onconnectionstatechange: onconnectionstatechange,
            },
        })
    }

    fn sender(&self, id: SenderId) -> Result<RtcRtpSender, NegotiationError> {
        self.senders
            .borrow()
            .get(id.0)
            .cloned()
            .ok_or_else(|| NegotiationError::Track(format!("unknown sender {}", id.0)))
    }
}

fn web_track(track: &LocalTrack) -> Result<&WebMediaTrack, NegotiationError> {
    WebMediaTrack::from_local(track)
        .ok_or_else(|| NegotiationError::Track(format!("track {} is not a browser track", track.id())))
}

fn sdp_of(value: &JsValue) -> Option<String> {
    js_sys::Reflect::get(value, &"sdp".into())
        .ok()
        .and_then(|sdp| sdp.as_string())
}

fn description_init(description: &SessionDescription) -> RtcSessionDescriptionInit {
    let kind = match description.kind {
        SdpKind::Offer => RtcSdpType::Offer,
        SdpKind::Answer => RtcSdpType::Answer,
    };
    let init = RtcSessionDescriptionInit::new(kind);
    init.set_sdp(&description.sdp);
    init
}

#[async_trait(?Send)]
impl PeerConnection for WebPeerConnection {
    async fn create_offer(&self) -> Result<String, NegotiationError> {
        let offer = JsFuture::from(self.pc.create_offer())
            .await
            .map_err(|e| NegotiationError::CreateDescription(js_error(&e)))?;
        sdp_of(&offer).ok_or_else(|| NegotiationError::CreateDescription("offer has no sdp".into()))
    }

    async fn create_answer(&self) -> Result<String, NegotiationError> {
        let answer = JsFuture::from(self.pc.create_answer())
            .await
            .map_err(|e| NegotiationError::CreateDescription(js_error(&e)))?;
        sdp_of(&answer)
            .ok_or_else(|| NegotiationError::CreateDescription("answer has no sdp".into()))
    }

    async fn set_local_description(
        &self,
        description: &SessionDescription,
    ) -> Result<(), NegotiationError> {
        let init = description_init(description);
        JsFuture::from(self.pc.set_local_description(&init))
            .await
            .map_err(|e| NegotiationError::ApplyDescription(js_error(&e)))?;
        Ok(())
    }

    async fn set_remote_description(
        &self,
        description: &SessionDescription,
    ) -> Result<(), NegotiationError> {
        let init = description_init(description);
        JsFuture::from(self.pc.set_remote_description(&init))
            .await
            .map_err(|e| NegotiationError::ApplyDescription(js_error(&e)))?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<(), NegotiationError> {
        let init = RtcIceCandidateInit::new(&candidate.candidate);
        init.set_sdp_mid(candidate.sdp_mid.as_deref());
        init.set_sdp_m_line_index(candidate.sdp_m_line_index);
        JsFuture::from(
            self.pc
                .add_ice_candidate_with_opt_rtc_ice_candidate_init(Some(&init)),
        )
        .await
        .map_err(|e| NegotiationError::AddCandidate(js_error(&e)))?;
        Ok(())
    }

    async fn add_track(&self, track: &LocalTrack) -> Result<SenderId, NegotiationError> {
        let web = web_track(track)?;
        let sender = self.pc.add_track_0(web.track(), web.stream());
        let mut senders = self.senders.borrow_mut();
        senders.push(sender);
        Ok(SenderId(senders.len() - 1))
    }

    async fn replace_track(
        &self,
        sender: SenderId,
        track: Option<&LocalTrack>,
    ) -> Result<(), NegotiationError> {
        let sender = self.sender(sender)?;
        let track: Option<MediaStreamTrack> = match track {
            Some(track) => Some(web_track(track)?.track().clone()),
            None => None,
        };
        JsFuture::from(sender.replace_track(track.as_ref()))
            .await
            .map_err(|e| NegotiationError::Track(js_error(&e)))?;
        Ok(())
    }

    fn close(&self) {
        self.pc.set_onicecandidate(None);
        self.pc.set_ontrack(None);
        self.pc.set_onconnectionstatechange(None);
        self.pc.close();
        self.remote_streams.release(self.stream_owner);
        debug!("RTCPeerConnection closed");
    }
}
