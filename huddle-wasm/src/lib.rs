//! Browser bindings: the room engine on top of WebSocket, `RTCPeerConnection`
//! and `getUserMedia`.

use huddle_client::directory::{RoomDirectory, find_room_by_invite};
use huddle_client::{ClientConfig, Platform, RoomCoordinator};
use huddle_core::RoomId;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

pub mod engine;
mod events;
mod logger;

pub use engine::{
    HttpRoomDirectory, RemoteStreams, StompTransport, WasmExecutor, WebMediaDevices,
    WebMediaTrack, WebPeerConnection, WebPeerFactory,
};
pub use events::{JsEvents, UiEvent};

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsError::new(&e.to_string()).into()
}

/// One room session driven from the page.
#[wasm_bindgen]
pub struct HuddleClient {
    coordinator: RoomCoordinator,
    events: Rc<JsEvents>,
    remote_streams: RemoteStreams,
    pagehide: Closure<dyn FnMut(JsValue)>,
}

#[wasm_bindgen]
impl HuddleClient {
    /// `config` is a `ClientConfig` object (`{ signalingUrl, roomId, ... }`).
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<HuddleClient, JsValue> {
        logger::init("info");

        let mut config: ClientConfig = serde_wasm_bindgen::from_value(config)?;
        let window = web_sys::window().ok_or_else(|| to_js("no window object"))?;
        let location = window.location();
        config.signaling_url = engine::resolve_ws_url(
            &config.signaling_url,
            &location.protocol()?,
            &location.host()?,
        );

        let remote_streams = RemoteStreams::default();
        let events = Rc::new(JsEvents::default());
        let platform = Platform {
            transport: Rc::new(StompTransport::new(config.signaling_url.clone())),
            devices: Rc::new(WebMediaDevices::new().map_err(to_js)?),
            peers: Rc::new(WebPeerFactory::new(remote_streams.clone())),
            executor: Rc::new(WasmExecutor),
        };
        let coordinator = RoomCoordinator::new(config, platform, events.clone()).map_err(to_js)?;

        // Best-effort leave when the tab goes away.
        let pagehide = {
            let coordinator = coordinator.clone();
            Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |_| coordinator.leave_room()))
        };
        window.add_event_listener_with_callback("pagehide", pagehide.as_ref().unchecked_ref())?;

        Ok(HuddleClient {
            coordinator,
            events,
            remote_streams,
            pagehide,
        })
    }

    #[wasm_bindgen(js_name = setEventHandler)]
    pub fn set_event_handler(&self, callback: js_sys::Function) {
        self.events.set_handler(callback);
    }

    #[wasm_bindgen(getter, js_name = userId)]
    pub fn user_id(&self) -> String {
        self.coordinator.local_user().id.to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn username(&self) -> String {
        self.coordinator.local_user().username.clone()
    }

    #[wasm_bindgen(getter, js_name = roomId)]
    pub fn room_id(&self) -> String {
        self.coordinator.room_id().to_string()
    }

    pub fn join(&self) -> js_sys::Promise {
        let coordinator = self.coordinator.clone();
        future_to_promise(async move {
            coordinator.join().await.map_err(to_js)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn leave(&self) {
        self.coordinator.leave_room();
        self.remote_streams.clear();
    }

    #[wasm_bindgen(js_name = sendChatMessage)]
    pub fn send_chat_message(&self, text: &str) -> Result<(), JsValue> {
        self.coordinator.send_chat_message(text).map_err(to_js)
    }

    #[wasm_bindgen(js_name = toggleVideo)]
    pub fn toggle_video(&self) -> Result<bool, JsValue> {
        self.coordinator.toggle_video().map_err(to_js)
    }

    #[wasm_bindgen(js_name = toggleAudio)]
    pub fn toggle_audio(&self) -> bool {
        self.coordinator.toggle_audio()
    }

    #[wasm_bindgen(js_name = startScreenShare)]
    pub fn start_screen_share(&self) -> js_sys::Promise {
        let coordinator = self.coordinator.clone();
        future_to_promise(async move {
            coordinator.start_screen_share().await.map_err(to_js)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = stopScreenShare)]
    pub fn stop_screen_share(&self) -> bool {
        self.coordinator.stop_screen_share()
    }

    #[wasm_bindgen(js_name = switchDevices)]
    pub fn switch_devices(
        &self,
        video_device_id: Option<String>,
        audio_device_id: Option<String>,
    ) -> js_sys::Promise {
        let coordinator = self.coordinator.clone();
        future_to_promise(async move {
            coordinator
                .switch_devices(video_device_id, audio_device_id)
                .await
                .map_err(to_js)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = enumerateDevices)]
    pub fn enumerate_devices(&self) -> js_sys::Promise {
        let coordinator = self.coordinator.clone();
        future_to_promise(async move {
            let devices = coordinator.enumerate_devices().await.map_err(to_js)?;
            Ok(serde_wasm_bindgen::to_value(&devices)?)
        })
    }

    /// Connects to a participant without waiting for a room notification.
    #[wasm_bindgen(js_name = connectTo)]
    pub fn connect_to(&self, peer_id: &str) -> bool {
        self.coordinator.connect_to(peer_id.into())
    }

    #[wasm_bindgen(js_name = mediaState)]
    pub fn media_state(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.coordinator.media_state())?)
    }

    /// The stream to preview locally: the screen capture while sharing,
    /// else the camera.
    #[wasm_bindgen(js_name = localStream)]
    pub fn local_stream(&self) -> Option<web_sys::MediaStream> {
        let stream = self.coordinator.media().active_stream()?;
        stream
            .tracks()
            .iter()
            .find_map(WebMediaTrack::from_local)
            .map(|track| track.stream().clone())
    }

    #[wasm_bindgen(js_name = remoteStream)]
    pub fn remote_stream(&self, stream_id: &str) -> Option<web_sys::MediaStream> {
        self.remote_streams.get(stream_id)
    }
}

impl Drop for HuddleClient {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            let _ = window.remove_event_listener_with_callback(
                "pagehide",
                self.pagehide.as_ref().unchecked_ref(),
            );
        }
        self.coordinator.leave_room();
    }
}

/// Room creation and invite-code lookup for the landing page.
#[wasm_bindgen]
pub struct RoomDirectoryClient {
    directory: Rc<HttpRoomDirectory>,
}

#[wasm_bindgen]
impl RoomDirectoryClient {
    #[wasm_bindgen(constructor)]
    pub fn new(base_url: Option<String>) -> RoomDirectoryClient {
        logger::init("info");
        RoomDirectoryClient {
            directory: Rc::new(HttpRoomDirectory::new(base_url.unwrap_or_default())),
        }
    }

    #[wasm_bindgen(js_name = createRoom)]
    pub fn create_room(&self, name: String) -> js_sys::Promise {
        let directory = self.directory.clone();
        future_to_promise(async move {
            let room = directory.create_room(&name).await.map_err(to_js)?;
            Ok(serde_wasm_bindgen::to_value(&room)?)
        })
    }

    #[wasm_bindgen(js_name = roomInfo)]
    pub fn room_info(&self, room_id: String) -> js_sys::Promise {
        let directory = self.directory.clone();
        future_to_promise(async move {
            let info = directory
                .room_info(&RoomId::from(room_id.as_str()))
                .await
                .map_err(to_js)?;
            Ok(serde_wasm_bindgen::to_value(&info)?)
        })
    }

    /// Resolves a six-digit invite code to the room it belongs to.
    #[wasm_bindgen(js_name = findByInviteCode)]
    pub fn find_by_invite_code(&self, code: String) -> js_sys::Promise {
        let directory = self.directory.clone();
        future_to_promise(async move {
            let room = find_room_by_invite(directory.as_ref(), &code)
                .await
                .map_err(to_js)?;
            Ok(serde_wasm_bindgen::to_value(&room)?)
        })
    }
}
