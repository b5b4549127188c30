use huddle_client::media::LocalMediaState;
use huddle_client::peer::{PeerConnectionState, RemoteStream};
use huddle_client::{ChannelState, ClientError, RoomEvents};
use huddle_core::{ChatMessage, Participant, PeerId};
use serde::Serialize;
use std::cell::RefCell;
use wasm_bindgen::JsValue;

use crate::logger::Logger;

/// Payload handed to the page's event handler. Serialized as
/// `{ "type": "participantJoined", ... }`.
#[derive(Debug, Serialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum UiEvent<'a> {
    ParticipantJoined { participant: &'a Participant },
    ParticipantLeft { peer_id: &'a PeerId },
    ParticipantCount { count: u32 },
    RemoteStream { peer_id: &'a PeerId, stream_id: &'a str },
    PeerConnectionState { peer_id: &'a PeerId, state: PeerConnectionState },
    ChatMessage { message: &'a ChatMessage },
    LocalMediaChanged { state: &'a LocalMediaState },
    ScreenShareEnded,
    ConnectionState { state: ChannelState },
    Error { message: String },
}

/// Forwards room events to a single JS callback.
#[derive(Default)]
pub struct JsEvents {
    callback: RefCell<Option<js_sys::Function>>,
}

impl JsEvents {
    pub fn set_handler(&self, callback: js_sys::Function) {
        *self.callback.borrow_mut() = Some(callback);
    }

    fn emit(&self, event: UiEvent<'_>) {
        let callback = self.callback.borrow().clone();
        let Some(callback) = callback else {
            return;
        };
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        match event.serialize(&serializer) {
            Ok(value) => {
                if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                    Logger::error(&e);
                }
            }
            Err(e) => tracing::error!("Failed to serialize UI event: {}", e),
        }
    }
}

impl RoomEvents for JsEvents {
    fn on_participant_joined(&self, participant: &Participant) {
        self.emit(UiEvent::ParticipantJoined { participant });
    }

    fn on_participant_left(&self, peer_id: &PeerId) {
        self.emit(UiEvent::ParticipantLeft { peer_id });
    }

    fn on_participant_count(&self, count: u32) {
        self.emit(UiEvent::ParticipantCount { count });
    }

    fn on_remote_stream(&self, peer_id: &PeerId, stream: &RemoteStream) {
        self.emit(UiEvent::RemoteStream {
            peer_id,
            stream_id: &stream.id,
        });
    }

    fn on_peer_connection_state(&self, peer_id: &PeerId, state: PeerConnectionState) {
        self.emit(UiEvent::PeerConnectionState { peer_id, state });
    }

    fn on_chat_message(&self, message: &ChatMessage) {
        self.emit(UiEvent::ChatMessage { message });
    }

    fn on_local_media_changed(&self, state: &LocalMediaState) {
        self.emit(UiEvent::LocalMediaChanged { state });
    }

    fn on_screen_share_ended(&self) {
        self.emit(UiEvent::ScreenShareEnded);
    }

    fn on_connection_state(&self, state: ChannelState) {
        self.emit(UiEvent::ConnectionState { state });
    }

    fn on_error(&self, error: &ClientError) {
        self.emit(UiEvent::Error {
            message: error.to_string(),
        });
    }
}
