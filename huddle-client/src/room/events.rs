use crate::error::ClientError;
use crate::media::LocalMediaState;
use crate::peer::{PeerConnectionState, RemoteStream};
use crate::signaling::ChannelState;
use huddle_core::{ChatMessage, Participant, PeerId};

/// Callbacks into the UI layer. Every method defaults to a no-op.
///
/// Callbacks run on the event loop and may call back into the
/// [`RoomCoordinator`](super::RoomCoordinator).
pub trait RoomEvents {
    fn on_participant_joined(&self, _participant: &Participant) {}

    fn on_participant_left(&self, _peer_id: &PeerId) {}

    fn on_participant_count(&self, _count: u32) {}

    fn on_remote_stream(&self, _peer_id: &PeerId, _stream: &RemoteStream) {}

    fn on_peer_connection_state(&self, _peer_id: &PeerId, _state: PeerConnectionState) {}

    fn on_chat_message(&self, _message: &ChatMessage) {}

    fn on_local_media_changed(&self, _state: &LocalMediaState) {}

    fn on_screen_share_ended(&self) {}

    fn on_connection_state(&self, _state: ChannelState) {}

    /// User-visible failures, e.g. denied camera access.
    fn on_error(&self, _error: &ClientError) {}
}

pub struct NoopEvents;

impl RoomEvents for NoopEvents {}
