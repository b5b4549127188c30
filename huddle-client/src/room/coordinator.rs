use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::media::{LocalMediaState, MediaController, MediaDeviceInfo, MediaDevices, MediaEvent};
use crate::peer::{PeerConnectionFactory, PeerSessionRegistry, RtcConfig};
use crate::room::events::RoomEvents;
use crate::runtime::Executor;
use crate::signaling::{PubSubTransport, SignalingChannel};
use huddle_core::destinations::{
    USER_ROOM_STATUS_QUEUE, USER_SIGNALING_QUEUE, chat_topic, participants_topic,
};
use huddle_core::{
    ChatKind, ChatMessage, PeerId, PeerSignal, Presence, RoomId, RoomNotification,
    RoomStatusRequest, SignalingMessage,
};
use serde::Serialize;
use std::cell::Cell;
use std::rc::{Rc, Weak};
use tracing::{info, warn};
use uuid::Uuid;

/// Platform services the coordinator is built on.
pub struct Platform {
    pub transport: Rc<dyn PubSubTransport>,
    pub devices: Rc<dyn MediaDevices>,
    pub peers: Rc<dyn PeerConnectionFactory>,
    pub executor: Rc<dyn Executor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalUser {
    pub id: PeerId,
    pub username: String,
}

impl LocalUser {
    pub fn from_config(config: &ClientConfig) -> Self {
        let id = config.user_id.clone().unwrap_or_else(PeerId::generate);
        let username = config
            .username
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| {
                let random = Uuid::new_v4().simple().to_string();
                format!("User_{}", &random[..5])
            });
        Self { id, username }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinState {
    Idle,
    Joining,
    Joined,
    Left,
}

struct CoordinatorInner {
    config: ClientConfig,
    user: LocalUser,
    channel: SignalingChannel,
    media: MediaController,
    registry: PeerSessionRegistry,
    events: Rc<dyn RoomEvents>,
    state: Cell<JoinState>,
}

/// One room session: owns the signaling channel, local media and the peer
/// mesh, and translates room events between them and the UI.
#[derive(Clone)]
pub struct RoomCoordinator {
    inner: Rc<CoordinatorInner>,
}

impl RoomCoordinator {
    pub fn new(
        config: ClientConfig,
        platform: Platform,
        events: Rc<dyn RoomEvents>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        let user = LocalUser::from_config(&config);

        let channel = SignalingChannel::new(
            platform.transport,
            platform.executor.clone(),
            config.reconnect_interval(),
            config.liveness_interval(),
        );
        let media = MediaController::new(platform.devices);
        let registry = PeerSessionRegistry::new(
            user.id.clone(),
            RtcConfig {
                ice_servers: config.ice_servers.clone(),
            },
            platform.peers,
            Rc::new(channel.clone()),
            platform.executor,
            events.clone(),
            config.join_offer_delay(),
        );

        let coordinator = Self {
            inner: Rc::new(CoordinatorInner {
                config,
                user,
                channel,
                media,
                registry,
                events,
                state: Cell::new(JoinState::Idle),
            }),
        };
        coordinator.wire();
        Ok(coordinator)
    }

    pub fn room_id(&self) -> &RoomId {
        &self.inner.config.room_id
    }

    pub fn local_user(&self) -> &LocalUser {
        &self.inner.user
    }

    pub fn join_state(&self) -> JoinState {
        self.inner.state.get()
    }

    pub fn channel(&self) -> &SignalingChannel {
        &self.inner.channel
    }

    pub fn media(&self) -> &MediaController {
        &self.inner.media
    }

    pub fn registry(&self) -> &PeerSessionRegistry {
        &self.inner.registry
    }

    pub fn media_state(&self) -> LocalMediaState {
        self.inner.media.state()
    }

    /// Connects to the relay, acquires local media, announces presence and
    /// asks for the current membership.
    ///
    /// Missing media is reported through [`RoomEvents::on_error`] and the
    /// join continues chat-only. An unreachable relay only shows up as
    /// connection state while the channel reconnects in the background.
    pub async fn join(&self) -> Result<(), ClientError> {
        match self.inner.state.get() {
            JoinState::Idle => self.inner.state.set(JoinState::Joining),
            JoinState::Left => {
                return Err(ClientError::InvalidStateForOperation("room already left"));
            }
            JoinState::Joining | JoinState::Joined => return Ok(()),
        }
        info!(
            "Joining room {} as {} ({})",
            self.room_id(),
            self.inner.user.username,
            self.inner.user.id
        );

        if let Err(e) = self.inner.channel.connect().await {
            warn!("Relay not reachable yet: {}", e);
        }
        if self.inner.state.get() == JoinState::Left {
            return Ok(());
        }

        if let Err(e) = self
            .inner
            .media
            .acquire_local_media(&self.inner.config.media)
            .await
        {
            warn!("Joining without local media: {}", e);
            self.inner.events.on_error(&e);
        }
        if self.inner.state.get() == JoinState::Left {
            return Ok(());
        }

        self.inner.state.set(JoinState::Joined);
        if self.inner.channel.is_connected() {
            self.announce();
        }
        Ok(())
    }

    /// Rejects blank text before anything reaches the transport. A message
    /// sent while disconnected is dropped.
    pub fn send_chat_message(&self, text: &str) -> Result<(), ClientError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        if self.inner.state.get() == JoinState::Left {
            return Err(ClientError::InvalidStateForOperation("room already left"));
        }

        let message = ChatMessage::new(
            self.room_id().clone(),
            self.inner.user.id.clone(),
            Some(self.inner.user.username.clone()),
            content.to_string(),
        );
        if self
            .inner
            .channel
            .send(&SignalingMessage::Chat(message.clone()))
        {
            self.inner.events.on_chat_message(&message);
        }
        Ok(())
    }

    /// Announces departure, releases media, closes every peer session and
    /// disconnects. Synchronous, best-effort and safe to call twice.
    pub fn leave_room(&self) {
        if self.inner.state.replace(JoinState::Left) == JoinState::Left {
            return;
        }
        info!("Leaving room {}", self.room_id());

        self.inner.channel.send(&SignalingMessage::Leave(Presence::new(
            self.room_id().clone(),
            self.inner.user.id.clone(),
            Some(self.inner.user.username.clone()),
        )));
        self.inner.media.release();
        self.inner.registry.close_all();
        self.inner.channel.disconnect();
    }

    pub fn connect_to(&self, peer_id: PeerId) -> bool {
        self.inner.registry.connect_to(peer_id)
    }

    pub fn toggle_video(&self) -> Result<bool, ClientError> {
        let enabled = self.inner.media.toggle_video()?;
        self.publish_media_state();
        Ok(enabled)
    }

    pub fn toggle_audio(&self) -> bool {
        let enabled = self.inner.media.toggle_audio();
        self.publish_media_state();
        enabled
    }

    pub async fn start_screen_share(&self) -> Result<(), ClientError> {
        self.inner.media.start_screen_share().await
    }

    pub fn stop_screen_share(&self) -> bool {
        self.inner.media.stop_screen_share()
    }

    pub async fn switch_devices(
        &self,
        video_device_id: Option<String>,
        audio_device_id: Option<String>,
    ) -> Result<(), ClientError> {
        self.inner
            .media
            .switch_devices(video_device_id, audio_device_id)
            .await
    }

    pub async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, ClientError> {
        self.inner.media.enumerate_devices().await
    }

    fn announce(&self) {
        let room_id = self.room_id().clone();
        let user_id = self.inner.user.id.clone();
        self.inner.channel.send(&SignalingMessage::Join(Presence::new(
            room_id.clone(),
            user_id.clone(),
            Some(self.inner.user.username.clone()),
        )));
        self.inner
            .channel
            .send(&SignalingMessage::StatusRequest(RoomStatusRequest::new(
                room_id, user_id,
            )));
    }

    fn publish_media_state(&self) {
        self.inner
            .events
            .on_local_media_changed(&self.inner.media.state());
    }

    fn wire(&self) {
        let channel = &self.inner.channel;
        let room_id = self.room_id().clone();

        let weak = self.downgrade();
        channel.subscribe(participants_topic(&room_id), move |body| {
            if let Some(this) = upgrade(&weak) {
                this.on_room_message(body);
            }
        });

        let weak = self.downgrade();
        channel.subscribe(USER_ROOM_STATUS_QUEUE, move |body| {
            if let Some(this) = upgrade(&weak) {
                this.on_room_message(body);
            }
        });

        let weak = self.downgrade();
        channel.subscribe(chat_topic(&room_id), move |body| {
            if let Some(this) = upgrade(&weak) {
                this.on_chat_message(body);
            }
        });

        let weak = self.downgrade();
        channel.subscribe(USER_SIGNALING_QUEUE, move |body| {
            if let Some(this) = upgrade(&weak) {
                this.on_peer_signal(body);
            }
        });

        let weak = self.downgrade();
        channel.set_on_connected(move || {
            let Some(this) = upgrade(&weak) else {
                return;
            };
            // Presence is re-announced after reconnects.
            if this.inner.state.get() == JoinState::Joined {
                this.announce();
            }
        });

        let weak = self.downgrade();
        channel.set_on_state_change(move |state| {
            if let Some(this) = upgrade(&weak) {
                this.inner.events.on_connection_state(state);
            }
        });

        let weak = self.downgrade();
        self.inner.media.set_listener(move |event| {
            let Some(this) = upgrade(&weak) else {
                return;
            };
            match event {
                MediaEvent::OutwardTracksChanged(tracks) => {
                    this.inner.registry.on_local_track_changed(tracks);
                    this.publish_media_state();
                }
                MediaEvent::ScreenShareEnded => this.inner.events.on_screen_share_ended(),
            }
        });
    }

    fn on_room_message(&self, body: &str) {
        let notification: RoomNotification = match serde_json::from_str(body) {
            Ok(notification) => notification,
            Err(e) => {
                warn!("Malformed room notification: {}", e);
                return;
            }
        };
        if let Some(count) = notification.participant_count() {
            self.inner.events.on_participant_count(count);
        }

        let registry = &self.inner.registry;
        match notification {
            RoomNotification::UserJoined {
                user_id, username, ..
            } => registry.on_participant_joined(user_id, username),
            RoomNotification::UserLeft { user_id, .. } => registry.on_participant_left(&user_id),
            RoomNotification::RoomStatus { participants, .. } => {
                registry.on_room_status_received(&participants)
            }
        }
    }

    fn on_chat_message(&self, body: &str) {
        let message: ChatMessage = match serde_json::from_str(body) {
            Ok(message) => message,
            Err(e) => {
                warn!("Malformed chat message: {}", e);
                return;
            }
        };
        if let Some(count) = message.participant_count {
            self.inner.events.on_participant_count(count);
        }
        // Own lines were shown when sent.
        if message.kind == ChatKind::Chat && message.user_id == self.inner.user.id {
            return;
        }
        self.inner.events.on_chat_message(&message);
    }

    fn on_peer_signal(&self, body: &str) {
        match serde_json::from_str::<PeerSignal>(body) {
            Ok(signal) => self.inner.registry.handle_signal(signal),
            Err(e) => warn!("Malformed peer signal: {}", e),
        }
    }

    fn downgrade(&self) -> Weak<CoordinatorInner> {
        Rc::downgrade(&self.inner)
    }
}

fn upgrade(weak: &Weak<CoordinatorInner>) -> Option<RoomCoordinator> {
    weak.upgrade().map(|inner| RoomCoordinator { inner })
}
