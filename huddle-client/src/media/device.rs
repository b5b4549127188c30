use crate::error::MediaError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// A captured local track owned by the [`MediaController`](super::MediaController).
pub trait MediaTrack {
    fn id(&self) -> String;

    fn kind(&self) -> TrackKind;

    fn enabled(&self) -> bool;

    fn set_enabled(&self, enabled: bool);

    /// `false` once the track has been stopped or ended by the platform.
    fn is_live(&self) -> bool;

    fn stop(&self);

    /// Invoked once when the platform ends the track (e.g. the user revokes
    /// screen capture from the browser UI). Not invoked by [`MediaTrack::stop`].
    fn on_ended(&self, callback: Box<dyn FnOnce()>);

    fn as_any(&self) -> &dyn Any;
}

pub type LocalTrack = Rc<dyn MediaTrack>;

#[derive(Clone)]
pub struct LocalStream {
    id: String,
    tracks: Vec<LocalTrack>,
}

impl LocalStream {
    pub fn new(id: impl Into<String>, tracks: Vec<LocalTrack>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = LocalTrack> + '_ {
        self.tracks_of(TrackKind::Video)
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = LocalTrack> + '_ {
        self.tracks_of(TrackKind::Audio)
    }

    fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = LocalTrack> + '_ {
        self.tracks
            .iter()
            .filter(move |t| t.kind() == kind)
            .cloned()
    }

    pub fn has_track(&self, id: &str) -> bool {
        self.tracks.iter().any(|t| t.id() == id)
    }

    /// Stops every live track.
    pub fn stop(&self) {
        for track in &self.tracks {
            if track.is_live() {
                track.stop();
            }
        }
    }
}

impl fmt::Debug for LocalStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tracks: Vec<String> = self.tracks.iter().map(|t| t.id()).collect();
        f.debug_struct("LocalStream")
            .field("id", &self.id)
            .field("tracks", &tracks)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
    pub video_device_id: Option<String>,
    pub audio_device_id: Option<String>,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
            video_device_id: None,
            audio_device_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDeviceInfo {
    pub device_id: String,
    pub kind: DeviceKind,
    pub label: String,
}

#[async_trait(?Send)]
pub trait MediaDevices {
    async fn get_user_media(&self, constraints: &MediaConstraints)
    -> Result<LocalStream, MediaError>;

    async fn get_display_media(&self) -> Result<LocalStream, MediaError>;

    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, MediaError>;
}
