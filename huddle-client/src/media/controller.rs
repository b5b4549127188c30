use crate::error::ClientError;
use crate::media::device::{LocalStream, LocalTrack, MediaConstraints, MediaDeviceInfo, MediaDevices};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalMediaState {
    pub video_enabled: bool,
    pub audio_enabled: bool,
    pub screen_sharing: bool,
    pub has_camera: bool,
    /// Id of the stream currently shown to peers.
    pub active_stream: Option<String>,
}

pub enum MediaEvent {
    /// The set of tracks peers should receive changed.
    OutwardTracksChanged(Vec<LocalTrack>),
    /// The platform ended the screen capture.
    ScreenShareEnded,
}

type MediaListener = Rc<dyn Fn(MediaEvent)>;

struct MediaInner {
    camera: Option<LocalStream>,
    screen: Option<LocalStream>,
    video_enabled: bool,
    audio_enabled: bool,
    released: bool,
    listener: Option<MediaListener>,
}

struct MediaShared {
    devices: Rc<dyn MediaDevices>,
    inner: RefCell<MediaInner>,
}

/// Owns every locally captured stream. Nothing else stops local tracks.
#[derive(Clone)]
pub struct MediaController {
    shared: Rc<MediaShared>,
}

impl MediaController {
    pub fn new(devices: Rc<dyn MediaDevices>) -> Self {
        Self {
            shared: Rc::new(MediaShared {
                devices,
                inner: RefCell::new(MediaInner {
                    camera: None,
                    screen: None,
                    video_enabled: true,
                    audio_enabled: true,
                    released: false,
                    listener: None,
                }),
            }),
        }
    }

    pub fn set_listener(&self, listener: impl Fn(MediaEvent) + 'static) {
        self.shared.inner.borrow_mut().listener = Some(Rc::new(listener));
    }

    pub fn state(&self) -> LocalMediaState {
        let inner = self.shared.inner.borrow();
        let active = inner.screen.as_ref().or(inner.camera.as_ref());
        LocalMediaState {
            video_enabled: inner.video_enabled,
            audio_enabled: inner.audio_enabled,
            screen_sharing: inner.screen.is_some(),
            has_camera: inner.camera.is_some(),
            active_stream: active.map(|s| s.id().to_string()),
        }
    }

    pub fn camera_stream(&self) -> Option<LocalStream> {
        self.shared.inner.borrow().camera.clone()
    }

    /// The stream shown locally: the screen capture while sharing, else the camera.
    pub fn active_stream(&self) -> Option<LocalStream> {
        let inner = self.shared.inner.borrow();
        inner.screen.clone().or_else(|| inner.camera.clone())
    }

    /// Tracks peers should receive. While sharing, the screen replaces the
    /// camera video but the microphone keeps flowing.
    pub fn outward_tracks(&self) -> Vec<LocalTrack> {
        let inner = self.shared.inner.borrow();
        let mut tracks: Vec<LocalTrack> = match (&inner.screen, &inner.camera) {
            (Some(screen), camera) => screen
                .video_tracks()
                .chain(camera.iter().flat_map(|c| c.audio_tracks()))
                .collect(),
            (None, Some(camera)) => camera.tracks().to_vec(),
            (None, None) => Vec::new(),
        };
        tracks.retain(|t| t.is_live());
        tracks
    }

    /// Acquires camera and microphone. On failure the current streams are
    /// left untouched. A successful acquisition replaces (and stops) the
    /// previous camera stream.
    pub async fn acquire_local_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<(), ClientError> {
        if self.shared.inner.borrow().released {
            return Err(ClientError::InvalidStateForOperation(
                "local media has been released",
            ));
        }

        let stream = match self.shared.devices.get_user_media(constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Local media acquisition failed: {}", e);
                return Err(e.into());
            }
        };

        let previous = {
            let mut inner = self.shared.inner.borrow_mut();
            if inner.released {
                None
            } else {
                for track in stream.video_tracks() {
                    track.set_enabled(inner.video_enabled);
                }
                for track in stream.audio_tracks() {
                    track.set_enabled(inner.audio_enabled);
                }
                Some(inner.camera.replace(stream.clone()))
            }
        };

        let Some(previous) = previous else {
            stream.stop();
            return Err(ClientError::InvalidStateForOperation(
                "local media has been released",
            ));
        };

        if let Some(previous) = previous {
            for track in previous.tracks() {
                if !stream.has_track(&track.id()) && track.is_live() {
                    track.stop();
                }
            }
        }

        info!(
            "Local media acquired: stream {} with {} tracks",
            stream.id(),
            stream.tracks().len()
        );
        self.emit(MediaEvent::OutwardTracksChanged(self.outward_tracks()));
        Ok(())
    }

    /// Re-acquires capture from specific devices.
    pub async fn switch_devices(
        &self,
        video_device_id: Option<String>,
        audio_device_id: Option<String>,
    ) -> Result<(), ClientError> {
        let constraints = MediaConstraints {
            video: true,
            audio: true,
            video_device_id,
            audio_device_id,
        };
        self.acquire_local_media(&constraints).await
    }

    pub async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, ClientError> {
        Ok(self.shared.devices.enumerate_devices().await?)
    }

    /// Flips camera video and returns the new state. Rejected while sharing.
    pub fn toggle_video(&self) -> Result<bool, ClientError> {
        let mut inner = self.shared.inner.borrow_mut();
        if inner.screen.is_some() {
            return Err(ClientError::InvalidStateForOperation(
                "camera video cannot be toggled while screen sharing",
            ));
        }
        let tracks: Vec<LocalTrack> = match &inner.camera {
            Some(camera) => camera.video_tracks().collect(),
            None => Vec::new(),
        };
        if tracks.is_empty() {
            return Ok(inner.video_enabled);
        }

        let enabled = !inner.video_enabled;
        inner.video_enabled = enabled;
        drop(inner);

        for track in tracks {
            track.set_enabled(enabled);
        }
        info!("Video {}", if enabled { "enabled" } else { "disabled" });
        Ok(enabled)
    }

    /// Flips the microphone and returns the new state.
    pub fn toggle_audio(&self) -> bool {
        let mut inner = self.shared.inner.borrow_mut();
        let tracks: Vec<LocalTrack> = match &inner.camera {
            Some(camera) => camera.audio_tracks().collect(),
            None => Vec::new(),
        };
        if tracks.is_empty() {
            return inner.audio_enabled;
        }

        let enabled = !inner.audio_enabled;
        inner.audio_enabled = enabled;
        drop(inner);

        for track in tracks {
            track.set_enabled(enabled);
        }
        info!("Audio {}", if enabled { "enabled" } else { "disabled" });
        enabled
    }

    /// Starts display capture. The camera stream is kept for restoring.
    pub async fn start_screen_share(&self) -> Result<(), ClientError> {
        {
            let inner = self.shared.inner.borrow();
            if inner.released {
                return Err(ClientError::InvalidStateForOperation(
                    "local media has been released",
                ));
            }
            if inner.screen.is_some() {
                return Ok(());
            }
        }

        let stream = match self.shared.devices.get_display_media().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Screen capture failed: {}", e);
                return Err(e.into());
            }
        };

        let accepted = {
            let mut inner = self.shared.inner.borrow_mut();
            if inner.released || inner.screen.is_some() {
                false
            } else {
                inner.screen = Some(stream.clone());
                true
            }
        };
        if !accepted {
            stream.stop();
            return Ok(());
        }

        let weak: Weak<MediaShared> = Rc::downgrade(&self.shared);
        for track in stream.video_tracks() {
            let weak = weak.clone();
            let stream_id = stream.id().to_string();
            track.on_ended(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    MediaController { shared }.screen_capture_ended(&stream_id);
                }
            }));
        }

        info!("Screen share started: stream {}", stream.id());
        self.emit(MediaEvent::OutwardTracksChanged(self.outward_tracks()));
        Ok(())
    }

    /// Stops display capture and restores the camera. Returns `false` if
    /// nothing was being shared.
    pub fn stop_screen_share(&self) -> bool {
        let screen = self.shared.inner.borrow_mut().screen.take();
        let Some(screen) = screen else {
            return false;
        };
        screen.stop();

        info!("Screen share stopped");
        self.emit(MediaEvent::OutwardTracksChanged(self.outward_tracks()));
        true
    }

    fn screen_capture_ended(&self, stream_id: &str) {
        let current = self
            .shared
            .inner
            .borrow()
            .screen
            .as_ref()
            .is_some_and(|s| s.id() == stream_id);
        if !current {
            return;
        }
        info!("Screen capture ended by the platform");
        if self.stop_screen_share() {
            self.emit(MediaEvent::ScreenShareEnded);
        }
    }

    /// Stops every owned track. Safe to call more than once.
    pub fn release(&self) {
        let (camera, screen) = {
            let mut inner = self.shared.inner.borrow_mut();
            if inner.released {
                return;
            }
            inner.released = true;
            (inner.camera.take(), inner.screen.take())
        };
        for stream in camera.iter().chain(screen.iter()) {
            stream.stop();
        }
        info!("Local media released");
    }

    fn emit(&self, event: MediaEvent) {
        let listener = self.shared.inner.borrow().listener.clone();
        if let Some(listener) = listener {
            listener(event);
        }
    }
}
