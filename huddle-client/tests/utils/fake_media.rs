use async_trait::async_trait;
use huddle_client::MediaError;
use huddle_client::media::{
    DeviceKind, LocalStream, LocalTrack, MediaConstraints, MediaDeviceInfo, MediaDevices,
    MediaTrack, TrackKind,
};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub struct FakeTrack {
    id: String,
    kind: TrackKind,
    enabled: Cell<bool>,
    live: Cell<bool>,
    stops: Cell<usize>,
    ended: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl FakeTrack {
    pub fn new(id: &str, kind: TrackKind) -> Rc<Self> {
        Rc::new(Self {
            id: id.to_string(),
            kind,
            enabled: Cell::new(true),
            live: Cell::new(true),
            stops: Cell::new(0),
            ended: RefCell::new(None),
        })
    }

    pub fn stop_count(&self) -> usize {
        self.stops.get()
    }

    /// The platform ends the track, e.g. the user clicks "Stop sharing".
    pub fn end_from_platform(&self) {
        self.live.set(false);
        let callback = self.ended.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn enabled(&self) -> bool {
        self.enabled.get()
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    fn is_live(&self) -> bool {
        self.live.get()
    }

    fn stop(&self) {
        self.live.set(false);
        self.stops.set(self.stops.get() + 1);
    }

    fn on_ended(&self, callback: Box<dyn FnOnce()>) {
        *self.ended.borrow_mut() = Some(callback);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Camera, microphone and screen capture that always succeed unless told
/// otherwise. Every capture yields fresh tracks named after the capture
/// number: `cam1-video`, `cam1-audio`, `screen1-video`.
#[derive(Default)]
pub struct FakeMediaDevices {
    user_media_error: RefCell<Option<MediaError>>,
    display_media_error: RefCell<Option<MediaError>>,
    captures: Cell<usize>,
    screens: Cell<usize>,
    tracks: RefCell<Vec<Rc<FakeTrack>>>,
    requested: RefCell<Vec<MediaConstraints>>,
}

impl FakeMediaDevices {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn fail_user_media(&self, error: MediaError) {
        *self.user_media_error.borrow_mut() = Some(error);
    }

    pub fn fail_display_media(&self, error: MediaError) {
        *self.display_media_error.borrow_mut() = Some(error);
    }

    pub fn track(&self, id: &str) -> Rc<FakeTrack> {
        self.tracks
            .borrow()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .unwrap_or_else(|| panic!("no track {}", id))
    }

    pub fn tracks(&self) -> Vec<Rc<FakeTrack>> {
        self.tracks.borrow().clone()
    }

    pub fn requested(&self) -> Vec<MediaConstraints> {
        self.requested.borrow().clone()
    }

    fn issue(&self, id: String, kind: TrackKind) -> LocalTrack {
        let track = FakeTrack::new(&id, kind);
        self.tracks.borrow_mut().push(track.clone());
        track
    }
}

#[async_trait(?Send)]
impl MediaDevices for FakeMediaDevices {
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<LocalStream, MediaError> {
        self.requested.borrow_mut().push(constraints.clone());
        if let Some(error) = self.user_media_error.borrow().clone() {
            return Err(error);
        }
        let n = self.captures.get() + 1;
        self.captures.set(n);

        let mut tracks = Vec::new();
        if constraints.video {
            tracks.push(self.issue(format!("cam{}-video", n), TrackKind::Video));
        }
        if constraints.audio {
            tracks.push(self.issue(format!("cam{}-audio", n), TrackKind::Audio));
        }
        Ok(LocalStream::new(format!("camera-{}", n), tracks))
    }

    async fn get_display_media(&self) -> Result<LocalStream, MediaError> {
        if let Some(error) = self.display_media_error.borrow().clone() {
            return Err(error);
        }
        let n = self.screens.get() + 1;
        self.screens.set(n);
        let track = self.issue(format!("screen{}-video", n), TrackKind::Video);
        Ok(LocalStream::new(format!("screen-{}", n), vec![track]))
    }

    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, MediaError> {
        Ok(vec![
            MediaDeviceInfo {
                device_id: "cam-front".into(),
                kind: DeviceKind::VideoInput,
                label: "Front Camera".into(),
            },
            MediaDeviceInfo {
                device_id: "mic-builtin".into(),
                kind: DeviceKind::AudioInput,
                label: "Built-in Microphone".into(),
            },
        ])
    }
}
