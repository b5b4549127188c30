use async_trait::async_trait;
use huddle_client::MediaError;
use huddle_client::media::{
    DeviceKind, LocalStream, LocalTrack, MediaConstraints, MediaDeviceInfo, MediaDevices,
    MediaTrack, TrackKind,
};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    ConstrainDomStringParameters, DisplayMediaStreamConstraints, DomException, MediaDeviceKind,
    MediaStream, MediaStreamConstraints, MediaStreamTrack, MediaStreamTrackState,
    MediaTrackConstraints,
};

use crate::engine::js_error;

/// A `MediaStreamTrack` together with the stream it was captured in, which
/// `addTrack` needs for stream association on the remote side.
pub struct WebMediaTrack {
    track: MediaStreamTrack,
    stream: MediaStream,
    kind: TrackKind,
    onended: RefCell<Option<Closure<dyn FnMut(JsValue)>>>,
}

impl WebMediaTrack {
    fn new(track: MediaStreamTrack, stream: MediaStream) -> Option<Rc<Self>> {
        let kind = match track.kind().as_str() {
            "audio" => TrackKind::Audio,
            "video" => TrackKind::Video,
            _ => return None,
        };
        Some(Rc::new(Self {
            track,
            stream,
            kind,
            onended: RefCell::new(None),
        }))
    }

    pub fn track(&self) -> &MediaStreamTrack {
        &self.track
    }

    pub fn stream(&self) -> &MediaStream {
        &self.stream
    }

    pub fn from_local(track: &LocalTrack) -> Option<&WebMediaTrack> {
        track.as_any().downcast_ref::<WebMediaTrack>()
    }
}

impl MediaTrack for WebMediaTrack {
    fn id(&self) -> String {
        self.track.id()
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn enabled(&self) -> bool {
        self.track.enabled()
    }

    fn set_enabled(&self, enabled: bool) {
        self.track.set_enabled(enabled);
    }

    fn is_live(&self) -> bool {
        self.track.ready_state() == MediaStreamTrackState::Live
    }

    fn stop(&self) {
        self.track.stop();
    }

    fn on_ended(&self, callback: Box<dyn FnOnce()>) {
        let mut callback = Some(callback);
        let closure = Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |_| {
            if let Some(callback) = callback.take() {
                callback();
            }
        }));
        self.track
            .set_onended(Some(closure.as_ref().unchecked_ref()));
        *self.onended.borrow_mut() = Some(closure);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for WebMediaTrack {
    fn drop(&mut self) {
        if self.onended.borrow().is_some() {
            self.track.set_onended(None);
        }
    }
}

/// `navigator.mediaDevices`.
pub struct WebMediaDevices {
    devices: web_sys::MediaDevices,
}

impl WebMediaDevices {
    pub fn new() -> Result<Self, MediaError> {
        let window =
            web_sys::window().ok_or_else(|| MediaError::Other("no window object".into()))?;
        let devices = window
            .navigator()
            .media_devices()
            .map_err(|e| MediaError::Other(js_error(&e)))?;
        Ok(Self { devices })
    }
}

#[async_trait(?Send)]
impl MediaDevices for WebMediaDevices {
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<LocalStream, MediaError> {
        let request = MediaStreamConstraints::new();
        request.set_video(&track_constraint(
            constraints.video,
            constraints.video_device_id.as_deref(),
        ));
        request.set_audio(&track_constraint(
            constraints.audio,
            constraints.audio_device_id.as_deref(),
        ));

        let promise = self
            .devices
            .get_user_media_with_constraints(&request)
            .map_err(media_error)?;
        let stream = JsFuture::from(promise).await.map_err(media_error)?;
        to_local_stream(stream)
    }

    async fn get_display_media(&self) -> Result<LocalStream, MediaError> {
        let request = DisplayMediaStreamConstraints::new();
        request.set_video(&JsValue::TRUE);
        request.set_audio(&JsValue::FALSE);

        let promise = self
            .devices
            .get_display_media_with_constraints(&request)
            .map_err(media_error)?;
        let stream = JsFuture::from(promise).await.map_err(media_error)?;
        to_local_stream(stream)
    }

    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, MediaError> {
        let promise = self.devices.enumerate_devices().map_err(media_error)?;
        let list = JsFuture::from(promise).await.map_err(media_error)?;

        let mut devices = Vec::new();
        for value in js_sys::Array::from(&list).iter() {
            let Ok(info) = value.dyn_into::<web_sys::MediaDeviceInfo>() else {
                continue;
            };
            let kind = match info.kind() {
                MediaDeviceKind::Videoinput => DeviceKind::VideoInput,
                MediaDeviceKind::Audioinput => DeviceKind::AudioInput,
                MediaDeviceKind::Audiooutput => DeviceKind::AudioOutput,
                _ => continue,
            };
            devices.push(MediaDeviceInfo {
                device_id: info.device_id(),
                kind,
                label: info.label(),
            });
        }
        Ok(devices)
    }
}

fn track_constraint(wanted: bool, device_id: Option<&str>) -> JsValue {
    match (wanted, device_id) {
        (false, _) => JsValue::FALSE,
        (true, None) => JsValue::TRUE,
        (true, Some(id)) => {
            let exact = ConstrainDomStringParameters::new();
            exact.set_exact(&JsValue::from_str(id));
            let track = MediaTrackConstraints::new();
            track.set_device_id(&exact);
            track.into()
        }
    }
}

fn to_local_stream(value: JsValue) -> Result<LocalStream, MediaError> {
    let stream: MediaStream = value
        .dyn_into()
        .map_err(|_| MediaError::Other("capture did not return a MediaStream".into()))?;

    let mut tracks: Vec<LocalTrack> = Vec::new();
    for value in stream.get_tracks().iter() {
        let Ok(track) = value.dyn_into::<MediaStreamTrack>() else {
            continue;
        };
        if let Some(track) = WebMediaTrack::new(track, stream.clone()) {
            tracks.push(track);
        }
    }
    Ok(LocalStream::new(stream.id(), tracks))
}

fn media_error(value: JsValue) -> MediaError {
    match value.dyn_ref::<DomException>() {
        Some(dom) => MediaError::from_dom_exception(&dom.name(), &dom.message()),
        None => MediaError::Other(js_error(&value)),
    }
}
