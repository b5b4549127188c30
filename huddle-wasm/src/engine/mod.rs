//! Browser implementations of the engine's platform seams.

use wasm_bindgen::{JsCast, JsValue};

mod create_pc_impl;
mod directory_impl;
mod executor_impl;
mod media_impl;
mod remote_streams_impl;
mod ws_transport_impl;

pub use create_pc_impl::{WebPeerConnection, WebPeerFactory};
pub use directory_impl::HttpRoomDirectory;
pub use executor_impl::WasmExecutor;
pub use media_impl::{WebMediaDevices, WebMediaTrack};
pub use remote_streams_impl::{RemoteStreams, StreamMap};
pub use ws_transport_impl::{StompTransport, resolve_ws_url};

/// Best-effort text for a rejected promise or thrown value.
pub(crate) fn js_error(value: &JsValue) -> String {
    if let Some(dom) = value.dyn_ref::<web_sys::DomException>() {
        return format!("{}: {}", dom.name(), dom.message());
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
