//! Native peer connections on top of the `webrtc` crate, for running the
//! engine outside the browser (bots, recorders, tests against a real stack).

mod connection_wrapper;

pub use connection_wrapper::{WebrtcPeerConnection, WebrtcPeerFactory};
