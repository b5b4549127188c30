mod test_liveness_forces_reconnect;

use huddle_client::SignalingChannel;
use huddle_client::config::{DEFAULT_LIVENESS_INTERVAL_MS, DEFAULT_RECONNECT_INTERVAL_MS};
use huddle_client::runtime::TokioExecutor;
use std::rc::Rc;
use std::time::Duration;

use crate::utils::FakeTransport;

pub fn create_channel(transport: &FakeTransport) -> SignalingChannel {
    SignalingChannel::new(
        Rc::new(transport.clone()),
        Rc::new(TokioExecutor),
        Duration::from_millis(DEFAULT_RECONNECT_INTERVAL_MS),
        Duration::from_millis(DEFAULT_LIVENESS_INTERVAL_MS),
    )
}
