pub mod fake_media;
pub mod fake_peer;
pub mod fake_transport;

pub use fake_media::*;
pub use fake_peer::*;
pub use fake_transport::*;
pub use mock_signaling::*;
pub use recording_events::*;
pub use test_room::*;

use std::future::Future;
use std::time::Duration;
use tokio::task::LocalSet;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Runs a test body on a `LocalSet` so the engine can spawn local tasks.
pub async fn run_local<F: Future>(body: F) -> F::Output {
    LocalSet::new().run_until(body).await
}

/// Lets every runnable task finish. With paused time the sleep only
/// completes once the runtime is idle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Advances paused time by `ms`, then settles.
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    settle().await;
}
