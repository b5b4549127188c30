use huddle_client::ChannelState;

use crate::integration::signaling_tests::create_channel;
use crate::utils::{FakeTransport, advance, init_tracing, run_local, settle};

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_liveness_check_forces_reconnect() {
    init_tracing();
    run_local(async {
        let transport = FakeTransport::new();
        let channel = create_channel(&transport);
        channel.subscribe("/topic/a", |_| {});
        channel.connect().await.expect("connect");

        transport.drop_silently();
        advance(9_000).await;
        assert_eq!(channel.state(), ChannelState::Connected);

        advance(1_500).await;
        assert_eq!(channel.state(), ChannelState::Disconnected);

        advance(5_000).await;
        assert_eq!(channel.state(), ChannelState::Connected);
        assert_eq!(transport.connect_attempts(), 2);
        assert_eq!(transport.subscription_count("/topic/a"), 2);
    })
    .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_close_frame_triggers_reconnect() {
    init_tracing();
    run_local(async {
        let transport = FakeTransport::new();
        let channel = create_channel(&transport);
        channel.connect().await.expect("connect");

        transport.close_remote("relay restarting");
        settle().await;
        assert_eq!(channel.state(), ChannelState::Disconnected);

        advance(5_500).await;
        assert_eq!(channel.state(), ChannelState::Connected);
        assert_eq!(transport.connect_attempts(), 2);
    })
    .await;
}
