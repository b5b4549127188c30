use huddle_client::room::JoinState;
use huddle_client::{ChannelState, ClientError, MediaError};
use huddle_core::destinations::{
    CHAT_SEND, ROOM_JOIN, ROOM_STATUS, USER_ROOM_STATUS_QUEUE, USER_SIGNALING_QUEUE,
};

use crate::integration::room_tests::{chat, participants};
use crate::utils::{
    FakeTransport, UiEvent, advance, create_test_room, create_test_room_with, init_tracing,
    run_local, settle, test_config,
};

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_join_subscribes_and_announces() {
    init_tracing();
    run_local(async {
        let room = create_test_room("me");
        room.coordinator.join().await.expect("join");
        settle().await;

        let mut subscriptions = room.transport.subscriptions();
        subscriptions.sort();
        let mut expected = vec![
            participants(),
            chat(),
            USER_SIGNALING_QUEUE.to_string(),
            USER_ROOM_STATUS_QUEUE.to_string(),
        ];
        expected.sort();
        assert_eq!(subscriptions, expected);

        let joins = room.transport.sent_to(ROOM_JOIN);
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0]["roomId"], "room-1");
        assert_eq!(joins[0]["userId"], "me");
        assert_eq!(joins[0]["username"], "me-name");
        let status = room.transport.sent_to(ROOM_STATUS);
        assert_eq!(status.len(), 1);
        assert_eq!(status[0]["userId"], "me");

        assert_eq!(room.coordinator.join_state(), JoinState::Joined);
        assert!(
            room.events
                .events()
                .contains(&UiEvent::Connection(ChannelState::Connected))
        );
        let media = room.events.last_media().expect("media state");
        assert!(media.has_camera);
        assert_eq!(media.active_stream.as_deref(), Some("camera-1"));

        // Joining again changes nothing.
        room.coordinator.join().await.expect("join");
        assert_eq!(room.transport.sent_to(ROOM_JOIN).len(), 1);
        assert_eq!(room.transport.connect_attempts(), 1);
    })
    .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_join_without_media_still_announces() {
    init_tracing();
    run_local(async {
        let room = create_test_room("me");
        room.devices.fail_user_media(MediaError::PermissionDenied);

        room.coordinator.join().await.expect("join");

        assert_eq!(
            room.events.errors(),
            vec![ClientError::Media(MediaError::PermissionDenied)]
        );
        assert_eq!(room.transport.sent_to(ROOM_JOIN).len(), 1);
        assert!(!room.coordinator.media_state().has_camera);

        // Chat works without media.
        room.coordinator.send_chat_message("text only").expect("chat");
        assert_eq!(room.transport.sent_to(CHAT_SEND).len(), 1);
    })
    .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_presence_announced_once_relay_is_reachable() {
    init_tracing();
    run_local(async {
        let room = create_test_room_with(test_config("me"), FakeTransport::failing(1));

        room.coordinator.join().await.expect("join");
        assert!(room.events.errors().is_empty());
        assert_eq!(
            room.events
                .count(|e| *e == UiEvent::Connection(ChannelState::Disconnected)),
            1
        );
        assert!(room.transport.sent().is_empty());

        advance(5_500).await;
        assert!(room.events.errors().is_empty());
        assert_eq!(
            room.events.events().last(),
            Some(&UiEvent::Connection(ChannelState::Connected))
        );
        assert_eq!(room.transport.sent_to(ROOM_JOIN).len(), 1);
        assert_eq!(room.transport.sent_to(ROOM_STATUS).len(), 1);
        assert_eq!(room.transport.subscriptions().len(), 4);
    })
    .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_presence_reannounced_after_reconnect() {
    init_tracing();
    run_local(async {
        let room = create_test_room("me");
        room.coordinator.join().await.expect("join");
        room.transport.clear_sent();

        room.transport.drop_silently();
        advance(10_500).await;
        assert_eq!(
            room.coordinator.channel().state(),
            ChannelState::Disconnected
        );
        advance(5_000).await;

        assert_eq!(room.coordinator.channel().state(), ChannelState::Connected);
        assert_eq!(room.transport.sent_to(ROOM_JOIN).len(), 1);
        assert_eq!(room.transport.sent_to(ROOM_STATUS).len(), 1);
    })
    .await;
}
