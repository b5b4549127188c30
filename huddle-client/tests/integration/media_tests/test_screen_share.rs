use huddle_client::ClientError;
use huddle_client::media::{MediaConstraints, MediaController, MediaTrack};

use crate::integration::media_tests::MediaLog;
use crate::utils::{FakeMediaDevices, init_tracing};

#[tokio::test]
async fn test_screen_share_replaces_camera_video() {
    init_tracing();
    let devices = FakeMediaDevices::new();
    let media = MediaController::new(devices.clone());
    let log = MediaLog::attach(&media);

    media
        .acquire_local_media(&MediaConstraints::default())
        .await
        .expect("camera");
    assert_eq!(log.last_outward(), vec!["cam1-video", "cam1-audio"]);

    media.start_screen_share().await.expect("screen");
    assert_eq!(log.last_outward(), vec!["screen1-video", "cam1-audio"]);
    let state = media.state();
    assert!(state.screen_sharing);
    assert!(state.has_camera);
    assert_eq!(state.active_stream.as_deref(), Some("screen-1"));

    assert!(matches!(
        media.toggle_video(),
        Err(ClientError::InvalidStateForOperation(_))
    ));
    assert!(devices.track("cam1-video").enabled());

    // Already sharing: no second capture.
    media.start_screen_share().await.expect("screen");
    assert_eq!(devices.tracks().len(), 3);
    assert_eq!(log.outward.borrow().len(), 2);
}

#[tokio::test]
async fn test_platform_ending_capture_restores_camera() {
    init_tracing();
    let devices = FakeMediaDevices::new();
    let media = MediaController::new(devices.clone());
    let log = MediaLog::attach(&media);
    media
        .acquire_local_media(&MediaConstraints::default())
        .await
        .expect("camera");
    media.start_screen_share().await.expect("screen");

    devices.track("screen1-video").end_from_platform();

    assert_eq!(log.screen_share_ended.get(), 1);
    assert_eq!(log.last_outward(), vec!["cam1-video", "cam1-audio"]);
    assert!(!media.state().screen_sharing);
    assert_eq!(media.state().active_stream.as_deref(), Some("camera-1"));
    assert_eq!(media.toggle_video(), Ok(false));
}

#[tokio::test]
async fn test_stop_screen_share() {
    init_tracing();
    let devices = FakeMediaDevices::new();
    let media = MediaController::new(devices.clone());
    let log = MediaLog::attach(&media);
    media
        .acquire_local_media(&MediaConstraints::default())
        .await
        .expect("camera");

    assert!(!media.stop_screen_share());
    media.start_screen_share().await.expect("screen");
    assert!(media.stop_screen_share());

    let screen = devices.track("screen1-video");
    assert_eq!(screen.stop_count(), 1);
    assert!(!screen.is_live());
    assert_eq!(log.screen_share_ended.get(), 0);
    assert_eq!(log.last_outward(), vec!["cam1-video", "cam1-audio"]);
}
