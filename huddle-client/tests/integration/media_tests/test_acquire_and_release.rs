use huddle_client::media::{DeviceKind, MediaConstraints, MediaController};
use huddle_client::{ClientError, MediaError};

use crate::integration::media_tests::MediaLog;
use crate::utils::{FakeMediaDevices, init_tracing};

#[tokio::test]
async fn test_failed_acquisition_leaves_state_untouched() {
    init_tracing();
    let devices = FakeMediaDevices::new();
    let media = MediaController::new(devices.clone());
    let log = MediaLog::attach(&media);
    devices.fail_user_media(MediaError::PermissionDenied);

    let result = media
        .acquire_local_media(&MediaConstraints::default())
        .await;

    assert_eq!(result, Err(ClientError::Media(MediaError::PermissionDenied)));
    let state = media.state();
    assert!(!state.has_camera);
    assert_eq!(state.active_stream, None);
    assert!(media.outward_tracks().is_empty());
    assert!(log.outward.borrow().is_empty());
}

#[tokio::test]
async fn test_audio_only_capture() {
    init_tracing();
    let devices = FakeMediaDevices::new();
    let media = MediaController::new(devices.clone());
    let constraints = MediaConstraints {
        video: false,
        ..MediaConstraints::default()
    };

    media.acquire_local_media(&constraints).await.expect("mic");

    assert_eq!(media.outward_tracks().len(), 1);
    assert_eq!(media.toggle_video(), Ok(true));
}

#[tokio::test]
async fn test_release_stops_every_track_once() {
    init_tracing();
    let devices = FakeMediaDevices::new();
    let media = MediaController::new(devices.clone());
    media
        .acquire_local_media(&MediaConstraints::default())
        .await
        .expect("camera");
    media.start_screen_share().await.expect("screen");

    media.release();
    media.release();

    assert_eq!(devices.tracks().len(), 3);
    for track in devices.tracks() {
        assert_eq!(track.stop_count(), 1);
    }
    assert!(media.outward_tracks().is_empty());
    assert!(matches!(
        media
            .acquire_local_media(&MediaConstraints::default())
            .await,
        Err(ClientError::InvalidStateForOperation(_))
    ));
}

#[tokio::test]
async fn test_enumerate_devices() {
    let devices = FakeMediaDevices::new();
    let media = MediaController::new(devices);

    let found = media.enumerate_devices().await.expect("devices");

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].kind, DeviceKind::VideoInput);
}
