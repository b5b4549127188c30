use huddle_client::media::{MediaConstraints, MediaController, MediaTrack};

use crate::utils::{FakeMediaDevices, init_tracing};

#[tokio::test]
async fn test_toggle_twice_restores() {
    init_tracing();
    let devices = FakeMediaDevices::new();
    let media = MediaController::new(devices.clone());

    // Nothing captured yet: toggles report the current state.
    assert_eq!(media.toggle_video(), Ok(true));
    assert!(media.toggle_audio());

    media
        .acquire_local_media(&MediaConstraints::default())
        .await
        .expect("camera");
    let video = devices.track("cam1-video");
    let audio = devices.track("cam1-audio");

    assert_eq!(media.toggle_video(), Ok(false));
    assert!(!video.enabled());
    assert!(!media.state().video_enabled);
    assert_eq!(media.toggle_video(), Ok(true));
    assert!(video.enabled());
    assert!(media.state().video_enabled);

    assert!(!media.toggle_audio());
    assert!(!audio.enabled());
    assert!(media.toggle_audio());
    assert!(audio.enabled());
}

#[tokio::test]
async fn test_switched_devices_keep_mute_state() {
    init_tracing();
    let devices = FakeMediaDevices::new();
    let media = MediaController::new(devices.clone());
    media
        .acquire_local_media(&MediaConstraints::default())
        .await
        .expect("camera");
    assert!(!media.toggle_audio());

    media
        .switch_devices(Some("cam-front".into()), None)
        .await
        .expect("switch");

    assert!(!devices.track("cam2-audio").enabled());
    assert!(devices.track("cam2-video").enabled());
    assert_eq!(devices.track("cam1-video").stop_count(), 1);
    assert_eq!(devices.track("cam1-audio").stop_count(), 1);
    assert_eq!(
        devices.requested()[1].video_device_id.as_deref(),
        Some("cam-front")
    );
    assert_eq!(media.state().active_stream.as_deref(), Some("camera-2"));
}
