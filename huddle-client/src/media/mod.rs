mod controller;
mod device;

pub use controller::{LocalMediaState, MediaController, MediaEvent};
pub use device::{
    DeviceKind, LocalStream, LocalTrack, MediaConstraints, MediaDeviceInfo, MediaDevices,
    MediaTrack, TrackKind,
};
