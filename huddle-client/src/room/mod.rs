mod coordinator;
mod events;

pub use coordinator::{JoinState, LocalUser, Platform, RoomCoordinator};
pub use events::{NoopEvents, RoomEvents};
