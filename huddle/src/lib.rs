pub use huddle_core::model::{PeerId, RoomId};

pub mod model {
    pub use huddle_core::model::*;
}

pub mod protocol {
    pub use huddle_core::destinations;
    pub use huddle_core::stomp;
}

#[cfg(feature = "client")]
pub mod client {
    pub use huddle_client::*;
}

#[cfg(feature = "wasm")]
pub mod wasm {
    pub use huddle_wasm::*;
}
