mod channel;
mod signaling_output;
mod transport;

pub use channel::{ChannelState, SignalingChannel};
pub use signaling_output::SignalingOutput;
pub use transport::{PubSubTransport, TransportEvent, TransportEventSender};
