use crate::error::TransportError;
use async_trait::async_trait;
use futures::channel::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A frame delivered on a subscribed destination.
    Message { destination: String, body: String },
    /// The transport dropped the connection.
    Closed { reason: String },
}

pub type TransportEventSender = mpsc::UnboundedSender<TransportEvent>;

/// Publish/subscribe relay connection (STOMP over WebSocket in the browser).
///
/// Inbound traffic for the lifetime of one connection goes to the sender
/// passed to [`PubSubTransport::connect`].
#[async_trait(?Send)]
pub trait PubSubTransport {
    /// Resolves once the relay handshake completes.
    async fn connect(&self, events: TransportEventSender) -> Result<(), TransportError>;

    fn subscribe(&self, destination: &str) -> Result<(), TransportError>;

    fn send(&self, destination: &str, body: &str) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;

    fn disconnect(&self);
}
