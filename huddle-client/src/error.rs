use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("relay unreachable: {0}")]
    Unreachable(String),

    #[error("signaling channel is not connected")]
    NotConnected,

    #[error("signaling channel was closed")]
    Closed,

    #[error("relay protocol error: {0}")]
    Protocol(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("permission to capture media was denied")]
    PermissionDenied,

    #[error("no capture device matches the request: {0}")]
    DeviceNotFound(String),

    #[error("capture device is unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("media capture failed: {0}")]
    Other(String),
}

impl MediaError {
    /// Maps a browser `DOMException` name onto the capture error taxonomy.
    pub fn from_dom_exception(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "SecurityError" | "PermissionDeniedError" => {
                MediaError::PermissionDenied
            }
            "NotFoundError" | "OverconstrainedError" | "DevicesNotFoundError" => {
                MediaError::DeviceNotFound(message.to_string())
            }
            "NotReadableError" | "AbortError" | "TrackStartError" => {
                MediaError::DeviceUnavailable(message.to_string())
            }
            _ => MediaError::Other(format!("{}: {}", name, message)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    #[error("failed to create peer connection: {0}")]
    CreateConnection(String),

    #[error("failed to create session description: {0}")]
    CreateDescription(String),

    #[error("failed to apply session description: {0}")]
    ApplyDescription(String),

    #[error("failed to add ICE candidate: {0}")]
    AddCandidate(String),

    #[error("failed to attach track: {0}")]
    Track(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("invalid invite code: {0}")]
    InvalidInviteCode(String),

    #[error("room not found: {0}")]
    NotFound(String),

    #[error("directory request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("invalid state for operation: {0}")]
    InvalidStateForOperation(&'static str),

    #[error("negotiation failure: {0}")]
    NegotiationFailure(#[from] NegotiationError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("chat message is empty")]
    EmptyMessage,

    #[error("invalid configuration: {0}")]
    Config(String),
}
