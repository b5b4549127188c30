use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StompError {
    #[error("frame has no command line")]
    MissingCommand,

    #[error("unknown frame command: {0}")]
    UnknownCommand(String),

    #[error("malformed header line: {0}")]
    MalformedHeader(String),

    #[error("invalid escape sequence in header: {0}")]
    InvalidEscape(String),
}
