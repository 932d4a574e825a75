//! XAX protocol errors.

#[derive(Debug, thiserror::Error)]
pub enum XaxError {
    #[error("malformed XAX frame: unknown message type tag {0}")]
    UnknownMessageType(u8),
    #[error("malformed XAX frame: expected {expected} bytes, got {got}")]
    WrongFrameLength { expected: usize, got: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
