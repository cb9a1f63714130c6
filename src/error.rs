//! Canonical error and result types for the crate.
//!
//! Module-level error enums (`RingBufferError`, `DecodeError`,
//! `EncodeError`) stay close to the operations that produce them;
//! `StreamError` is the umbrella surface for binaries and embedders that
//! drive the whole stack.

use crate::decoder::DecodeError;
use crate::frame::EncodeError;
use crate::ring_buffer::RingBufferError;

/// Top-level error type exposed by `streammux`.
#[derive(Debug)]
pub enum StreamError {
    /// An error in the underlying transport (for example, a socket close).
    Io(std::io::Error),
    /// A circular buffer operation failed.
    Buffer(RingBufferError),
    /// A connection's byte stream violated the frame protocol.
    Decode(DecodeError),
    /// An outbound frame could not be assembled.
    Encode(EncodeError),
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(error) => write!(f, "transport error: {error}"),
            Self::Buffer(error) => write!(f, "buffer error: {error}"),
            Self::Decode(error) => write!(f, "decode error: {error}"),
            Self::Encode(error) => write!(f, "encode error: {error}"),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            Self::Buffer(error) => Some(error),
            Self::Decode(error) => Some(error),
            Self::Encode(error) => Some(error),
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(error: std::io::Error) -> Self { Self::Io(error) }
}

impl From<RingBufferError> for StreamError {
    fn from(error: RingBufferError) -> Self { Self::Buffer(error) }
}

impl From<DecodeError> for StreamError {
    fn from(error: DecodeError) -> Self { Self::Decode(error) }
}

impl From<EncodeError> for StreamError {
    fn from(error: EncodeError) -> Self { Self::Encode(error) }
}

/// Canonical result alias used by `streammux` public APIs.
pub type Result<T> = std::result::Result<T, StreamError>;
