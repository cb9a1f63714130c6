//! Public API for the `streammux` library.
//!
//! This crate multiplexes many concurrent byte-stream connections (raw TCP
//! and WebSocket) into a single queue of decoded, length-framed messages
//! tagged by connection identity. Applications poll the queue with
//! [`SessionRegistry::recv`] and reply through [`SessionRegistry::send`];
//! the listeners in [`server`] own all of the socket I/O.

pub mod byte_order;
pub mod config;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod message;
pub mod metrics;
pub mod ring_buffer;
pub mod server;
pub mod session;

pub use decoder::{DecodeError, DecoderLimits, StreamDecoder};
pub use error::{Result, StreamError};
pub use frame::{FrameEncoder, FrameHeader, HEADER_SIZE, MAX_BODY_SIZE};
pub use message::{Message, MessageKind};
pub use ring_buffer::{RingBuffer, RingBufferError};
pub use server::{StreamServer, WsStreamServer};
pub use session::{ConnectionId, Session, SessionHandle, SessionRegistry};
