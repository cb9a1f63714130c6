//! Streaming frame decoder.
//!
//! One [`StreamDecoder`] exists per connection. Raw transport bytes are
//! appended with [`write`] and complete frames are drained with [`parse`];
//! a partial frame stays in the accumulator until the rest of it arrives.
//! Decode failures are fatal to the owning connection only; the caller is
//! expected to force-close it and leave every other connection untouched.
//!
//! [`write`]: StreamDecoder::write
//! [`parse`]: StreamDecoder::parse

use bytes::Bytes;
use thiserror::Error;
use tracing::error;

use crate::frame::{FrameHeader, HEADER_SIZE, MAX_BODY_SIZE};
use crate::message::Message;
use crate::ring_buffer::{RingBuffer, RingBufferError};
use crate::session::ConnectionId;

/// Sizing limits applied to a decoder's accumulator.
#[derive(Clone, Copy, Debug)]
pub struct DecoderLimits {
    /// Starting capacity of the accumulator ring.
    pub initial_capacity: usize,
    /// Ceiling the accumulator may grow to.
    pub max_capacity: usize,
    /// Largest body length a frame may declare.
    pub max_body_size: usize,
}

impl Default for DecoderLimits {
    fn default() -> Self {
        Self {
            initial_capacity: 8 * 1024,
            max_capacity: 512 * 1024,
            max_body_size: MAX_BODY_SIZE,
        }
    }
}

impl DecoderLimits {
    fn accumulator(&self) -> RingBuffer {
        let initial = self.initial_capacity.min(self.max_capacity);
        RingBuffer::new(initial, self.max_capacity)
            .unwrap_or_else(|_| RingBuffer::with_capacity(self.max_capacity))
    }
}

/// Errors that end the owning connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A frame declared a body longer than the configured maximum.
    #[error("declared body of {declared} bytes is over the maximum of {limit}")]
    BodyTooLarge {
        /// Body length read from the wire.
        declared: usize,
        /// Maximum the decoder accepts.
        limit: usize,
    },
    /// The accumulator could not hold the incoming bytes.
    #[error("receive accumulator error: {0}")]
    Buffer(#[from] RingBufferError),
}

/// Turns a per-connection byte stream into decoded [`Message`]s.
#[derive(Debug)]
pub struct StreamDecoder {
    id: ConnectionId,
    buffer: RingBuffer,
    max_body_size: usize,
}

impl StreamDecoder {
    /// Create a decoder for connection `id` with default limits.
    #[must_use]
    pub fn new(id: ConnectionId) -> Self { Self::with_limits(id, DecoderLimits::default()) }

    /// Create a decoder with explicit accumulator limits.
    #[must_use]
    pub fn with_limits(id: ConnectionId, limits: DecoderLimits) -> Self {
        Self {
            id,
            buffer: limits.accumulator(),
            max_body_size: limits.max_body_size,
        }
    }

    /// Identity of the connection this decoder belongs to.
    #[must_use]
    pub fn id(&self) -> ConnectionId { self.id }

    /// Number of not-yet-decoded bytes held in the accumulator.
    #[must_use]
    pub fn buffered(&self) -> usize { self.buffer.len() }

    /// Append newly arrived transport bytes. Never parses, never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Buffer`] when the accumulator has reached its
    /// ceiling; the connection must be closed.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        self.buffer.write(bytes)?;
        Ok(())
    }

    /// Drain every complete frame from the accumulator, in arrival order.
    ///
    /// Stops at the first incomplete frame and leaves it buffered for the
    /// next call, so calling `parse` again without an intervening `write`
    /// yields no further messages.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::BodyTooLarge`] when a frame declares a body
    /// over the configured maximum. The error is fatal to this connection;
    /// the accumulator contents are unspecified afterwards.
    pub fn parse(&mut self) -> Result<Vec<Message>, DecodeError> {
        let mut messages = Vec::new();

        while self.buffer.len() >= HEADER_SIZE {
            let body_size = usize::from(self.buffer.peek_u16()?);
            if body_size > self.max_body_size {
                error!(id = %self.id, declared = body_size, "frame body size is over the maximum");
                return Err(DecodeError::BodyTooLarge {
                    declared: body_size,
                    limit: self.max_body_size,
                });
            }
            if self.buffer.len() < HEADER_SIZE + body_size {
                return Ok(messages);
            }

            self.buffer.consume(2)?;
            let service_id = self.buffer.read_u16()? as i16;
            let msg_id = self.buffer.read_u32()? as i32;
            let msg_seq = self.buffer.read_u16()? as i16;
            let stage_index = self.buffer.pop()? as i8;

            let mut body = vec![0; body_size];
            let copied = self.buffer.read(&mut body);
            debug_assert_eq!(copied, body_size);

            messages.push(Message::frame(
                self.id,
                FrameHeader::new(service_id, msg_id, msg_seq, stage_index),
                Bytes::from(body),
            ));
        }

        Ok(messages)
    }
}
