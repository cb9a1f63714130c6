//! Wire frame layout and encoding.
//!
//! A frame is a 2-byte body length, a 9-byte fixed header (service id,
//! message id, sequence number, stage index) and the body bytes. All
//! multi-byte fields travel big-endian. [`FrameEncoder`] assembles outbound
//! frames through a reusable [`RingBuffer`] scratch area; the streaming
//! decode path lives in [`crate::decoder`].

use bytes::Bytes;
use thiserror::Error;

use crate::ring_buffer::{RingBuffer, RingBufferError};

/// Size of the length prefix plus fixed header fields, in bytes.
pub const HEADER_SIZE: usize = 11;

/// Largest body a frame may declare; fits the 16-bit length field.
pub const MAX_BODY_SIZE: usize = 65535;

/// Initial capacity of a [`FrameEncoder`] scratch buffer.
const ENCODE_CAPACITY: usize = 64 * 1024;

/// Ceiling of a [`FrameEncoder`] scratch buffer.
const ENCODE_MAX_CAPACITY: usize = 64 * 1024 * 2;

/// Fixed header fields carried by every data frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// Service the message addresses.
    pub service_id: i16,
    /// Message identifier within the service.
    pub msg_id: i32,
    /// Per-connection sequence number.
    pub msg_seq: i16,
    /// Stage routing index.
    pub stage_index: i8,
}

impl FrameHeader {
    /// Create a header from its four wire fields.
    #[must_use]
    pub fn new(service_id: i16, msg_id: i32, msg_seq: i16, stage_index: i8) -> Self {
        Self {
            service_id,
            msg_id,
            msg_seq,
            stage_index,
        }
    }
}

/// Errors returned when assembling a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The body exceeds [`MAX_BODY_SIZE`].
    #[error("frame body of {size} bytes is over the maximum of {MAX_BODY_SIZE}")]
    BodyTooLarge {
        /// Length of the rejected body.
        size: usize,
    },
    /// The scratch buffer could not hold the frame.
    #[error(transparent)]
    Buffer(#[from] RingBufferError),
}

/// Assembles outbound frames into owned byte buffers.
///
/// The encoder owns a scratch [`RingBuffer`] that is cleared and refilled on
/// every call, so repeated encodes reuse the same backing allocation.
#[derive(Debug)]
pub struct FrameEncoder {
    scratch: RingBuffer,
}

impl FrameEncoder {
    /// Create an encoder with the default scratch capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scratch: RingBuffer::new(ENCODE_CAPACITY, ENCODE_MAX_CAPACITY)
                .unwrap_or_else(|_| RingBuffer::with_capacity(ENCODE_CAPACITY)),
        }
    }

    /// Encode `header` and `body` into a complete wire frame.
    ///
    /// The returned buffer is ready to hand to a session's outbound path and
    /// decodes back through [`crate::decoder::StreamDecoder`] unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::BodyTooLarge`] when the body exceeds
    /// [`MAX_BODY_SIZE`], or a buffer error if the scratch area cannot grow
    /// to hold the frame.
    pub fn encode(&mut self, header: &FrameHeader, body: &[u8]) -> Result<Bytes, EncodeError> {
        if body.len() > MAX_BODY_SIZE {
            return Err(EncodeError::BodyTooLarge { size: body.len() });
        }

        self.scratch.clear();
        self.scratch.write_u16(body.len() as u16)?;
        self.scratch.write_u16(header.service_id as u16)?;
        self.scratch.write_u32(header.msg_id as u32)?;
        self.scratch.write_u16(header.msg_seq as u16)?;
        self.scratch.write_u8(header.stage_index as u8)?;
        self.scratch.write(body)?;

        let mut frame = vec![0; self.scratch.len()];
        self.scratch.read(&mut frame);
        Ok(Bytes::from(frame))
    }
}

impl Default for FrameEncoder {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::{FrameEncoder, FrameHeader, HEADER_SIZE, MAX_BODY_SIZE};

    #[test]
    fn encodes_the_documented_wire_layout() {
        let mut encoder = FrameEncoder::new();
        let header = FrameHeader::new(1, 2, 3, 1);
        let frame = encoder.encode(&header, &[0u8; 11]).unwrap();

        let mut expected = vec![
            0x00, 0x0B, // body length
            0x00, 0x01, // service id
            0x00, 0x00, 0x00, 0x02, // message id
            0x00, 0x03, // sequence
            0x01, // stage index
        ];
        expected.extend_from_slice(&[0u8; 11]);
        assert_eq!(frame.as_ref(), expected.as_slice());
        assert_eq!(frame.len(), HEADER_SIZE + 11);
    }

    #[test]
    fn negative_fields_encode_as_twos_complement_big_endian() {
        let mut encoder = FrameEncoder::new();
        let header = FrameHeader::new(-1, -2, -3, -1);
        let frame = encoder.encode(&header, &[]).unwrap();
        assert_eq!(
            frame.as_ref(),
            &[0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0xFF, 0xFD, 0xFF]
        );
    }

    #[test]
    fn rejects_oversized_bodies() {
        let mut encoder = FrameEncoder::new();
        let header = FrameHeader::new(1, 1, 1, 0);
        let body = vec![0u8; MAX_BODY_SIZE + 1];
        assert!(encoder.encode(&header, &body).is_err());
    }

    #[test]
    fn scratch_is_reusable_across_encodes() {
        let mut encoder = FrameEncoder::new();
        let header = FrameHeader::new(7, 8, 9, 2);
        let first = encoder.encode(&header, b"abc").unwrap();
        let second = encoder.encode(&header, b"abc").unwrap();
        assert_eq!(first, second);
    }
}
