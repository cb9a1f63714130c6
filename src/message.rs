//! Messages exchanged between the transport layer and the application.
//!
//! A [`Message`] is either a connection lifecycle event or a fully decoded
//! data frame, tagged with the [`ConnectionId`] it belongs to. Messages are
//! move-only: the body buffer is produced once by the decoder (or the
//! application, for outbound traffic) and ownership transfers exactly once
//! when the message is consumed.

use bytes::Bytes;

use crate::frame::FrameHeader;
use crate::session::ConnectionId;

/// Payload carried by a [`Message`].
#[derive(Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// The connection entered the registry.
    Connect,
    /// The connection left the registry.
    Disconnect,
    /// A fully decoded data frame.
    Frame {
        /// Header fields decoded from the wire.
        header: FrameHeader,
        /// Owned body bytes.
        body: Bytes,
    },
}

/// One decoded unit of data, tagged with its connection identity.
#[derive(Debug, PartialEq, Eq)]
pub struct Message {
    id: ConnectionId,
    kind: MessageKind,
}

impl Message {
    /// Lifecycle event announcing a new connection.
    #[must_use]
    pub fn connect(id: ConnectionId) -> Self {
        Self {
            id,
            kind: MessageKind::Connect,
        }
    }

    /// Lifecycle event announcing a closed connection.
    #[must_use]
    pub fn disconnect(id: ConnectionId) -> Self {
        Self {
            id,
            kind: MessageKind::Disconnect,
        }
    }

    /// Data frame decoded from (or destined for) connection `id`.
    #[must_use]
    pub fn frame(id: ConnectionId, header: FrameHeader, body: Bytes) -> Self {
        Self {
            id,
            kind: MessageKind::Frame { header, body },
        }
    }

    /// Identity of the connection this message belongs to.
    #[must_use]
    pub fn id(&self) -> ConnectionId { self.id }

    /// Payload of the message.
    #[must_use]
    pub fn kind(&self) -> &MessageKind { &self.kind }

    /// Header fields, present only for data frames.
    #[must_use]
    pub fn header(&self) -> Option<&FrameHeader> {
        match &self.kind {
            MessageKind::Frame { header, .. } => Some(header),
            MessageKind::Connect | MessageKind::Disconnect => None,
        }
    }

    /// Split the message into its identity and payload.
    #[must_use]
    pub fn into_parts(self) -> (ConnectionId, MessageKind) { (self.id, self.kind) }

    /// Take ownership of the body, consuming the message.
    ///
    /// Returns `None` for lifecycle events, which carry no body.
    #[must_use]
    pub fn into_body(self) -> Option<Bytes> {
        match self.kind {
            MessageKind::Frame { body, .. } => Some(body),
            MessageKind::Connect | MessageKind::Disconnect => None,
        }
    }
}
