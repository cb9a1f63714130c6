//! Connection identity, the concurrent session registry and the
//! per-connection session driver.
//!
//! `SessionRegistry` is the application-facing multiplexer: it maps live
//! [`ConnectionId`]s to their outbound handles and funnels every decoded
//! message into one inbound queue polled with [`recv`]. A [`Session`] is the
//! transport-side driver for a single connection: it owns that connection's
//! [`StreamDecoder`] and is only ever touched by the connection's own I/O
//! task, so the decoder needs no locking. Concurrency control is confined to
//! the registry map and the inbound queue.
//!
//! [`recv`]: SessionRegistry::recv

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::decoder::{DecodeError, DecoderLimits, StreamDecoder};
use crate::message::Message;
use crate::metrics::{self, Direction};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier assigned to a connection for its entire life.
///
/// Ids are minted from a process-wide counter and never reused, so a message
/// still pending in the inbound queue can never be attributed to a later
/// connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a [`ConnectionId`] with the provided value.
    #[must_use]
    pub fn new(id: u64) -> Self { Self(id) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub fn as_u64(&self) -> u64 { self.0 }

    pub(crate) fn next() -> Self { Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)) }
}

impl From<u64> for ConnectionId {
    fn from(value: u64) -> Self { Self(value) }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConnectionId({})", self.0)
    }
}

/// Outbound half of a live connection, held by the registry.
///
/// Cloning is cheap; every clone feeds the same writer task.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    outbound: mpsc::UnboundedSender<Bytes>,
}

impl SessionHandle {
    /// Wrap the sender feeding a connection's writer task.
    #[must_use]
    pub fn new(outbound: mpsc::UnboundedSender<Bytes>) -> Self { Self { outbound } }

    fn forward(&self, body: Bytes) -> bool { self.outbound.send(body).is_ok() }
}

/// Concurrent registry of live sessions plus the inbound message queue.
pub struct SessionRegistry {
    sessions: DashMap<ConnectionId, SessionHandle>,
    inbound_tx: mpsc::UnboundedSender<Message>,
    inbound_rx: Mutex<mpsc::UnboundedReceiver<Message>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            sessions: DashMap::new(),
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
        }
    }

    /// Dequeue one pending inbound message, or `None` when the queue is
    /// empty. Never blocks; safe to poll from the application thread.
    pub fn recv(&self) -> Option<Message> {
        let mut inbound = self
            .inbound_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        inbound.try_recv().ok()
    }

    /// Hand `message`'s body to its connection's outbound path.
    ///
    /// Returns `false`, without blocking or erroring, when the connection
    /// has already disconnected or the message carries no body; the message
    /// is dropped in both cases.
    pub fn send(&self, message: Message) -> bool {
        let id = message.id();
        let Some(handle) = self.sessions.get(&id).map(|entry| entry.value().clone()) else {
            debug!(%id, "session does not exist, dropping outbound message");
            return false;
        };
        let Some(body) = message.into_body() else {
            debug!(%id, "outbound message carries no body, dropping");
            return false;
        };
        if handle.forward(body) {
            metrics::frame_processed(Direction::Outbound);
            true
        } else {
            debug!(%id, "outbound channel closed, dropping message");
            false
        }
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize { self.sessions.len() }

    /// Whether no sessions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.sessions.is_empty() }

    /// Whether `id` is currently registered.
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool { self.sessions.contains_key(&id) }

    fn insert(&self, id: ConnectionId, handle: SessionHandle) { self.sessions.insert(id, handle); }

    fn remove(&self, id: ConnectionId) { self.sessions.remove(&id); }

    pub(crate) fn push_inbound(&self, message: Message) {
        if self.inbound_tx.send(message).is_err() {
            warn!("inbound queue is closed, dropping message");
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self { Self::new() }
}

/// Driver for one live connection.
///
/// Bridges a transport's notification stream to a [`StreamDecoder`] and the
/// owning [`SessionRegistry`]. The transport must deliver notifications for
/// a single connection in order: open, then received bytes, then close.
pub struct Session {
    id: ConnectionId,
    decoder: StreamDecoder,
    registry: Arc<SessionRegistry>,
}

impl Session {
    /// Register a new connection and announce it on the inbound queue.
    ///
    /// The handle is inserted before the `Connect` event is pushed, so the
    /// connection is sendable by the time the application observes it.
    #[must_use]
    pub fn open(registry: Arc<SessionRegistry>, handle: SessionHandle) -> Self {
        Self::open_with_limits(registry, handle, DecoderLimits::default())
    }

    /// Register a new connection with explicit decoder limits.
    #[must_use]
    pub fn open_with_limits(
        registry: Arc<SessionRegistry>,
        handle: SessionHandle,
        limits: DecoderLimits,
    ) -> Self {
        let id = ConnectionId::next();
        registry.insert(id, handle);
        debug!(%id, "session connected");
        registry.push_inbound(Message::connect(id));
        metrics::connection_opened();
        Self {
            id,
            decoder: StreamDecoder::with_limits(id, limits),
            registry,
        }
    }

    /// Identity of this connection.
    #[must_use]
    pub fn id(&self) -> ConnectionId { self.id }

    /// Feed received transport bytes through the decoder and push every
    /// fully decoded message onto the inbound queue, preserving arrival
    /// order.
    ///
    /// # Errors
    ///
    /// Returns the [`DecodeError`] when the stream violates the protocol;
    /// the caller must close this connection and leave others untouched.
    pub fn receive(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        self.decoder.write(bytes)?;
        for message in self.decoder.parse()? {
            metrics::frame_processed(Direction::Inbound);
            self.registry.push_inbound(message);
        }
        Ok(())
    }

    /// Announce the disconnect and deregister the connection.
    ///
    /// The `Disconnect` event is pushed before the handle is removed; after
    /// removal no `send` can reach this identity.
    pub fn close(self) {
        debug!(id = %self.id, "session disconnected");
        self.registry.push_inbound(Message::disconnect(self.id));
        self.registry.remove(self.id);
        metrics::connection_closed();
    }
}
