//! WebSocket stream listener.
//!
//! Speaks the same frame protocol as the raw TCP listener: every binary
//! WebSocket message is treated as a chunk of the connection's byte stream
//! and fed through the shared [`Session`] driver. Protocol-level ping/pong
//! is answered by the WebSocket layer itself.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use log::warn;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{WebSocketStream, accept_async};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use super::{AcceptBackoff, configure_stream, configured_listener};
use crate::config::SocketConfig;
use crate::decoder::DecoderLimits;
use crate::metrics;
use crate::session::{Session, SessionHandle, SessionRegistry};

/// WebSocket listener feeding a [`SessionRegistry`].
///
/// Must be created from within a tokio runtime; the accept loop and every
/// connection task run on that runtime until [`close`] is awaited.
///
/// [`close`]: WsStreamServer::close
pub struct WsStreamServer {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl WsStreamServer {
    /// Bind `addr` and start accepting WebSocket connections into
    /// `registry`.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if the listening socket cannot be created,
    /// configured, or bound.
    pub fn bind(
        addr: SocketAddr,
        registry: Arc<SessionRegistry>,
        config: SocketConfig,
    ) -> io::Result<Self> {
        let listener = configured_listener(addr, &config)?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "websocket stream server started");

        let shutdown = CancellationToken::new();
        let tasks = TaskTracker::new();
        tasks.spawn(accept_loop(
            listener,
            registry,
            config,
            shutdown.clone(),
            tasks.clone(),
        ));
        Ok(Self {
            local_addr,
            shutdown,
            tasks,
        })
    }

    /// Address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr { self.local_addr }

    /// Stop the listener and every connection task, then wait for them to
    /// finish. Idempotent.
    pub async fn close(&self) {
        self.shutdown.cancel();
        self.tasks.close();
        self.tasks.wait().await;
    }
}

async fn accept_loop(
    listener: TcpListener,
    registry: Arc<SessionRegistry>,
    config: SocketConfig,
    shutdown: CancellationToken,
    tasks: TaskTracker,
) {
    let mut backoff = AcceptBackoff::new();
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    backoff.reset();
                    if let Err(error) = configure_stream(&stream, &config) {
                        warn!("failed to apply stream options for {peer}: {error}");
                    }
                    tasks.spawn(drive_connection(
                        stream,
                        peer,
                        Arc::clone(&registry),
                        config.decoder_limits(),
                        shutdown.clone(),
                    ));
                }
                Err(error) => {
                    error!(%error, "websocket server accept error");
                    metrics::record_error();
                    backoff.wait().await;
                }
            },
        }
    }
}

async fn drive_connection(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<SessionRegistry>,
    limits: DecoderLimits,
    shutdown: CancellationToken,
) {
    let websocket = match accept_async(stream).await {
        Ok(websocket) => websocket,
        Err(error) => {
            warn!("websocket handshake failed for {peer}: {error}");
            return;
        }
    };
    let (sink, mut source) = websocket.split();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let mut session = Session::open_with_limits(registry, SessionHandle::new(outbound_tx), limits);
    let id = session.id();
    debug!(%id, %peer, "websocket connection accepted");

    let writer_task = tokio::spawn(write_outbound(sink, outbound_rx, shutdown.clone()));

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            incoming = source.next() => match incoming {
                Some(Ok(WsMessage::Binary(data))) => {
                    if let Err(error) = session.receive(&data) {
                        error!(%id, %error, "protocol error, closing connection");
                        metrics::record_error();
                        break;
                    }
                }
                Some(Ok(WsMessage::Text(text))) => {
                    if let Err(error) = session.receive(text.as_bytes()) {
                        error!(%id, %error, "protocol error, closing connection");
                        metrics::record_error();
                        break;
                    }
                }
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Err(error)) => {
                    error!(%id, %error, "websocket transport error");
                    metrics::record_error();
                    break;
                }
            },
        }
    }

    session.close();
    let _ = writer_task.await;
}

/// Drain the outbound channel into the WebSocket sink as binary messages.
async fn write_outbound(
    mut sink: SplitSink<WebSocketStream<TcpStream>, WsMessage>,
    mut outbound_rx: mpsc::UnboundedReceiver<Bytes>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            frame = outbound_rx.recv() => match frame {
                Some(frame) => {
                    if let Err(error) = sink.send(WsMessage::Binary(frame.to_vec())).await {
                        error!(%error, "websocket write error");
                        metrics::record_error();
                        break;
                    }
                }
                None => break,
            },
        }
    }
    let _ = sink.close().await;
}
