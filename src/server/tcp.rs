//! Raw TCP stream listener.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use log::warn;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use super::{AcceptBackoff, configure_stream, configured_listener};
use crate::config::SocketConfig;
use crate::decoder::DecoderLimits;
use crate::metrics;
use crate::session::{Session, SessionHandle, SessionRegistry};

/// Size of the per-connection read chunk.
const READ_CHUNK: usize = 8 * 1024;

/// TCP listener feeding a [`SessionRegistry`].
///
/// Must be created from within a tokio runtime; the accept loop and every
/// connection task run on that runtime until [`close`] is awaited.
///
/// [`close`]: StreamServer::close
pub struct StreamServer {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl StreamServer {
    /// Bind `addr` and start accepting stream connections into `registry`.
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
        info!(%local_addr, "stream server started");

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
                    error!(%error, "stream server accept error");
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
    let (mut reader, writer) = stream.into_split();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let mut session = Session::open_with_limits(registry, SessionHandle::new(outbound_tx), limits);
    let id = session.id();
    debug!(%id, %peer, "stream connection accepted");

    let writer_task = tokio::spawn(write_outbound(writer, outbound_rx, shutdown.clone()));

    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            read = reader.read(&mut chunk) => match read {
                Ok(0) => break,
                Ok(received) => {
                    if let Err(error) = session.receive(&chunk[..received]) {
                        error!(%id, %error, "protocol error, closing connection");
                        metrics::record_error();
                        break;
                    }
                }
                Err(error) => {
                    error!(%id, %error, "stream transport error");
                    metrics::record_error();
                    break;
                }
            },
        }
    }

    session.close();
    let _ = writer_task.await;
}

/// Drain the outbound channel into the socket until the channel closes,
/// a write fails, or shutdown is requested.
async fn write_outbound(
    mut writer: OwnedWriteHalf,
    mut outbound_rx: mpsc::UnboundedReceiver<Bytes>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            frame = outbound_rx.recv() => match frame {
                Some(frame) => {
                    if let Err(error) = writer.write_all(&frame).await {
                        error!(%error, "stream write error");
                        metrics::record_error();
                        break;
                    }
                }
                None => break,
            },
        }
    }
}
