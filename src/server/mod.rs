//! Transport listeners binding a [`SessionRegistry`] to real sockets.
//!
//! Both listeners share the same shape: an accept loop spawned on the tokio
//! runtime, one reader task and one writer task per accepted connection, and
//! a [`Session`] driver translating transport events into registry state.
//! Only the I/O loops differ between TCP and WebSocket.
//!
//! [`Session`]: crate::session::Session
//! [`SessionRegistry`]: crate::session::SessionRegistry

mod tcp;
mod ws;

use std::net::SocketAddr;

use tokio::net::TcpSocket;
use tokio::time::{Duration, sleep};

pub use tcp::StreamServer;
pub use ws::WsStreamServer;

use crate::config::SocketConfig;

/// Exponential back-off applied when `accept` fails, so a transient error
/// (for example, file-descriptor exhaustion) does not spin the loop.
struct AcceptBackoff {
    delay: Duration,
}

impl AcceptBackoff {
    const INITIAL: Duration = Duration::from_millis(10);
    const CEILING: Duration = Duration::from_secs(1);

    fn new() -> Self {
        Self {
            delay: Self::INITIAL,
        }
    }

    fn reset(&mut self) { self.delay = Self::INITIAL; }

    async fn wait(&mut self) {
        sleep(self.delay).await;
        self.delay = (self.delay * 2).min(Self::CEILING);
    }
}

/// Build a listening socket with the configured options applied.
fn configured_listener(
    addr: SocketAddr,
    config: &SocketConfig,
) -> std::io::Result<tokio::net::TcpListener> {
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };
    socket.set_reuseaddr(true)?;
    socket.set_keepalive(config.tcp_keepalive)?;
    socket.set_send_buffer_size(config.send_buffer_size)?;
    socket.set_recv_buffer_size(config.receive_buffer_size)?;
    socket.bind(addr)?;
    socket.listen(config.backlog)
}

/// Apply per-connection stream options.
fn configure_stream(
    stream: &tokio::net::TcpStream,
    config: &SocketConfig,
) -> std::io::Result<()> {
    stream.set_nodelay(config.nodelay)?;
    stream.set_linger(Some(Duration::from_millis(config.linger)))?;
    Ok(())
}
