//! `streammux` echo server binary.
//!
//! Binds the TCP listener (and optionally the WebSocket listener), then
//! echoes every decoded frame back to the connection it arrived on until
//! Ctrl+C.

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info};

use streammux::config::SocketConfig;
use streammux::message::{Message, MessageKind};
use streammux::server::{StreamServer, WsStreamServer};
use streammux::session::SessionRegistry;
use streammux::{FrameEncoder, Result};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    let config = SocketConfig::from_option_string(&cli.socket_options);
    let registry = Arc::new(SessionRegistry::new());

    let server = StreamServer::bind(
        ([0, 0, 0, 0], cli.port).into(),
        Arc::clone(&registry),
        config.clone(),
    )?;
    info!(addr = %server.local_addr(), "listening for stream connections");

    let ws_server = match cli.ws_port {
        Some(ws_port) => {
            let ws_server = WsStreamServer::bind(
                ([0, 0, 0, 0], ws_port).into(),
                Arc::clone(&registry),
                config,
            )?;
            info!(addr = %ws_server.local_addr(), "listening for websocket connections");
            Some(ws_server)
        }
        None => None,
    };

    let echo = tokio::spawn(echo_loop(Arc::clone(&registry)));

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    echo.abort();
    server.close().await;
    if let Some(ws_server) = ws_server {
        ws_server.close().await;
    }
    Ok(())
}

/// Poll the inbound queue and echo every data frame back to its sender.
async fn echo_loop(registry: Arc<SessionRegistry>) {
    let mut encoder = FrameEncoder::new();
    loop {
        let Some(message) = registry.recv() else {
            tokio::time::sleep(Duration::from_millis(10)).await;
            continue;
        };
        let (id, kind) = message.into_parts();
        match kind {
            MessageKind::Connect => info!(%id, "client connected"),
            MessageKind::Disconnect => info!(%id, "client disconnected"),
            MessageKind::Frame { header, body } => {
                debug!(%id, ?header, len = body.len(), "frame received");
                if let Ok(frame) = encoder.encode(&header, &body) {
                    registry.send(Message::frame(id, header, frame));
                }
            }
        }
    }
}
