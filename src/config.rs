//! Socket tuning options.
//!
//! `SocketConfig` mirrors the option-string convention used by operators:
//! a comma-separated list of long flags, for example
//! `"--backlog=500,--nodelay=false"`. Unparseable option strings are logged
//! and replaced by the defaults rather than refusing to start.

use clap::Parser;
use tracing::{error, info};

use crate::decoder::DecoderLimits;
use crate::frame::MAX_BODY_SIZE;

/// Tuning options applied to listeners and accepted connections.
#[derive(Clone, Debug, Parser)]
#[command(name = "socket-options", no_binary_name = true)]
pub struct SocketConfig {
    /// Enable TCP keepalive probes on the listening socket.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub tcp_keepalive: bool,

    /// Disable Nagle's algorithm on accepted connections.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub nodelay: bool,

    /// Listen backlog for the accepting socket.
    #[arg(long, default_value_t = 1000)]
    pub backlog: u32,

    /// `SO_LINGER` timeout in milliseconds applied to accepted connections.
    #[arg(long, default_value_t = 0)]
    pub linger: u64,

    /// Socket send buffer size in bytes.
    #[arg(long, default_value_t = 1024 * 1024)]
    pub send_buffer_size: u32,

    /// Socket receive buffer size in bytes.
    #[arg(long, default_value_t = 1024 * 1024)]
    pub receive_buffer_size: u32,

    /// Initial capacity of each connection's receive accumulator.
    #[arg(long, default_value_t = 8 * 1024)]
    pub accumulator_capacity: usize,

    /// Ceiling each connection's receive accumulator may grow to.
    #[arg(long, default_value_t = 512 * 1024)]
    pub accumulator_max_capacity: usize,
}

impl SocketConfig {
    /// Parse a comma-separated option string.
    ///
    /// Unknown or malformed options log an error and yield the defaults.
    #[must_use]
    pub fn from_option_string(options: &str) -> Self {
        let tokens = options
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty());
        match Self::try_parse_from(tokens) {
            Ok(config) => {
                info!(?config, "socket options");
                config
            }
            Err(parse_error) => {
                error!(%parse_error, "socket option parsing error, using defaults");
                Self::default()
            }
        }
    }

    /// Accumulator limits for decoders created under this configuration.
    #[must_use]
    pub fn decoder_limits(&self) -> DecoderLimits {
        DecoderLimits {
            initial_capacity: self.accumulator_capacity,
            max_capacity: self.accumulator_max_capacity,
            max_body_size: MAX_BODY_SIZE,
        }
    }
}

impl Default for SocketConfig {
    fn default() -> Self { Self::parse_from(std::iter::empty::<std::ffi::OsString>()) }
}
