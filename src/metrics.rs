//! Metric helpers wrapping the [`metrics`](https://docs.rs/metrics) facade.
//!
//! Recording is fire-and-forget: with no recorder installed every call is a
//! no-op, so the transport layer never depends on an exporter being present.

use metrics::{counter, gauge};

/// Gauge tracking currently connected sessions.
pub const CONNECTIONS_ACTIVE: &str = "streammux_connections_active";
/// Counter tracking frames decoded from or handed to the wire.
pub const FRAMES_PROCESSED: &str = "streammux_frames_processed_total";
/// Counter tracking connection-level errors.
pub const ERRORS_TOTAL: &str = "streammux_errors_total";

/// Direction of frame processing, used as a metric label.
#[derive(Clone, Copy)]
pub enum Direction {
    /// Frames received from a client.
    Inbound,
    /// Frames sent to a client.
    Outbound,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Record a session entering the registry.
pub fn connection_opened() { gauge!(CONNECTIONS_ACTIVE).increment(1.0); }

/// Record a session leaving the registry.
pub fn connection_closed() { gauge!(CONNECTIONS_ACTIVE).decrement(1.0); }

/// Record one processed frame in the given direction.
pub fn frame_processed(direction: Direction) {
    counter!(FRAMES_PROCESSED, "direction" => direction.as_str()).increment(1);
}

/// Record a connection-level error (decode, transport, or accept failure).
pub fn record_error() { counter!(ERRORS_TOTAL).increment(1); }
