//! Command line interface for the `streammux` server binary.

use clap::Parser;

/// Command line arguments for the `streammux` binary.
#[derive(Debug, Parser)]
#[command(name = "streammux", version, about = "Connection-multiplexing stream server")]
pub struct Cli {
    /// TCP listen port.
    #[arg(long, default_value_t = 9100)]
    pub port: u16,

    /// WebSocket listen port; the WebSocket listener is disabled when
    /// omitted.
    #[arg(long)]
    pub ws_port: Option<u16>,

    /// Comma-separated socket tuning options, for example
    /// "--backlog=500,--nodelay=false".
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub socket_options: String,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Cli;

    #[test]
    fn parses_ports_and_options() {
        let cli = Cli::parse_from([
            "streammux",
            "--port",
            "4000",
            "--ws-port",
            "4001",
            "--socket-options",
            "--backlog=10",
        ]);
        assert_eq!(cli.port, 4000);
        assert_eq!(cli.ws_port, Some(4001));
        assert_eq!(cli.socket_options, "--backlog=10");
    }

    #[test]
    fn websocket_listener_is_optional() {
        let cli = Cli::parse_from(["streammux"]);
        assert_eq!(cli.ws_port, None);
    }
}
