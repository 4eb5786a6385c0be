//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 3000                 # HTTP port number
//! ws_port = 35729             # WebSocket port for reload signals
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.
//! Port `0` picks a free port.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// WebSocket port for reload notifications.
    pub ws_port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            ws_port: 35729,
        }
    }
}

impl ServeConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.port != 0 && self.port == self.ws_port {
            diag.error_with_hint(
                FieldPath::new("serve.ws_port"),
                format!("`ws_port` must differ from `port` ({})", self.port),
                "use the default 35729 or any other free port",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_serve_config() {
        let config =
            test_parse_config("[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nws_port = 9000");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.ws_port, 9000);
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.serve.ws_port, 35729);
    }

    #[test]
    fn test_same_ports_rejected() {
        let config = test_parse_config("[serve]\nport = 4000\nws_port = 4000");
        let mut diag = ConfigDiagnostics::new();
        config.serve.validate(&mut diag);
        assert!(diag.has_errors());
    }

    #[test]
    fn test_ephemeral_ports_allowed() {
        let config = test_parse_config("[serve]\nport = 0\nws_port = 0");
        let mut diag = ConfigDiagnostics::new();
        config.serve.validate(&mut diag);
        assert!(!diag.has_errors());
    }
}
