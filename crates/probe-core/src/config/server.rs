//! HTTP boundary configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port. The `PORT` environment variable overrides it.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Bind address, e.g. `0.0.0.0:8000`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Apply the `PORT` override, ignoring values that are not a valid port.
    pub fn apply_port_override(&mut self, port: Option<&str>) {
        if let Some(port) = port.and_then(|p| p.trim().parse::<u16>().ok()) {
            self.port = port;
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}
