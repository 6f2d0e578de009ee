use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum accepted request body (64 KiB).
pub const MAX_BODY_BYTES: usize = 65_536;
/// Per-request deadline enforced by the HTTP layer.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway port (default: 3000)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// Origins allowed by CORS; empty leaves CORS headers off.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            host: default_gateway_host(),
            allowed_origins: Vec::new(),
        }
    }
}
