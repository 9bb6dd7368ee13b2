//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for a [`RestClient`](crate::client::RestClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Prefix for every request path, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sent as `User-Agent` on every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout handed to the transport.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_user_agent() -> String {
    format!("DiscordBot (discord-core, {})", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_ms: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Parse configuration from JSON. Empty input yields the defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
