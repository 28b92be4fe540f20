//! Client configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub rounds: u32,
    pub round_delay_ms: u64,
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// URL answering `{"ip": "..."}`. Defaults to the first region's `/ip` route.
    pub address_lookup_url: Option<String>,
    pub cache_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rounds: 3,
            round_delay_ms: 800,
            request_timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
            address_lookup_url: None,
            cache_path: PathBuf::from("./vantage_cache.json"),
        }
    }
}

impl ClientConfig {
    pub fn round_delay(&self) -> Duration {
        Duration::from_millis(self.round_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
