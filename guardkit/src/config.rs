use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the recognition backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base address of the HTTP API (`/images`, `/uploads`, `/door-control`)
    pub api_url: String,
    /// Address of the device's push channel
    pub ws_url: String,
    pub request_timeout_ms: u64,
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: "http://192.168.89.2:5000".to_string(),
            ws_url: "ws://192.168.1.100:8080".to_string(),
            request_timeout_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// The terminal is owned by the UI, so logs go to a file
    pub log_file: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: "guard-dash.log".to_string(),
        }
    }
}
