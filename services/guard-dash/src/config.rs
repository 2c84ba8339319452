// services/guard-dash/src/config.rs
//
// Layered configuration: defaults, optional file, GUARD_DASH_* environment

use anyhow::Result;
use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use guardkit::config::{BackendConfig, ObservabilityConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardDashConfig {
    pub backend: BackendConfig,
    pub dashboard: DashboardConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub mode: SourceMode,
    /// Sample data only, no backend traffic
    pub demo: bool,
    pub poll_interval_secs: u64,
    pub reconnect_delay_secs: u64,
    /// Cap on the push-mode history; oldest captures are evicted first
    pub max_images: usize,
    pub door_failure_policy: DoorFailurePolicy,
    /// Show the sample dataset when a poll fails
    pub sample_fallback: bool,
    pub download_dir: Option<PathBuf>,
}

impl DashboardConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Configured directory, else the user's download directory, else the working directory.
    pub fn resolved_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::Poll,
            demo: false,
            poll_interval_secs: 5,
            reconnect_delay_secs: 5,
            max_images: 100,
            door_failure_policy: DoorFailurePolicy::Optimistic,
            sample_fallback: cfg!(debug_assertions),
            download_dir: None,
        }
    }
}

/// How live data reaches the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Periodic `GET /images`
    Poll,
    /// Persistent WebSocket subscription
    Push,
}

/// What the lock indicator does when a door command cannot be confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorFailurePolicy {
    /// Apply the requested state anyway so the control never looks stuck
    Optimistic,
    /// Keep the last confirmed state
    FailClosed,
}

pub fn load_config(path: &str) -> Result<GuardDashConfig> {
    let config = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("GUARD_DASH")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}
