// services/guard-dash/src/source/demo.rs
//
// Offline sample dataset for demo mode

use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use guardkit::{DoorAction, GuardError, ImageRecord};

use super::{emit, DashEvent, DataSource, DoorDelivery, EventSender};

const DEMO_ENDPOINT: &str = "Not connected in preview mode";

/// Fixed captures shown in demo mode and as the fallback when a poll fails.
pub fn sample_images() -> Vec<ImageRecord> {
    let samples = [
        ("1", "/diverse-person-faces.png", 5, "Melanka"),
        ("2", "/serene-woman.png", 10, "Unknown"),
        ("3", "/man-face.png", 15, "Melanka"),
    ];

    samples
        .iter()
        .map(|(id, path, minutes_ago, name)| ImageRecord {
            id: id.to_string(),
            image_data: path.to_string(),
            timestamp: (Utc::now() - Duration::minutes(*minutes_ago))
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            name: Some(name.to_string()),
        })
        .collect()
}

pub struct DemoSource {
    refresh: Notify,
}

impl DemoSource {
    pub fn new() -> Self {
        Self { refresh: Notify::new() }
    }
}

impl Default for DemoSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSource for DemoSource {
    fn name(&self) -> &str {
        "demo"
    }

    fn endpoint(&self) -> &str {
        DEMO_ENDPOINT
    }

    async fn run(&self, events: EventSender, cancel: CancellationToken) {
        loop {
            debug!("Loading demo dataset");
            if !emit(&events, &cancel, DashEvent::RefreshSettled(Ok(sample_images()))) {
                return;
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = self.refresh.notified() => {}
            }
        }
    }

    async fn send_door_command(&self, _action: DoorAction) -> Result<DoorDelivery, GuardError> {
        Ok(DoorDelivery::Applied)
    }

    fn refresh(&self) {
        self.refresh.notify_one();
    }

    fn reconnect(&self) {
        self.refresh.notify_one();
    }
}
