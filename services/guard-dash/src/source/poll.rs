// services/guard-dash/src/source/poll.rs
//
// HTTP polling client for the recognition backend

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use guardkit::config::BackendConfig;
use guardkit::types::{DoorControlRequest, ImageListResponse};
use guardkit::{DoorAction, GuardError, ImageRecord};

use super::{emit, DashEvent, DataSource, DoorDelivery, EventSender};

pub struct PollSource {
    client: reqwest::Client,
    base_url: String,
    interval: Duration,
    timeout: Duration,
    refresh: Notify,
}

impl PollSource {
    pub fn new(backend: &BackendConfig, interval: Duration) -> Result<Self, GuardError> {
        let timeout = backend.request_timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GuardError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: backend.api_url.trim_end_matches('/').to_string(),
            interval,
            timeout,
            refresh: Notify::new(),
        })
    }

    fn map_err(&self, err: reqwest::Error) -> GuardError {
        if err.is_timeout() {
            GuardError::Timeout(self.timeout)
        } else {
            err.into()
        }
    }

    /// `GET /images`, mapped into records in server order.
    pub async fn fetch_images(&self) -> Result<Vec<ImageRecord>, GuardError> {
        let url = format!("{}/images", self.base_url);

        let response = self.client.get(&url).send().await.map_err(|e| self.map_err(e))?;
        if !response.status().is_success() {
            return Err(GuardError::HttpStatus(response.status().as_u16()));
        }

        let body: ImageListResponse = response.json().await.map_err(|e| self.map_err(e))?;
        let records = body.into_records(&self.base_url);
        debug!("Fetched {} images from {}", records.len(), url);
        Ok(records)
    }

    /// `POST /door-control`; any non-2xx status is a failure.
    pub async fn post_door_control(&self, action: DoorAction) -> Result<(), GuardError> {
        let url = format!("{}/door-control", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&DoorControlRequest { action })
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        if !response.status().is_success() {
            return Err(GuardError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl DataSource for PollSource {
    fn name(&self) -> &str {
        "poll"
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn run(&self, events: EventSender, cancel: CancellationToken) {
        info!("Polling {} every {:?}", self.base_url, self.interval);

        // First tick fires immediately, which doubles as the initial fetch
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
                _ = self.refresh.notified() => {}
            }

            if !emit(&events, &cancel, DashEvent::RefreshStarted) {
                break;
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.fetch_images() => outcome,
            };

            if let Err(e) = &outcome {
                warn!("Failed to fetch images: {}", e);
            }

            if !emit(&events, &cancel, DashEvent::RefreshSettled(outcome)) {
                break;
            }
        }

        debug!("Poll loop for {} stopped", self.base_url);
    }

    async fn send_door_command(&self, action: DoorAction) -> Result<DoorDelivery, GuardError> {
        self.post_door_control(action).await?;
        info!("Door command '{}' accepted by {}", action, self.base_url);
        Ok(DoorDelivery::Applied)
    }

    fn refresh(&self) {
        self.refresh.notify_one();
    }

    fn reconnect(&self) {
        self.refresh.notify_one();
    }
}
