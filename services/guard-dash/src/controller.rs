// services/guard-dash/src/controller.rs
//
// Dashboard controller - sole owner of dashboard state.
// Background work (the data source, door commands, downloads) runs on the
// tokio runtime and reports back through one event channel; the UI loop
// applies those events one at a time.
//

use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use guardkit::{DoorAction, GuardError};

use crate::config::{DoorFailurePolicy, GuardDashConfig};
use crate::gallery::{self, ImageResource};
use crate::source::demo::sample_images;
use crate::source::{emit, DashEvent, DataSource, DoorDelivery, EventReceiver, EventSender};
use crate::state::DashboardState;

pub struct Controller {
    state: DashboardState,
    source: Arc<dyn DataSource>,
    policy: DoorFailurePolicy,
    max_images: usize,
    sample_fallback: bool,
    download_dir: PathBuf,
    http: reqwest::Client,
    runtime: Handle,
    events_tx: EventSender,
    events_rx: EventReceiver,
    /// Scopes every spawned task to the controller's lifetime
    cancel: CancellationToken,
}

impl Controller {
    pub fn new(
        config: &GuardDashConfig,
        source: Arc<dyn DataSource>,
        runtime: Handle,
    ) -> Result<Self, GuardError> {
        let dashboard = &config.dashboard;
        // Probes and downloads share the backend's request timeout
        let http = reqwest::Client::builder()
            .timeout(config.backend.request_timeout())
            .build()
            .map_err(|e| GuardError::Config(format!("HTTP client: {}", e)))?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            state: DashboardState::new(dashboard.demo),
            source,
            policy: dashboard.door_failure_policy,
            max_images: dashboard.max_images,
            sample_fallback: dashboard.sample_fallback,
            download_dir: dashboard.resolved_download_dir(),
            http,
            runtime,
            events_tx,
            events_rx,
            cancel: CancellationToken::new(),
        })
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn source(&self) -> &dyn DataSource {
        self.source.as_ref()
    }

    /// Start the data source.
    pub fn start(&mut self) {
        if self.state.demo_mode {
            self.state.add_log("INFO", "Dashboard started in DEMO mode - using sample data");
        } else {
            self.state.add_log(
                "INFO",
                &format!("Dashboard started - {} source at {}", self.source.name(), self.source.endpoint()),
            );
        }

        let source = Arc::clone(&self.source);
        let events = self.events_tx.clone();
        let cancel = self.cancel.clone();
        self.runtime.spawn(async move {
            source.run(events, cancel).await;
        });
    }

    /// Cancel all background work; late results are dropped.
    pub fn shutdown(&mut self) {
        if !self.cancel.is_cancelled() {
            info!("Shutting down {} source", self.source.name());
            self.cancel.cancel();
        }
    }

    /// Apply every event that has arrived so far. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next event without applying it.
    pub async fn next_event(&mut self) -> Option<DashEvent> {
        self.events_rx.recv().await
    }

    pub fn handle_event(&mut self, event: DashEvent) {
        match event {
            DashEvent::RefreshStarted => {
                self.state.loading = true;
            }
            DashEvent::RefreshSettled(Ok(images)) => {
                if !self.state.connected {
                    self.state.add_log("INFO", &format!("Connected to {}", self.source.endpoint()));
                }
                debug!("Replacing gallery with {} images", images.len());
                self.state.replace_images(images);
                self.state.connected = true;
                self.state.loading = false;
            }
            DashEvent::RefreshSettled(Err(e)) => {
                if self.state.connected {
                    self.state.add_log("WARN", &format!("Failed to fetch images: {}", e));
                }
                self.state.connected = false;
                if self.sample_fallback {
                    self.state.replace_images(sample_images());
                }
                self.state.loading = false;
            }
            DashEvent::Connected => {
                self.state.connected = true;
                self.state.add_log("INFO", &format!("Connected to {}", self.source.endpoint()));
            }
            DashEvent::Disconnected => {
                if self.state.connected {
                    self.state.add_log("WARN", &format!("Disconnected from {}", self.source.endpoint()));
                }
                self.state.connected = false;
                // The session that would have confirmed it is gone
                self.state.pending_door = None;
            }
            DashEvent::ConnectionError(e) => {
                error!("Connection error: {}", e);
                self.state.connected = false;
                self.state.add_log("ERROR", &format!("Connection error: {}", e));
            }
            DashEvent::ImagePushed(record) => {
                self.state.add_log("INFO", &format!("Face captured: {}", record.display_name()));
                self.state.push_image(record, self.max_images);
            }
            DashEvent::DoorStatus { locked } => {
                self.state.door_locked = locked;
                self.state.pending_door = None;
                self.state.add_log(
                    "INFO",
                    &format!("Door reported {}", if locked { "locked" } else { "unlocked" }),
                );
            }
            DashEvent::MalformedMessage(e) => {
                self.state.add_log("WARN", &format!("Ignored malformed message: {}", e));
            }
            DashEvent::DoorCommandSettled { action, result } => {
                self.settle_door_command(action, result);
            }
            DashEvent::ImageUnavailable { id } => {
                self.state.add_log("WARN", &format!("Image {} failed to load, showing fallback", id));
                self.state.unavailable.insert(id);
            }
            DashEvent::DownloadSettled { id, result } => match result {
                Ok(path) => {
                    self.state.set_notice("INFO", &format!("Saved {} to {}", id, path.display()));
                }
                Err(e) => {
                    error!("Error downloading image {}: {}", id, e);
                    self.state.set_notice("ERROR", &format!("Failed to download image: {}", e));
                }
            },
        }
    }

    fn settle_door_command(&mut self, action: DoorAction, result: Result<DoorDelivery, GuardError>) {
        let target = action.target_locked();
        match result {
            Ok(DoorDelivery::Applied) => {
                self.state.door_locked = target;
                self.state.add_log("INFO", &format!("Door {} confirmed", action));
            }
            Ok(DoorDelivery::AwaitingConfirmation) => {
                self.state.pending_door = Some(target);
                self.state.add_log("INFO", &format!("Door {} sent, awaiting status", action));
            }
            Err(e) => {
                warn!("Failed to control door ({}): {}", action, e);
                match self.policy {
                    DoorFailurePolicy::Optimistic => {
                        self.state.door_locked = target;
                        self.state.set_notice(
                            "WARN",
                            &format!("Failed to control door: {} - showing requested state", e),
                        );
                    }
                    DoorFailurePolicy::FailClosed => {
                        self.state.set_notice(
                            "WARN",
                            &format!("Failed to control door: {} - lock state unchanged", e),
                        );
                    }
                }
            }
        }
    }

    /// Request the inverse of the current lock state.
    pub fn toggle_door(&mut self) {
        let action = DoorAction::toggle_from(self.state.door_locked);

        if self.state.demo_mode {
            self.state.door_locked = action.target_locked();
            self.state.add_log("INFO", &format!("Door {} (simulated)", action));
            return;
        }

        let source = Arc::clone(&self.source);
        let events = self.events_tx.clone();
        let cancel = self.cancel.clone();
        self.runtime.spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = source.send_door_command(action) => result,
            };
            emit(&events, &cancel, DashEvent::DoorCommandSettled { action, result });
        });
    }

    /// Manual refresh; ignored while a fetch is in flight.
    pub fn refresh(&mut self) {
        if self.state.loading {
            return;
        }
        self.source.refresh();
    }

    pub fn reconnect(&mut self) {
        if self.state.demo_mode {
            return;
        }
        self.state.add_log("INFO", &format!("Reconnecting to {}", self.source.endpoint()));
        self.source.reconnect();
    }

    pub fn select_next(&mut self) {
        self.state.select_next();
    }

    pub fn select_prev(&mut self) {
        self.state.select_prev();
    }

    pub fn collapse(&mut self) {
        self.state.collapse();
    }

    /// Expand or collapse the selected capture; expanding a remote capture checks it still loads.
    pub fn toggle_expanded_selected(&mut self) {
        let Some(record) = self.state.selected_image().cloned() else {
            return;
        };

        self.state.toggle_expanded(&record.id);
        if self.state.expanded.as_deref() != Some(record.id.as_str())
            || self.state.demo_mode
            || self.state.unavailable.contains(&record.id)
        {
            return;
        }

        let remote = match ImageResource::classify(&record.image_data) {
            ImageResource::Remote(url) => Some(url.to_string()),
            _ => None,
        };
        if let Some(url) = remote {
            let id = record.id;
            let http = self.http.clone();
            let events = self.events_tx.clone();
            let cancel = self.cancel.clone();
            self.runtime.spawn(async move {
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => return,
                    outcome = gallery::probe(&http, &url) => outcome,
                };
                if let Err(e) = outcome {
                    debug!("Probe of {} failed: {}", url, e);
                    emit(&events, &cancel, DashEvent::ImageUnavailable { id });
                }
            });
        }
    }

    /// Save the expanded capture, or the selected one when nothing is expanded.
    pub fn download_current(&mut self) {
        let Some(record) = self
            .state
            .expanded_image()
            .or_else(|| self.state.selected_image())
            .cloned()
        else {
            return;
        };

        if !ImageResource::classify(&record.image_data).is_downloadable() {
            self.state
                .set_notice("WARN", "Cannot download placeholder images in preview mode.");
            return;
        }

        let http = self.http.clone();
        let dir = self.download_dir.clone();
        let events = self.events_tx.clone();
        let cancel = self.cancel.clone();
        self.runtime.spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = gallery::download(&http, &record, &dir) => result,
            };
            emit(&events, &cancel, DashEvent::DownloadSettled { id: record.id, result });
        });
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use async_trait::async_trait;
    use guardkit::ImageRecord;
    use std::time::Duration;

    /// Source whose door commands always resolve to a fixed outcome.
    struct StubSource {
        door: Result<DoorDelivery, ()>,
    }

    #[async_trait]
    impl DataSource for StubSource {
        fn name(&self) -> &str {
            "stub"
        }

        fn endpoint(&self) -> &str {
            "http://stub.local"
        }

        async fn run(&self, _events: EventSender, cancel: CancellationToken) {
            cancel.cancelled().await;
        }

        async fn send_door_command(&self, _action: DoorAction) -> Result<DoorDelivery, GuardError> {
            self.door
                .map_err(|_| GuardError::Network("connection refused".to_string()))
        }

        fn refresh(&self) {}

        fn reconnect(&self) {}
    }

    fn controller(door: Result<DoorDelivery, ()>, dashboard: DashboardConfig) -> Controller {
        let config = GuardDashConfig { dashboard, ..Default::default() };
        Controller::new(&config, Arc::new(StubSource { door }), Handle::current()).unwrap()
    }

    fn live_config() -> DashboardConfig {
        DashboardConfig {
            sample_fallback: false,
            ..Default::default()
        }
    }

    fn record(id: &str) -> ImageRecord {
        ImageRecord {
            id: id.to_string(),
            image_data: format!("data:image/jpeg;base64,{}", id),
            timestamp: "2024-05-01T10:00:00Z".to_string(),
            name: None,
        }
    }

    async fn settle_next(ctrl: &mut Controller) {
        let event = tokio::time::timeout(Duration::from_secs(5), ctrl.next_event())
            .await
            .expect("event within timeout")
            .expect("channel open");
        ctrl.handle_event(event);
    }

    #[tokio::test]
    async fn test_fetch_failure_clears_loading_and_connection() {
        let mut ctrl = controller(Ok(DoorDelivery::Applied), live_config());
        ctrl.handle_event(DashEvent::RefreshStarted);
        assert!(ctrl.state().loading);

        ctrl.handle_event(DashEvent::RefreshSettled(Err(GuardError::HttpStatus(500))));
        assert!(!ctrl.state().loading);
        assert!(!ctrl.state().connected);
        assert!(ctrl.state().images.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_uses_samples_when_enabled() {
        let config = DashboardConfig { sample_fallback: true, ..Default::default() };
        let mut ctrl = controller(Ok(DoorDelivery::Applied), config);
        ctrl.handle_event(DashEvent::RefreshStarted);
        ctrl.handle_event(DashEvent::RefreshSettled(Err(GuardError::Network("down".into()))));
        assert!(!ctrl.state().loading);
        assert!(!ctrl.state().connected);
        assert_eq!(ctrl.state().images.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_success_replaces_images() {
        let mut ctrl = controller(Ok(DoorDelivery::Applied), live_config());
        ctrl.handle_event(DashEvent::RefreshSettled(Err(GuardError::HttpStatus(502))));
        ctrl.handle_event(DashEvent::RefreshStarted);
        ctrl.handle_event(DashEvent::RefreshSettled(Ok(vec![record("a"), record("b")])));
        assert!(ctrl.state().connected);
        assert!(!ctrl.state().loading);
        assert_eq!(ctrl.state().images.len(), 2);
    }

    #[tokio::test]
    async fn test_demo_toggle_is_synchronous() {
        let config = DashboardConfig { demo: true, ..Default::default() };
        let mut ctrl = controller(Err(()), config);
        ctrl.handle_event(DashEvent::Disconnected);
        assert!(ctrl.state().door_locked);

        ctrl.toggle_door();
        assert!(!ctrl.state().door_locked);
        ctrl.toggle_door();
        assert!(ctrl.state().door_locked);
    }

    #[tokio::test]
    async fn test_failed_command_flips_when_optimistic() {
        let mut ctrl = controller(Err(()), live_config());
        assert!(ctrl.state().door_locked);

        ctrl.toggle_door();
        settle_next(&mut ctrl).await;
        assert!(!ctrl.state().door_locked);
        assert!(ctrl.state().notice.is_some());
    }

    #[tokio::test]
    async fn test_failed_command_keeps_state_when_fail_closed() {
        let config = DashboardConfig {
            door_failure_policy: DoorFailurePolicy::FailClosed,
            ..live_config()
        };
        let mut ctrl = controller(Err(()), config);

        ctrl.toggle_door();
        settle_next(&mut ctrl).await;
        assert!(ctrl.state().door_locked);
    }

    #[tokio::test]
    async fn test_applied_command_flips() {
        let mut ctrl = controller(Ok(DoorDelivery::Applied), live_config());
        ctrl.toggle_door();
        settle_next(&mut ctrl).await;
        assert!(!ctrl.state().door_locked);
    }

    #[tokio::test]
    async fn test_pushed_command_waits_for_status() {
        let mut ctrl = controller(Ok(DoorDelivery::AwaitingConfirmation), live_config());
        ctrl.toggle_door();
        settle_next(&mut ctrl).await;
        assert!(ctrl.state().door_locked);
        assert_eq!(ctrl.state().pending_door, Some(false));

        ctrl.handle_event(DashEvent::DoorStatus { locked: false });
        assert!(!ctrl.state().door_locked);
        assert_eq!(ctrl.state().pending_door, None);
    }

    #[tokio::test]
    async fn test_disconnect_drops_unconfirmed_command() {
        let mut ctrl = controller(Ok(DoorDelivery::AwaitingConfirmation), live_config());
        ctrl.toggle_door();
        settle_next(&mut ctrl).await;
        assert_eq!(ctrl.state().pending_door, Some(false));

        ctrl.handle_event(DashEvent::Disconnected);
        assert_eq!(ctrl.state().pending_door, None);
        assert!(ctrl.state().door_locked);
    }

    #[tokio::test]
    async fn test_door_status_push_without_toggle() {
        let mut ctrl = controller(Ok(DoorDelivery::Applied), live_config());
        ctrl.handle_event(DashEvent::DoorStatus { locked: false });
        assert!(!ctrl.state().door_locked);
    }

    #[tokio::test]
    async fn test_connection_events() {
        let mut ctrl = controller(Ok(DoorDelivery::Applied), live_config());
        ctrl.handle_event(DashEvent::ConnectionError(GuardError::Network("reset".into())));
        assert!(!ctrl.state().connected);
        ctrl.handle_event(DashEvent::Connected);
        assert!(ctrl.state().connected);
        ctrl.handle_event(DashEvent::Disconnected);
        assert!(!ctrl.state().connected);
    }

    #[tokio::test]
    async fn test_pushed_images_are_bounded() {
        let config = DashboardConfig { max_images: 2, ..live_config() };
        let mut ctrl = controller(Ok(DoorDelivery::Applied), config);
        for id in ["1", "2", "3"] {
            ctrl.handle_event(DashEvent::ImagePushed(record(id)));
        }
        let ids: Vec<&str> = ctrl.state().images.iter().map(|img| img.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2"]);
    }

    #[tokio::test]
    async fn test_malformed_message_keeps_state() {
        let mut ctrl = controller(Ok(DoorDelivery::Applied), live_config());
        ctrl.handle_event(DashEvent::Connected);
        ctrl.handle_event(DashEvent::MalformedMessage(GuardError::Decode("eof".into())));
        assert!(ctrl.state().connected);
        assert!(ctrl.state().door_locked);
    }

    #[tokio::test]
    async fn test_placeholder_download_refused() {
        let config = DashboardConfig { demo: true, ..Default::default() };
        let mut ctrl = controller(Ok(DoorDelivery::Applied), config);
        ctrl.handle_event(DashEvent::RefreshSettled(Ok(sample_images())));

        ctrl.download_current();
        assert_eq!(
            ctrl.state().notice.as_deref(),
            Some("Cannot download placeholder images in preview mode.")
        );
    }

    #[tokio::test]
    async fn test_inline_download_settles() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            download_dir: Some(dir.path().to_path_buf()),
            ..live_config()
        };
        let mut ctrl = controller(Ok(DoorDelivery::Applied), config);
        ctrl.handle_event(DashEvent::ImagePushed(ImageRecord {
            image_data: "data:image/jpeg;base64,/9j/4A==".to_string(),
            ..record("x")
        }));

        ctrl.download_current();
        settle_next(&mut ctrl).await;
        assert!(ctrl.state().notice.as_deref().unwrap_or_default().starts_with("Saved x"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_expand_selected_toggles() {
        let mut ctrl = controller(Ok(DoorDelivery::Applied), live_config());
        ctrl.handle_event(DashEvent::RefreshSettled(Ok(vec![record("2"), record("3")])));

        ctrl.toggle_expanded_selected();
        assert_eq!(ctrl.state().expanded.as_deref(), Some("2"));
        ctrl.toggle_expanded_selected();
        assert_eq!(ctrl.state().expanded, None);

        ctrl.toggle_expanded_selected();
        ctrl.select_next();
        ctrl.toggle_expanded_selected();
        assert_eq!(ctrl.state().expanded.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_shutdown_drops_late_results() {
        let mut ctrl = controller(Err(()), live_config());
        ctrl.shutdown();
        ctrl.toggle_door();
        tokio::task::yield_now().await;
        assert_eq!(ctrl.pump(), 0);
        assert!(ctrl.state().door_locked);
    }

    #[tokio::test]
    async fn test_stalled_download_settles_with_error() {
        // Accepts the request and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((tcp, _)) = listener.accept().await {
                held.push(tcp);
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let mut config = GuardDashConfig::default();
        config.backend.request_timeout_ms = 200;
        config.dashboard = DashboardConfig {
            download_dir: Some(dir.path().to_path_buf()),
            ..live_config()
        };
        let mut ctrl =
            Controller::new(&config, Arc::new(StubSource { door: Ok(DoorDelivery::Applied) }), Handle::current())
                .unwrap();
        ctrl.handle_event(DashEvent::ImagePushed(ImageRecord {
            image_data: format!("http://{}/uploads/x.jpg", addr),
            ..record("x")
        }));

        ctrl.download_current();
        settle_next(&mut ctrl).await;
        assert!(ctrl
            .state()
            .notice
            .as_deref()
            .unwrap_or_default()
            .starts_with("Failed to download image"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
