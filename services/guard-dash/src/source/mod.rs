// services/guard-dash/src/source/mod.rs
//
// DataSource - Strategy pattern for how captures and door state reach the dashboard.
// One implementation is picked at startup: periodic polling, a persistent
// push channel, or the offline demo dataset.
//

pub mod demo;
pub mod poll;
pub mod push;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use guardkit::{DoorAction, GuardError, ImageRecord};

use crate::config::{GuardDashConfig, SourceMode};

pub use demo::DemoSource;
pub use poll::PollSource;
pub use push::PushSource;

pub type EventSender = mpsc::UnboundedSender<DashEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<DashEvent>;

/// Everything that can change dashboard state from outside the UI loop.
#[derive(Debug)]
pub enum DashEvent {
    /// A bulk fetch is in flight
    RefreshStarted,
    /// A bulk fetch finished, either way
    RefreshSettled(Result<Vec<ImageRecord>, GuardError>),
    Connected,
    Disconnected,
    ConnectionError(GuardError),
    ImagePushed(ImageRecord),
    DoorStatus { locked: bool },
    MalformedMessage(GuardError),
    DoorCommandSettled {
        action: DoorAction,
        result: Result<DoorDelivery, GuardError>,
    },
    ImageUnavailable { id: String },
    DownloadSettled {
        id: String,
        result: Result<PathBuf, GuardError>,
    },
}

/// How far a door command got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorDelivery {
    /// The backend acknowledged and applied the command
    Applied,
    /// Sent over the push channel; the device confirms with a door-status message
    AwaitingConfirmation,
}

#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;

    /// Address shown in the connection panel
    fn endpoint(&self) -> &str;

    /// Produce events until `cancel` fires.
    async fn run(&self, events: EventSender, cancel: CancellationToken);

    async fn send_door_command(&self, action: DoorAction) -> Result<DoorDelivery, GuardError>;

    /// Ask for fresh data as soon as possible.
    fn refresh(&self);

    /// Drop the current connection, if any, and establish a new one.
    fn reconnect(&self);
}

/// Send unless the owning controller has been torn down.
pub(crate) fn emit(events: &EventSender, cancel: &CancellationToken, event: DashEvent) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    events.send(event).is_ok()
}

pub fn build_source(config: &GuardDashConfig) -> Result<Arc<dyn DataSource>, GuardError> {
    if config.dashboard.demo {
        return Ok(Arc::new(DemoSource::new()));
    }

    match config.dashboard.mode {
        SourceMode::Poll => Ok(Arc::new(PollSource::new(
            &config.backend,
            config.dashboard.poll_interval(),
        )?)),
        SourceMode::Push => Ok(Arc::new(PushSource::new(
            &config.backend.ws_url,
            config.dashboard.reconnect_delay(),
            config.backend.request_timeout(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_flag_wins_over_mode() {
        let mut config = GuardDashConfig::default();
        config.dashboard.demo = true;
        config.dashboard.mode = SourceMode::Push;
        assert_eq!(build_source(&config).unwrap().name(), "demo");
    }

    #[test]
    fn test_mode_selection() {
        let mut config = GuardDashConfig::default();
        config.dashboard.mode = SourceMode::Poll;
        let source = build_source(&config).unwrap();
        assert_eq!(source.name(), "poll");
        assert_eq!(source.endpoint(), config.backend.api_url);

        config.dashboard.mode = SourceMode::Push;
        let source = build_source(&config).unwrap();
        assert_eq!(source.name(), "push");
        assert_eq!(source.endpoint(), config.backend.ws_url);
    }

    #[test]
    fn test_emit_after_cancel_is_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        assert!(emit(&tx, &cancel, DashEvent::Connected));
        cancel.cancel();
        assert!(!emit(&tx, &cancel, DashEvent::Disconnected));
        assert!(matches!(rx.try_recv(), Ok(DashEvent::Connected)));
        assert!(rx.try_recv().is_err());
    }
}
