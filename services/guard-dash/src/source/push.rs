// services/guard-dash/src/source/push.rs
//
// Persistent WebSocket subscription to the door device.
// Every disconnect schedules exactly one delayed reconnect; a manual
// reconnect skips the delay. Manual reconnects only act on a live session
// or a pending retry, never on a handshake already in flight.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use guardkit::types::{pushed_record, InboundMessage, OutboundMessage};
use guardkit::{DoorAction, GuardError};

use super::{emit, DashEvent, DataSource, DoorDelivery, EventSender};

/// Why a live connection ended.
enum SessionEnd {
    Cancelled,
    Disconnected,
    ManualReconnect,
}

pub struct PushSource {
    url: String,
    retry_delay: Duration,
    /// Upper bound on the TCP connect plus WebSocket upgrade
    connect_timeout: Duration,
    /// Present only while the channel is open
    outbound: Mutex<Option<mpsc::UnboundedSender<OutboundMessage>>>,
    reconnect: Notify,
}

impl PushSource {
    pub fn new(url: &str, retry_delay: Duration, connect_timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            retry_delay,
            connect_timeout,
            outbound: Mutex::new(None),
            reconnect: Notify::new(),
        }
    }

    /// Translate one inbound text frame into a dashboard event.
    pub fn decode_frame(text: &str) -> DashEvent {
        match InboundMessage::decode(text) {
            Ok(InboundMessage::Image { image_data, timestamp, name }) => {
                DashEvent::ImagePushed(pushed_record(image_data, timestamp, name))
            }
            Ok(InboundMessage::DoorStatus { locked }) => DashEvent::DoorStatus { locked },
            Err(e) => DashEvent::MalformedMessage(e),
        }
    }

    async fn session(&self, events: &EventSender, cancel: &CancellationToken) -> SessionEnd {
        let connect = tokio::select! {
            _ = cancel.cancelled() => return SessionEnd::Cancelled,
            connect = tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str())) => connect,
        };

        let connect = match connect {
            Ok(result) => result.map_err(GuardError::from),
            Err(_elapsed) => Err(GuardError::Timeout(self.connect_timeout)),
        };

        let stream = match connect {
            Ok((stream, _response)) => stream,
            Err(err) => {
                warn!("WebSocket connection to {} failed: {}", self.url, err);
                // An error is always followed by a close, which drives the retry
                emit(events, cancel, DashEvent::ConnectionError(err));
                return SessionEnd::Disconnected;
            }
        };

        info!("WebSocket connected to {}", self.url);
        // Registered before anyone can observe the session as live
        let reconnect = self.reconnect.notified();
        tokio::pin!(reconnect);

        let (mut sink, mut stream) = stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
        *self.outbound.lock() = Some(out_tx);
        emit(events, cancel, DashEvent::Connected);

        let end = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    break SessionEnd::Cancelled;
                }
                _ = &mut reconnect => {
                    info!("Manual reconnect requested, closing {}", self.url);
                    let _ = sink.send(Message::Close(None)).await;
                    break SessionEnd::ManualReconnect;
                }
                Some(outbound) = out_rx.recv() => {
                    match outbound.encode() {
                        Ok(text) => {
                            if let Err(e) = sink.send(Message::Text(text)).await {
                                let err = GuardError::from(e);
                                error!("Failed to send {:?}: {}", outbound, err);
                                emit(events, cancel, DashEvent::ConnectionError(err));
                                break SessionEnd::Disconnected;
                            }
                        }
                        Err(e) => error!("Failed to encode {:?}: {}", outbound, e),
                    }
                }
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        let event = Self::decode_frame(&text);
                        if let DashEvent::MalformedMessage(e) = &event {
                            warn!("Dropping malformed message: {}", e);
                        }
                        emit(events, cancel, event);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("WebSocket {} closed by peer", self.url);
                        break SessionEnd::Disconnected;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let err = GuardError::from(e);
                        warn!("WebSocket error on {}: {}", self.url, err);
                        emit(events, cancel, DashEvent::ConnectionError(err));
                        break SessionEnd::Disconnected;
                    }
                },
            }
        };

        *self.outbound.lock() = None;
        end
    }
}

#[async_trait]
impl DataSource for PushSource {
    fn name(&self) -> &str {
        "push"
    }

    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn run(&self, events: EventSender, cancel: CancellationToken) {
        loop {
            let end = self.session(&events, &cancel).await;
            if matches!(end, SessionEnd::Cancelled) || !emit(&events, &cancel, DashEvent::Disconnected) {
                break;
            }

            if matches!(end, SessionEnd::ManualReconnect) {
                continue;
            }

            debug!("Reconnecting to {} in {:?}", self.url, self.retry_delay);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.retry_delay) => {}
                _ = self.reconnect.notified() => {}
            }
        }

        *self.outbound.lock() = None;
        debug!("Push loop for {} stopped", self.url);
    }

    async fn send_door_command(&self, action: DoorAction) -> Result<DoorDelivery, GuardError> {
        let sender = self
            .outbound
            .lock()
            .clone()
            .ok_or_else(|| GuardError::ChannelClosed(format!("{} is not open", self.url)))?;

        sender
            .send(OutboundMessage::DoorControl { action })
            .map_err(|_| GuardError::ChannelClosed(format!("{} closed while sending", self.url)))?;

        info!("Door command '{}' sent to {}", action, self.url);
        Ok(DoorDelivery::AwaitingConfirmation)
    }

    fn refresh(&self) {}

    fn reconnect(&self) {
        // No stored permit: a request with nobody waiting is dropped
        self.reconnect.notify_waiters();
    }
}
