// guardkit/src/types.rs
//
// Data model and wire formats exchanged with the recognition backend

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::GuardError;

/// Label used when a capture carries no recognised identity.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Filename prefix the backend uses for saved face captures,
/// e.g. `detected_face_Melanka_20230515_123456.jpg`.
pub const DETECTED_FACE_PREFIX: &str = "detected_face_";

/// One captured face image as held by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Unique within the current in-memory list only
    pub id: String,
    /// Direct URL or inline `data:` URI, treated opaquely
    pub image_data: String,
    /// ISO-8601, may be unparsable
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ImageRecord {
    /// Display name, falling back to "Unknown".
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => UNKNOWN_NAME,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.display_name() != UNKNOWN_NAME
    }
}

/// Current time in the same shape the browser's `toISOString` produces.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Derive the recognised name from a capture filename.
///
/// `detected_face_<name>_<...>` yields `<name>`; anything else yields "Unknown".
pub fn name_from_filename(filename: &str) -> String {
    if filename.starts_with(DETECTED_FACE_PREFIX) {
        if let Some(name) = filename.split('_').nth(2) {
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }
    UNKNOWN_NAME.to_string()
}

// ---------------------------------------------------------------------------
// HTTP (poll) boundary
// ---------------------------------------------------------------------------

/// Response body of `GET /images`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageListResponse {
    pub images: Vec<BackendImage>,
}

/// A capture as listed by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendImage {
    pub filename: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl BackendImage {
    /// Map to an [`ImageRecord`] served from `<base_url>/uploads/<filename>`.
    pub fn into_record(self, base_url: &str) -> ImageRecord {
        let name = match self.name {
            Some(name) if !name.is_empty() => name,
            _ => name_from_filename(&self.filename),
        };
        let timestamp = match self.timestamp {
            Some(ts) if !ts.is_empty() => ts,
            _ => now_timestamp(),
        };

        ImageRecord {
            image_data: format!("{}/uploads/{}", base_url.trim_end_matches('/'), self.filename),
            id: self.filename,
            timestamp,
            name: Some(name),
        }
    }
}

impl ImageListResponse {
    pub fn into_records(self, base_url: &str) -> Vec<ImageRecord> {
        self.images
            .into_iter()
            .map(|img| img.into_record(base_url))
            .collect()
    }
}

/// Requested lock transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorAction {
    Lock,
    Unlock,
}

impl DoorAction {
    /// The action that inverts the given lock state.
    pub fn toggle_from(locked: bool) -> Self {
        if locked {
            DoorAction::Unlock
        } else {
            DoorAction::Lock
        }
    }

    /// Lock state once this action has been applied.
    pub fn target_locked(self) -> bool {
        matches!(self, DoorAction::Lock)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DoorAction::Lock => "lock",
            DoorAction::Unlock => "unlock",
        }
    }
}

impl std::fmt::Display for DoorAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /door-control`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorControlRequest {
    pub action: DoorAction,
}

// ---------------------------------------------------------------------------
// WebSocket (push) boundary
// ---------------------------------------------------------------------------

/// Messages pushed by the device over the persistent channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "image")]
    Image {
        #[serde(rename = "imageData")]
        image_data: String,
        #[serde(default)]
        timestamp: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
    #[serde(rename = "doorStatus", alias = "door-status")]
    DoorStatus { locked: bool },
}

impl InboundMessage {
    pub fn decode(text: &str) -> Result<Self, GuardError> {
        serde_json::from_str(text).map_err(|e| GuardError::Decode(format!("inbound message: {}", e)))
    }
}

/// Build a record for an image pushed over the channel; ids are generated locally.
pub fn pushed_record(image_data: String, timestamp: Option<String>, name: Option<String>) -> ImageRecord {
    ImageRecord {
        id: Uuid::new_v4().to_string(),
        image_data,
        timestamp: timestamp.filter(|ts| !ts.is_empty()).unwrap_or_else(now_timestamp),
        name: Some(name.filter(|n| !n.is_empty()).unwrap_or_else(|| UNKNOWN_NAME.to_string())),
    }
}

/// Messages sent to the device over the persistent channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    #[serde(rename = "doorControl")]
    DoorControl { action: DoorAction },
}

impl OutboundMessage {
    pub fn encode(&self) -> Result<String, GuardError> {
        Ok(serde_json::to_string(self)?)
    }
}
