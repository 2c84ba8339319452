// services/guard-dash/src/gallery.rs
//
// Capture gallery helpers: timestamp labels, resource handling, downloads

use base64::Engine;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use guardkit::{GuardError, ImageRecord};

pub const UNKNOWN_DATE: &str = "Unknown date";
pub const UNKNOWN_TIME: &str = "Unknown time";

/// Shown in place of a capture whose resource failed to load.
pub const FALLBACK_IMAGE: &str = "/error-loading-abstract.png";
/// Shown when a capture carries no image data at all.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Parse an ISO-8601 timestamp; naive values are taken as UTC.
pub fn parse_timestamp(timestamp: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.with_timezone(&Local));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(timestamp, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive).with_timezone(&Local))
}

pub fn format_date(timestamp: &str) -> String {
    match parse_timestamp(timestamp) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => {
            debug!("Invalid date format: {:?}", timestamp);
            UNKNOWN_DATE.to_string()
        }
    }
}

pub fn format_time(timestamp: &str) -> String {
    match parse_timestamp(timestamp) {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => {
            debug!("Invalid time format: {:?}", timestamp);
            UNKNOWN_TIME.to_string()
        }
    }
}

/// Where a capture's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageResource<'a> {
    Remote(&'a str),
    Inline { mime: &'a str, payload: &'a str },
    /// Bundled sample or placeholder artwork, nothing to fetch
    Placeholder,
}

impl<'a> ImageResource<'a> {
    pub fn classify(image_data: &'a str) -> Self {
        if image_data.starts_with("http://") || image_data.starts_with("https://") {
            return ImageResource::Remote(image_data);
        }

        if let Some(rest) = image_data.strip_prefix("data:") {
            if let Some((meta, payload)) = rest.split_once(',') {
                if let Some(mime) = meta.strip_suffix(";base64") {
                    return ImageResource::Inline { mime, payload };
                }
            }
        }

        ImageResource::Placeholder
    }

    pub fn is_downloadable(&self) -> bool {
        !matches!(self, ImageResource::Placeholder)
    }
}

/// Source to display for a record, honouring load failures.
pub fn display_source(record: &ImageRecord, unavailable: bool) -> &str {
    if unavailable {
        FALLBACK_IMAGE
    } else if record.image_data.is_empty() {
        PLACEHOLDER_IMAGE
    } else {
        &record.image_data
    }
}

/// `face-capture-<ISO timestamp>.jpg`, with `:` made filesystem-safe.
pub fn download_file_name(record: &ImageRecord) -> String {
    let stamp = match parse_timestamp(&record.timestamp) {
        Some(dt) => dt
            .with_timezone(&Utc)
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string(),
        None => format!("unknown-{}", record.id),
    };
    let stamp: String = stamp
        .chars()
        .map(|c| if c == ':' || c == '/' || c == '\\' { '-' } else { c })
        .collect();
    format!("face-capture-{}.jpg", stamp)
}

/// Check that a remote capture can still be loaded.
pub async fn probe(client: &reqwest::Client, url: &str) -> Result<(), GuardError> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(GuardError::HttpStatus(response.status().as_u16()));
    }
    Ok(())
}

/// Save a capture into `dir`, returning the written path.
pub async fn download(
    client: &reqwest::Client,
    record: &ImageRecord,
    dir: &Path,
) -> Result<PathBuf, GuardError> {
    let bytes = match ImageResource::classify(&record.image_data) {
        ImageResource::Placeholder => {
            return Err(GuardError::Unsupported(
                "Cannot download placeholder images in preview mode.".to_string(),
            ))
        }
        ImageResource::Inline { mime, payload } => {
            debug!("Decoding inline {} capture {}", mime, record.id);
            base64::engine::general_purpose::STANDARD.decode(payload.trim())?
        }
        ImageResource::Remote(url) => {
            let response = client.get(url).send().await?;
            if !response.status().is_success() {
                return Err(GuardError::HttpStatus(response.status().as_u16()));
            }
            response.bytes().await?.to_vec()
        }
    };

    tokio::fs::create_dir_all(dir).await?;
    let path = write_new(dir, &download_file_name(record), &bytes).await?;
    info!("Saved {} ({} bytes) to {}", record.id, bytes.len(), path.display());
    Ok(path)
}

/// Write `bytes` under `name`, or `<stem>-<n>.<ext>` when earlier captures already took it.
async fn write_new(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, GuardError> {
    let (stem, ext) = name.rsplit_once('.').unwrap_or((name, "jpg"));

    for attempt in 0u32.. {
        let path = if attempt == 0 {
            dir.join(name)
        } else {
            dir.join(format!("{}-{}.{}", stem, attempt, ext))
        };

        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(mut file) => {
                file.write_all(bytes).await?;
                file.flush().await?;
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(GuardError::Unsupported(format!("no free file name for {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(image_data: &str, timestamp: &str) -> ImageRecord {
        ImageRecord {
            id: "7".to_string(),
            image_data: image_data.to_string(),
            timestamp: timestamp.to_string(),
            name: Some("Melanka".to_string()),
        }
    }

    #[test]
    fn test_unparsable_timestamp_labels() {
        assert_eq!(format_date("yesterday-ish"), "Unknown date");
        assert_eq!(format_time("yesterday-ish"), "Unknown time");
        assert_eq!(format_date(""), "Unknown date");
    }

    #[test]
    fn test_parse_variants() {
        assert!(parse_timestamp("2023-01-01T12:00:00Z").is_some());
        assert!(parse_timestamp("2023-01-01T12:00:00.123+02:00").is_some());
        assert!(parse_timestamp("2023-01-01T12:00:00.123456").is_some());
        assert!(parse_timestamp("2023-01-01 12:00:00").is_some());
        assert!(parse_timestamp("2023-13-01T12:00:00Z").is_none());
    }

    #[test]
    fn test_labels_match_local_time() {
        let ts = "2023-06-15T12:30:45Z";
        let local = DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Local);
        assert_eq!(format_date(ts), local.format("%Y-%m-%d").to_string());
        assert_eq!(format_time(ts), local.format("%H:%M:%S").to_string());
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            ImageResource::classify("http://door.local:5000/uploads/a.jpg"),
            ImageResource::Remote("http://door.local:5000/uploads/a.jpg")
        );
        assert_eq!(
            ImageResource::classify("data:image/jpeg;base64,AAEC"),
            ImageResource::Inline { mime: "image/jpeg", payload: "AAEC" }
        );
        assert_eq!(ImageResource::classify("/placeholder.svg"), ImageResource::Placeholder);
        assert_eq!(ImageResource::classify("/man-face.png"), ImageResource::Placeholder);
        assert!(!ImageResource::classify("").is_downloadable());
    }

    #[test]
    fn test_display_source_fallbacks() {
        let rec = record("http://door.local/uploads/a.jpg", "2023-01-01T00:00:00Z");
        assert_eq!(display_source(&rec, false), "http://door.local/uploads/a.jpg");
        assert_eq!(display_source(&rec, true), FALLBACK_IMAGE);
        assert_eq!(display_source(&record("", "x"), false), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_download_file_name() {
        let rec = record("data:image/jpeg;base64,AA==", "2023-01-01T12:00:00Z");
        assert_eq!(download_file_name(&rec), "face-capture-2023-01-01T12-00-00.000Z.jpg");

        let rec = record("data:image/jpeg;base64,AA==", "garbage");
        assert_eq!(download_file_name(&rec), "face-capture-unknown-7.jpg");
    }

    #[tokio::test]
    async fn test_download_inline_payload() {
        let dir = tempfile::tempdir().unwrap();
        let client = reqwest::Client::new();
        let rec = record("data:image/png;base64,iVBORw0KGgo=", "2023-01-01T12:00:00Z");

        let path = download(&client, &rec, dir.path()).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG\r\n\x1a\n");
        assert!(path.starts_with(dir.path()));
    }

    #[tokio::test]
    async fn test_repeat_download_keeps_earlier_file() {
        let dir = tempfile::tempdir().unwrap();
        let client = reqwest::Client::new();
        let first = record("data:image/png;base64,iVBORw0KGgo=", "2023-01-01T12:00:00Z");
        let second = record("data:image/jpeg;base64,/9j/4A==", "2023-01-01T12:00:00Z");

        let first_path = download(&client, &first, dir.path()).await.unwrap();
        let second_path = download(&client, &second, dir.path()).await.unwrap();

        assert_ne!(first_path, second_path);
        assert_eq!(
            second_path.file_name().unwrap(),
            "face-capture-2023-01-01T12-00-00.000Z-1.jpg"
        );
        assert_eq!(std::fs::read(&first_path).unwrap(), b"\x89PNG\r\n\x1a\n");
        assert_eq!(std::fs::read(&second_path).unwrap(), b"\xff\xd8\xff\xe0");
    }

    #[tokio::test]
    async fn test_download_placeholder_refused() {
        let dir = tempfile::tempdir().unwrap();
        let client = reqwest::Client::new();
        let rec = record("/diverse-person-faces.png", "2023-01-01T12:00:00Z");

        let err = download(&client, &rec, dir.path()).await.unwrap_err();
        assert!(matches!(err, GuardError::Unsupported(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
