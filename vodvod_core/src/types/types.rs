use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single user-initiated download: where to fetch from and where to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub source_url: String,
    pub destination_path: PathBuf,
}

impl DownloadRequest {
    pub fn new(source_url: impl Into<String>, destination_path: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into(),
            destination_path: destination_path.into(),
        }
    }
}

/// Cumulative progress of one download.
///
/// `total_bytes` and `percentage` are `None` when the server did not send a
/// `content-length` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub received_bytes: u64,
    pub total_bytes: Option<u64>,
    pub percentage: Option<u8>,
}

impl ProgressEvent {
    pub fn new(received_bytes: u64, total_bytes: Option<u64>) -> Self {
        let percentage = total_bytes
            .filter(|&total| total > 0)
            .map(|total| (received_bytes.saturating_mul(100) / total).min(100) as u8);
        Self {
            received_bytes,
            total_bytes,
            percentage,
        }
    }
}

/// The last event of a download's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerminalEvent {
    Complete { final_path: PathBuf, filename: String },
    Error { message: String, retryable: bool },
    Cancelled,
}

impl TerminalEvent {
    pub fn is_complete(&self) -> bool {
        matches!(self, TerminalEvent::Complete { .. })
    }
}

impl From<&DownloadError> for TerminalEvent {
    fn from(err: &DownloadError) -> Self {
        match err {
            DownloadError::Cancelled => TerminalEvent::Cancelled,
            other => TerminalEvent::Error {
                message: other.to_string(),
                retryable: other.is_retryable(),
            },
        }
    }
}

/// Item carried by a download's event channel: zero or more `Progress`
/// followed by exactly one `Finished`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum DownloadEvent {
    Progress(ProgressEvent),
    Finished(TerminalEvent),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server responded with HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("disk error: {0}")]
    Disk(std::io::Error),

    #[error("too many redirects (limit is {0})")]
    TooManyRedirects(usize),

    #[error("no data received for {0:?}")]
    IdleTimeout(Duration),

    #[error("download cancelled")]
    Cancelled,
}

impl DownloadError {
    /// Whether issuing a fresh request for the same resource might succeed.
    ///
    /// Failures are always terminal for the request that produced them; this
    /// only informs the caller's retry decision.
    pub fn is_retryable(&self) -> bool {
        match self {
            DownloadError::Network(_) | DownloadError::IdleTimeout(_) => true,
            DownloadError::HttpStatus { status } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            DownloadError::InvalidUrl { .. }
            | DownloadError::Disk(_)
            | DownloadError::TooManyRedirects(_)
            | DownloadError::Cancelled => false,
        }
    }
}
