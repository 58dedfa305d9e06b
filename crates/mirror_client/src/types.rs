use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown when the service refuses a submission without saying why.
pub const SUBMIT_FALLBACK_MESSAGE: &str = "Failed to start download";
/// Shown when the submission request never got an answer.
pub const SUBMIT_RETRY_MESSAGE: &str = "Failed to start download. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("service rejected submission (http {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("submission request failed: {0}")]
    Transport(#[source] FetchError),
}

impl SubmitError {
    /// The single message surfaced to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Rejected { message, .. } => message.clone(),
            SubmitError::Transport(_) => SUBMIT_RETRY_MESSAGE.to_string(),
        }
    }
}

/// Downloadable outputs of a finished job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// The mirrored entry page, for viewing.
    View,
    FullArchive,
    Images,
    Html,
}

impl ArtifactKind {
    pub(crate) fn endpoint(self) -> &'static str {
        match self {
            ArtifactKind::View => "files",
            ArtifactKind::FullArchive => "download-zip",
            ArtifactKind::Images => "download-images",
            ArtifactKind::Html => "download-html",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::View => "view",
            ArtifactKind::FullArchive => "full",
            ArtifactKind::Images => "images",
            ArtifactKind::Html => "html",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "view" | "files" => Ok(ArtifactKind::View),
            "full" | "zip" => Ok(ArtifactKind::FullArchive),
            "images" => Ok(ArtifactKind::Images),
            "html" => Ok(ArtifactKind::Html),
            other => Err(format!(
                "unknown artifact kind '{other}' (expected view, full, images or html)"
            )),
        }
    }
}

/// A payload fetched from the service, ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Safe file name: the service's suggestion when present, otherwise derived.
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// One row of the service's download listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadSummary {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub wget_installed: bool,
    #[serde(default)]
    pub wget_error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
