use serde::{Deserialize, Deserializer, Serialize};

use crate::resolve_domain;

/// Opaque id assigned by the archiving service at submission time.
pub type JobId = String;

/// Message a record carries between submission and the first poll response.
pub const STARTING_MESSAGE: &str = "Starting download...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum JobStatus {
    #[default]
    Downloading,
    Completed,
    Error,
}

impl JobStatus {
    /// `completed` and `error` end a job; nothing follows them.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Downloading => "downloading",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// Maps the service's status vocabulary onto the three tracked states.
    /// Intermediate phases (`starting`, `processing`, anything unknown) count
    /// as still downloading.
    pub fn from_remote(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" => JobStatus::Completed,
            "error" | "failed" => JobStatus::Error,
            _ => JobStatus::Downloading,
        }
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        JobStatus::from_remote(&raw)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locally held view of one job, continuously merged from poll responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    /// Percentage in `0..=100`. Not guaranteed to be monotonic.
    pub progress: u8,
    pub message: String,
    /// Submitted URL. Never overwritten once set.
    pub url: Option<String>,
    /// Display host for `url`. Never overwritten once set.
    pub domain: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub files: Option<Vec<String>>,
    pub errors: Option<Vec<String>>,
    pub download_method: Option<String>,
    pub warning: Option<String>,
    pub site_map: Option<String>,
}

impl JobRecord {
    /// Record for a job this client just submitted.
    pub fn submitted(id: impl Into<JobId>, url: impl Into<String>) -> Self {
        let url = url.into();
        let domain = resolve_domain(&url);
        Self {
            url: Some(url),
            domain: Some(domain),
            ..Self::attached(id)
        }
    }

    /// Record for a job known only by id. `url` and `domain` stay unset until
    /// a poll response supplies a URL.
    pub fn attached(id: impl Into<JobId>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Downloading,
            progress: 0,
            message: STARTING_MESSAGE.to_string(),
            url: None,
            domain: None,
            started_at: None,
            completed_at: None,
            files: None,
            errors: None,
            download_method: None,
            warning: None,
            site_map: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Best label for display: the resolved domain, then the URL, then the id.
    pub fn label(&self) -> &str {
        self.domain
            .as_deref()
            .or(self.url.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Partial status as returned by a single poll. Every field may be missing;
/// keys this client does not know about are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(
        default,
        deserialize_with = "deserialize_progress",
        skip_serializing_if = "Option::is_none"
    )]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_map: Option<String>,
}

// The service reports integers, but any JSON number is accepted and clamped
// into 0..=100.
fn deserialize_progress<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.map(|value| {
        if value.is_nan() {
            0
        } else {
            value.round().clamp(0.0, 100.0) as u8
        }
    }))
}
