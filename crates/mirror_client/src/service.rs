use std::time::Duration;

use futures_util::StreamExt;
use mirror_core::{resolve_domain, JobId, StatusFragment};
use mirror_logging::{mirror_debug, mirror_warn};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{
    fallback_filename, filename_from_disposition, Artifact, ArtifactKind, DownloadSummary,
    FailureKind, FetchError, HealthReport, SubmitError, SUBMIT_FALLBACK_MESSAGE,
};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001";

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Upper bound for a single downloaded artifact.
    pub max_artifact_bytes: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_artifact_bytes: 512 * 1024 * 1024,
        }
    }
}

/// The two calls job tracking depends on. Each is a single attempt; retrying
/// is the poller's business.
#[async_trait::async_trait]
pub trait ArchiveService: Send + Sync {
    /// Creates a job for `url` and returns the id the service assigned.
    async fn submit(&self, url: &str) -> Result<JobId, SubmitError>;

    /// Current, possibly partial, status of one job.
    async fn fetch_status(&self, job_id: &str) -> Result<StatusFragment, FetchError>;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    download_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn describe(&self) -> Option<String> {
        match (&self.error, &self.message) {
            (Some(error), Some(detail)) if !detail.is_empty() => Some(format!("{error}: {detail}")),
            (Some(error), _) => Some(error.clone()),
            (None, Some(detail)) => Some(detail.clone()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SiteMapBody {
    content: String,
}

/// HTTP client for the archiving service.
#[derive(Debug, Clone)]
pub struct ReqwestArchiveService {
    settings: ServiceSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestArchiveService {
    pub fn new(settings: ServiceSettings) -> Result<Self, FetchError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as an api base", settings.base_url),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// `{base}/api/{segments...}`, keeping any path prefix of the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::new(FailureKind::InvalidUrl, "api base has no path"))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, FetchError> {
        let url = self.endpoint(segments)?;
        mirror_debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        decode_json(response).await
    }

    /// Fetches one of a finished job's artifacts.
    pub async fn fetch_artifact(
        &self,
        job_id: &str,
        kind: ArtifactKind,
    ) -> Result<Artifact, FetchError> {
        let url = self.endpoint(&[kind.endpoint(), job_id])?;
        mirror_debug!("GET {} ({})", url, kind);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        self.read_artifact(response, job_id, Some(kind)).await
    }

    /// Has the service mirror `url` and return the archive in the same
    /// response, without creating a tracked job.
    pub async fn download_in_memory(&self, url: &str) -> Result<Artifact, FetchError> {
        let endpoint = self.endpoint(&["download-in-memory"])?;
        let body = serde_json::json!({ "url": url });
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        self.read_artifact(response, &resolve_domain(url), None).await
    }

    pub async fn list_downloads(&self) -> Result<Vec<DownloadSummary>, FetchError> {
        self.get_json(&["downloads"]).await
    }

    /// Markdown site map generated for a completed job.
    pub async fn site_map(&self, job_id: &str) -> Result<String, FetchError> {
        let body: SiteMapBody = self.get_json(&["sitemap", job_id]).await?;
        Ok(body.content)
    }

    pub async fn health(&self) -> Result<HealthReport, FetchError> {
        self.get_json(&["health"]).await
    }

    async fn read_artifact(
        &self,
        response: Response,
        stem: &str,
        kind: Option<ArtifactKind>,
    ) -> Result<Artifact, FetchError> {
        let max_bytes = self.settings.max_artifact_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "artifact too large",
                ));
            }
        }

        let content_type = header_value(&response, CONTENT_TYPE);
        let filename = header_value(&response, CONTENT_DISPOSITION)
            .as_deref()
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| fallback_filename(stem, kind));

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "artifact too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(Artifact {
            filename,
            content_type,
            bytes,
        })
    }
}

#[async_trait::async_trait]
impl ArchiveService for ReqwestArchiveService {
    async fn submit(&self, url: &str) -> Result<JobId, SubmitError> {
        let endpoint = self.endpoint(&["download"]).map_err(SubmitError::Transport)?;
        let body = serde_json::json!({ "url": url });
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|err| SubmitError::Transport(map_reqwest_error(err)))?;

        let status = response.status();
        if !status.is_success() {
            let message = read_error_body(response)
                .await
                .unwrap_or_else(|| SUBMIT_FALLBACK_MESSAGE.to_string());
            mirror_warn!("Submission of {} rejected: {} {}", url, status, message);
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let accepted: SubmitResponse = decode_json(response)
            .await
            .map_err(SubmitError::Transport)?;
        Ok(accepted.download_id)
    }

    async fn fetch_status(&self, job_id: &str) -> Result<StatusFragment, FetchError> {
        self.get_json(&["status", job_id]).await
    }
}

async fn ensure_success(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = read_error_body(response)
        .await
        .unwrap_or_else(|| status.to_string());
    Err(FetchError::new(
        FailureKind::HttpStatus(status.as_u16()),
        message,
    ))
}

async fn read_error_body(response: Response) -> Option<String> {
    let bytes = response.bytes().await.ok()?;
    serde_json::from_slice::<ErrorBody>(&bytes)
        .ok()
        .and_then(|body| body.describe())
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes).map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))
}

fn header_value(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return FetchError::new(FailureKind::Decode, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
