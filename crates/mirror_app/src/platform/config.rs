use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use mirror_client::{PollSettings, RetryPolicy, ServiceSettings, DEFAULT_API_BASE_URL};
use mirror_logging::mirror_info;
use serde::Deserialize;

use super::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "sitemirror.ron";

/// Settings read from `sitemirror.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_artifact_mb: u64,
    pub retry: RetryPolicy,
    pub output_dir: PathBuf,
    pub log_destination: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval_ms: 1000,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            max_artifact_mb: 512,
            retry: RetryPolicy::StopOnFailure,
            output_dir: PathBuf::from("downloads"),
            log_destination: LogDestination::Terminal,
        }
    }
}

impl AppConfig {
    /// Loads `explicit` if given (it must exist), else `./sitemirror.ron` if
    /// present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::parse(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        mirror_info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn with_overrides(mut self, api_url: Option<String>, output_dir: Option<PathBuf>) -> Self {
        if let Some(api_url) = api_url {
            self.api_base_url = api_url;
        }
        if let Some(output_dir) = output_dir {
            self.output_dir = output_dir;
        }
        self
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            base_url: self.api_base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_artifact_bytes: self.max_artifact_mb.saturating_mul(1024 * 1024),
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            // A zero interval would spin; tokio also rejects it.
            interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            retry: self.retry,
        }
    }
}
