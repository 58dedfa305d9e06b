#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use mirror_client::{ArchiveService, FailureKind, FetchError, SubmitError};
use mirror_core::{JobId, JobStatus, StatusFragment};
use tokio::time::Instant;

type ScriptedStatus = (Duration, Result<StatusFragment, FetchError>);

/// In-process stand-in for the archiving service. Submissions and status
/// responses are played back in order; an exhausted status script answers
/// with an empty fragment.
#[derive(Default)]
pub struct ScriptedService {
    submissions: Mutex<VecDeque<Result<JobId, SubmitError>>>,
    statuses: Mutex<HashMap<JobId, VecDeque<ScriptedStatus>>>,
    calls: Mutex<Vec<(JobId, Instant)>>,
    submit_delay: Option<Duration>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submit_delay(delay: Duration) -> Self {
        Self {
            submit_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn accept(self, job_id: &str) -> Self {
        self.submissions
            .lock()
            .unwrap()
            .push_back(Ok(job_id.to_string()));
        self
    }

    pub fn reject(self, err: SubmitError) -> Self {
        self.submissions.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn respond(self, job_id: &str, response: Result<StatusFragment, FetchError>) -> Self {
        self.respond_after(job_id, Duration::ZERO, response)
    }

    /// Like `respond`, but the fetch takes `delay` before answering.
    pub fn respond_after(
        self,
        job_id: &str,
        delay: Duration,
        response: Result<StatusFragment, FetchError>,
    ) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .entry(job_id.to_string())
            .or_default()
            .push_back((delay, response));
        self
    }

    /// Instants at which `job_id` was polled.
    pub fn polls(&self, job_id: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == job_id)
            .map(|(_, at)| *at)
            .collect()
    }
}

#[async_trait::async_trait]
impl ArchiveService for ScriptedService {
    async fn submit(&self, _url: &str) -> Result<JobId, SubmitError> {
        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }
        self.submissions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SubmitError::Transport(network_error())))
    }

    async fn fetch_status(&self, job_id: &str) -> Result<StatusFragment, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((job_id.to_string(), Instant::now()));
        let scripted = self
            .statuses
            .lock()
            .unwrap()
            .get_mut(job_id)
            .and_then(VecDeque::pop_front);
        let (delay, response) =
            scripted.unwrap_or_else(|| (Duration::ZERO, Ok(StatusFragment::default())));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        response
    }
}

pub fn network_error() -> FetchError {
    FetchError::new(FailureKind::Network, "connection refused")
}

pub fn downloading(progress: u8, message: &str) -> StatusFragment {
    StatusFragment {
        status: Some(JobStatus::Downloading),
        progress: Some(progress),
        message: Some(message.to_string()),
        ..StatusFragment::default()
    }
}

pub fn completed(files: &[&str]) -> StatusFragment {
    StatusFragment {
        status: Some(JobStatus::Completed),
        files: Some(files.iter().map(|f| f.to_string()).collect()),
        completed_at: Some("2024-01-01T00:00:00Z".to_string()),
        ..StatusFragment::default()
    }
}

pub fn failed(errors: &[&str]) -> StatusFragment {
    StatusFragment {
        status: Some(JobStatus::Error),
        errors: Some(errors.iter().map(|e| e.to_string()).collect()),
        ..StatusFragment::default()
    }
}

/// Asserts that consecutive instants are at least `min_gap` apart.
pub fn assert_spacing(instants: &[Instant], min_gap: Duration) {
    for pair in instants.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= min_gap, "polls only {gap:?} apart, expected >= {min_gap:?}");
    }
}
