//! Sitemirror client: talks to the archiving service, polls job status and
//! keeps the shared job registry up to date.
mod disposition;
mod persist;
mod poller;
mod retry;
mod service;
mod shared;
mod tracker;
mod types;

pub use disposition::{fallback_filename, filename_from_disposition, sanitize_filename};
pub use persist::{ArtifactStore, PersistError};
pub use poller::{spawn_poller, PollHandle, PollOutcome, PollSettings, DEFAULT_POLL_INTERVAL};
pub use retry::{RetryDecision, RetryPolicy};
pub use service::{ArchiveService, ReqwestArchiveService, ServiceSettings, DEFAULT_API_BASE_URL};
pub use shared::SharedState;
pub use tracker::Tracker;
pub use types::{
    Artifact, ArtifactKind, DownloadSummary, FailureKind, FetchError, HealthReport, SubmitError,
    SUBMIT_FALLBACK_MESSAGE, SUBMIT_RETRY_MESSAGE,
};
