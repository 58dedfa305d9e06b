#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A job-creation request has been sent and not yet answered.
    SubmitStarted,
    /// The service accepted a submission and assigned it an id.
    JobAccepted { job_id: crate::JobId, url: String },
    /// The submission failed; `message` is what the user gets to see.
    SubmitFailed { message: String },
    /// The caller stopped waiting for a submission before it was answered.
    SubmitAbandoned,
    /// Track a job that was created elsewhere, knowing only its id.
    AttachJob { job_id: crate::JobId },
    /// A poll returned a status fragment for a job.
    StatusFetched {
        job_id: crate::JobId,
        fragment: crate::StatusFragment,
    },
    /// A single poll attempt failed. The record is left as it is; the error
    /// becomes the last error shown to the user.
    StatusFetchFailed { job_id: crate::JobId, error: String },
    /// The poller gave up on a job without reaching a terminal status.
    PollingAbandoned { job_id: crate::JobId },
}
