use crate::{JobId, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Begin the recurring status poll for a freshly registered job.
    StartPolling { job_id: JobId },
    /// The poller for this job must stop and never tick again.
    StopPolling { job_id: JobId, reason: StopReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Terminal(JobStatus),
    UnknownJob,
}
