use std::sync::Arc;
use std::time::Duration;

use mirror_core::{Effect, JobId, JobStatus, Msg, StopReason};
use mirror_logging::{mirror_debug, mirror_info, mirror_trace, mirror_warn, short_id};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{ArchiveService, FetchError, RetryDecision, RetryPolicy, SharedState};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Minimum spacing between two status fetches for the same job.
    pub interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            retry: RetryPolicy::default(),
        }
    }
}

/// Why a poller stopped. Every variant is final; pollers never restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Terminal(JobStatus),
    FetchFailed { attempts: u32, error: FetchError },
    UnknownJob,
    Cancelled,
}

/// Cancellation handle for one job's poller.
#[derive(Debug)]
pub struct PollHandle {
    job_id: JobId,
    cancel: CancellationToken,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Stops the poller before its next fetch. Used at shutdown only.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once the poller has stopped on its own or after `cancel`.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> PollOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                mirror_warn!("Poller for job {} ended abnormally: {}", self.job_id, err);
                PollOutcome::Cancelled
            }
        }
    }
}

/// Starts polling `job_id` every `settings.interval`, first tick one interval
/// from now. The poller merges each fragment into `state` and stops by itself
/// once the job is terminal or the retry policy gives up.
pub fn spawn_poller(
    job_id: JobId,
    service: Arc<dyn ArchiveService>,
    state: SharedState,
    settings: PollSettings,
) -> PollHandle {
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run_poller(
        job_id.clone(),
        service,
        state,
        settings,
        cancel.clone(),
    ));
    PollHandle {
        job_id,
        cancel,
        task,
    }
}

async fn run_poller(
    job_id: JobId,
    service: Arc<dyn ArchiveService>,
    state: SharedState,
    settings: PollSettings,
    cancel: CancellationToken,
) -> PollOutcome {
    let mut ticker = time::interval_at(Instant::now() + settings.interval, settings.interval);
    // A slow fetch pushes the schedule back instead of causing a burst.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;
    let mut consecutive_failures: u32 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return cancelled(&job_id),
            _ = ticker.tick() => {}
        }
        tick += 1;
        mirror_debug!("poll job={} tick={}", short_id(&job_id), tick);

        let fetched = tokio::select! {
            _ = cancel.cancelled() => return cancelled(&job_id),
            fetched = service.fetch_status(&job_id) => fetched,
        };

        match fetched {
            Ok(fragment) => {
                mirror_trace!("job={} fragment={:?}", short_id(&job_id), fragment);
                consecutive_failures = 0;
                let effects = state.dispatch(Msg::StatusFetched {
                    job_id: job_id.clone(),
                    fragment,
                });
                if let Some(reason) = stop_reason(&effects, &job_id) {
                    return match reason {
                        StopReason::Terminal(status) => {
                            mirror_info!("Job {} finished: {}", short_id(&job_id), status);
                            PollOutcome::Terminal(status)
                        }
                        StopReason::UnknownJob => {
                            mirror_warn!("Job {} is not in the registry; polling stopped", job_id);
                            PollOutcome::UnknownJob
                        }
                    };
                }
            }
            Err(error) => {
                consecutive_failures += 1;
                state.dispatch(Msg::StatusFetchFailed {
                    job_id: job_id.clone(),
                    error: error.to_string(),
                });
                match settings.retry.after_failure(consecutive_failures) {
                    RetryDecision::Stop => {
                        mirror_warn!(
                            "Status poll for job {} failed ({}); giving up after {} attempt(s)",
                            short_id(&job_id),
                            error,
                            consecutive_failures
                        );
                        state.dispatch(Msg::PollingAbandoned {
                            job_id: job_id.clone(),
                        });
                        return PollOutcome::FetchFailed {
                            attempts: consecutive_failures,
                            error,
                        };
                    }
                    RetryDecision::RetryAfter(delay) => {
                        mirror_debug!(
                            "Status poll for job {} failed ({}); retrying in {:?}",
                            short_id(&job_id),
                            error,
                            delay
                        );
                        tokio::select! {
                            _ = cancel.cancelled() => return cancelled(&job_id),
                            _ = time::sleep(delay) => {}
                        }
                    }
                }
            }
        }
    }
}

fn stop_reason(effects: &[Effect], job_id: &str) -> Option<StopReason> {
    effects.iter().find_map(|effect| match effect {
        Effect::StopPolling { job_id: id, reason } if id == job_id => Some(*reason),
        _ => None,
    })
}

fn cancelled(job_id: &str) -> PollOutcome {
    mirror_debug!("Poller for job {} cancelled", short_id(job_id));
    PollOutcome::Cancelled
}
