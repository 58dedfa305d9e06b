use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mirror_core::{AppViewModel, Effect, JobId, JobRecord, Msg};
use mirror_logging::{mirror_info, mirror_warn, short_id};

use crate::{spawn_poller, ArchiveService, PollHandle, PollOutcome, PollSettings, SharedState, SubmitError};

/// Submits jobs, registers them and runs one poller per job.
///
/// Must be used from within a tokio runtime; pollers are spawned as tasks.
pub struct Tracker {
    service: Arc<dyn ArchiveService>,
    state: SharedState,
    settings: PollSettings,
    pollers: Mutex<HashMap<JobId, PollHandle>>,
}

impl Tracker {
    pub fn new(service: Arc<dyn ArchiveService>, settings: PollSettings) -> Self {
        Self::with_state(service, SharedState::new(), settings)
    }

    /// Tracker writing into an existing registry, e.g. one a renderer already holds.
    pub fn with_state(
        service: Arc<dyn ArchiveService>,
        state: SharedState,
        settings: PollSettings,
    ) -> Self {
        Self {
            service,
            state,
            settings,
            pollers: Mutex::new(HashMap::new()),
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// True while a submission is waiting for the service to answer.
    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn job(&self, job_id: &str) -> Option<JobRecord> {
        self.state.job(job_id)
    }

    /// Submits `url` (already trimmed, non-empty) and starts tracking the job.
    ///
    /// On failure nothing is registered and no poller runs; the error's
    /// `user_message` is what to show. Submissions are never retried.
    pub async fn start_job(&self, url: &str) -> Result<JobId, SubmitError> {
        self.state.dispatch(Msg::SubmitStarted);
        let pending = PendingSubmission::new(&self.state);
        let answer = self.service.submit(url).await;
        pending.answered();
        match answer {
            Ok(job_id) => {
                mirror_info!("Submitted {} as job {}", url, job_id);
                let effects = self.state.dispatch(Msg::JobAccepted {
                    job_id: job_id.clone(),
                    url: url.to_string(),
                });
                self.run_effects(effects);
                Ok(job_id)
            }
            Err(err) => {
                mirror_warn!("Submission of {} failed: {}", url, err);
                self.state.dispatch(Msg::SubmitFailed {
                    message: err.user_message(),
                });
                Err(err)
            }
        }
    }

    /// Tracks a job created elsewhere. Returns false if it is already tracked.
    pub fn attach(&self, job_id: &str) -> bool {
        let effects = self.state.dispatch(Msg::AttachJob {
            job_id: job_id.to_string(),
        });
        let started = !effects.is_empty();
        self.run_effects(effects);
        started
    }

    /// Number of pollers that have not stopped yet.
    pub fn active_pollers(&self) -> usize {
        self.pollers()
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Waits until every poller has stopped and returns how each one ended.
    pub async fn wait_idle(&self) -> Vec<(JobId, PollOutcome)> {
        let mut outcomes = Vec::new();
        loop {
            let drained: Vec<PollHandle> = self.pollers().drain().map(|(_, h)| h).collect();
            if drained.is_empty() {
                return outcomes;
            }
            for handle in drained {
                let job_id = handle.job_id().to_string();
                outcomes.push((job_id, handle.join().await));
            }
        }
    }

    /// Cancels all pollers still running. Records keep their last state.
    pub fn shutdown(&self) {
        for handle in self.pollers().values() {
            if !handle.is_finished() {
                handle.cancel();
            }
        }
    }

    fn run_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartPolling { job_id } => {
                    let mut pollers = self.pollers();
                    if pollers.contains_key(&job_id) {
                        continue;
                    }
                    mirror_info!("Polling job {}", short_id(&job_id));
                    let handle = spawn_poller(
                        job_id.clone(),
                        self.service.clone(),
                        self.state.clone(),
                        self.settings,
                    );
                    pollers.insert(job_id, handle);
                }
                // Pollers stop themselves when the core says so.
                Effect::StopPolling { .. } => {}
            }
        }
    }

    fn pollers(&self) -> MutexGuard<'_, HashMap<JobId, PollHandle>> {
        self.pollers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the busy flag if a `start_job` future is dropped while the service
/// has not answered yet.
struct PendingSubmission<'a> {
    state: &'a SharedState,
    answered: bool,
}

impl<'a> PendingSubmission<'a> {
    fn new(state: &'a SharedState) -> Self {
        Self {
            state,
            answered: false,
        }
    }

    fn answered(mut self) {
        self.answered = true;
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if !self.answered {
            mirror_warn!("Submission dropped before the service answered");
            self.state.dispatch(Msg::SubmitAbandoned);
        }
    }
}
