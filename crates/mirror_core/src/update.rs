use crate::{AppState, Effect, JobRecord, Msg, RegistryError, StopReason};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SubmitStarted => {
            state.begin_submission();
            state.mark_dirty();
            Vec::new()
        }
        Msg::JobAccepted { job_id, url } => {
            state.end_submission();
            state.mark_dirty();
            register(&mut state, JobRecord::submitted(job_id, url))
        }
        Msg::SubmitFailed { message } => {
            state.end_submission();
            state.set_last_error(Some(message));
            state.mark_dirty();
            Vec::new()
        }
        Msg::SubmitAbandoned => {
            state.end_submission();
            state.mark_dirty();
            Vec::new()
        }
        Msg::AttachJob { job_id } => {
            state.mark_dirty();
            register(&mut state, JobRecord::attached(job_id))
        }
        Msg::StatusFetched { job_id, fragment } => {
            match state.registry_mut().apply_fragment(&job_id, &fragment) {
                Ok(merged) => {
                    let status = merged.status;
                    state.mark_dirty();
                    if status.is_terminal() {
                        vec![Effect::StopPolling {
                            job_id,
                            reason: StopReason::Terminal(status),
                        }]
                    } else {
                        Vec::new()
                    }
                }
                // A finished record stays frozen; its poller should already be gone.
                Err(RegistryError::Terminal { status, .. }) => vec![Effect::StopPolling {
                    job_id,
                    reason: StopReason::Terminal(status),
                }],
                Err(_) => vec![Effect::StopPolling {
                    job_id,
                    reason: StopReason::UnknownJob,
                }],
            }
        }
        Msg::StatusFetchFailed { job_id, error } => {
            state.set_last_error(Some(format!("status poll for job {job_id} failed: {error}")));
            state.mark_dirty();
            Vec::new()
        }
        Msg::PollingAbandoned { .. } => Vec::new(),
    };

    (state, effects)
}

fn register(state: &mut AppState, record: JobRecord) -> Vec<Effect> {
    let job_id = record.id.clone();
    match state.registry_mut().insert(record) {
        Ok(()) => vec![Effect::StartPolling { job_id }],
        Err(err) => {
            state.set_last_error(Some(err.to_string()));
            Vec::new()
        }
    }
}
