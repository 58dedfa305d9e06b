use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mirror_core::{update, AppState, AppViewModel, Effect, JobRecord, Msg};

/// Handle to the one `AppState` (and so the one job registry) shared by the
/// tracker, its pollers and whatever renders the jobs.
///
/// Every change goes through [`SharedState::dispatch`], which runs the pure
/// `update` under the lock. The lock is never held across an await.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<AppState>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: AppState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Applies `msg` and returns the effects the core asked for.
    pub fn dispatch(&self, msg: Msg) -> Vec<Effect> {
        let mut guard = self.lock();
        // The stored state is only swapped once update has returned.
        let (state, effects) = update(guard.clone(), msg);
        *guard = state;
        effects
    }

    pub fn view(&self) -> AppViewModel {
        self.lock().view()
    }

    pub fn job(&self, job_id: &str) -> Option<JobRecord> {
        self.lock().job(job_id).cloned()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().is_busy()
    }

    /// View of the registry if anything changed since the last call.
    pub fn take_changes(&self) -> Option<AppViewModel> {
        let mut guard = self.lock();
        if guard.consume_dirty() {
            Some(guard.view())
        } else {
            None
        }
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        // dispatch replaces the state whole, so a poisoned lock still guards the last complete value.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
