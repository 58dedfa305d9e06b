use crate::view_model::AppViewModel;
use crate::{JobRecord, JobRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    registry: JobRegistry,
    submissions_in_flight: usize,
    last_error: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn job(&self, job_id: &str) -> Option<&JobRecord> {
        self.registry.get(job_id)
    }

    /// True while any submission request is still waiting for an answer.
    pub fn is_busy(&self) -> bool {
        self.submissions_in_flight > 0
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            busy: self.is_busy(),
            jobs: self.registry.records().cloned().collect(),
            active_jobs: self.registry.active_count(),
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn registry_mut(&mut self) -> &mut JobRegistry {
        &mut self.registry
    }

    pub(crate) fn begin_submission(&mut self) {
        self.submissions_in_flight += 1;
    }

    pub(crate) fn end_submission(&mut self) {
        self.submissions_in_flight = self.submissions_in_flight.saturating_sub(1);
    }

    pub(crate) fn set_last_error(&mut self, message: Option<String>) {
        self.last_error = message;
    }
}
