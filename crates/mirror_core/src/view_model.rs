use crate::JobRecord;

/// Immutable snapshot handed to presentation code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub busy: bool,
    pub jobs: Vec<JobRecord>,
    pub active_jobs: usize,
    pub last_error: Option<String>,
    pub dirty: bool,
}
