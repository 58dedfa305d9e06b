use std::collections::HashMap;

use thiserror::Error;

use crate::{reconcile, JobId, JobRecord, JobStatus, StatusFragment};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("job {0} is already tracked")]
    Duplicate(JobId),
    #[error("job {0} is not tracked")]
    UnknownJob(JobId),
    #[error("job {job_id} already finished with status {status}")]
    Terminal { job_id: JobId, status: JobStatus },
}

/// In-memory map of every job seen during this process, in submission order.
///
/// Records are only ever inserted or replaced whole; nothing is removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobRegistry {
    records: HashMap<JobId, JobRecord>,
    order: Vec<JobId>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: JobRecord) -> Result<(), RegistryError> {
        if self.records.contains_key(&record.id) {
            return Err(RegistryError::Duplicate(record.id));
        }
        self.order.push(record.id.clone());
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn get(&self, job_id: &str) -> Option<&JobRecord> {
        self.records.get(job_id)
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.records.contains_key(job_id)
    }

    /// Swaps the stored record for `record` in one step.
    pub fn replace(&mut self, record: JobRecord) -> Result<(), RegistryError> {
        match self.records.get_mut(&record.id) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(RegistryError::UnknownJob(record.id)),
        }
    }

    /// Reconciles `fragment` into the stored record and writes the result back.
    /// Finished jobs are frozen and reject further fragments.
    pub fn apply_fragment(
        &mut self,
        job_id: &str,
        fragment: &StatusFragment,
    ) -> Result<&JobRecord, RegistryError> {
        let existing = self
            .records
            .get(job_id)
            .ok_or_else(|| RegistryError::UnknownJob(job_id.to_string()))?;
        if existing.is_terminal() {
            return Err(RegistryError::Terminal {
                job_id: job_id.to_string(),
                status: existing.status,
            });
        }
        let merged = reconcile(existing, fragment);
        self.replace(merged)?;
        self.records
            .get(job_id)
            .ok_or_else(|| RegistryError::UnknownJob(job_id.to_string()))
    }

    /// Records in the order they were first inserted.
    pub fn records(&self) -> impl Iterator<Item = &JobRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of jobs that have not reached a terminal status.
    pub fn active_count(&self) -> usize {
        self.records.values().filter(|r| !r.is_terminal()).count()
    }
}
