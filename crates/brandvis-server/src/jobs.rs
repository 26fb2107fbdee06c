//! In-process table of analysis jobs.
//!
//! A job moves `running -> completed` or `running -> failed` and never leaves
//! a terminal state. Every mutation takes the write lock, so concurrent
//! progress ticks from one job's prompts cannot lose updates. Reads return a
//! cloned snapshot.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use brandvis_visibility::AnalysisReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub progress: usize,
    pub total: usize,
    pub result: Option<AnalysisReport>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("job {0} already finished")]
    AlreadyFinished(Uuid),
}

#[derive(Debug, Clone, Default)]
pub struct JobTable {
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
}

impl JobTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Job>> {
        self.jobs
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Job>> {
        self.jobs
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a new running job expecting `total` steps.
    pub fn submit(&self, total: usize) -> Uuid {
        let id = Uuid::new_v4();
        let job = Job {
            id,
            status: JobStatus::Running,
            progress: 0,
            total,
            result: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        };
        self.write().insert(id, job);
        id
    }

    /// Add `increment` to a running job's progress, clamped to its total.
    /// Returns the new progress.
    ///
    /// # Errors
    ///
    /// [`JobError::NotFound`] for unknown ids, [`JobError::AlreadyFinished`]
    /// once the job is terminal.
    pub fn advance(&self, id: Uuid, increment: usize) -> Result<usize, JobError> {
        let mut jobs = self.write();
        let job = running_job(&mut jobs, id)?;
        job.progress = job.progress.saturating_add(increment).min(job.total);
        Ok(job.progress)
    }

    /// Mark a job completed with its report; progress jumps to the total.
    ///
    /// # Errors
    ///
    /// Same as [`JobTable::advance`].
    pub fn complete(&self, id: Uuid, result: AnalysisReport) -> Result<(), JobError> {
        let mut jobs = self.write();
        let job = running_job(&mut jobs, id)?;
        job.status = JobStatus::Completed;
        job.progress = job.total;
        job.result = Some(result);
        job.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Mark a job failed with a human-readable message.
    ///
    /// # Errors
    ///
    /// Same as [`JobTable::advance`].
    pub fn fail(&self, id: Uuid, message: impl Into<String>) -> Result<(), JobError> {
        let mut jobs = self.write();
        let job = running_job(&mut jobs, id)?;
        job.status = JobStatus::Failed;
        job.error = Some(message.into());
        job.finished_at = Some(Utc::now());
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<Job> {
        self.read().get(&id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop terminal jobs that finished more than `retention` ago.
    /// Running jobs are never removed. Returns how many were dropped.
    pub fn prune_finished(&self, retention: chrono::Duration) -> usize {
        let cutoff = Utc::now() - retention;
        let mut jobs = self.write();
        let before = jobs.len();
        jobs.retain(|_, job| job.finished_at.is_none_or(|at| at > cutoff));
        before - jobs.len()
    }
}

fn running_job(jobs: &mut HashMap<Uuid, Job>, id: Uuid) -> Result<&mut Job, JobError> {
    let job = jobs.get_mut(&id).ok_or(JobError::NotFound(id))?;
    if job.status.is_terminal() {
        return Err(JobError::AlreadyFinished(id));
    }
    Ok(job)
}

#[cfg(test)]
#[path = "jobs_test.rs"]
mod tests;
