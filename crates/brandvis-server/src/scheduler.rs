//! Background housekeeping.
//!
//! Finished jobs are kept for polling until their retention lapses, then
//! pruned by a recurring job so the in-process table stays bounded.

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::jobs::JobTable;

/// Every five minutes, on the minute.
const PRUNE_SCHEDULE: &str = "0 */5 * * * *";

/// Builds and starts the scheduler. The returned handle must outlive the
/// server; dropping it stops the prune job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    jobs: JobTable,
    retention: chrono::Duration,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_prune_job(&scheduler, jobs, retention).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_prune_job(
    scheduler: &JobScheduler,
    jobs: JobTable,
    retention: chrono::Duration,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(PRUNE_SCHEDULE, move |_uuid, _lock| {
        let jobs = jobs.clone();
        Box::pin(async move {
            let pruned = jobs.prune_finished(retention);
            if pruned > 0 {
                tracing::info!(
                    pruned,
                    remaining = jobs.len(),
                    "scheduler: pruned finished jobs"
                );
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
