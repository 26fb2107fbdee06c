//! Drives analysis jobs in the background.

use std::sync::Arc;
use std::time::Duration;

use brandvis_core::AnalysisRequest;
use brandvis_db::RunStore;
use brandvis_visibility::AnalysisPipeline;
use uuid::Uuid;

use crate::jobs::JobTable;

/// Starts analyses on their own tasks and records every outcome in the job table.
#[derive(Clone)]
pub struct Runner {
    jobs: JobTable,
    pipeline: Arc<AnalysisPipeline>,
    store: Arc<dyn RunStore>,
    deadline: Duration,
}

impl Runner {
    #[must_use]
    pub fn new(
        jobs: JobTable,
        pipeline: Arc<AnalysisPipeline>,
        store: Arc<dyn RunStore>,
        deadline: Duration,
    ) -> Self {
        Self {
            jobs,
            pipeline,
            store,
            deadline,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn RunStore> {
        &self.store
    }

    /// Register a job and start it without waiting. Returns the job id and
    /// its progress total.
    pub fn submit(&self, request: AnalysisRequest) -> (Uuid, usize) {
        let total = self.pipeline.total_steps();
        let id = self.jobs.submit(total);
        tracing::info!(
            job_id = %id,
            brand = %request.brand,
            seed = %request.seed_keyword,
            total,
            "analysis submitted"
        );
        tokio::spawn(self.clone().drive(id, request));
        (id, total)
    }

    /// Run the pipeline under the deadline and settle the job exactly once.
    ///
    /// The pipeline runs on its own task so a panic inside it surfaces here
    /// as a join error instead of unwinding through the driver.
    async fn drive(self, id: Uuid, request: AnalysisRequest) {
        let jobs = self.jobs.clone();
        let pipeline = Arc::clone(&self.pipeline);
        let mut task = tokio::spawn(async move {
            let on_progress = || {
                if let Err(e) = jobs.advance(id, 1) {
                    tracing::debug!(job_id = %id, error = %e, "progress tick ignored");
                }
            };
            pipeline.run(&request, &on_progress).await
        });

        let outcome = tokio::time::timeout(self.deadline, &mut task).await;
        let settled = match outcome {
            Ok(Ok(Ok(report))) => {
                let record = report.run_record();
                if let Err(e) = self.store.record(&record).await {
                    tracing::error!(
                        job_id = %id,
                        store = self.store.kind(),
                        error = %e,
                        "failed to persist run record"
                    );
                }
                tracing::info!(
                    job_id = %id,
                    visibility = report.visibility_percentage,
                    "analysis completed"
                );
                self.jobs.complete(id, report)
            }
            Ok(Ok(Err(e))) => {
                tracing::warn!(job_id = %id, error = %e, "analysis failed");
                self.jobs.fail(id, e.to_string())
            }
            Ok(Err(join_error)) => {
                tracing::error!(job_id = %id, error = %join_error, "analysis task aborted");
                self.jobs.fail(id, "analysis aborted unexpectedly")
            }
            Err(_) => {
                task.abort();
                tracing::warn!(
                    job_id = %id,
                    deadline_secs = self.deadline.as_secs(),
                    "analysis exceeded its deadline"
                );
                self.jobs.fail(
                    id,
                    format!(
                        "analysis did not finish within {} seconds",
                        self.deadline.as_secs()
                    ),
                )
            }
        };

        if let Err(e) = settled {
            tracing::error!(job_id = %id, error = %e, "could not settle job");
        }
    }
}
