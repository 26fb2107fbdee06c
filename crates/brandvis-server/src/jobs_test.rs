use brandvis_core::AnalysisRequest;

use super::*;

fn report() -> AnalysisReport {
    let request = AnalysisRequest {
        email: "ops@example.com".to_string(),
        seed_keyword: "crm".to_string(),
        brand: "Acme".to_string(),
        market: "US".to_string(),
    };
    AnalysisReport::aggregate(&request, Vec::new())
}

#[test]
fn submitted_job_starts_running_at_zero() {
    let table = JobTable::new();
    let id = table.submit(10);

    let job = table.get(id).expect("job exists");
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.progress, 0);
    assert_eq!(job.total, 10);
    assert!(job.result.is_none());
    assert!(job.finished_at.is_none());
}

#[test]
fn unknown_job_is_not_found() {
    let table = JobTable::new();
    let id = Uuid::new_v4();
    assert!(table.get(id).is_none());
    assert_eq!(table.advance(id, 1), Err(JobError::NotFound(id)));
    assert_eq!(table.fail(id, "x"), Err(JobError::NotFound(id)));
}

#[test]
fn advance_is_clamped_to_total() {
    let table = JobTable::new();
    let id = table.submit(3);
    assert_eq!(table.advance(id, 2), Ok(2));
    assert_eq!(table.advance(id, 5), Ok(3));
    assert_eq!(table.get(id).expect("job").progress, 3);
}

#[test]
fn complete_sets_progress_to_total_and_stores_result() {
    let table = JobTable::new();
    let id = table.submit(10);
    table.advance(id, 4).expect("advance");
    table.complete(id, report()).expect("complete");

    let job = table.get(id).expect("job");
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 10);
    assert!(job.result.is_some());
    assert!(job.finished_at.is_some());
}

#[test]
fn terminal_jobs_reject_further_mutation() {
    let table = JobTable::new();
    let id = table.submit(5);
    table.fail(id, "provider outage").expect("fail");

    assert_eq!(table.advance(id, 1), Err(JobError::AlreadyFinished(id)));
    assert_eq!(
        table.complete(id, report()),
        Err(JobError::AlreadyFinished(id))
    );
    assert_eq!(table.fail(id, "again"), Err(JobError::AlreadyFinished(id)));

    let job = table.get(id).expect("job");
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.progress, 0);
    assert_eq!(job.error.as_deref(), Some("provider outage"));
}

#[tokio::test]
async fn concurrent_advances_are_not_lost() {
    let table = JobTable::new();
    let id = table.submit(1_000);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let table = table.clone();
            tokio::spawn(async move {
                for _ in 0..100 {
                    table.advance(id, 1).expect("advance");
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.expect("task");
    }

    assert_eq!(table.get(id).expect("job").progress, 800);
}

#[test]
fn prune_drops_only_old_terminal_jobs() {
    let table = JobTable::new();
    let running = table.submit(1);
    let finished = table.submit(1);
    table.complete(finished, report()).expect("complete");

    assert_eq!(table.prune_finished(chrono::Duration::hours(1)), 0);
    assert_eq!(table.len(), 2);

    assert_eq!(table.prune_finished(chrono::Duration::seconds(-1)), 1);
    assert!(table.get(finished).is_none());
    assert!(table.get(running).is_some());
}

#[test]
fn status_serializes_lowercase() {
    let json = serde_json::to_string(&JobStatus::Completed).expect("serialize");
    assert_eq!(json, "\"completed\"");
}
