//! Submit and poll visibility analyses.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use brandvis_core::AnalysisRequest;
use brandvis_visibility::AnalysisReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::jobs::{Job, JobStatus};
use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// Missing fields deserialize as empty strings so validation, not the JSON
/// extractor, reports which one is absent.
#[derive(Debug, Deserialize)]
pub(super) struct SubmitAnalysisBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    seed_keyword: String,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    market: String,
}

impl From<SubmitAnalysisBody> for AnalysisRequest {
    fn from(body: SubmitAnalysisBody) -> Self {
        Self {
            email: body.email,
            seed_keyword: body.seed_keyword,
            brand: body.brand,
            market: body.market,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SubmittedAnalysis {
    job_id: Uuid,
    status: JobStatus,
    total_steps: usize,
}

#[derive(Debug, Serialize)]
pub(super) struct JobView {
    job_id: Uuid,
    status: JobStatus,
    progress: usize,
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<AnalysisReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<DateTime<Utc>>,
}

impl From<Job> for JobView {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            progress: job.progress,
            total: job.total,
            result: job.result,
            error: job.error,
            created_at: job.created_at,
            finished_at: job.finished_at,
        }
    }
}

pub(super) async fn submit_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<SubmitAnalysisBody>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SubmittedAnalysis>>), ApiError> {
    let Json(body) = body.map_err(|rejection| {
        ApiError::new(&req_id.0, "validation_error", rejection.body_text())
    })?;

    let request = AnalysisRequest::from(body)
        .normalized()
        .map_err(|e| ApiError::new(&req_id.0, "validation_error", e.to_string()))?;

    let (job_id, total_steps) = state.runner.submit(request);

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: SubmittedAnalysis {
                job_id,
                status: JobStatus::Running,
                total_steps,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn get_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(job_id): Path<String>,
) -> Result<Json<ApiResponse<JobView>>, ApiError> {
    let job = Uuid::parse_str(&job_id)
        .ok()
        .and_then(|id| state.jobs.get(id))
        .ok_or_else(|| {
            ApiError::new(
                &req_id.0,
                "not_found",
                format!("analysis {job_id} not found"),
            )
        })?;

    Ok(Json(ApiResponse {
        data: JobView::from(job),
        meta: ResponseMeta::new(req_id.0),
    }))
}
