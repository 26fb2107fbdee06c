use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use brandvis_core::PromptTemplates;
use brandvis_db::LogRunStore;
use brandvis_visibility::{AnalysisPipeline, PipelineSettings};
use tower::ServiceExt;

use super::*;
use crate::test_support::{gateways, FakeProvider};

fn app_with(auth: AuthState, rate_limit: RateLimitState) -> (Router, JobTable) {
    let pipeline = AnalysisPipeline::new(
        gateways(
            FakeProvider::cooperative(),
            FakeProvider::text("gemini", "salesforce"),
        ),
        Arc::new(PromptTemplates::builtin()),
        PipelineSettings::default(),
    )
    .expect("pipeline");
    let jobs = JobTable::new();
    let runner = Runner::new(
        jobs.clone(),
        Arc::new(pipeline),
        Arc::new(LogRunStore),
        Duration::from_secs(30),
    );
    let state = AppState {
        jobs: jobs.clone(),
        runner,
    };
    (build_app(state, auth, rate_limit), jobs)
}

fn app() -> (Router, JobTable) {
    app_with(AuthState::disabled(), default_rate_limit_state())
}

fn submit(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/analyses")
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .expect("request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

const VALID_BODY: &str =
    r#"{"email":"ops@example.com","seed_keyword":"crm","brand":"Acme","market":"US"}"#;

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("unauthorized", StatusCode::UNAUTHORIZED),
        ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "x").into_response();
        assert_eq!(response.status(), status, "{code}");
    }
}

#[tokio::test]
async fn health_reports_store_and_job_count() {
    let (app, _) = app();
    let response = app
        .oneshot(get_request("/api/v1/health"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let json = json_body(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["store"], "log");
    assert_eq!(json["data"]["jobs"], 0);
}

#[tokio::test]
async fn request_id_header_is_echoed() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-abc")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-abc")
    );
    let json = json_body(response).await;
    assert_eq!(json["meta"]["request_id"], "req-abc");
}

#[tokio::test]
async fn submitted_analysis_is_accepted_then_completes() {
    let (app, _) = app();
    let response = app
        .clone()
        .oneshot(submit(VALID_BODY))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = json_body(response).await;
    assert_eq!(json["data"]["status"], "running");
    assert_eq!(json["data"]["total_steps"], 10);
    let job_id = json["data"]["job_id"]
        .as_str()
        .expect("job id")
        .to_owned();

    let mut last = serde_json::Value::Null;
    for _ in 0..200 {
        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/v1/analyses/{job_id}")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        last = json_body(response).await;
        let progress = last["data"]["progress"].as_u64().expect("progress");
        let total = last["data"]["total"].as_u64().expect("total");
        assert!(progress <= total);
        if last["data"]["status"] != "running" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(last["data"]["status"], "completed");
    assert_eq!(last["data"]["progress"], 10);
    assert!(last["data"].get("error").is_none());
    let result = &last["data"]["result"];
    assert_eq!(result["brand"], "Acme");
    assert_eq!(result["total_prompts"], 10);
    assert_eq!(result["appeared"], 10);
    assert_eq!(result["visibility_percentage"], 100.0);
}

#[tokio::test]
async fn missing_field_is_rejected_before_a_job_exists() {
    let (app, jobs) = app();
    let response = app
        .oneshot(submit(
            r#"{"email":"ops@example.com","seed_keyword":"crm","market":"US"}"#,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
    assert_eq!(json["error"]["message"], "brand is required");
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let (app, jobs) = app();
    let response = app.oneshot(submit("{not json")).await.expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_not_found() {
    let (app, _) = app();
    for uri in [
        format!("/api/v1/analyses/{}", uuid::Uuid::new_v4()),
        "/api/v1/analyses/not-a-uuid".to_owned(),
    ] {
        let response = app
            .clone()
            .oneshot(get_request(&uri))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "not_found");
    }
}

#[tokio::test]
async fn analyses_require_a_bearer_token_when_auth_is_enabled() {
    let auth = AuthState::from_keys("secret-token", false).expect("auth");
    let (app, _) = app_with(auth, default_rate_limit_state());

    let response = app
        .clone()
        .oneshot(submit(VALID_BODY))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut request = submit(VALID_BODY);
    request.headers_mut().insert(
        header::AUTHORIZATION,
        "Bearer secret-token".parse().expect("header"),
    );
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = app
        .oneshot(get_request("/api/v1/health"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_are_rate_limited() {
    let (app, _) = app_with(
        AuthState::disabled(),
        RateLimitState::new(1, Duration::from_secs(60)),
    );
    let uri = format!("/api/v1/analyses/{}", uuid::Uuid::new_v4());

    let first = app
        .clone()
        .oneshot(get_request(&uri))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::NOT_FOUND);

    let second = app.oneshot(get_request(&uri)).await.expect("response");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = json_body(second).await;
    assert_eq!(json["error"]["code"], "rate_limited");
}
