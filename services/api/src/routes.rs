use std::collections::BTreeMap;
use std::sync::atomic::Ordering;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use nexasales::workflows::segmentation::PipelineInput;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::infra::{AppState, DEFAULT_MARKET_DATA, DEFAULT_SERVICE_DESCRIPTION};

/// Body of a run request. Missing texts fall back to the bundled defaults.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RunRequest {
    #[serde(default)]
    pub(crate) service_description: Option<String>,
    #[serde(default)]
    pub(crate) market_data: Option<String>,
    #[serde(default)]
    pub(crate) segment_parameters: BTreeMap<String, String>,
}

impl RunRequest {
    fn into_input(self) -> PipelineInput {
        let text = |value: Option<String>, default: &str| {
            value
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        PipelineInput {
            service_description: text(self.service_description, DEFAULT_SERVICE_DESCRIPTION),
            market_data: text(self.market_data, DEFAULT_MARKET_DATA),
            segment_parameters: self.segment_parameters,
        }
    }
}

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/segmentation/run", post(segmentation_run_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Runs the whole pipeline for one request. A failed run still returns its
/// artifact, with 422 instead of 200.
pub(crate) async fn segmentation_run_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RunRequest>,
) -> Response {
    let artifact = state.workflow.run(&payload.into_input());
    info!(workflow_id = %artifact.workflow_id, status = ?artifact.status, "segmentation run served");

    let status = if artifact.is_success() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(artifact)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use nexasales::workflows::segmentation::pipeline::WorkflowSettings;
    use nexasales::workflows::segmentation::{ScriptedCollaborator, SegmentationWorkflow};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(collaborator: ScriptedCollaborator, ready: bool) -> Router {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            workflow: Arc::new(SegmentationWorkflow::new(
                collaborator,
                WorkflowSettings::default(),
            )),
        };
        router().layer(Extension(state))
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn run_request(body: &str) -> Request<Body> {
        Request::post("/api/v1/segmentation/run")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let request = Request::get("/health").body(Body::empty()).expect("request");

        let (status, body) = call(app(ScriptedCollaborator::new(), true), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_reflects_startup_flag() {
        let request = Request::get("/ready").body(Body::empty()).expect("request");

        let (status, body) = call(app(ScriptedCollaborator::new(), false), request).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");
    }

    #[tokio::test]
    async fn run_endpoint_returns_the_artifact() {
        let (status, body) = call(app(ScriptedCollaborator::new(), true), run_request("{}")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        let evaluations = body["stages"]["priority_evaluation"]["report"]["segment_evaluations"]
            .as_array()
            .expect("evaluations");
        assert_eq!(evaluations.len(), 4);
        assert_eq!(evaluations[0]["segment_id"], "s1");
    }

    #[tokio::test]
    async fn failed_run_is_unprocessable_but_keeps_partial_stages() {
        let collaborator = ScriptedCollaborator::new().fail("value_comparison", "model offline");

        let (status, body) = call(
            app(collaborator, true),
            run_request(r#"{"service_description": "営業支援SaaS", "market_data": "成長率 5%"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], "failed");
        assert_eq!(body["failed_stage"], "value_comparison");
        assert!(body["stages"]["reference_products"].is_string());
        assert!(body["stages"].get("formula_design").is_none());
    }

    #[test]
    fn blank_texts_use_defaults() {
        let input = RunRequest {
            service_description: Some("   ".to_string()),
            ..RunRequest::default()
        }
        .into_input();

        assert_eq!(input.service_description, DEFAULT_SERVICE_DESCRIPTION);
        assert_eq!(input.market_data, DEFAULT_MARKET_DATA);
    }
}
