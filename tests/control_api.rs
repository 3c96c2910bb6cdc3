//! Control API exercised in-process against a fake browser and oracle.

use std::sync::Arc;

use action_primitives::{
    ActionError, Extractor, InputInjector, Navigator, PointerSequence, PrimitiveSet,
    VisualCapture,
};
use agent_core::{
    Candidate, DecisionOracle, ExplorationOrchestrator, ExplorerConfig, OracleError,
    PageValidation, PageValidationRequest,
};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use webprobe_cli::server::{build_router, ServeState};
use webprobe_core_types::{DocumentId, ElementType, ExtractionReport, InteractiveElement};

/// Every document shows the same two buttons.
struct StaticPage;

#[async_trait]
impl Navigator for StaticPage {
    async fn open(&self, _url: &str) -> Result<DocumentId, ActionError> {
        Ok(DocumentId::new())
    }

    async fn wait_until_loaded(
        &self,
        _doc: &DocumentId,
        _timeout: std::time::Duration,
    ) -> Result<(), ActionError> {
        Ok(())
    }
}

#[async_trait]
impl Extractor for StaticPage {
    async fn ping(&self, _doc: &DocumentId) -> Result<(), ActionError> {
        Ok(())
    }

    async fn extract(&self, _doc: &DocumentId) -> Result<ExtractionReport, ActionError> {
        Ok(ExtractionReport {
            success: true,
            url: "https://app.test/".into(),
            title: "App".into(),
            elements: vec![
                InteractiveElement::new(0, ElementType::Button, "Save").at(10.0, 10.0),
                InteractiveElement::new(1, ElementType::Button, "Cancel").at(10.0, 40.0),
            ],
            console_errors: Vec::new(),
            network_errors: Vec::new(),
        })
    }
}

#[async_trait]
impl InputInjector for StaticPage {
    async fn inject(
        &self,
        _doc: &DocumentId,
        _sequence: &PointerSequence,
    ) -> Result<(), ActionError> {
        Ok(())
    }
}

#[async_trait]
impl VisualCapture for StaticPage {
    async fn capture(&self, _doc: &DocumentId) -> Result<Option<String>, ActionError> {
        Ok(None)
    }
}

struct FirstChoice;

#[async_trait]
impl DecisionOracle for FirstChoice {
    async fn pick_element(
        &self,
        _candidates: &[Candidate],
        _page_url: &str,
        _page_title: &str,
    ) -> Result<Option<i64>, OracleError> {
        Ok(Some(0))
    }

    async fn validate_page(
        &self,
        _request: &PageValidationRequest,
    ) -> Result<PageValidation, OracleError> {
        Ok(PageValidation::default())
    }
}

fn app() -> (Router, ServeState) {
    // Long settle delay keeps the run active for the whole test.
    let mut config = ExplorerConfig::fast();
    config.settle_delay_ms = 60_000;
    let orchestrator = ExplorationOrchestrator::new(
        config,
        PrimitiveSet::from_backend(Arc::new(StaticPage)),
        Arc::new(FirstChoice),
    );
    let state = ServeState::new(orchestrator);
    state.health.mark_live();
    state.health.mark_ready();
    (build_router(state.clone()), state)
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn start_requires_a_navigable_url() {
    let (router, _) = app();

    let (status, body) = send(&router, Method::POST, "/api/test/start", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], json!("INVALID_REQUEST"));

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/test/start",
        Some(json!({ "url": "ftp://files.test/" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid request"));
}

#[tokio::test]
async fn start_status_stop_round() {
    let (router, _) = app();

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/test/start",
        Some(json!({ "url": "https://app.test/", "configId": "nightly" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let run_id = body["runId"].as_str().unwrap().to_string();

    let (status, body) = send(&router, Method::GET, "/api/test/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isRunning"], json!(true));
    assert_eq!(body["currentRun"]["id"], json!(run_id));
    assert_eq!(body["currentRun"]["configId"], json!("nightly"));
    assert_eq!(body["currentRun"]["startUrl"], json!("https://app.test/"));

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/test/start",
        Some(json!({ "url": "https://other.test/" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], json!("CONFLICT"));

    let (status, body) = send(&router, Method::POST, "/api/test/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["run"]["id"], json!(run_id));
    assert_eq!(body["run"]["status"], json!("completed"));

    let (_, body) = send(&router, Method::GET, "/api/test/status", None).await;
    assert_eq!(body["isRunning"], json!(false));
    assert_eq!(body["currentRun"]["status"], json!("completed"));

    let (_, body) = send(&router, Method::GET, "/api/test/logs", None).await;
    let messages: Vec<&str> = body["logs"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|entry| entry["message"].as_str())
        .collect();
    assert!(messages.iter().any(|m| m.starts_with("Test started")));
    assert!(messages.iter().any(|m| m.starts_with("Test stopped")));
}

#[tokio::test]
async fn stop_without_a_run_reports_nothing() {
    let (router, _) = app();
    let (status, body) = send(&router, Method::POST, "/api/test/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body["run"].is_null());
}

#[tokio::test]
async fn health_reflects_liveness() {
    let (router, state) = app();
    let (status, body) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], json!(true));
    assert_eq!(body["running"], json!(false));

    state.health.mark_unready("browser crashed");
    let (_, body) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(body["status"], json!("starting"));
    assert_eq!(body["lastError"], json!("browser crashed"));
}

#[tokio::test]
async fn metrics_are_exposed_as_prometheus_text() {
    let (router, _) = app();
    let response = router
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let (router, _) = app();
    let response = router
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/test/start")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
