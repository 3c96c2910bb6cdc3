use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use webprobe_core_types::{RunId, TestRun};

use agent_core::{LogEntry, StatusSnapshot};

use super::state::ServeState;
use crate::errors::{WebprobeError, WebprobeResult};
use crate::metrics;

pub fn build_router(state: ServeState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/test/start", post(start_handler))
        .route("/api/test/stop", post(stop_handler))
        .route("/api/test/status", get(status_handler))
        .route("/api/test/logs", get(logs_handler))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn health_handler(State(state): State<ServeState>) -> impl IntoResponse {
    let snapshot = state.health_snapshot();
    let status = if snapshot.live {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "status": if snapshot.ready { "ok" } else { "starting" },
            "ready": snapshot.ready,
            "live": snapshot.live,
            "lastReadyCheck": snapshot.last_ready_check,
            "lastError": snapshot.last_error,
            "running": state.orchestrator.status().is_running,
        })),
    )
}

async fn metrics_handler() -> Response {
    metrics::register_metrics();
    metrics::render(metrics::global_registry())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartTestRequest {
    #[serde(default)]
    url: String,
    #[serde(default)]
    config_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartTestResponse {
    success: bool,
    run_id: RunId,
}

async fn start_handler(
    State(state): State<ServeState>,
    Json(payload): Json<StartTestRequest>,
) -> WebprobeResult<Json<StartTestResponse>> {
    let url = payload.url.trim();
    if url.is_empty() {
        return Err(WebprobeError::invalid_request("url is required"));
    }
    action_primitives::validate_url(url)
        .map_err(|err| WebprobeError::invalid_request(err.to_string()))?;
    if state.orchestrator.status().is_running {
        return Err(WebprobeError::Conflict(
            "a test run is already active; stop it first".to_string(),
        ));
    }

    let run_id = state
        .orchestrator
        .start_test(url, payload.config_id)
        .await?;
    info!(run_id = %run_id, %url, "test started via control API");
    Ok(Json(StartTestResponse {
        success: true,
        run_id,
    }))
}

#[derive(Serialize)]
struct StopTestResponse {
    success: bool,
    run: Option<TestRun>,
}

async fn stop_handler(State(state): State<ServeState>) -> Json<StopTestResponse> {
    let run = state.orchestrator.stop_test().await;
    Json(StopTestResponse { success: true, run })
}

#[derive(Serialize)]
struct StatusResponse {
    success: bool,
    #[serde(flatten)]
    status: StatusSnapshot,
}

async fn status_handler(State(state): State<ServeState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        success: true,
        status: state.orchestrator.status(),
    })
}

#[derive(Serialize)]
struct LogsResponse {
    success: bool,
    logs: Vec<LogEntry>,
}

async fn logs_handler(State(state): State<ServeState>) -> Json<LogsResponse> {
    Json(LogsResponse {
        success: true,
        logs: state.orchestrator.recent_logs(),
    })
}
