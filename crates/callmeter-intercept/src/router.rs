//! Axum router wiring.
//!
//! - `GET /metrics`: in-process registry, text exposition
//! - `GET /metrics.json`: same, as JSON
//! - `GET /v1/call/:method?fail=true`: run a measured demo call

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{app_state::AppState, context::capture_headers, services::DemoService};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_text))
        .route("/metrics.json", get(metrics_json))
        .route("/v1/call/:method", get(call_method))
        .layer(middleware::from_fn(capture_headers))
        .with_state(state)
}

async fn metrics_text(State(state): State<AppState>) -> impl IntoResponse {
    state.registry().render()
}

async fn metrics_json(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry().snapshot())
}

#[derive(Debug, Deserialize)]
struct CallParams {
    #[serde(default)]
    fail: bool,
}

async fn call_method(
    State(state): State<AppState>,
    Path(method): Path<String>,
    Query(params): Query<CallParams>,
) -> impl IntoResponse {
    let Some(id) = DemoService::method(&method) else {
        return (StatusCode::NOT_FOUND, format!("unknown method: {method}"));
    };

    match state.demo().call(id, params.fail).await {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            tracing::info!(method = %id, code = e.code().as_str(), "demo call failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
