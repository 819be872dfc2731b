use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

/// Health check endpoint with the current subscriber count.
async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let subscribers = state.registry.len().await;
    Json(json!({
        "status": "ok",
        "subscribers": subscribers,
    }))
}
