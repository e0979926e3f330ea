//! GET /health - liveness probe with a summary of the action state.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use shapegate_core::executor::RemoteExecutor;

use crate::http::response::{ApiResponse, request_id};
use crate::state::AppState;

pub async fn health<E: RemoteExecutor + 'static>(
    State(state): State<AppState<E>>,
) -> Json<ApiResponse<Value>> {
    let start = Instant::now();
    let status = state.service.status().await;

    let data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "action_in_progress": status.action_in_progress,
        "pending_disable": status.pending_disable,
        "actions_completed": status.actions_completed,
        "idle_secs": status.idle_secs,
    });

    Json(ApiResponse::success(
        data,
        request_id(),
        start.elapsed().as_millis() as u64,
    ))
}
