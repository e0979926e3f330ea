//! Axum router configuration.
//!
//! Two routes: the webhook (POST only, path from config) and `/health`.
//! No timeout layer: an enable request lasts as long as the firewall
//! command does.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use shapegate_core::executor::RemoteExecutor;

use crate::http::handlers;
use crate::state::AppState;

pub fn build_router<E: RemoteExecutor + 'static>(state: AppState<E>) -> Router {
    Router::new()
        .route(
            &state.webhook_path,
            post(handlers::webhook::receive_webhook::<E>),
        )
        .route("/health", get(handlers::health::health::<E>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
