use axum::{Json, Router, extract::State, routing::get};

use crate::state::{RelayState, RelayStats};

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn stats_handler(State(state): State<RelayState>) -> Json<RelayStats> {
    Json(state.snapshot().await)
}
