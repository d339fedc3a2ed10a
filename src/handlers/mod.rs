pub mod integration;
pub mod webhooks;

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::json;

use crate::db::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/integration/{platform}/authorize", get(integration::authorize))
        .route("/integration/{platform}/callback", get(integration::callback))
        .route("/webhooks/{platform}", post(webhooks::receive))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
