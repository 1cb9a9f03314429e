//! HTTP request handlers.

pub mod contact;
pub mod media;

use axum::Json;
use axum::extract::State;
use serde_json::json;

use crate::server::AppState;

pub use contact::submit_contact;
pub use media::{media_readiness, preload_media};

/// Handles `GET /api/health`.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.server_started_at.elapsed().as_secs(),
    }))
}
