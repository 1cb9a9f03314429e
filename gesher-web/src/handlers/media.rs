//! Media preload and readiness endpoints.
//!
//! The frontend polls readiness to drive its loading indicators; the
//! endpoint therefore always answers 200 with readiness information in the
//! body, even for unknown keys.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gesher_core::media::{MediaReadiness, MediaState, PreloadTicket};
use serde::{Deserialize, Serialize};

use crate::server::AppState;

/// Response structure for media readiness checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaReadinessResponse {
    /// Whether the asset is ready for playback
    pub ready: bool,
    /// Current lifecycle position
    pub status: MediaReadiness,
    /// Descriptive message about readiness status
    pub message: String,
    /// Resolved download URL once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Failure reason when status is failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<MediaState> for MediaReadinessResponse {
    fn from(state: MediaState) -> Self {
        let message = match state.readiness {
            MediaReadiness::Idle => "Not requested".to_string(),
            MediaReadiness::Resolving => "Resolving download URL...".to_string(),
            MediaReadiness::Buffering => "Buffering for smooth playback...".to_string(),
            MediaReadiness::Ready => "Ready to play".to_string(),
            MediaReadiness::Failed => format!(
                "Loading failed: {}",
                state.error_detail.as_deref().unwrap_or("unknown error")
            ),
        };

        Self {
            ready: state.readiness.is_ready(),
            status: state.readiness,
            message,
            url: state.resolved_url,
            error: state.error_detail,
        }
    }
}

/// Handles `GET /api/media/ready/{key}`.
///
/// Always returns 200 with readiness information in the response body.
pub async fn media_readiness(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<MediaReadinessResponse> {
    Json(state.media.state(&key).into())
}

/// Response structure for preload requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreloadResponse {
    /// Whether this request started a new preload attempt
    pub started: bool,
    #[serde(flatten)]
    pub readiness: MediaReadinessResponse,
}

/// Handles `POST /api/media/preload/{key}`.
///
/// Starts a preload for the key, or joins the attempt already in flight;
/// repeated calls never trigger a second fetch.
pub async fn preload_media(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.media.request_preload(&key) {
        Ok(ticket) => {
            let started = ticket == PreloadTicket::Started;
            Json(PreloadResponse {
                started,
                readiness: state.media.state(&key).into(),
            })
            .into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
