//! Contact submission endpoint.
//!
//! Validates the submission server-side, fans it out across the email and
//! chat channels, and maps the aggregated outcome to the response contract:
//! 400 with field errors, 500 when every channel failed, 200 otherwise
//! (partial success carries a warning, not an error status).

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gesher_core::GesherError;
use gesher_core::notify::{ContactSubmission, NotifyError, validate};
use serde_json::json;

use crate::server::AppState;

/// Handles `POST /api/contact`.
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(submission): Json<ContactSubmission>,
) -> Response {
    let request = match validate(&submission) {
        Ok(request) => request,
        Err(fields) => {
            tracing::debug!("contact submission rejected: {:?}", fields);
            return error_response(NotifyError::Invalid { fields }.into());
        }
    };

    let outcome = match state.dispatcher.dispatch(&request).await.require_delivery() {
        Ok(outcome) => outcome,
        Err(e) => return error_response(e.into()),
    };

    let details = json!({
        "email": outcome.email_succeeded,
        "whatsapp": outcome.chat_succeeded,
    });

    if outcome.is_partial() {
        return Json(json!({
            "ok": true,
            "warning": "Sending partially succeeded",
            "details": details,
            "errors": outcome.channel_errors,
        }))
        .into_response();
    }

    Json(json!({ "ok": true, "details": details })).into_response()
}

/// Maps a core error onto the response contract.
///
/// Validation failures are the caller's fault (400, with per-field
/// messages); everything else is a server-side delivery problem (500).
fn error_response(error: GesherError) -> Response {
    let status = if error.is_user_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let mut body = json!({ "error": error.user_message() });
    match &error {
        GesherError::Notify(NotifyError::Invalid { fields }) => {
            body["fieldErrors"] = json!(fields);
        }
        GesherError::Notify(NotifyError::AllChannelsFailed { errors }) => {
            body["details"] = json!(errors);
        }
        _ => {}
    }

    (status, Json(body)).into_response()
}
