// rest/routes/sessions.rs — Session lifecycle routes.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::warn;

use super::status_for;
use crate::AppContext;

/// `POST /{session_id}` — body is a bare JSON array of participant IDs.
pub async fn start_session(
    State(ctx): State<Arc<AppContext>>,
    Path(session_id): Path<String>,
    body: Result<Json<Vec<String>>, JsonRejection>,
) -> StatusCode {
    let Ok(Json(participants)) = body else {
        warn!(session_id, "rejecting session start with malformed body");
        return StatusCode::BAD_REQUEST;
    };
    match ctx.relay.start_session(&session_id, participants).await {
        Ok(()) => StatusCode::CREATED,
        Err(e) => status_for(&e),
    }
}

/// `DELETE /{session_id}`
pub async fn end_session(
    State(ctx): State<Arc<AppContext>>,
    Path(session_id): Path<String>,
) -> StatusCode {
    match ctx.relay.end_session(&session_id).await {
        Ok(()) => StatusCode::OK,
        Err(e) => status_for(&e),
    }
}
