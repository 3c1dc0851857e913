// rest/routes/messages.rs — Mailbox post/drain routes.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::warn;

use super::status_for;
use crate::relay::model::Message;
use crate::AppContext;

/// `GET /message/{session_id}/{participant_id}` — drain the participant's
/// mailbox. The response body is the complete, exclusive view of everything
/// accumulated since the last drain; an empty array means nothing is waiting.
pub async fn get_messages(
    State(ctx): State<Arc<AppContext>>,
    Path((session_id, participant_id)): Path<(String, String)>,
) -> Result<Json<Vec<Message>>, StatusCode> {
    match ctx.relay.get_messages(&session_id, &participant_id).await {
        Ok(messages) => Ok(Json(messages)),
        Err(e) => Err(status_for(&e)),
    }
}

/// `POST /message/{session_id}` — fan the message out to its addressed,
/// session-member recipients.
pub async fn post_message(
    State(ctx): State<Arc<AppContext>>,
    Path(session_id): Path<String>,
    body: Result<Json<Message>, JsonRejection>,
) -> StatusCode {
    let Ok(Json(message)) = body else {
        warn!(session_id, "rejecting message post with malformed body");
        return StatusCode::BAD_REQUEST;
    };
    match ctx.relay.post_message(&session_id, message).await {
        Ok(()) => StatusCode::CREATED,
        Err(e) => status_for(&e),
    }
}
