pub mod health;
pub mod messages;
pub mod sessions;

use axum::http::StatusCode;

use crate::relay::RelayError;

/// Map a relay outcome to its transport status code.
pub(crate) fn status_for(err: &RelayError) -> StatusCode {
    match err {
        RelayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        RelayError::Conflict => StatusCode::CONFLICT,
        RelayError::NotFound => StatusCode::NOT_FOUND,
        RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
