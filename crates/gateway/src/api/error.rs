//! `IntoResponse` for the shared domain error type.
//!
//! A tool call that fails returns `forge_domain::error::tool_error`'s flat
//! `{status, error_code, message}` shape to the model. An HTTP handler that
//! fails returns this module's nested `{error: {code, message, field?}}`
//! envelope instead — same error kinds, two different audiences.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use forge_domain::error::{Error, ErrorEnvelope};

/// Wraps [`Error`] so it can be returned directly from an axum handler.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope::from(&self.0);
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404_response() {
        let err = ApiError(Error::NotFound("session abc".into()));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflict_maps_to_409_response() {
        let err = ApiError(Error::Conflict("session already terminal".into()));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
