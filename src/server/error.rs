//! Error-to-response mapping for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::error::Error;

/// Wrapper turning crate errors into HTTP responses. Every variant maps to
/// a fixed status code; the mapping lives here and nowhere else.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInterval(_) | Error::InvalidRange(_) | Error::InvalidArgument(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            Error::UpstreamUnavailable(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::Io(_)
            | Error::Json(_)
            | Error::Csv(_)
            | Error::Db(_)
            | Error::MissingConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
