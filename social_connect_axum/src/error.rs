use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;
use social_connect::{ConnectError, Remedy};

/// JSON error body returned by the API routes.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remedy: Option<Remedy>,
}

impl ErrorResponse {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal_error",
            message: message.into(),
            remedy: None,
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            message: message.into(),
            remedy: None,
        }
    }
}

pub(crate) fn status_for(error: &ConnectError) -> StatusCode {
    match error {
        ConnectError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        ConnectError::ConnectionNotFound(_) => StatusCode::NOT_FOUND,
        ConnectError::Configuration(_)
        | ConnectError::AuthorizationDenied(_)
        | ConnectError::MissingParameters(_)
        | ConnectError::NoMatchingFlow(_)
        | ConnectError::StateMismatch => StatusCode::BAD_REQUEST,
        ConnectError::Transport(_)
        | ConnectError::ExchangeFailed(_)
        | ConnectError::RefreshFailed(_)
        | ConnectError::SyncFailed(_) => StatusCode::BAD_GATEWAY,
        ConnectError::Storage(_) | ConnectError::Utils(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ConnectError> for ErrorResponse {
    fn from(error: ConnectError) -> Self {
        Self {
            status: status_for(&error),
            kind: error.kind(),
            message: error.to_string(),
            remedy: Some(error.remedy()),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Helper trait for converting errors to a standard response error format
pub(crate) trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, ErrorResponse>;
}

impl<T> IntoResponseError<T> for Result<T, ConnectError> {
    fn into_response_error(self) -> Result<T, ErrorResponse> {
        self.map_err(ErrorResponse::from)
    }
}

/// Implementation for http::Error (used by Response::builder())
impl<T> IntoResponseError<T> for http::Result<T> {
    fn into_response_error(self) -> Result<T, ErrorResponse> {
        self.map_err(|e| ErrorResponse::internal(e.to_string()))
    }
}

impl<T> IntoResponseError<T> for Result<T, askama::Error> {
    fn into_response_error(self) -> Result<T, ErrorResponse> {
        self.map_err(|e| ErrorResponse::internal(e.to_string()))
    }
}
