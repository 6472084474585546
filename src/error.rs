use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed request field, unknown model variant or label
    #[error("{0}")]
    Validation(String),

    /// One or more tables an operation depends on have not been generated
    #[error("{0}")]
    PrerequisiteMissing(String),

    #[error("{0}")]
    TableNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Table exists but lacks a column the operation needs
    #[error("Malformed table {table}: missing column {column}")]
    MalformedTable { table: String, column: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::PrerequisiteMissing(_)
            | ApiError::TableNotFound(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}


#[derive(Serialize)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    pub error: String,
}

/// Rendered as `{error}`; used by query endpoints.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        (status, Json(ErrorBody { ok: None, error: self.to_string() })).into_response()
    }
}


/// Rendered as `{ok: false, error}`; used by action endpoints.
#[derive(Debug)]
pub struct ActionError(pub ApiError);

impl From<ApiError> for ActionError {
    fn from(err: ApiError) -> Self {
        ActionError(err)
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!("action failed: {}", self.0);
        }
        (status, Json(ErrorBody { ok: Some(false), error: self.0.to_string() })).into_response()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_bad_request() {
        assert_eq!(ApiError::validation("Missing uuid").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::PrerequisiteMissing("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::TableNotFound("x".into()).status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_io_errors_map_to_server_error() {
        let err: ApiError = std::io::Error::other("disk gone").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "IO error: disk gone");
    }

    #[test]
    fn test_error_body_omits_ok_for_queries() {
        let body = ErrorBody { ok: None, error: "bad".into() };
        assert_eq!(serde_json::to_value(&body).unwrap(), serde_json::json!({"error": "bad"}));

        let body = ErrorBody { ok: Some(false), error: "bad".into() };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"ok": false, "error": "bad"})
        );
    }
}
