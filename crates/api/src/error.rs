use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input, or an operation that is not supported
    #[error("{0}")]
    BadRequest(String),
    /// Any failure further down the pipeline; rendered with its full context chain
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        match &self {
            ApiError::BadRequest(_) => tracing::info!(%message, "Rejected request"),
            ApiError::Internal(_) => tracing::error!(error = %message, "Request failed"),
        }

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// A required string field: present and not blank
pub fn required(value: Option<String>, message: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_internal_error_keeps_context_chain() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("connection refused"));
        let api_error = ApiError::from(err.context("Failed to embed query").unwrap_err());

        assert_eq!(api_error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.to_string(), "Failed to embed query: connection refused");
    }

    #[test]
    fn test_required_field() {
        assert_eq!(required(Some("text".into()), "missing").unwrap(), "text");
        assert!(matches!(required(None, "missing"), Err(ApiError::BadRequest(m)) if m == "missing"));
        assert!(required(Some("".into()), "missing").is_err());
        assert!(required(Some("  \n".into()), "missing").is_err());
    }
}
