//! HTTP error responses.

use axum::Json;
use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docchat_model::ModelError;
use docchat_rag::RagError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors a handler can return.
///
/// Every variant renders as `{"status": "error", "message": …}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request is missing a field or has a blank one.
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Rag(#[from] RagError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rag(err) if err.is_upstream() => StatusCode::BAD_GATEWAY,
            Self::Rag(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Model(ModelError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Model(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        }
        (status, Json(json!({"status": "error", "message": self.to_string()}))).into_response()
    }
}

/// A JSON body whose parse failures are reported as [`ApiError::BadRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Reject a missing or whitespace-only parameter.
pub fn require<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, ApiError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError::BadRequest(format!("'{name}' must not be blank"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);

        let upstream = RagError::EmbeddingError { provider: "p".into(), message: "m".into() };
        assert_eq!(ApiError::from(upstream).status(), StatusCode::BAD_GATEWAY);

        let local = RagError::ConfigError("bad top_k".into());
        assert_eq!(ApiError::from(local).status(), StatusCode::INTERNAL_SERVER_ERROR);

        let api = ModelError::Api {
            provider: "p".into(),
            code: Some("rate_limit_exceeded".into()),
            message: "slow".into(),
        };
        assert_eq!(ApiError::from(api).status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn require_rejects_blank() {
        assert_eq!(require("q", Some("hi")).unwrap(), "hi");
        assert!(require("q", Some("  ")).is_err());
        assert!(require("q", None).is_err());
    }
}
