use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    Validation(String),

    #[error("Server misconfigured: {0}")]
    Configuration(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Upstream request failed: {message}")]
    Upstream {
        /// Status the provider answered with, if it answered at all.
        status: Option<StatusCode>,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Provider status and body relayed as-is, without rewrapping.
    #[error("Upstream returned {status}")]
    UpstreamPassthrough {
        status: StatusCode,
        body: bytes::Bytes,
    },

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// Upstream failure without a provider response (connect error, timeout).
    pub fn upstream_unreachable(err: impl std::fmt::Display) -> Self {
        AppError::Upstream {
            status: None,
            message: err.to_string(),
            details: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                msg,
                None,
            ),
            AppError::Synthesis(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SYNTHESIS_ERROR",
                msg,
                None,
            ),
            AppError::Upstream {
                status,
                message,
                details,
            } => (
                status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                "UPSTREAM_ERROR",
                message,
                details,
            ),
            AppError::UpstreamPassthrough { status, body } => {
                tracing::error!("Upstream rejected request: {}", status);
                return (status, [(header::CONTENT_TYPE, "application/json")], body)
                    .into_response();
            }
            AppError::Multipart(e) => (
                StatusCode::BAD_REQUEST,
                "MULTIPART_ERROR",
                e.to_string(),
                None,
            ),
        };

        tracing::error!("Request failed: {} - {}", code, message);

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
                details,
            }),
        )
            .into_response()
    }
}
