use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Request payload could not be turned into a project input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model artifact missing, unreadable or structurally invalid
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Feature vector, schema and artifact disagree on shape or order
    #[error("Encoding mismatch for {model} model: {message}")]
    EncodingMismatch { model: String, message: String },

    /// Estimator failed while producing a prediction
    #[error("Inference error: {0}")]
    Inference(String),

    /// Chart generation or chart file write failed
    #[error("Rendering error: {0}")]
    Rendering(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn encoding_mismatch(model: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::EncodingMismatch {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::EncodingMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Rendering(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            AppError::EncodingMismatch { .. } => "ENCODING_MISMATCH",
            AppError::Inference(_) => "INFERENCE_ERROR",
            AppError::Rendering(_) => "RENDERING_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        tracing::error!(
            error_code = error_code,
            status_code = status.as_u16(),
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl From<axum::extract::rejection::FormRejection> for AppError {
    fn from(err: axum::extract::rejection::FormRejection) -> Self {
        AppError::InvalidInput(err.body_text())
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::InvalidInput(err.body_text())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
