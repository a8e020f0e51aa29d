use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::pipeline::SubmissionError;
use crate::remote::FetchError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Rejected(_) | FetchError::TooLarge(_) => AppError::Validation(err.to_string()),
            FetchError::Upstream(msg) => AppError::Upstream(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = match &self {
            AppError::NotFound(msg) => {
                return error_body(StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None)
            }
            AppError::Validation(msg) => {
                return error_body(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream failure: {msg}");
                return error_body(StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone(), None);
            }
            AppError::Submission(err) => err,
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                return error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                );
            }
        };

        // Storage details stay in the logs; the caller only learns which stage failed.
        let (status, code, message) = match err {
            SubmissionError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            SubmissionError::Storage { stage, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                format!("A storage error occurred during {stage}"),
            ),
            SubmissionError::Extraction(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_ERROR",
                msg.clone(),
            ),
            SubmissionError::ScoringUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SCORING_UNAVAILABLE",
                "Scoring is temporarily unavailable; please resubmit later".to_string(),
            ),
        };
        error_body(status, code, message, Some(err))
    }
}

fn error_body(
    status: StatusCode,
    code: &str,
    message: String,
    submission: Option<&SubmissionError>,
) -> Response {
    let mut error = json!({
        "code": code,
        "message": message,
    });
    if let Some(err) = submission {
        error["stage"] = json!(err.stage());
        error["retryable"] = json!(err.is_retryable());
    }
    (status, Json(json!({ "success": false, "error": error }))).into_response()
}
