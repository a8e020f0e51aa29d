use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::candidate::Candidate;
use crate::pipeline::{Submission, UploadedFile};
use crate::state::AppState;

/// Async callback sent by the form provider.
#[derive(Debug, Deserialize)]
#[serde(tag = "event")]
pub enum WebhookEvent {
    #[serde(rename = "submission.created")]
    SubmissionCreated {
        candidate: Candidate,
        job_id: i64,
        file_name: String,
        file_url: String,
    },
    #[serde(other)]
    Unsupported,
}

/// POST /submit
/// Multipart fields: `resume` (file), `name`, `email`, `phone` (optional), `job_id`.
pub async fn handle_submit(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut file: Option<UploadedFile> = None;
    let mut name = String::new();
    let mut email = String::new();
    let mut phone = None;
    let mut job_id = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "resume" => {
                let file_name = field.file_name().unwrap_or_default().trim().to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                file = Some(UploadedFile { file_name, bytes });
            }
            "name" => name = text(field).await?,
            "email" => email = text(field).await?,
            "phone" => phone = Some(text(field).await?),
            "job_id" => job_id = Some(parse_job_id(&text(field).await?)?),
            other => warn!("Ignoring unexpected multipart field '{other}'"),
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("a resume file is required".to_string()))?;
    let job_id = job_id.ok_or_else(|| AppError::Validation("job_id is required".to_string()))?;
    let submission = Submission {
        file,
        candidate: Candidate { name, email, phone },
        job_id,
    };

    let outcome = state.orchestrator.process(submission).await?;
    Ok((StatusCode::CREATED, Json(outcome)).into_response())
}

/// POST /webhook
/// Runs `submission.created` events through the same pipeline as `/submit`.
pub async fn handle_webhook(
    State(state): State<AppState>,
    Json(event): Json<WebhookEvent>,
) -> Result<Response, AppError> {
    let (candidate, job_id, file_name, file_url) = match event {
        WebhookEvent::SubmissionCreated {
            candidate,
            job_id,
            file_name,
            file_url,
        } => (candidate, job_id, file_name, file_url),
        WebhookEvent::Unsupported => {
            info!("Ignoring unsupported webhook event");
            return Ok((StatusCode::ACCEPTED, Json(json!({ "status": "ignored" }))).into_response());
        }
    };

    let bytes = state
        .remote_files
        .fetch(&file_url, state.orchestrator.max_upload_bytes())
        .await?;
    let submission = Submission {
        file: UploadedFile {
            file_name: file_name.trim().to_string(),
            bytes,
        },
        candidate: Candidate {
            name: candidate.name.trim().to_string(),
            email: candidate.email.trim().to_string(),
            phone: candidate.phone,
        },
        job_id,
    };

    let outcome = state.orchestrator.process(submission).await?;
    Ok((StatusCode::CREATED, Json(outcome)).into_response())
}

async fn text(field: Field<'_>) -> Result<String, AppError> {
    Ok(field.text().await.map_err(bad_multipart)?.trim().to_string())
}

fn parse_job_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("job_id must be an integer, got '{raw}'")))
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(err.body_text())
}
