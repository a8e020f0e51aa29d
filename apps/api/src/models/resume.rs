use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored résumé upload. `processed` only ever moves from false to true.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub candidate_email: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_sha256: String,
    pub uploaded_at: DateTime<Utc>,
    pub processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Metadata recorded once the upload is durably stored. The id is assigned on insert.
#[derive(Debug, Clone)]
pub struct NewResume {
    pub candidate_email: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_sha256: String,
}
