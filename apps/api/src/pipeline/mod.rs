//! Submission processing: validate, store, extract, score, record, notify.

pub mod errors;
pub mod orchestrator;

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::models::analysis::AnalysisResult;
use crate::models::candidate::Candidate;

pub use errors::{Diagnostic, SubmissionError};
pub use orchestrator::{PipelineDeps, PipelineSettings, SubmissionOrchestrator};

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub file: UploadedFile,
    pub candidate: Candidate,
    pub job_id: i64,
}

/// Result of a run that reached a persisted analysis. `diagnostics` lists the
/// best-effort steps that failed; they never flip `success`.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub success: bool,
    pub resume_id: Uuid,
    pub analysis: AnalysisResult,
    pub diagnostics: Vec<Diagnostic>,
}
