use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Where in the pipeline something happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validation,
    JobLookup,
    Storage,
    Metadata,
    Extraction,
    Scoring,
    AnalysisPersistence,
    TrackingSheet,
    CandidateNotification,
    RecruiterNotification,
    MarkProcessed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validation => "validation",
            Stage::JobLookup => "job_lookup",
            Stage::Storage => "storage",
            Stage::Metadata => "metadata",
            Stage::Extraction => "extraction",
            Stage::Scoring => "scoring",
            Stage::AnalysisPersistence => "analysis_persistence",
            Stage::TrackingSheet => "tracking_sheet",
            Stage::CandidateNotification => "candidate_notification",
            Stage::RecruiterNotification => "recruiter_notification",
            Stage::MarkProcessed => "mark_processed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures that abort a run. Exactly one is returned to the caller.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("invalid submission: {0}")]
    Validation(String),

    #[error("{stage} failed: {message}")]
    Storage { stage: Stage, message: String },

    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("scoring unavailable: {0}")]
    ScoringUnavailable(String),
}

impl SubmissionError {
    pub fn storage(stage: Stage, err: impl fmt::Display) -> Self {
        SubmissionError::Storage {
            stage,
            message: err.to_string(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            SubmissionError::Validation(_) => Stage::Validation,
            SubmissionError::Storage { stage, .. } => *stage,
            SubmissionError::Extraction(_) => Stage::Extraction,
            SubmissionError::ScoringUnavailable(_) => Stage::Scoring,
        }
    }

    /// Whether resubmitting the same input may succeed. Bad input never will.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SubmissionError::Validation(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    SecondaryWrite,
    Notification,
    StateTransition,
}

/// A non-fatal failure. The run still reports success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub stage: Stage,
    pub message: String,
}

impl Diagnostic {
    /// Builds the entry and logs it; degraded steps are never silent.
    pub fn record(kind: DiagnosticKind, stage: Stage, err: impl fmt::Display) -> Self {
        let message = err.to_string();
        warn!(stage = %stage, kind = ?kind, "non-fatal pipeline failure: {message}");
        Self {
            kind,
            stage,
            message,
        }
    }
}
