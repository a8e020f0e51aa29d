//! The submission pipeline controller.
//!
//! Ordering:
//! 1. job lookup (precondition) → store artifact → record metadata
//! 2. extract text
//! 3. score
//! 4. persist analysis ∥ append tracking row
//! 5. candidate email ∥ recruiter email ∥ 6. mark processed
//!
//! Steps 1–3 and the analysis write are fatal. Everything else degrades into
//! a [`Diagnostic`]. Step 6 never starts before the analysis write succeeded,
//! so a processed resume always has a persisted analysis.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use sha2::{Digest, Sha256};
use tracing::{error, info, info_span, Instrument};

use crate::extraction::{is_supported_document, TextExtractor};
use crate::models::analysis::AnalysisResult;
use crate::models::job::JobDescription;
use crate::models::resume::NewResume;
use crate::notify::{Notifier, StoredArtifact};
use crate::pipeline::errors::{Diagnostic, DiagnosticKind, Stage, SubmissionError};
use crate::pipeline::{Submission, SubmissionOutcome};
use crate::repository::{JobCatalog, ResultRepository};
use crate::scoring::ScoringEngine;
use crate::sheet::{tracking_row, TrackingSheet};
use crate::storage::ResumeStore;

/// Collaborators, injected once at startup.
#[derive(Clone)]
pub struct PipelineDeps {
    pub store: Arc<dyn ResumeStore>,
    pub extractor: Arc<dyn TextExtractor>,
    pub catalog: Arc<dyn JobCatalog>,
    pub repository: Arc<dyn ResultRepository>,
    pub scorer: Arc<dyn ScoringEngine>,
    pub sheet: Arc<dyn TrackingSheet>,
    pub notifier: Arc<Notifier>,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_upload_bytes: usize,
    /// Deadline for each storage, database, sheet and mail call.
    pub call_timeout: Duration,
    pub scoring_timeout: Duration,
    #[cfg(feature = "simulate-latency")]
    pub simulated_delay: Duration,
}

pub struct SubmissionOrchestrator {
    deps: PipelineDeps,
    settings: PipelineSettings,
}

impl SubmissionOrchestrator {
    pub fn new(deps: PipelineDeps, settings: PipelineSettings) -> Self {
        Self { deps, settings }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.settings.max_upload_bytes
    }

    pub async fn process(
        &self,
        submission: Submission,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        validate(&submission, self.settings.max_upload_bytes)?;

        let span = info_span!(
            "submission",
            candidate = %submission.candidate.email,
            job_id = submission.job_id,
            bytes = submission.file.bytes.len(),
        );
        self.run(submission).instrument(span).await
    }

    async fn run(&self, submission: Submission) -> Result<SubmissionOutcome, SubmissionError> {
        let Submission {
            file,
            candidate,
            job_id,
        } = submission;
        let deps = &self.deps;
        let timeout = self.settings.call_timeout;

        info!("Processing resume submission");

        let job = self.lookup_job(job_id).await?;

        // 1. Store, then record. Metadata is only written for a stored file.
        let file_size = file.bytes.len() as i64;
        let content_sha256 = sha256_hex(&file.bytes);
        let location = within(
            timeout,
            deps.store
                .put(file.bytes.clone(), &candidate.email, &file.file_name),
        )
        .await
        .map_err(|e| fatal(SubmissionError::storage(Stage::Storage, e)))?;

        let new_resume = NewResume {
            candidate_email: candidate.email.clone(),
            file_name: file.file_name.clone(),
            file_path: location.clone(),
            file_size,
            content_sha256,
        };
        let resume_id = match within(timeout, deps.repository.save_resume_metadata(&new_resume))
            .await
        {
            Ok(id) => id,
            Err(e) => {
                if let Err(cleanup) = within(timeout, deps.store.delete(&location)).await {
                    error!("Could not remove orphaned artifact {location}: {cleanup}");
                }
                return Err(fatal(SubmissionError::storage(Stage::Metadata, e)));
            }
        };
        info!(%resume_id, "Resume stored at {location}");

        // 2. Extract.
        let resume_text = match tokio::time::timeout(timeout, deps.extractor.extract(&location))
            .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(fatal(SubmissionError::Extraction(e.to_string()))),
            Err(_) => {
                return Err(fatal(SubmissionError::Extraction(timed_out(timeout))));
            }
        };

        #[cfg(feature = "simulate-latency")]
        {
            if !self.settings.simulated_delay.is_zero() {
                tokio::time::sleep(self.settings.simulated_delay).await;
            }
        }

        // 3. Score. Not retried here; the caller may resubmit.
        let scoring_timeout = self.settings.scoring_timeout;
        let assessment =
            match tokio::time::timeout(scoring_timeout, deps.scorer.score(&resume_text, &job))
                .await
            {
                Ok(Ok(assessment)) => assessment,
                Ok(Err(e)) => {
                    return Err(fatal(SubmissionError::ScoringUnavailable(e.to_string())))
                }
                Err(_) => {
                    return Err(fatal(SubmissionError::ScoringUnavailable(timed_out(
                        scoring_timeout,
                    ))))
                }
            };
        let analysis = AnalysisResult::from_assessment(resume_id, &candidate.email, job.id, assessment);
        info!(
            score = analysis.score,
            recommendation = %analysis.recommendation,
            backend = deps.scorer.backend(),
            "Resume scored"
        );

        let mut diagnostics = Vec::new();

        // 4. Authoritative write alongside the best-effort sheet row.
        let (saved, appended) = tokio::join!(
            within(timeout, deps.repository.save_analysis_result(&analysis)),
            within(timeout, deps.sheet.append_row(tracking_row(&candidate, &analysis))),
        );
        if let Err(e) = appended {
            diagnostics.push(Diagnostic::record(
                DiagnosticKind::SecondaryWrite,
                Stage::TrackingSheet,
                e,
            ));
        }
        saved.map_err(|e| fatal(SubmissionError::storage(Stage::AnalysisPersistence, e)))?;

        // 5 and 6. Only reached once the analysis is persisted.
        let artifact = StoredArtifact {
            location: &location,
            file_name: &file.file_name,
        };
        let (candidate_sent, recruiter_sent, marked) = tokio::join!(
            within(
                timeout,
                deps.notifier
                    .send_candidate_status(&candidate, &job.title, &analysis)
            ),
            within(
                timeout,
                deps.notifier
                    .notify_recruiter(&candidate, &job.title, &analysis, artifact)
            ),
            within(timeout, deps.repository.mark_processed(resume_id)),
        );
        if let Err(e) = candidate_sent {
            diagnostics.push(Diagnostic::record(
                DiagnosticKind::Notification,
                Stage::CandidateNotification,
                e,
            ));
        }
        if let Err(e) = recruiter_sent {
            diagnostics.push(Diagnostic::record(
                DiagnosticKind::Notification,
                Stage::RecruiterNotification,
                e,
            ));
        }
        if let Err(e) = marked {
            diagnostics.push(Diagnostic::record(
                DiagnosticKind::StateTransition,
                Stage::MarkProcessed,
                e,
            ));
        }

        info!(
            %resume_id,
            degraded_steps = diagnostics.len(),
            "Submission processed"
        );

        Ok(SubmissionOutcome {
            success: true,
            resume_id,
            analysis,
            diagnostics,
        })
    }

    async fn lookup_job(&self, job_id: i64) -> Result<JobDescription, SubmissionError> {
        within(
            self.settings.call_timeout,
            self.deps.catalog.fetch_job_description(job_id),
        )
        .await
        .map_err(|e| fatal(SubmissionError::storage(Stage::JobLookup, e)))?
        .ok_or_else(|| {
            info!("Rejected submission for unknown job");
            SubmissionError::Validation(format!("job {job_id} does not exist"))
        })
    }
}

/// Checks the preconditions that need no I/O.
pub fn validate(submission: &Submission, max_upload_bytes: usize) -> Result<(), SubmissionError> {
    let invalid = |msg: String| Err(SubmissionError::Validation(msg));
    let size = submission.file.bytes.len();

    if size == 0 {
        return invalid("uploaded file is empty".to_string());
    }
    if size > max_upload_bytes {
        return invalid(format!(
            "uploaded file is {size} bytes; the limit is {max_upload_bytes}"
        ));
    }
    let file_name = submission.file.file_name.trim();
    if file_name.is_empty() {
        return invalid("file name is required".to_string());
    }
    if !is_supported_document(file_name) {
        return invalid(format!(
            "'{file_name}' is not a supported format; upload a PDF or plain-text file"
        ));
    }
    if submission.candidate.name.trim().is_empty() {
        return invalid("candidate name is required".to_string());
    }
    let email = submission.candidate.email.trim();
    if email.is_empty() {
        return invalid("candidate email is required".to_string());
    }
    if !is_plausible_email(email) {
        return invalid(format!("'{email}' is not a valid email address"));
    }
    if submission.job_id <= 0 {
        return invalid(format!("job id must be positive, got {}", submission.job_id));
    }
    Ok(())
}

/// `local@domain.tld` with no whitespace. Deliverability is the mail server's problem.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Runs an external call under a deadline; a timeout is reported like any other error.
async fn within<T, F>(limit: Duration, call: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| Err(anyhow!(timed_out(limit))))
}

fn timed_out(limit: Duration) -> String {
    format!("timed out after {}ms", limit.as_millis())
}

fn fatal(err: SubmissionError) -> SubmissionError {
    error!(stage = %err.stage(), "Submission aborted: {err}");
    err
}
