//! Authoritative storage contracts and their Postgres implementation.

pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::analysis::AnalysisResult;
use crate::models::job::JobDescription;
use crate::models::resume::{NewResume, ResumeRow};

pub use postgres::PgRepository;

/// Largest page `get_unprocessed` will return.
pub const MAX_UNPROCESSED_PAGE: i64 = 100;

#[async_trait]
pub trait JobCatalog: Send + Sync {
    /// `Ok(None)` when no job has this id.
    async fn fetch_job_description(&self, job_id: i64) -> Result<Option<JobDescription>>;
}

/// Every write is a single statement, so readers never see a partial row.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    async fn save_resume_metadata(&self, resume: &NewResume) -> Result<Uuid>;

    async fn save_analysis_result(&self, analysis: &AnalysisResult) -> Result<()>;

    /// Idempotent. Marking an already-processed resume succeeds and keeps
    /// its original `processed_at`.
    async fn mark_processed(&self, resume_id: Uuid) -> Result<()>;

    /// Oldest first. `limit` is clamped to `1..=MAX_UNPROCESSED_PAGE`.
    async fn get_unprocessed(&self, limit: i64) -> Result<Vec<ResumeRow>>;

    async fn find_resume(&self, resume_id: Uuid) -> Result<Option<ResumeRow>>;

    async fn find_analysis(&self, resume_id: Uuid) -> Result<Option<AnalysisResult>>;
}

pub fn clamp_page(limit: i64) -> i64 {
    limit.clamp(1, MAX_UNPROCESSED_PAGE)
}
