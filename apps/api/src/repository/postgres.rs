use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::analysis::{AnalysisResult, AnalysisRow};
use crate::models::job::{join_skills, JobDescription, JobDescriptionRow};
use crate::models::resume::{NewResume, ResumeRow};
use crate::repository::{clamp_page, JobCatalog, ResultRepository};

/// Postgres-backed job catalog and result repository.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobCatalog for PgRepository {
    async fn fetch_job_description(&self, job_id: i64) -> Result<Option<JobDescription>> {
        let row = sqlx::query_as::<_, JobDescriptionRow>(
            r#"
            SELECT id, title, description, required_skills, preferred_skills, min_experience_years
            FROM job_descriptions
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(JobDescription::from))
    }
}

#[async_trait]
impl ResultRepository for PgRepository {
    async fn save_resume_metadata(&self, resume: &NewResume) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO resumes
                (candidate_email, file_name, file_path, file_size, content_sha256)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&resume.candidate_email)
        .bind(&resume.file_name)
        .bind(&resume.file_path)
        .bind(resume.file_size)
        .bind(&resume.content_sha256)
        .fetch_one(&self.pool)
        .await?;

        info!("Recorded resume {id} for {}", resume.candidate_email);
        Ok(id)
    }

    async fn save_analysis_result(&self, analysis: &AnalysisResult) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO candidate_analysis
                (resume_id, candidate_email, job_id, match_score, is_match,
                 identified_skills, missing_skills, recommendation, explanation, analyzed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(analysis.resume_id)
        .bind(&analysis.candidate_email)
        .bind(analysis.job_id)
        .bind(i16::from(analysis.score))
        .bind(analysis.is_match)
        .bind(join_skills(&analysis.identified_skills))
        .bind(join_skills(&analysis.missing_skills))
        .bind(analysis.recommendation.as_str())
        .bind(&analysis.explanation)
        .bind(analysis.analyzed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_processed(&self, resume_id: Uuid) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE resumes
            SET processed = TRUE, processed_at = NOW()
            WHERE id = $1 AND processed = FALSE
            "#,
        )
        .bind(resume_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            let exists: Option<bool> =
                sqlx::query_scalar("SELECT processed FROM resumes WHERE id = $1")
                    .bind(resume_id)
                    .fetch_optional(&self.pool)
                    .await?;
            match exists {
                Some(true) => warn!("Resume {resume_id} was already marked processed"),
                _ => bail!("resume {resume_id} does not exist"),
            }
        }
        Ok(())
    }

    async fn get_unprocessed(&self, limit: i64) -> Result<Vec<ResumeRow>> {
        Ok(sqlx::query_as::<_, ResumeRow>(
            r#"
            SELECT * FROM resumes
            WHERE processed = FALSE
            ORDER BY uploaded_at ASC
            LIMIT $1
            "#,
        )
        .bind(clamp_page(limit))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn find_resume(&self, resume_id: Uuid) -> Result<Option<ResumeRow>> {
        Ok(
            sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
                .bind(resume_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_analysis(&self, resume_id: Uuid) -> Result<Option<AnalysisResult>> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT resume_id, candidate_email, job_id, match_score, is_match,
                   identified_skills, missing_skills, recommendation, explanation, analyzed_at
            FROM candidate_analysis
            WHERE resume_id = $1
            "#,
        )
        .bind(resume_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AnalysisResult::try_from).transpose()
    }
}
