use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::job::split_skills;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Interview,
    Reject,
    Pending,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Interview => "interview",
            Recommendation::Reject => "reject",
            Recommendation::Pending => "pending",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recommendation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interview" => Ok(Recommendation::Interview),
            "reject" => Ok(Recommendation::Reject),
            "pending" => Ok(Recommendation::Pending),
            other => Err(format!("unknown recommendation '{other}'")),
        }
    }
}

/// Output of a scoring engine, before it is bound to a résumé and job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub score: u8,
    pub is_match: bool,
    pub identified_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub recommendation: Recommendation,
    pub explanation: String,
}

/// The scored outcome of one submission. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub resume_id: Uuid,
    pub candidate_email: String,
    pub job_id: i64,
    pub score: u8,
    pub is_match: bool,
    pub identified_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub recommendation: Recommendation,
    pub explanation: String,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn from_assessment(
        resume_id: Uuid,
        candidate_email: &str,
        job_id: i64,
        assessment: Assessment,
    ) -> Self {
        Self {
            resume_id,
            candidate_email: candidate_email.to_string(),
            job_id,
            score: assessment.score,
            is_match: assessment.is_match,
            identified_skills: assessment.identified_skills,
            missing_skills: assessment.missing_skills,
            recommendation: assessment.recommendation,
            explanation: assessment.explanation,
            analyzed_at: Utc::now(),
        }
    }
}

/// Raw `candidate_analysis` row.
#[derive(Debug, Clone, FromRow)]
pub struct AnalysisRow {
    pub resume_id: Uuid,
    pub candidate_email: String,
    pub job_id: i64,
    pub match_score: i16,
    pub is_match: bool,
    pub identified_skills: String,
    pub missing_skills: String,
    pub recommendation: String,
    pub explanation: String,
    pub analyzed_at: DateTime<Utc>,
}

impl TryFrom<AnalysisRow> for AnalysisResult {
    type Error = anyhow::Error;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        Ok(Self {
            resume_id: row.resume_id,
            candidate_email: row.candidate_email,
            job_id: row.job_id,
            score: row.match_score.clamp(0, 100) as u8,
            is_match: row.is_match,
            identified_skills: split_skills(&row.identified_skills),
            missing_skills: split_skills(&row.missing_skills),
            recommendation: row.recommendation.parse().map_err(anyhow::Error::msg)?,
            explanation: row.explanation,
            analyzed_at: row.analyzed_at,
        })
    }
}
