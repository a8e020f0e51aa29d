//! Scoring — pluggable engines that detect skills and experience in résumé text.
//!
//! Backends only decide *what was found*. The score, `is_match` and the
//! recommendation are always computed by [`policy::ScoringPolicy`].
//!
//! `SubmissionOrchestrator` holds an `Arc<dyn ScoringEngine>` chosen at startup.

pub mod matcher;
pub mod policy;
pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::llm_client::LlmClient;
use crate::models::analysis::Assessment;
use crate::models::job::JobDescription;
use crate::scoring::matcher::{detect_experience_years, SkillMatcher};
use crate::scoring::policy::{DetectedProfile, ScoringPolicy};
use crate::scoring::prompts::{SKILL_DETECTION_PROMPT, SKILL_DETECTION_SYSTEM};

/// Résumé text beyond this many characters is not sent to the model.
const MAX_PROMPT_RESUME_CHARS: usize = 24_000;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scoring capability unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ScoringEngine: Send + Sync {
    async fn score(&self, resume_text: &str, job: &JobDescription)
        -> Result<Assessment, ScoringError>;

    /// Short label for logs, e.g. "keyword" or "llm".
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordScoringEngine — default, deterministic
// ────────────────────────────────────────────────────────────────────────────

pub struct KeywordScoringEngine {
    matcher: Arc<dyn SkillMatcher>,
    policy: ScoringPolicy,
}

impl KeywordScoringEngine {
    pub fn new(matcher: Arc<dyn SkillMatcher>, policy: ScoringPolicy) -> Self {
        Self { matcher, policy }
    }
}

#[async_trait]
impl ScoringEngine for KeywordScoringEngine {
    async fn score(
        &self,
        resume_text: &str,
        job: &JobDescription,
    ) -> Result<Assessment, ScoringError> {
        let mut candidates = job.required_skills.clone();
        candidates.extend(job.preferred_skills.iter().cloned());

        let detected = DetectedProfile {
            skills: self.matcher.detect(resume_text, &candidates),
            experience_years: detect_experience_years(resume_text),
        };
        Ok(self.policy.assess(job, &detected))
    }

    fn backend(&self) -> &'static str {
        "keyword"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LlmScoringEngine — semantic detection, same policy
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ModelDetection {
    #[serde(default)]
    detected_skills: Vec<String>,
    #[serde(default)]
    experience_years: u32,
    #[serde(default)]
    summary: String,
}

pub struct LlmScoringEngine {
    llm: LlmClient,
    policy: ScoringPolicy,
}

impl LlmScoringEngine {
    pub fn new(llm: LlmClient, policy: ScoringPolicy) -> Self {
        Self { llm, policy }
    }
}

#[async_trait]
impl ScoringEngine for LlmScoringEngine {
    async fn score(
        &self,
        resume_text: &str,
        job: &JobDescription,
    ) -> Result<Assessment, ScoringError> {
        let prompt = build_detection_prompt(resume_text, job);
        let detection: ModelDetection = self
            .llm
            .call_json(&prompt, SKILL_DETECTION_SYSTEM)
            .await
            .map_err(|e| ScoringError::Unavailable(format!("{} call failed: {e}", self.llm.model())))?;

        let detected = DetectedProfile {
            skills: restrict_to_job_skills(&detection.detected_skills, job),
            experience_years: detection.experience_years,
        };
        let mut assessment = self.policy.assess(job, &detected);
        let summary = detection.summary.trim();
        if !summary.is_empty() {
            assessment.explanation = format!("{} {summary}", assessment.explanation);
        }
        Ok(assessment)
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

fn build_detection_prompt(resume_text: &str, job: &JobDescription) -> String {
    let skills: Vec<String> = job
        .required_skills
        .iter()
        .chain(job.preferred_skills.iter())
        .map(|s| format!("- {s}"))
        .collect();
    let resume_text: String = resume_text.chars().take(MAX_PROMPT_RESUME_CHARS).collect();

    SKILL_DETECTION_PROMPT
        .replace("{job_title}", &job.title)
        .replace("{skills}", &skills.join("\n"))
        .replace("{resume_text}", &resume_text)
}

/// Drops anything the model invented and maps the rest back to the job's spelling.
fn restrict_to_job_skills(reported: &[String], job: &JobDescription) -> Vec<String> {
    job.required_skills
        .iter()
        .chain(job.preferred_skills.iter())
        .filter(|skill| reported.iter().any(|r| r.trim().eq_ignore_ascii_case(skill.trim())))
        .cloned()
        .collect()
}
