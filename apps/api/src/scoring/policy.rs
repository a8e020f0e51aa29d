//! Turns detected skills and experience into a score and recommendation.
//!
//! The engine that detects skills is pluggable; this policy is not. Every
//! backend funnels through [`ScoringPolicy::assess`] so `score`, `is_match`
//! and `recommendation` can never disagree.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::models::analysis::{Assessment, Recommendation};
use crate::models::job::JobDescription;

/// Relative weight of each scoring dimension. Normalised by their sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub required_skills: f64,
    pub preferred_skills: f64,
    pub experience: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            required_skills: 0.6,
            preferred_skills: 0.2,
            experience: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub match_threshold: u8,
    pub reject_threshold: u8,
    pub weights: ScoreWeights,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            match_threshold: 70,
            reject_threshold: 40,
            weights: ScoreWeights::default(),
        }
    }
}

/// What a backend found in the résumé. Skill names use the job's spelling.
#[derive(Debug, Clone, Default)]
pub struct DetectedProfile {
    pub skills: Vec<String>,
    pub experience_years: u32,
}

impl ScoringPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.match_threshold > 100 {
            bail!("match threshold must be within 0-100, got {}", self.match_threshold);
        }
        if self.reject_threshold > self.match_threshold {
            bail!(
                "reject threshold ({}) must not exceed match threshold ({})",
                self.reject_threshold,
                self.match_threshold
            );
        }
        let w = &self.weights;
        for (name, value) in [
            ("required_skills", w.required_skills),
            ("preferred_skills", w.preferred_skills),
            ("experience", w.experience),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("score weight '{name}' must be a non-negative number, got {value}");
            }
        }
        if w.required_skills + w.preferred_skills + w.experience <= 0.0 {
            bail!("score weights must not all be zero");
        }
        Ok(())
    }

    pub fn is_match(&self, score: u8) -> bool {
        score >= self.match_threshold
    }

    pub fn recommend(&self, score: u8, missing_required: bool) -> Recommendation {
        if self.is_match(score) && !missing_required {
            Recommendation::Interview
        } else if score < self.reject_threshold {
            Recommendation::Reject
        } else {
            Recommendation::Pending
        }
    }

    pub fn assess(&self, job: &JobDescription, detected: &DetectedProfile) -> Assessment {
        let found = |skill: &str| {
            detected
                .skills
                .iter()
                .any(|d| d.trim().eq_ignore_ascii_case(skill.trim()))
        };

        let (found_required, missing_skills): (Vec<String>, Vec<String>) =
            job.required_skills.iter().cloned().partition(|s| found(s.as_str()));
        let found_preferred: Vec<String> = job
            .preferred_skills
            .iter()
            .filter(|s| found(s.as_str()))
            .filter(|s| !found_required.iter().any(|r| r.eq_ignore_ascii_case(s)))
            .cloned()
            .collect();

        let preferred_found = job.preferred_skills.iter().filter(|s| found(s.as_str())).count();

        let required_coverage = coverage(found_required.len(), job.required_skills.len());
        let preferred_coverage = coverage(preferred_found, job.preferred_skills.len());
        let experience =
            experience_proximity(detected.experience_years, job.min_experience_years);

        let w = &self.weights;
        let total = w.required_skills + w.preferred_skills + w.experience;
        let raw = if total > 0.0 {
            (w.required_skills * required_coverage
                + w.preferred_skills * preferred_coverage
                + w.experience * experience)
                / total
        } else {
            0.0
        };
        let score = (raw * 100.0).round().clamp(0.0, 100.0) as u8;

        let recommendation = self.recommend(score, !missing_skills.is_empty());
        let explanation = build_explanation(
            score,
            job,
            found_required.len(),
            preferred_found,
            detected.experience_years,
            &missing_skills,
        );

        let mut identified_skills = found_required;
        identified_skills.extend(found_preferred);

        Assessment {
            score,
            is_match: self.is_match(score),
            identified_skills,
            missing_skills,
            recommendation,
            explanation,
        }
    }
}

/// An empty requirement set is fully covered.
fn coverage(found: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        found as f64 / total as f64
    }
}

fn experience_proximity(years: u32, minimum: u32) -> f64 {
    if minimum == 0 {
        1.0
    } else {
        (years as f64 / minimum as f64).min(1.0)
    }
}

fn build_explanation(
    score: u8,
    job: &JobDescription,
    required_found: usize,
    preferred_found: usize,
    years: u32,
    missing: &[String],
) -> String {
    let mut text = format!(
        "Score {score}/100: {required_found} of {} required and {preferred_found} of {} preferred skills found; {years} years of experience against a {}-year minimum.",
        job.required_skills.len(),
        job.preferred_skills.len(),
        job.min_experience_years,
    );
    if !missing.is_empty() {
        let top: Vec<&str> = missing.iter().take(3).map(String::as_str).collect();
        text.push_str(&format!(" Missing required skills: {}.", top.join(", ")));
    }
    text
}
