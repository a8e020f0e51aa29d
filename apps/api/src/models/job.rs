use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Raw `job_descriptions` row. Skill lists are stored as comma-separated text.
#[derive(Debug, Clone, FromRow)]
pub struct JobDescriptionRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub required_skills: Option<String>,
    pub preferred_skills: Option<String>,
    pub min_experience_years: i32,
}

/// A job opening as seen by the pipeline. Read-only; owned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub min_experience_years: u32,
}

impl From<JobDescriptionRow> for JobDescription {
    fn from(row: JobDescriptionRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            required_skills: split_skills(row.required_skills.as_deref().unwrap_or_default()),
            preferred_skills: split_skills(row.preferred_skills.as_deref().unwrap_or_default()),
            min_experience_years: row.min_experience_years.max(0) as u32,
        }
    }
}

/// Parses a comma-separated skill field into a de-duplicated list.
/// Duplicates are detected case-insensitively; the first spelling wins.
pub fn split_skills(field: &str) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for skill in field.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !skills.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            skills.push(skill.to_string());
        }
    }
    skills
}

/// Inverse of [`split_skills`]. Commas inside a skill name would break the
/// round trip, so they are replaced with spaces.
pub fn join_skills(skills: &[String]) -> String {
    skills
        .iter()
        .map(|s| s.replace(',', " ").trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
