use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::AnalysisResult;
use crate::models::resume::ResumeRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UnprocessedQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Serialize)]
pub struct ResumeDetail {
    pub resume: ResumeRow,
    pub analysis: Option<AnalysisResult>,
}

/// GET /api/v1/resumes/unprocessed
/// Oldest first, for re-driving submissions that stopped before completion.
pub async fn handle_list_unprocessed(
    State(state): State<AppState>,
    Query(params): Query<UnprocessedQuery>,
) -> Result<Json<Vec<ResumeRow>>, AppError> {
    let rows = state.repository.get_unprocessed(params.limit).await?;
    Ok(Json(rows))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeDetail>, AppError> {
    let resume = state
        .repository
        .find_resume(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    let analysis = state.repository.find_analysis(id).await?;
    Ok(Json(ResumeDetail { resume, analysis }))
}
