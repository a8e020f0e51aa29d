//! Best-effort tracking spreadsheet. Not a system of record.

pub mod auth;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::json;
use tracing::debug;

use crate::models::analysis::AnalysisResult;
use crate::models::candidate::Candidate;
use crate::sheet::auth::AccessTokenSource;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[async_trait]
pub trait TrackingSheet: Send + Sync {
    async fn append_row(&self, fields: Vec<String>) -> Result<()>;
}

/// Column order: timestamp, name, email, phone, score, match, identified
/// skills, missing skills, recommendation, resume id.
pub fn tracking_row(candidate: &Candidate, analysis: &AnalysisResult) -> Vec<String> {
    vec![
        analysis.analyzed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        candidate.name.clone(),
        candidate.email.clone(),
        candidate.phone().unwrap_or_default().to_string(),
        analysis.score.to_string(),
        if analysis.is_match { "Yes" } else { "No" }.to_string(),
        analysis.identified_skills.join(", "),
        analysis.missing_skills.join(", "),
        analysis.recommendation.to_string(),
        analysis.resume_id.to_string(),
    ]
}

/// Appends rows through the Sheets v4 `values:append` endpoint.
pub struct GoogleSheetsTracker {
    client: Client,
    api_base: Url,
    spreadsheet_id: String,
    range: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl GoogleSheetsTracker {
    pub fn new(
        client: Client,
        spreadsheet_id: String,
        range: String,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Result<Self> {
        Ok(Self {
            client,
            api_base: Url::parse(SHEETS_API_BASE)?,
            spreadsheet_id,
            range,
            tokens,
        })
    }

    /// Points the tracker at another API host.
    pub fn with_api_base(mut self, api_base: Url) -> Self {
        self.api_base = api_base;
        self
    }

    /// The spreadsheet id and range are pushed as single path segments, so
    /// reserved characters in a tab name are percent-encoded.
    fn append_url(&self) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Sheets API base '{}' cannot carry a path", self.api_base))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{}:append", self.range));
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        Ok(url)
    }
}

#[async_trait]
impl TrackingSheet for GoogleSheetsTracker {
    async fn append_row(&self, fields: Vec<String>) -> Result<()> {
        let token = self
            .tokens
            .access_token()
            .await
            .context("obtaining Sheets access token")?;
        let response = self
            .client
            .post(self.append_url()?)
            .bearer_auth(token)
            .json(&json!({ "values": [fields] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Sheets append returned {status}: {body}"));
        }
        Ok(())
    }
}

/// Used when no spreadsheet is configured.
pub struct DisabledTrackingSheet;

#[async_trait]
impl TrackingSheet for DisabledTrackingSheet {
    async fn append_row(&self, fields: Vec<String>) -> Result<()> {
        debug!(columns = fields.len(), "tracking sheet disabled; row not appended");
        Ok(())
    }
}
