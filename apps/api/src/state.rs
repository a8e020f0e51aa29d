use std::sync::Arc;

use crate::pipeline::SubmissionOrchestrator;
use crate::remote::RemoteFileFetcher;
use crate::repository::ResultRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SubmissionOrchestrator>,
    /// Read side for the operator endpoints.
    pub repository: Arc<dyn ResultRepository>,
    /// Downloads the files linked from webhook events.
    pub remote_files: Arc<RemoteFileFetcher>,
}
