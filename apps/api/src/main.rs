mod config;
mod db;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod notify;
mod pipeline;
mod remote;
mod repository;
mod routes;
mod scoring;
mod sheet;
mod state;
mod storage;

#[cfg(test)]
mod testing;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, ScoringBackend, SkillMatching, StorageConfig};
use crate::db::create_pool;
use crate::extraction::DocumentTextExtractor;
use crate::llm_client::LlmClient;
use crate::notify::transport::SmtpMailTransport;
use crate::notify::Notifier;
use crate::pipeline::{PipelineDeps, PipelineSettings, SubmissionOrchestrator};
use crate::repository::PgRepository;
use crate::remote::RemoteFileFetcher;
use crate::routes::build_router;
use crate::scoring::matcher::{SkillMatcher, SubstringMatcher, WholeWordMatcher};
use crate::scoring::{KeywordScoringEngine, LlmScoringEngine, ScoringEngine};
use crate::sheet::auth::{ServiceAccountKey, ServiceAccountTokenProvider, SHEETS_SCOPE};
use crate::sheet::{DisabledTrackingSheet, GoogleSheetsTracker, TrackingSheet};
use crate::state::AppState;
use crate::storage::{LocalResumeStore, ResumeStore, S3ResumeStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screening API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL backs both the job catalog and the result repository
    let db = create_pool(&config.database_url).await?;
    let repository = Arc::new(PgRepository::new(db));

    let store = build_store(&config).await;
    let http = reqwest::Client::builder()
        .timeout(config.call_timeout)
        .build()?;

    let scorer = build_scorer(&config)?;
    info!("Scoring backend: {}", scorer.backend());

    let sheet: Arc<dyn TrackingSheet> = match &config.sheets {
        Some(sheets) => {
            let key = ServiceAccountKey::from_file(&sheets.credentials_path)?;
            info!(
                "Tracking sheet enabled (range {}, service account {})",
                sheets.range, key.client_email
            );
            let tokens = ServiceAccountTokenProvider::new(http.clone(), key, SHEETS_SCOPE)?;
            Arc::new(GoogleSheetsTracker::new(
                http.clone(),
                sheets.spreadsheet_id.clone(),
                sheets.range.clone(),
                Arc::new(tokens),
            )?)
        }
        None => {
            info!("GOOGLE_SHEETS_SPREADSHEET_ID not set; tracking sheet disabled");
            Arc::new(DisabledTrackingSheet)
        }
    };

    let transport = SmtpMailTransport::new(&config.smtp)?;
    let notifier = Notifier::new(
        Arc::new(transport),
        store.clone(),
        config.recruiter_email.clone(),
    );

    let deps = PipelineDeps {
        store: store.clone(),
        extractor: Arc::new(DocumentTextExtractor::new(store)),
        catalog: repository.clone(),
        repository: repository.clone(),
        scorer,
        sheet,
        notifier: Arc::new(notifier),
    };
    let settings = PipelineSettings {
        max_upload_bytes: config.max_upload_bytes,
        call_timeout: config.call_timeout,
        scoring_timeout: config.scoring_timeout,
        #[cfg(feature = "simulate-latency")]
        simulated_delay: config.simulated_delay,
    };

    let state = AppState {
        orchestrator: Arc::new(SubmissionOrchestrator::new(deps, settings)),
        repository,
        remote_files: Arc::new(RemoteFileFetcher::new(
            config.webhook.allowed_hosts.clone(),
            config.webhook.allow_private_networks,
            config.call_timeout,
        )),
    };
    if config.webhook.allowed_hosts.is_empty() {
        info!("WEBHOOK_ALLOWED_HOSTS not set; webhook file downloads are refused");
    }

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_store(config: &Config) -> Arc<dyn ResumeStore> {
    match &config.storage {
        StorageConfig::S3 {
            bucket,
            endpoint,
            region,
            access_key_id,
            secret_access_key,
        } => {
            let credentials = Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "screening-static",
            );
            let client = build_s3_client(credentials, region, endpoint).await;
            info!("Résumés stored in S3 bucket '{bucket}'");
            Arc::new(S3ResumeStore::new(client, bucket.clone()))
        }
        StorageConfig::Local { root } => {
            info!("Résumés stored on local disk under {}", root.display());
            Arc::new(LocalResumeStore::new(root.clone()))
        }
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(credentials: Credentials, region: &str, endpoint: &str) -> aws_sdk_s3::Client {
    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(credentials)
        .endpoint_url(endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}

fn build_scorer(config: &Config) -> Result<Arc<dyn ScoringEngine>> {
    let policy = config.scoring_policy.clone();
    Ok(match (config.scoring_backend, &config.llm) {
        (ScoringBackend::Llm, Some(llm)) => {
            let client = LlmClient::new(llm.api_key.clone(), llm.model.clone(), config.scoring_timeout)?;
            info!("LLM client initialized (model: {})", client.model());
            Arc::new(LlmScoringEngine::new(client, policy))
        }
        (ScoringBackend::Llm, None) => anyhow::bail!("SCORING_BACKEND=llm requires LLM settings"),
        (ScoringBackend::Keyword, _) => {
            let matcher: Arc<dyn SkillMatcher> = match config.skill_matching {
                SkillMatching::WholeWord => Arc::new(WholeWordMatcher),
                SkillMatching::Substring => Arc::new(SubstringMatcher),
            };
            Arc::new(KeywordScoringEngine::new(matcher, policy))
        }
    })
}
