use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::notify::transport::SmtpSettings;
use crate::scoring::policy::{ScoreWeights, ScoringPolicy};

/// Where uploaded résumés are written.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    S3 {
        bucket: String,
        endpoint: String,
        region: String,
        access_key_id: String,
        secret_access_key: String,
    },
    Local {
        root: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringBackend {
    Keyword,
    Llm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillMatching {
    WholeWord,
    Substring,
}

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub range: String,
    /// Service-account JSON key used to mint access tokens.
    pub credentials_path: PathBuf,
}

/// Limits on the files `/webhook` is allowed to download.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Hosts (and their subdomains) that `file_url` may point at. Empty disables downloads.
    pub allowed_hosts: Vec<String>,
    pub allow_private_networks: bool,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or inconsistent.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub storage: StorageConfig,
    pub max_upload_bytes: usize,
    pub scoring_policy: ScoringPolicy,
    pub scoring_backend: ScoringBackend,
    pub skill_matching: SkillMatching,
    pub llm: Option<LlmConfig>,
    pub smtp: SmtpSettings,
    pub recruiter_email: String,
    pub sheets: Option<SheetsConfig>,
    pub webhook: WebhookConfig,
    pub call_timeout: Duration,
    pub scoring_timeout: Duration,
    #[cfg(feature = "simulate-latency")]
    pub simulated_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage = match optional_env("STORAGE_BACKEND").as_deref().unwrap_or("s3") {
            "s3" => StorageConfig::S3 {
                bucket: require_env("S3_BUCKET")?,
                endpoint: require_env("S3_ENDPOINT")?,
                region: optional_env("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            },
            "local" => StorageConfig::Local {
                root: optional_env("LOCAL_STORAGE_DIR")
                    .unwrap_or_else(|| "uploads".to_string())
                    .into(),
            },
            other => bail!("STORAGE_BACKEND must be 's3' or 'local', got '{other}'"),
        };

        let scoring_policy = ScoringPolicy {
            match_threshold: parse_env("MATCH_THRESHOLD", 70)?,
            reject_threshold: parse_env("REJECT_THRESHOLD", 40)?,
            weights: ScoreWeights {
                required_skills: parse_env("SCORE_WEIGHT_REQUIRED", 0.6)?,
                preferred_skills: parse_env("SCORE_WEIGHT_PREFERRED", 0.2)?,
                experience: parse_env("SCORE_WEIGHT_EXPERIENCE", 0.2)?,
            },
        };
        scoring_policy
            .validate()
            .context("invalid scoring configuration")?;

        let scoring_backend = match optional_env("SCORING_BACKEND").as_deref().unwrap_or("keyword") {
            "keyword" => ScoringBackend::Keyword,
            "llm" => ScoringBackend::Llm,
            other => bail!("SCORING_BACKEND must be 'keyword' or 'llm', got '{other}'"),
        };
        let skill_matching = match optional_env("SKILL_MATCHING").as_deref().unwrap_or("word") {
            "word" => SkillMatching::WholeWord,
            "substring" => SkillMatching::Substring,
            other => bail!("SKILL_MATCHING must be 'word' or 'substring', got '{other}'"),
        };
        let llm = match scoring_backend {
            ScoringBackend::Llm => Some(LlmConfig {
                api_key: require_env("ANTHROPIC_API_KEY")?,
                model: optional_env("LLM_MODEL").unwrap_or_else(|| "claude-sonnet-4-5".to_string()),
            }),
            ScoringBackend::Keyword => None,
        };

        let smtp = SmtpSettings {
            host: require_env("SMTP_HOST")?,
            port: parse_env("SMTP_PORT", 587)?,
            username: require_env("SMTP_USERNAME")?,
            password: require_env("SMTP_PASSWORD")?,
            from_email: require_env("SMTP_FROM_EMAIL")?,
            from_name: optional_env("SMTP_FROM_NAME").unwrap_or_else(|| "Recruiting".to_string()),
        };

        let sheets = match optional_env("GOOGLE_SHEETS_SPREADSHEET_ID") {
            Some(spreadsheet_id) => Some(SheetsConfig {
                spreadsheet_id,
                range: optional_env("GOOGLE_SHEETS_RANGE").unwrap_or_else(|| "Candidate!A1".to_string()),
                credentials_path: require_env("GOOGLE_APPLICATION_CREDENTIALS")?.into(),
            }),
            None => None,
        };

        let webhook = WebhookConfig {
            allowed_hosts: optional_env("WEBHOOK_ALLOWED_HOSTS")
                .map(|raw| parse_host_list(&raw))
                .unwrap_or_default(),
            allow_private_networks: parse_env("WEBHOOK_ALLOW_PRIVATE_NETWORKS", false)?,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            storage,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            scoring_policy,
            scoring_backend,
            skill_matching,
            llm,
            smtp,
            recruiter_email: require_env("RECRUITER_EMAIL")?,
            sheets,
            webhook,
            call_timeout: Duration::from_secs(parse_env("EXTERNAL_CALL_TIMEOUT_SECS", 30)?),
            scoring_timeout: Duration::from_secs(parse_env("SCORING_TIMEOUT_SECS", 120)?),
            #[cfg(feature = "simulate-latency")]
            simulated_delay: Duration::from_millis(parse_env("SIMULATED_DELAY_MS", 0)?),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|host| host.trim().trim_end_matches('.').to_ascii_lowercase())
        .filter(|host| !host.is_empty())
        .collect()
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
