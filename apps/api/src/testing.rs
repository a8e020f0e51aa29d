//! In-memory implementations of the pipeline's collaborators for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::extraction::DocumentTextExtractor;
use crate::models::analysis::AnalysisResult;
use crate::models::job::JobDescription;
use crate::models::resume::{NewResume, ResumeRow};
use crate::notify::transport::{MailTransport, OutgoingEmail};
use crate::notify::Notifier;
use crate::pipeline::{PipelineDeps, PipelineSettings, SubmissionOrchestrator};
use crate::repository::{clamp_page, JobCatalog, ResultRepository};
use crate::scoring::matcher::WholeWordMatcher;
use crate::scoring::policy::ScoringPolicy;
use crate::scoring::{KeywordScoringEngine, ScoringEngine};
use crate::sheet::TrackingSheet;
use crate::storage::{object_key, ResumeStore};

pub const RECRUITER: &str = "hiring@example.com";
pub const CANDIDATE: &str = "ada@example.com";

/// Job 42: requires SQL and Go, prefers Kubernetes, three years minimum.
pub fn platform_job() -> JobDescription {
    JobDescription {
        id: 42,
        title: "Platform Engineer".to_string(),
        description: "Run the data platform".to_string(),
        required_skills: vec!["SQL".to_string(), "Go".to_string()],
        preferred_skills: vec!["Kubernetes".to_string()],
        min_experience_years: 3,
    }
}

/// A fully wired pipeline over in-memory collaborators.
pub struct TestPipeline {
    pub store: Arc<MemoryStore>,
    pub repo: Arc<MemoryRepository>,
    pub sheet: Arc<RecordingSheet>,
    pub transport: Arc<RecordingTransport>,
}

impl TestPipeline {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::default()),
            repo: Arc::new(MemoryRepository::with_job(platform_job())),
            sheet: Arc::new(RecordingSheet::default()),
            transport: Arc::new(RecordingTransport::default()),
        }
    }

    pub fn orchestrator(&self) -> SubmissionOrchestrator {
        self.orchestrator_with(Arc::new(KeywordScoringEngine::new(
            Arc::new(WholeWordMatcher),
            ScoringPolicy::default(),
        )))
    }

    pub fn orchestrator_with(&self, scorer: Arc<dyn ScoringEngine>) -> SubmissionOrchestrator {
        let deps = PipelineDeps {
            store: self.store.clone(),
            extractor: Arc::new(DocumentTextExtractor::new(self.store.clone())),
            catalog: self.repo.clone(),
            repository: self.repo.clone(),
            scorer,
            sheet: self.sheet.clone(),
            notifier: Arc::new(Notifier::new(
                self.transport.clone(),
                self.store.clone(),
                RECRUITER.to_string(),
            )),
        };
        SubmissionOrchestrator::new(
            deps,
            PipelineSettings {
                max_upload_bytes: 1024,
                call_timeout: Duration::from_secs(5),
                scoring_timeout: Duration::from_secs(10),
                #[cfg(feature = "simulate-latency")]
                simulated_delay: Duration::ZERO,
            },
        )
    }
}

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Bytes>>,
    pub fail_put: AtomicBool,
}

impl MemoryStore {
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn put(&self, bytes: Bytes, owner_key: &str, file_name: &str) -> Result<String> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(anyhow!("bucket unreachable"));
        }
        let key = object_key(owner_key, file_name);
        self.objects.lock().unwrap().insert(key.clone(), bytes);
        Ok(key)
    }

    async fn get(&self, location: &str) -> Result<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(location)
            .cloned()
            .ok_or_else(|| anyhow!("no object at {location}"))
    }

    async fn delete(&self, location: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(location);
        Ok(())
    }
}

/// Repository double that records the order of writes in `events`.
#[derive(Default)]
pub struct MemoryRepository {
    pub jobs: Mutex<HashMap<i64, JobDescription>>,
    pub resumes: Mutex<HashMap<Uuid, ResumeRow>>,
    pub analyses: Mutex<Vec<AnalysisResult>>,
    pub events: Mutex<Vec<String>>,
    pub fail_catalog: AtomicBool,
    pub fail_save_resume: AtomicBool,
    pub fail_save_analysis: AtomicBool,
    pub stall_save_analysis: AtomicBool,
    pub fail_mark_processed: AtomicBool,
}

impl MemoryRepository {
    pub fn with_job(job: JobDescription) -> Self {
        let repo = Self::default();
        repo.jobs.lock().unwrap().insert(job.id, job);
        repo
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn resume(&self, id: Uuid) -> Option<ResumeRow> {
        self.resumes.lock().unwrap().get(&id).cloned()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl JobCatalog for MemoryRepository {
    async fn fetch_job_description(&self, job_id: i64) -> Result<Option<JobDescription>> {
        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(anyhow!("catalog unreachable"));
        }
        Ok(self.jobs.lock().unwrap().get(&job_id).cloned())
    }
}

#[async_trait]
impl ResultRepository for MemoryRepository {
    async fn save_resume_metadata(&self, resume: &NewResume) -> Result<Uuid> {
        if self.fail_save_resume.load(Ordering::SeqCst) {
            return Err(anyhow!("insert into resumes failed"));
        }
        let id = Uuid::new_v4();
        self.resumes.lock().unwrap().insert(
            id,
            ResumeRow {
                id,
                candidate_email: resume.candidate_email.clone(),
                file_name: resume.file_name.clone(),
                file_path: resume.file_path.clone(),
                file_size: resume.file_size,
                content_sha256: resume.content_sha256.clone(),
                uploaded_at: Utc::now(),
                processed: false,
                processed_at: None,
            },
        );
        self.record(format!("save_resume:{id}"));
        Ok(id)
    }

    async fn save_analysis_result(&self, analysis: &AnalysisResult) -> Result<()> {
        if self.fail_save_analysis.load(Ordering::SeqCst) {
            return Err(anyhow!("insert into candidate_analysis failed"));
        }
        if self.stall_save_analysis.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.analyses.lock().unwrap().push(analysis.clone());
        self.record(format!("save_analysis:{}", analysis.resume_id));
        Ok(())
    }

    async fn mark_processed(&self, resume_id: Uuid) -> Result<()> {
        if self.fail_mark_processed.load(Ordering::SeqCst) {
            return Err(anyhow!("update resumes failed"));
        }
        let mut resumes = self.resumes.lock().unwrap();
        let resume = resumes
            .get_mut(&resume_id)
            .ok_or_else(|| anyhow!("resume {resume_id} does not exist"))?;
        if !resume.processed {
            resume.processed = true;
            resume.processed_at = Some(Utc::now());
        }
        drop(resumes);
        self.record(format!("mark_processed:{resume_id}"));
        Ok(())
    }

    async fn get_unprocessed(&self, limit: i64) -> Result<Vec<ResumeRow>> {
        let mut rows: Vec<ResumeRow> = self
            .resumes
            .lock()
            .unwrap()
            .values()
            .filter(|r| !r.processed)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.uploaded_at);
        rows.truncate(clamp_page(limit) as usize);
        Ok(rows)
    }

    async fn find_resume(&self, resume_id: Uuid) -> Result<Option<ResumeRow>> {
        Ok(self.resume(resume_id))
    }

    async fn find_analysis(&self, resume_id: Uuid) -> Result<Option<AnalysisResult>> {
        Ok(self
            .analyses
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.resume_id == resume_id)
            .cloned())
    }
}

#[derive(Default)]
pub struct RecordingSheet {
    pub rows: Mutex<Vec<Vec<String>>>,
    pub fail: AtomicBool,
    /// Never completes an append.
    pub stall: AtomicBool,
}

#[async_trait]
impl TrackingSheet for RecordingSheet {
    async fn append_row(&self, fields: Vec<String>) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("Sheets append returned 503"));
        }
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.rows.lock().unwrap().push(fields);
        Ok(())
    }
}

/// Records every email. Sends to addresses in `failing` return an error;
/// sends to addresses in `stalling` never complete.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub failing: Mutex<Vec<String>>,
    pub stalling: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().push(address.to_string());
    }

    pub fn stall_for(&self, address: &str) {
        self.stalling.lock().unwrap().push(address.to_string());
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|e| e.to.clone()).collect()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        if self.failing.lock().unwrap().contains(&email.to) {
            return Err(anyhow!("SMTP relay refused {}", email.to));
        }
        let stalled = self.stalling.lock().unwrap().contains(&email.to);
        if stalled {
            std::future::pending::<()>().await;
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}
