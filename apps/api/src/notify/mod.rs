//! Candidate and recruiter notifications.

pub mod templates;
pub mod transport;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::models::analysis::AnalysisResult;
use crate::models::candidate::Candidate;
use crate::notify::templates::{render_candidate_status, render_recruiter_alert, NotificationView};
use crate::notify::transport::{EmailAttachment, MailTransport, OutgoingEmail};
use crate::storage::{content_type_for, ResumeStore};

/// Where the stored résumé lives, for the recruiter attachment.
#[derive(Debug, Clone, Copy)]
pub struct StoredArtifact<'a> {
    pub location: &'a str,
    pub file_name: &'a str,
}

pub struct Notifier {
    transport: Arc<dyn MailTransport>,
    store: Arc<dyn ResumeStore>,
    recruiter_email: String,
}

impl Notifier {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        store: Arc<dyn ResumeStore>,
        recruiter_email: String,
    ) -> Self {
        Self {
            transport,
            store,
            recruiter_email,
        }
    }

    pub async fn send_candidate_status(
        &self,
        candidate: &Candidate,
        job_title: &str,
        analysis: &AnalysisResult,
    ) -> Result<()> {
        let rendered = render_candidate_status(&NotificationView {
            candidate,
            job_title,
            analysis,
        });
        self.transport
            .send(OutgoingEmail {
                to: candidate.email.clone(),
                subject: rendered.subject,
                html_body: rendered.html,
                attachments: vec![],
            })
            .await
    }

    pub async fn notify_recruiter(
        &self,
        candidate: &Candidate,
        job_title: &str,
        analysis: &AnalysisResult,
        artifact: StoredArtifact<'_>,
    ) -> Result<()> {
        let rendered = render_recruiter_alert(&NotificationView {
            candidate,
            job_title,
            analysis,
        });
        let bytes = self
            .store
            .get(artifact.location)
            .await
            .context("loading résumé attachment")?;

        self.transport
            .send(OutgoingEmail {
                to: self.recruiter_email.clone(),
                subject: rendered.subject,
                html_body: rendered.html,
                attachments: vec![EmailAttachment {
                    file_name: artifact.file_name.to_string(),
                    content_type: content_type_for(artifact.file_name).to_string(),
                    bytes,
                }],
            })
            .await
    }
}
