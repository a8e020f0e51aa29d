//! Email content. Pure functions of a typed view; no transport, no I/O.

use crate::models::analysis::{AnalysisResult, Recommendation};
use crate::models::candidate::Candidate;

pub const CANDIDATE_SUBJECT: &str = "Your Application Status";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateId {
    CandidateInterview,
    CandidateReject,
    CandidatePending,
    RecruiterAlert,
}

impl TemplateId {
    pub fn for_candidate(recommendation: Recommendation) -> Self {
        match recommendation {
            Recommendation::Interview => TemplateId::CandidateInterview,
            Recommendation::Reject => TemplateId::CandidateReject,
            Recommendation::Pending => TemplateId::CandidatePending,
        }
    }
}

/// Everything a template may reference.
#[derive(Debug, Clone, Copy)]
pub struct NotificationView<'a> {
    pub candidate: &'a Candidate,
    pub job_title: &'a str,
    pub analysis: &'a AnalysisResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub template: TemplateId,
    pub subject: String,
    pub html: String,
}

pub fn render_candidate_status(view: &NotificationView<'_>) -> RenderedEmail {
    let template = TemplateId::for_candidate(view.analysis.recommendation);
    let (status_class, heading) = match template {
        TemplateId::CandidateInterview => (
            "status-interview",
            "Congratulations! Your application has been approved for an interview",
        ),
        TemplateId::CandidateReject => ("status-rejected", "An update on your application"),
        _ => ("status-pending", "Your application has been received and is pending review"),
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: Arial, sans-serif; color: #333; }}
        .status-interview {{ color: #28a745; }}
        .status-rejected {{ color: #dc3545; }}
        .status-pending {{ color: #ffc107; }}
    </style>
</head>
<body>
    <p>Dear {name},</p>
    <h2 class="{status_class}">{heading}</h2>
    <p>Position: <strong>{job_title}</strong></p>
    <h3>Your Results</h3>
    <p>Match Score: <span class="{status_class}">{score}%</span></p>
    {body}
</body>
</html>"#,
        name = escape_html(&view.candidate.name),
        job_title = escape_html(view.job_title),
        score = view.analysis.score,
        body = candidate_branch_body(template, view.analysis),
    );

    RenderedEmail {
        template,
        subject: CANDIDATE_SUBJECT.to_string(),
        html,
    }
}

fn candidate_branch_body(template: TemplateId, analysis: &AnalysisResult) -> String {
    match template {
        TemplateId::CandidateInterview => format!(
            r#"<div class="interview-notice">
        <h4>Next Steps</h4>
        <p>Our hiring team will contact you within 48 hours to schedule an interview.</p>
        <p>Key strengths we noticed:</p>
        {}
    </div>"#,
            format_skills_list(&analysis.identified_skills)
        ),
        TemplateId::CandidateReject => format!(
            r#"<div class="rejection-notice">
        <p>After careful consideration, we have decided not to move forward with your application.</p>
        <p>Feedback from our screening:</p>
        <p>{}</p>
        <p>We appreciate your interest and encourage you to apply for future openings.</p>
    </div>"#,
            escape_html(&analysis.explanation)
        ),
        _ => format!(
            r#"<div class="pending-notice">
        <p>Your application is under review. We will notify you once a decision is made.</p>
        <p>Identified skills:</p>
        {}
    </div>"#,
            format_skills_list(&analysis.identified_skills)
        ),
    }
}

pub fn render_recruiter_alert(view: &NotificationView<'_>) -> RenderedEmail {
    let analysis = view.analysis;
    let candidate = view.candidate;
    let score_class = match analysis.score {
        80..=u8::MAX => "match-good",
        50..=79 => "match-average",
        _ => "match-poor",
    };

    let subject = format!(
        "New Candidate: {} for {} ({}% match)",
        candidate.name, view.job_title, analysis.score
    );

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: Arial, sans-serif; }}
        .match-good {{ color: #28a745; }}
        .match-average {{ color: #ffc107; }}
        .match-poor {{ color: #dc3545; }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{ padding: 8px; text-align: left; border-bottom: 1px solid #ddd; vertical-align: top; }}
    </style>
</head>
<body>
    <h2>New Candidate Analysis: {job_title}</h2>
    <h3>Candidate Details</h3>
    <ul>
        <li><strong>Name:</strong> {name}</li>
        <li><strong>Email:</strong> {email}</li>
        <li><strong>Phone:</strong> {phone}</li>
        <li><strong>Match Score:</strong> <span class="{score_class}">{score}%</span></li>
        <li><strong>Resume ID:</strong> {resume_id}</li>
    </ul>
    <h3>Skills Analysis</h3>
    <table>
        <tr><th>Identified Skills</th><th>Missing Skills</th></tr>
        <tr><td>{identified}</td><td>{missing}</td></tr>
    </table>
    <h3>Recommendation</h3>
    <p><strong>{recommendation}</strong> - {explanation}</p>
    <p>The candidate's résumé is attached.</p>
</body>
</html>"#,
        job_title = escape_html(view.job_title),
        name = escape_html(&candidate.name),
        email = escape_html(&candidate.email),
        phone = escape_html(candidate.phone().unwrap_or("Not provided")),
        score = analysis.score,
        resume_id = analysis.resume_id,
        identified = format_skills_list(&analysis.identified_skills),
        missing = format_skills_list(&analysis.missing_skills),
        recommendation = analysis.recommendation,
        explanation = escape_html(&analysis.explanation),
    );

    RenderedEmail {
        template: TemplateId::RecruiterAlert,
        subject,
        html,
    }
}

fn format_skills_list(skills: &[String]) -> String {
    if skills.is_empty() {
        return "<em>None identified</em>".to_string();
    }
    let items: String = skills
        .iter()
        .map(|s| format!("<li>{}</li>", escape_html(s)))
        .collect();
    format!("<ul>{items}</ul>")
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
