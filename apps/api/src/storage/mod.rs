//! Durable résumé artifact storage.

pub mod local;
pub mod s3;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

pub use local::LocalResumeStore;
pub use s3::S3ResumeStore;

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Stores the bytes and returns a location that `get` can read immediately.
    async fn put(&self, bytes: Bytes, owner_key: &str, file_name: &str) -> Result<String>;

    async fn get(&self, location: &str) -> Result<Bytes>;

    async fn delete(&self, location: &str) -> Result<()>;
}

/// Builds a collision-free relative key: `resumes/<owner>/<uuid>-<file name>`.
pub fn object_key(owner_key: &str, file_name: &str) -> String {
    format!(
        "resumes/{}/{}-{}",
        sanitize_segment(owner_key),
        Uuid::new_v4(),
        sanitize_segment(file_name)
    )
}

pub fn content_type_for(file_name: &str) -> &'static str {
    match file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "pdf" => "application/pdf",
        Some(ext) if ext == "md" => "text/markdown",
        Some(ext) if ext == "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Keeps `[A-Za-z0-9._@-]`, replaces everything else with `_`, and never
/// yields an empty or dot-only segment.
fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.chars().all(|c| c == '.') {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_layout() {
        let key = object_key("ada@example.com", "cv.pdf");
        assert!(key.starts_with("resumes/ada@example.com/"));
        assert!(key.ends_with("-cv.pdf"));
    }

    #[test]
    fn test_object_key_is_unique_per_call() {
        assert_ne!(object_key("a@b.co", "cv.pdf"), object_key("a@b.co", "cv.pdf"));
    }

    #[test]
    fn test_content_type_for_known_extensions() {
        assert_eq!(content_type_for("CV.PDF"), "application/pdf");
        assert_eq!(content_type_for("notes.txt"), "text/plain");
        assert_eq!(content_type_for("resume.docx"), "application/octet-stream");
        assert_eq!(content_type_for("README"), "application/octet-stream");
    }

    #[test]
    fn test_sanitize_blocks_traversal() {
        assert_eq!(sanitize_segment("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_segment(".."), "unnamed");
        assert_eq!(sanitize_segment(""), "unnamed");
        assert_eq!(sanitize_segment("my résumé.pdf"), "my_r_sum_.pdf");
    }
}
