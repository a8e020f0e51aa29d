use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use crate::storage::{content_type_for, object_key, ResumeStore};

/// Stores résumés in an S3-compatible bucket (MinIO locally, AWS in production).
/// Locations are `s3://<bucket>/<key>`.
pub struct S3ResumeStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ResumeStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    fn key_from_location<'a>(&self, location: &'a str) -> Result<&'a str> {
        location
            .strip_prefix("s3://")
            .and_then(|rest| rest.strip_prefix(self.bucket.as_str()))
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow!("location '{location}' is not in bucket '{}'", self.bucket))
    }
}

#[async_trait]
impl ResumeStore for S3ResumeStore {
    async fn put(&self, bytes: Bytes, owner_key: &str, file_name: &str) -> Result<String> {
        let key = object_key(owner_key, file_name);
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type_for(file_name))
            .send()
            .await
            .map_err(|e| anyhow!("S3 upload failed: {e}"))?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);
        Ok(format!("s3://{}/{}", self.bucket, key))
    }

    async fn get(&self, location: &str) -> Result<Bytes> {
        let key = self.key_from_location(location)?;
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow!("S3 download failed: {e}"))?;
        let data = object
            .body
            .collect()
            .await
            .map_err(|e| anyhow!("S3 body read failed: {e}"))?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, location: &str) -> Result<()> {
        let key = self.key_from_location(location)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow!("S3 delete failed: {e}"))?;
        Ok(())
    }
}
