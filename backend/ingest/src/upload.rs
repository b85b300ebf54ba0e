//! Object-storage upload for captured receipt images.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;
use uuid::Uuid;

/// Abstract interface for the object store holding receipt images.
/// Returns a stable URL the OCR endpoint can fetch.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, data: &[u8], owner: Uuid, file_name: &str) -> Result<String>;
}

/// HTTP client for a storage-bucket API (Supabase-style): objects are
/// written under `{base_url}/object/{bucket}/{path}` with bearer auth and
/// served back from `{base_url}/object/public/{bucket}/{path}`.
pub struct BucketClient {
    base_url: String,
    bucket: String,
    api_key: String,
    client: Client,
}

impl BucketClient {
    pub fn new(base_url: impl Into<String>, bucket: impl Into<String>, api_key: String) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            api_key,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl ObjectStorage for BucketClient {
    async fn upload(&self, data: &[u8], owner: Uuid, file_name: &str) -> Result<String> {
        // Objects are namespaced per owner; a fresh id keeps re-uploads of
        // the same file name from colliding.
        let path = format!("{owner}/{}_{file_name}", Uuid::new_v4());
        let upload_url = format!("{}/object/{}/{}", self.base_url, self.bucket, path);

        self.client
            .post(&upload_url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/octet-stream")
            .body(data.to_vec())
            .send()
            .await
            .context("Object storage request failed")?
            .error_for_status()
            .context("Object storage rejected the upload")?;

        let public_url = format!("{}/object/public/{}/{}", self.base_url, self.bucket, path);
        info!(bytes = data.len(), url = %public_url, "Uploaded receipt image");
        Ok(public_url)
    }
}
