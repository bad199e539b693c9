pub mod error;

pub use error::{BlobStoreError, Result};

use std::time::Duration;

use tracing::debug;

/// Client for a Supabase-style storage API: objects are uploaded under a
/// bucket and served back from a stable public URL.
pub struct BlobStoreClient {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    token: String,
}

impl BlobStoreClient {
    pub fn new(base_url: &str, bucket: &str, token: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            token: token.to_string(),
        }
    }

    /// Upload bytes under `key`, overwriting any existing object, and return
    /// the public URL of the stored object.
    pub async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let endpoint = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key);

        debug!(key, bytes = bytes.len(), "Uploading object");

        let resp = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.token)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BlobStoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(self.public_url(key))
    }

    /// Public URL an uploaded key is served from.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, key
        )
    }

    /// True when `url` points into this store's public bucket, i.e. the
    /// object is durably ours rather than externally hosted.
    pub fn is_public_url(&self, url: &str) -> bool {
        url.starts_with(&format!(
            "{}/storage/v1/object/public/{}/",
            self.base_url, self.bucket
        ))
    }
}
