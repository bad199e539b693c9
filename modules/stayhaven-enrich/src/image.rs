// Image normalization and durable storage.
//
// Downloads a source image, bounds it to 1600x1200 without upscaling,
// re-encodes as JPEG at fixed quality, and uploads it under a caller-chosen
// key. No retries here; retry policy belongs to the caller.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::ImageReader;
use tracing::info;

/// Bounding box for stored photos. Images already inside the box are
/// re-encoded but never enlarged.
const MAX_WIDTH: u32 = 1600;
const MAX_HEIGHT: u32 = 1200;
const JPEG_QUALITY: u8 = 80;
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// One distinct variant per failure stage, so callers can account for
/// download, decode, and upload failures separately.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Download failed: {0}")]
    Download(String),

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Upload failed: {0}")]
    Upload(String),
}

/// Durable object storage boundary: a pure durability predicate gating a
/// side-effecting upload. The predicate is what makes migration idempotent.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, String>;
    fn is_durable(&self, url: &str) -> bool;
}

#[async_trait]
impl ObjectStore for blobstore_client::BlobStoreClient {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, String> {
        self.upload(key, bytes, content_type)
            .await
            .map_err(|e| e.to_string())
    }

    fn is_durable(&self, url: &str) -> bool {
        self.is_public_url(url)
    }
}

pub struct ImageProcessor<'a> {
    http: reqwest::Client,
    store: &'a dyn ObjectStore,
}

impl<'a> ImageProcessor<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent(crate::discover::BROWSER_USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");
        Self { http, store }
    }

    /// Download, normalize, and store one image; returns the public URL.
    pub async fn process_and_store(&self, source_url: &str, key: &str) -> Result<String, ImageError> {
        let bytes = self.download(source_url).await?;
        let normalized = normalize(&bytes)?;

        let public_url = self
            .store
            .put(key, normalized, "image/jpeg")
            .await
            .map_err(ImageError::Upload)?;

        info!(source = source_url, key, "Image stored");
        Ok(public_url)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ImageError::Download(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ImageError::Download(format!("HTTP {}", resp.status())));
        }

        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ImageError::Download(e.to_string()))
    }
}

/// Decode, bound to the box preserving aspect ratio (never upscaling), and
/// re-encode as JPEG at the fixed quality.
fn normalize(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    let img = if img.width() > MAX_WIDTH || img.height() > MAX_HEIGHT {
        img.resize(MAX_WIDTH, MAX_HEIGHT, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    img.into_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    Ok(out)
}
