use std::env;

use tracing::info;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // AI provider
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_fallback_model: String,

    // Object storage
    pub blob_store_url: String,
    pub blob_store_bucket: String,
    pub blob_store_token: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            gemini_api_key: required_env("GEMINI_API_KEY"),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash-exp".to_string()),
            gemini_fallback_model: env::var("GEMINI_FALLBACK_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-pro".to_string()),
            blob_store_url: required_env("BLOB_STORE_URL"),
            blob_store_bucket: env::var("BLOB_STORE_BUCKET")
                .unwrap_or_else(|_| "stay-media".to_string()),
            blob_store_token: required_env("BLOB_STORE_TOKEN"),
        }
    }

    /// Log the loaded configuration without secrets.
    pub fn log_redacted(&self) {
        info!(
            model = %self.gemini_model,
            fallback = %self.gemini_fallback_model,
            blob_store = %self.blob_store_url,
            bucket = %self.blob_store_bucket,
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
