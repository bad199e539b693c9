/// Result type alias for enrichment operations.
pub type Result<T> = std::result::Result<T, EnrichError>;

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("Listing not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Upstream service unavailable: {0}")]
    Upstream(String),

    #[error("Failed to parse upstream response: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
