mod client;
pub(crate) mod types;

use anyhow::{anyhow, Result};
use tracing::warn;

use client::GeminiClient;
use types::GenerateRequest;

// =============================================================================
// Gemini Agent
// =============================================================================

/// Gemini text-generation agent with an optional fallback model.
///
/// The fallback is tried only for model-specific failures (unknown model,
/// model retired) — quota and network errors propagate as-is.
#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    model: String,
    fallback_model: Option<String>,
    base_url: Option<String>,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            fallback_model: None,
            base_url: None,
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow!("GEMINI_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> GeminiClient {
        let client = GeminiClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    /// Generate text from a single prompt.
    pub async fn generate(&self, prompt: impl Into<String>) -> Result<String> {
        self.send(GenerateRequest::new(prompt).temperature(0.4)).await
    }

    /// Generate text with the provider's web-search tool enabled, letting the
    /// model browse for current information (booking links, addresses).
    pub async fn generate_with_search(&self, prompt: impl Into<String>) -> Result<String> {
        self.send(GenerateRequest::new(prompt).with_web_search().temperature(0.2))
            .await
    }

    async fn send(&self, request: GenerateRequest) -> Result<String> {
        match self.send_to_model(&self.model, &request).await {
            Ok(text) => Ok(text),
            Err(e) if is_model_error(&e) => {
                let Some(ref fallback) = self.fallback_model else {
                    return Err(e);
                };
                warn!(
                    primary = %self.model,
                    fallback = %fallback,
                    error = %e,
                    "Primary model failed, trying fallback"
                );
                self.send_to_model(fallback, &request).await
            }
            Err(e) => Err(e),
        }
    }

    async fn send_to_model(&self, model: &str, request: &GenerateRequest) -> Result<String> {
        let response = self.client().generate(model, request).await?;
        response
            .text()
            .ok_or_else(|| anyhow!("Empty response from Gemini model {model}"))
    }
}

/// True when the error indicates the model itself is unavailable rather than
/// a transient or request problem.
fn is_model_error(err: &anyhow::Error) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("model") && (msg.contains("not found") || msg.contains("not supported"))
}
