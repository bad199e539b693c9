// Narrative content generation for a listing.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{EnrichError, Result};
use crate::traits::ContentEnricher;
use stayhaven_common::Listing;

/// Structured output of a content-enrichment call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrichedContent {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default, deserialize_with = "crate::verifier::lenient_sleeps")]
    pub sleeps: Option<i32>,
}

const ENRICH_PROMPT: &str = r#"You write listing copy for a directory of accommodation bookable for group celebrations and touring entertainment.

Property: {title}
Location: {location}
{context}

Provide:
1. description: a compelling 2-3 sentence description highlighting what makes the property special for group stays (space, gardens, hot tubs, etc.)
2. features: a list of key features appealing to groups ("Hot tub", "Large living room", "Parking for multiple cars", ...)
3. content: a 200-300 word sales piece about the atmosphere, the setting, and why the space works for a hosted entertainment session
4. meta_description: a 150-160 character SEO meta description
5. sleeps: the number of guests the property sleeps, if you know it, else null

Return ONLY valid JSON:
{
  "description": "...",
  "features": ["...", "..."],
  "content": "...",
  "meta_description": "...",
  "sleeps": 8 or null
}"#;

/// Gemini-backed content enricher. Text enrichment is a soft-fail
/// capability: an unparseable model response degrades to a minimal
/// placeholder rather than propagating a parse error.
pub struct GeminiEnricher {
    agent: ai_client::Gemini,
}

impl GeminiEnricher {
    pub fn new(agent: ai_client::Gemini) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl ContentEnricher for GeminiEnricher {
    async fn enrich(&self, listing: &Listing) -> Result<EnrichedContent> {
        let prompt = build_prompt(listing);

        let response = self
            .agent
            .generate(prompt)
            .await
            .map_err(|e| EnrichError::Upstream(format!("content enrichment: {e}")))?;

        debug!(len = response.len(), "Enricher raw response");

        match ai_client::parse_json_response::<EnrichedContent>(&response) {
            Ok(content) => Ok(content),
            Err(e) => {
                warn!(listing = %listing.slug, error = %e, "Enricher response unparseable, using placeholder");
                Ok(placeholder_content(listing))
            }
        }
    }
}

fn build_prompt(listing: &Listing) -> String {
    let mut context = String::new();
    if let Some(postcode) = listing.postcode.as_deref() {
        context.push_str(&format!("Postcode: {postcode}\n"));
    }
    if let Some(description) = listing.description.as_deref() {
        context.push_str(&format!("Current description (context only): {description}\n"));
    }
    if !listing.features.is_empty() {
        context.push_str(&format!("Known features: {}\n", listing.features.join(", ")));
    }

    ENRICH_PROMPT
        .replace("{title}", &listing.title)
        .replace("{location}", listing.location.as_deref().unwrap_or("Not specified"))
        .replace("{context}", &context)
}

/// Minimal non-empty result derived from the input, used when the model
/// response cannot be parsed.
fn placeholder_content(listing: &Listing) -> EnrichedContent {
    let place = listing
        .location
        .as_deref()
        .filter(|l| !l.is_empty())
        .map(|l| format!(" in {l}"))
        .unwrap_or_default();
    EnrichedContent {
        description: Some(format!(
            "{}{place}, a characterful property for group stays and celebrations.",
            listing.title
        )),
        ..Default::default()
    }
}
