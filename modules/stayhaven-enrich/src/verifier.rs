// Address & link verification via a web-browsing generative model.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::{EnrichError, Result};
use crate::traits::AddressVerifier;

/// Structured verification result. All fields are best-effort except
/// `is_public_property`, which drives `address_verified` and defaults to
/// false whenever the model does not explicitly confirm it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifiedAddress {
    #[serde(default)]
    pub is_public_property: bool,
    #[serde(default)]
    pub verified_address: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_sleeps")]
    pub sleeps: Option<i32>,
    #[serde(default)]
    pub google_maps_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub airbnb_url: Option<String>,
    #[serde(default)]
    pub booking_com_url: Option<String>,
    #[serde(default)]
    pub vrbo_url: Option<String>,
    #[serde(default)]
    pub other_booking_urls: Vec<String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// `sleeps` arrives as a number, a numeric string ("8"), or a range
/// ("10-12", "12+"). Take the first integer; anything else is unknown.
pub(crate) fn lenient_sleeps<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<i32>, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(n)) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Some(serde_json::Value::String(s)) => parse_leading_int(&s),
        _ => None,
    })
}

fn parse_leading_int(s: &str) -> Option<i32> {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

const VERIFY_PROMPT: &str = r#"You verify accommodation addresses for a directory of properties bookable for group celebrations.

Given this address: "{address}"
{region_line}

The address must be a PUBLIC property (hotel, B&B, holiday rental, event venue) with a public booking presence. A private residential address with no booking website or listing is NOT verified.

Search the web for the official property website, booking platform listings (Airbnb, Booking.com, VRBO), the Google Maps location, sleeping capacity, and 3-4 high-quality property photo URLs from its booking pages.

Return ONLY valid JSON:
{
  "verified_address": "Full official address",
  "is_public_property": true/false,
  "google_maps_url": "https://maps.google.com/...",
  "website_url": "https://..." or null,
  "airbnb_url": "https://www.airbnb.com/..." or null,
  "booking_com_url": "https://www.booking.com/..." or null,
  "vrbo_url": "https://www.vrbo.com/..." or null,
  "other_booking_urls": ["https://..."],
  "location": "City or town name",
  "postcode": "UK postcode" or null,
  "sleeps": 8 or null,
  "photos": ["https://...", "https://..."] or []
}

Mark is_public_property true only when you find booking links. Use null for anything not found."#;

/// Gemini-backed verifier using the web-search tool.
pub struct GeminiVerifier {
    agent: ai_client::Gemini,
}

impl GeminiVerifier {
    pub fn new(agent: ai_client::Gemini) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl AddressVerifier for GeminiVerifier {
    async fn verify(
        &self,
        raw_address: &str,
        location_hint: Option<&str>,
    ) -> Result<VerifiedAddress> {
        let region_line = location_hint
            .map(|r| format!("Region: {r}"))
            .unwrap_or_default();
        let prompt = VERIFY_PROMPT
            .replace("{address}", raw_address)
            .replace("{region_line}", &region_line);

        let response = self
            .agent
            .generate_with_search(prompt)
            .await
            .map_err(|e| EnrichError::Upstream(format!("address verification: {e}")))?;

        debug!(len = response.len(), "Verifier raw response");

        let mut verified: VerifiedAddress = ai_client::parse_json_response(&response)
            .map_err(|e| EnrichError::Parse(format!("address verification: {e}")))?;

        // The model sometimes echoes junk for optional URL fields.
        verified.photos.retain(|p| p.starts_with("http"));
        if verified.verified_address.as_deref().is_some_and(str::is_empty) {
            verified.verified_address = None;
        }
        if verified.verified_address.is_none() {
            verified.verified_address = Some(raw_address.to_string());
        }
        if verified.google_maps_url.is_none() {
            verified.google_maps_url = Some(maps_search_url(raw_address));
        }
        if verified.location.is_none() {
            verified.location = location_hint.map(str::to_string);
        }

        Ok(verified)
    }
}

/// Fallback Google Maps search URL for an unresolved address.
fn maps_search_url(address: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(address.as_bytes()).collect();
    format!("https://www.google.com/maps/search/?api=1&query={encoded}")
}
