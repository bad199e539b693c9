//! Producer seams for the enrichment pipeline.
//!
//! Each producer is independently failable; the orchestrator consumes
//! whichever results arrive and reconciles them in one pure merge step.
//! Production wires in Gemini-backed implementations; tests use mocks.

use async_trait::async_trait;

use crate::discover::PhotoCandidate;
use crate::enricher::EnrichedContent;
use crate::error::Result;
use crate::verifier::VerifiedAddress;
use stayhaven_common::Listing;

/// Confirms a claimed address refers to a genuine, publicly bookable
/// property and locates its canonical booking links. The sole authority
/// for `address_verified`.
#[async_trait]
pub trait AddressVerifier: Send + Sync {
    async fn verify(&self, raw_address: &str, location_hint: Option<&str>)
        -> Result<VerifiedAddress>;
}

/// Produces narrative content for a listing. Existing fields are grounding
/// context only, never a constraint to preserve verbatim.
#[async_trait]
pub trait ContentEnricher: Send + Sync {
    async fn enrich(&self, listing: &Listing) -> Result<EnrichedContent>;
}

/// A source of photo candidates for a page URL. Best-effort: returns an
/// empty list rather than erroring. The heuristic scraper and any AI-based
/// discovery path implement this interchangeably.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn discover(&self, page_url: &str) -> Vec<PhotoCandidate>;
}
