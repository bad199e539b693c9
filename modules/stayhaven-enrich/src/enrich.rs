//! Enrichment orchestrator.
//!
//! One pass per listing: load, verify the address (when there is anything to
//! verify), generate content, reconcile both producer outputs into a patch,
//! persist. Producer failures degrade the pass; only load and persist
//! failures abort it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EnrichError, Result};
use crate::reconcile::reconcile;
use crate::store::ListingStore;
use crate::traits::{AddressVerifier, ContentEnricher};
use stayhaven_common::{Listing, ListingPatch};

/// Base delay between listings in a batch, plus up to 500ms of jitter, to
/// stay under upstream model rate limits.
const BATCH_PACING: Duration = Duration::from_secs(1);

/// Outcome of a single enrichment pass.
#[derive(Debug, Clone)]
pub struct EnrichmentResult {
    pub listing: Listing,
    /// Whether the verifier confirmed a publicly bookable property this pass.
    pub address_verified: bool,
    /// The patch that was persisted. Empty patches are still written so
    /// `address_verified` reflects the latest pass.
    pub patch: ListingPatch,
    /// Producer failures recovered during the pass. The record still holds
    /// whatever the healthy producers returned.
    pub producer_errors: Vec<String>,
    /// True when the listing had no address information to verify.
    pub verification_skipped: bool,
}

impl EnrichmentResult {
    /// A pass is clean when every producer that should have run succeeded.
    pub fn is_clean(&self) -> bool {
        self.producer_errors.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct BatchItem {
    pub listing_id: Uuid,
    pub title: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Per-batch totals. The counts partition `total`: `succeeded` are clean
/// passes, `failed` covers aborted passes and passes where a producer
/// threw (the degraded persist still happened), `skipped` are passes where
/// verification had nothing to verify.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub items: Vec<BatchItem>,
}

pub struct EnrichmentPipeline {
    store: Arc<dyn ListingStore>,
    verifier: Arc<dyn AddressVerifier>,
    enricher: Arc<dyn ContentEnricher>,
    // One async mutex per listing id serializes concurrent passes over the
    // same record. The map only grows, bounded by the listing count.
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl EnrichmentPipeline {
    pub fn new(
        store: Arc<dyn ListingStore>,
        verifier: Arc<dyn AddressVerifier>,
        enricher: Arc<dyn ContentEnricher>,
    ) -> Self {
        Self {
            store,
            verifier,
            enricher,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(id).or_default().clone()
    }

    /// Run one full enrichment pass over a listing.
    pub async fn enrich_one(&self, id: Uuid) -> Result<EnrichmentResult> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let listing = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| EnrichError::NotFound(id.to_string()))?;

        if listing.title.trim().is_empty() {
            return Err(EnrichError::Validation(format!(
                "listing {id} has no title"
            )));
        }

        info!(listing = %listing.slug, "Enriching listing");

        let mut producer_errors = Vec::new();
        let mut verification_skipped = false;

        let verified = if listing.has_address_info() {
            let raw = listing
                .raw_address
                .as_deref()
                .or(listing.address.as_deref())
                .or(listing.postcode.as_deref())
                .unwrap_or_default();
            let hint = listing.region.as_deref().or(listing.location.as_deref());
            match self.verifier.verify(raw, hint).await {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(listing = %listing.slug, error = %e, "Address verification failed");
                    producer_errors.push(format!("verification: {e}"));
                    None
                }
            }
        } else {
            verification_skipped = true;
            None
        };

        let content = match self.enricher.enrich(&listing).await {
            Ok(c) => Some(c),
            Err(e) => {
                warn!(listing = %listing.slug, error = %e, "Content enrichment failed");
                producer_errors.push(format!("content: {e}"));
                None
            }
        };

        let patch = reconcile(&listing, verified.as_ref(), content.as_ref());
        let address_verified = patch.address_verified.unwrap_or(false);

        let updated = self.store.update(id, &patch).await?;
        info!(
            listing = %updated.slug,
            verified = address_verified,
            "Enrichment pass persisted"
        );

        Ok(EnrichmentResult {
            listing: updated,
            address_verified,
            patch,
            producer_errors,
            verification_skipped,
        })
    }

    /// Look a listing up by slug and run one enrichment pass over it.
    pub async fn enrich_by_slug(&self, slug: &str) -> Result<EnrichmentResult> {
        let listing = self
            .store
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| EnrichError::NotFound(slug.to_string()))?;
        self.enrich_one(listing.id).await
    }

    /// Enrich a set of listings sequentially with pacing between them.
    /// One listing's failure never aborts the rest of the batch.
    pub async fn enrich_batch(&self, ids: &[Uuid]) -> BatchSummary {
        let mut summary = BatchSummary {
            total: ids.len(),
            ..Default::default()
        };

        for (i, &id) in ids.iter().enumerate() {
            if i > 0 {
                let jitter = rand::rng().random_range(0..500);
                tokio::time::sleep(BATCH_PACING + Duration::from_millis(jitter)).await;
            }

            match self.enrich_one(id).await {
                Ok(result) if result.is_clean() => {
                    if result.verification_skipped {
                        summary.skipped += 1;
                    } else {
                        summary.succeeded += 1;
                    }
                    summary.items.push(BatchItem {
                        listing_id: id,
                        title: result.listing.title.clone(),
                        success: true,
                        error: None,
                    });
                }
                // A producer threw: the degraded pass persisted, but the
                // batch entry must report the failure.
                Ok(result) => {
                    summary.failed += 1;
                    summary.items.push(BatchItem {
                        listing_id: id,
                        title: result.listing.title.clone(),
                        success: false,
                        error: Some(result.producer_errors.join("; ")),
                    });
                }
                Err(e) => {
                    warn!(listing_id = %id, error = %e, "Enrichment pass failed");
                    summary.failed += 1;
                    summary.items.push(BatchItem {
                        listing_id: id,
                        title: String::new(),
                        success: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        summary
    }

    /// Enrich every listing in the store.
    pub async fn enrich_all(&self) -> Result<BatchSummary> {
        let ids = self.store.all_ids().await?;
        Ok(self.enrich_batch(&ids).await)
    }
}
