//! On-demand photo enrichment for listings that still lack photos after the
//! standard pass: scan the listing's booking pages through a `PhotoSource`,
//! store the top candidates, and point the image fields at the stored
//! copies.

use std::collections::HashSet;

use tracing::{info, warn};
use uuid::Uuid;

use crate::discover::PhotoCandidate;
use crate::error::{EnrichError, Result};
use crate::image::{ImageProcessor, ObjectStore};
use crate::links::booking_page_urls;
use crate::migrate::photo_key;
use crate::store::ListingStore;
use crate::traits::PhotoSource;
use stayhaven_common::ListingPatch;

/// One slot per image field.
const MAX_STORED_PHOTOS: usize = 4;

const IMAGE_FIELDS: [&str; 4] = ["image_url", "photo_1_url", "photo_2_url", "photo_3_url"];

/// Per-listing outcome of a photo-enrichment pass.
#[derive(Debug, Clone, Default)]
pub struct PhotoEnrichment {
    pub listing_id: Uuid,
    pub pages_scanned: usize,
    pub candidates_found: usize,
    pub stored: u32,
    pub failed: u32,
}

pub struct PhotoEnricher<'a> {
    store: &'a dyn ListingStore,
    source: &'a dyn PhotoSource,
    objects: &'a dyn ObjectStore,
}

impl<'a> PhotoEnricher<'a> {
    pub fn new(
        store: &'a dyn ListingStore,
        source: &'a dyn PhotoSource,
        objects: &'a dyn ObjectStore,
    ) -> Self {
        Self {
            store,
            source,
            objects,
        }
    }

    /// Scan every booking page the listing knows about, store the top
    /// candidates in score order, and restack the image fields. A download
    /// failure skips that candidate without consuming a slot; the record is
    /// only written when at least one photo was stored.
    pub async fn enrich_listing(&self, id: Uuid) -> Result<PhotoEnrichment> {
        let listing = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| EnrichError::NotFound(id.to_string()))?;

        let pages = booking_page_urls(&listing);
        if pages.is_empty() {
            return Err(EnrichError::Validation(format!(
                "listing {} has no booking pages to scan",
                listing.slug
            )));
        }

        let mut outcome = PhotoEnrichment {
            listing_id: id,
            pages_scanned: pages.len(),
            ..Default::default()
        };

        let mut candidates: Vec<PhotoCandidate> = Vec::new();
        let mut seen = HashSet::new();
        for page in &pages {
            for candidate in self.source.discover(page).await {
                if seen.insert(candidate.url.clone()) {
                    candidates.push(candidate);
                }
            }
        }
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        outcome.candidates_found = candidates.len();

        let processor = ImageProcessor::new(self.objects);
        let mut stored: Vec<String> = Vec::new();
        for candidate in &candidates {
            if stored.len() == MAX_STORED_PHOTOS {
                break;
            }
            let key = photo_key(&listing.slug, IMAGE_FIELDS[stored.len()]);
            match processor.process_and_store(&candidate.url, &key).await {
                Ok(url) => stored.push(url),
                Err(e) => {
                    warn!(listing = %listing.slug, url = %candidate.url, error = %e, "Photo store failed");
                    outcome.failed += 1;
                }
            }
        }
        outcome.stored = stored.len() as u32;
        if stored.is_empty() {
            return Ok(outcome);
        }

        let mut slots = stored.into_iter();
        let mut patch = ListingPatch {
            image_url: slots.next(),
            photo_1_url: slots.next(),
            photo_2_url: slots.next(),
            photo_3_url: slots.next(),
            photos_extracted: Some(true),
            ..Default::default()
        };

        // Same invariant as the migrator: the durable flag goes true only
        // when every populated image field ends the pass durable.
        let mut after = listing.clone();
        patch.apply_to(&mut after);
        let all_durable = after
            .image_fields()
            .iter()
            .all(|(_, v)| v.is_none_or(|url| self.objects.is_durable(url)));
        if all_durable {
            patch.photos_stored_in_blob = Some(true);
        }

        self.store.update(id, &patch).await?;
        info!(
            listing = %listing.slug,
            stored = outcome.stored,
            failed = outcome.failed,
            "Photo enrichment complete"
        );
        Ok(outcome)
    }

    /// Enrich every listing that has no photos at all yet. Per-listing
    /// failures are logged, never propagated.
    pub async fn enrich_missing(&self) -> Result<Vec<PhotoEnrichment>> {
        let mut outcomes = Vec::new();
        for id in self.store.all_ids().await? {
            let Some(listing) = self.store.get(id).await? else {
                continue;
            };
            if listing.image_fields().iter().any(|(_, v)| v.is_some()) {
                continue;
            }
            match self.enrich_listing(id).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(listing_id = %id, error = %e, "Photo enrichment failed");
                }
            }
        }
        Ok(outcomes)
    }
}
