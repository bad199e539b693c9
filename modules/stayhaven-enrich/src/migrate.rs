// Bulk migration of externally-hosted photos into durable storage.
//
// At-least-once and idempotent: durability is a pure predicate checked per
// field, so re-running over already-migrated listings uploads nothing.

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EnrichError, Result};
use crate::image::{ImageProcessor, ObjectStore};
use crate::store::ListingStore;
use stayhaven_common::ListingPatch;

/// Per-listing migration outcome.
#[derive(Debug, Clone, Default)]
pub struct ListingMigration {
    pub listing_id: Uuid,
    pub migrated: u32,
    pub failed: u32,
    pub skipped: u32,
    pub errors: Vec<String>,
}

/// Batch totals plus per-item error messages.
#[derive(Debug, Clone, Default)]
pub struct MigrationSummary {
    pub total: usize,
    pub migrated: u32,
    pub failed: u32,
    pub skipped: u32,
    pub errors: Vec<String>,
}

pub struct BlobMigrator<'a> {
    store: &'a dyn ListingStore,
    objects: &'a dyn ObjectStore,
}

impl<'a> BlobMigrator<'a> {
    pub fn new(store: &'a dyn ListingStore, objects: &'a dyn ObjectStore) -> Self {
        Self { store, objects }
    }

    /// Migrate every non-durable image field of one listing. The record is
    /// only written when at least one field actually migrated; failed fields
    /// keep their original URL.
    pub async fn migrate_listing(&self, id: Uuid) -> Result<ListingMigration> {
        let listing = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| EnrichError::NotFound(id.to_string()))?;

        let processor = ImageProcessor::new(self.objects);
        let mut outcome = ListingMigration {
            listing_id: id,
            ..Default::default()
        };
        let mut patch = ListingPatch::default();

        for (field, value) in listing.image_fields() {
            let Some(url) = value else { continue };
            if url.trim().is_empty() {
                continue;
            }

            if self.objects.is_durable(url) {
                outcome.skipped += 1;
                continue;
            }

            let key = photo_key(&listing.slug, field);
            match processor.process_and_store(url, &key).await {
                Ok(public_url) => {
                    match field {
                        "image_url" => patch.image_url = Some(public_url),
                        "photo_1_url" => patch.photo_1_url = Some(public_url),
                        "photo_2_url" => patch.photo_2_url = Some(public_url),
                        "photo_3_url" => patch.photo_3_url = Some(public_url),
                        _ => unreachable!("unknown image field {field}"),
                    }
                    outcome.migrated += 1;
                }
                Err(e) => {
                    warn!(listing = %listing.slug, field, error = %e, "Photo migration failed");
                    outcome.failed += 1;
                    outcome.errors.push(format!("{} - {field}: {e}", listing.slug));
                }
            }
        }

        if outcome.migrated == 0 {
            return Ok(outcome);
        }

        // The durable flag may only go true when every populated image field
        // now points at durable storage.
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
            migrated = outcome.migrated,
            failed = outcome.failed,
            skipped = outcome.skipped,
            "Photo migration complete"
        );
        Ok(outcome)
    }

    /// Migrate a set of listings, isolating failures per listing.
    pub async fn migrate_many(&self, ids: &[Uuid]) -> MigrationSummary {
        let mut summary = MigrationSummary {
            total: ids.len(),
            ..Default::default()
        };

        for &id in ids {
            match self.migrate_listing(id).await {
                Ok(outcome) => {
                    summary.migrated += outcome.migrated;
                    summary.failed += outcome.failed;
                    summary.skipped += outcome.skipped;
                    summary.errors.extend(outcome.errors);
                }
                Err(e) => {
                    warn!(listing_id = %id, error = %e, "Listing migration aborted");
                    summary.failed += 1;
                    summary.errors.push(format!("{id}: {e}"));
                }
            }
        }

        summary
    }

    /// Migrate every listing in the store.
    pub async fn migrate_all(&self) -> Result<MigrationSummary> {
        let ids = self.store.all_ids().await?;
        Ok(self.migrate_many(&ids).await)
    }
}

/// Storage key for a stored photo: slug-scoped, field-named, with a short
/// uniqueness token so re-migration never overwrites an object in flight.
pub(crate) fn photo_key(slug: &str, field: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("accommodations/{slug}/{field}-{}.jpg", &token[..8])
}
