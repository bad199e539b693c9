// Listing persistence: Postgres in production, in-memory for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{EnrichError, Result};
use stayhaven_common::{Listing, ListingPatch};

/// The record-store contract: get by id or slug, partial update, and id
/// listing for batch jobs. `update` touches only the fields present in the
/// patch — absent fields are left exactly as stored.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Listing>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Listing>>;
    async fn update(&self, id: Uuid, patch: &ListingPatch) -> Result<Listing>;
    async fn all_ids(&self) -> Result<Vec<Uuid>>;
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

pub struct PgListingStore {
    pool: PgPool,
}

impl PgListingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| EnrichError::Database(e.into()))?;
        Ok(())
    }
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn get(&self, id: Uuid) -> Result<Option<Listing>> {
        let listing = sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(listing)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Listing>> {
        let listing = sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(listing)
    }

    /// Partial update via COALESCE: a NULL bind leaves the column as-is,
    /// which enforces monotonic enrichment at the storage boundary.
    async fn update(&self, id: Uuid, patch: &ListingPatch) -> Result<Listing> {
        let listing = sqlx::query_as::<_, Listing>(
            r#"
            UPDATE listings SET
                location              = COALESCE($2,  location),
                region                = COALESCE($3,  region),
                description           = COALESCE($4,  description),
                content               = COALESCE($5,  content),
                features              = COALESCE($6,  features),
                meta_description      = COALESCE($7,  meta_description),
                postcode              = COALESCE($8,  postcode),
                verified_address      = COALESCE($9,  verified_address),
                address_verified      = COALESCE($10, address_verified),
                website_url           = COALESCE($11, website_url),
                airbnb_url            = COALESCE($12, airbnb_url),
                booking_com_url       = COALESCE($13, booking_com_url),
                vrbo_url              = COALESCE($14, vrbo_url),
                other_booking_url     = COALESCE($15, other_booking_url),
                google_maps_url       = COALESCE($16, google_maps_url),
                booking_links_found   = COALESCE($17, booking_links_found),
                sleeps                = COALESCE($18, sleeps),
                image_url             = COALESCE($19, image_url),
                photo_1_url           = COALESCE($20, photo_1_url),
                photo_2_url           = COALESCE($21, photo_2_url),
                photo_3_url           = COALESCE($22, photo_3_url),
                photos_extracted      = COALESCE($23, photos_extracted),
                photos_stored_in_blob = COALESCE($24, photos_stored_in_blob),
                updated_at            = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.location)
        .bind(&patch.region)
        .bind(&patch.description)
        .bind(&patch.content)
        .bind(&patch.features)
        .bind(&patch.meta_description)
        .bind(&patch.postcode)
        .bind(&patch.verified_address)
        .bind(patch.address_verified)
        .bind(&patch.website_url)
        .bind(&patch.airbnb_url)
        .bind(&patch.booking_com_url)
        .bind(&patch.vrbo_url)
        .bind(&patch.other_booking_url)
        .bind(&patch.google_maps_url)
        .bind(patch.booking_links_found)
        .bind(patch.sleeps)
        .bind(&patch.image_url)
        .bind(&patch.photo_1_url)
        .bind(&patch.photo_2_url)
        .bind(&patch.photo_3_url)
        .bind(patch.photos_extracted)
        .bind(patch.photos_stored_in_blob)
        .fetch_optional(&self.pool)
        .await?;

        listing.ok_or_else(|| EnrichError::NotFound(id.to_string()))
    }

    async fn all_ids(&self) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM listings ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}

// ---------------------------------------------------------------------------
// In-memory (tests and local tooling)
// ---------------------------------------------------------------------------

/// Mutex-wrapped map mirroring the Postgres partial-update semantics via
/// `ListingPatch::apply_to`. Also records every patch for assertions.
#[derive(Default)]
pub struct MemoryListingStore {
    listings: Mutex<HashMap<Uuid, Listing>>,
    updates: Mutex<Vec<(Uuid, ListingPatch)>>,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, listing: Listing) {
        self.listings
            .lock()
            .expect("lock poisoned")
            .insert(listing.id, listing);
    }

    /// Patches recorded by `update`, in call order.
    pub fn recorded_updates(&self) -> Vec<(Uuid, ListingPatch)> {
        self.updates.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn get(&self, id: Uuid) -> Result<Option<Listing>> {
        Ok(self.listings.lock().expect("lock poisoned").get(&id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Listing>> {
        Ok(self
            .listings
            .lock()
            .expect("lock poisoned")
            .values()
            .find(|l| l.slug == slug)
            .cloned())
    }

    async fn update(&self, id: Uuid, patch: &ListingPatch) -> Result<Listing> {
        let mut listings = self.listings.lock().expect("lock poisoned");
        let listing = listings
            .get_mut(&id)
            .ok_or_else(|| EnrichError::NotFound(id.to_string()))?;
        patch.apply_to(listing);
        let updated = listing.clone();
        drop(listings);

        self.updates
            .lock()
            .expect("lock poisoned")
            .push((id, patch.clone()));
        Ok(updated)
    }

    async fn all_ids(&self) -> Result<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self
            .listings
            .lock()
            .expect("lock poisoned")
            .keys()
            .copied()
            .collect();
        ids.sort();
        Ok(ids)
    }
}
