use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bookable accommodation listing — the canonical record the enrichment
/// pipeline reads and upgrades. Created with minimal seed data (title,
/// approximate location); everything else arrives through enrichment passes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: Uuid,
    /// URL-safe, unique, immutable once published.
    pub slug: String,
    pub title: String,

    pub location: Option<String>,
    pub region: Option<String>,
    pub description: Option<String>,
    /// Long-form sales content.
    pub content: Option<String>,
    pub features: Vec<String>,
    pub meta_description: Option<String>,

    pub address: Option<String>,
    /// Address exactly as originally supplied.
    pub raw_address: Option<String>,
    pub postcode: Option<String>,
    pub verified_address: Option<String>,
    /// Set only by a successful Verifier call that classified the address
    /// as a genuine, publicly bookable property.
    pub address_verified: bool,

    pub website_url: Option<String>,
    pub airbnb_url: Option<String>,
    pub booking_com_url: Option<String>,
    pub vrbo_url: Option<String>,
    /// A bare URL or a JSON-serialized list of URLs.
    pub other_booking_url: Option<String>,
    pub google_maps_url: Option<String>,
    /// Derived: true iff at least one booking-link field is non-empty.
    pub booking_links_found: bool,

    pub sleeps: Option<i32>,

    pub image_url: Option<String>,
    pub photo_1_url: Option<String>,
    pub photo_2_url: Option<String>,
    pub photo_3_url: Option<String>,
    pub photos_extracted: bool,
    /// True only while every populated image field points at durable storage.
    pub photos_stored_in_blob: bool,

    pub is_published: bool,
    pub is_featured: bool,
    pub has_affiliate_relationship: bool,
    pub owner_approved: bool,

    /// Dates the entertainer performed at this venue (YYYY-MM-DD).
    pub ben_visited_dates: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// The four image fields in quality order, paired with their column names.
    pub fn image_fields(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("image_url", self.image_url.as_deref()),
            ("photo_1_url", self.photo_1_url.as_deref()),
            ("photo_2_url", self.photo_2_url.as_deref()),
            ("photo_3_url", self.photo_3_url.as_deref()),
        ]
    }

    /// Whether any address information exists to hand to the Verifier.
    pub fn has_address_info(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.raw_address) || filled(&self.address) || filled(&self.postcode)
    }
}

/// Partial update for a listing. `None` fields are left untouched by the
/// store, which is what makes enrichment monotonic at the storage boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingPatch {
    pub location: Option<String>,
    pub region: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub features: Option<Vec<String>>,
    pub meta_description: Option<String>,

    pub postcode: Option<String>,
    pub verified_address: Option<String>,
    pub address_verified: Option<bool>,

    pub website_url: Option<String>,
    pub airbnb_url: Option<String>,
    pub booking_com_url: Option<String>,
    pub vrbo_url: Option<String>,
    pub other_booking_url: Option<String>,
    pub google_maps_url: Option<String>,
    pub booking_links_found: Option<bool>,

    pub sleeps: Option<i32>,

    pub image_url: Option<String>,
    pub photo_1_url: Option<String>,
    pub photo_2_url: Option<String>,
    pub photo_3_url: Option<String>,
    pub photos_extracted: Option<bool>,
    pub photos_stored_in_blob: Option<bool>,
}

impl ListingPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply this patch to a listing in place. Mirrors the store's partial
    /// update so the in-memory store and tests agree with Postgres semantics.
    pub fn apply_to(&self, listing: &mut Listing) {
        fn set(target: &mut Option<String>, source: &Option<String>) {
            if let Some(v) = source {
                *target = Some(v.clone());
            }
        }
        set(&mut listing.location, &self.location);
        set(&mut listing.region, &self.region);
        set(&mut listing.description, &self.description);
        set(&mut listing.content, &self.content);
        set(&mut listing.meta_description, &self.meta_description);
        set(&mut listing.postcode, &self.postcode);
        set(&mut listing.verified_address, &self.verified_address);
        set(&mut listing.website_url, &self.website_url);
        set(&mut listing.airbnb_url, &self.airbnb_url);
        set(&mut listing.booking_com_url, &self.booking_com_url);
        set(&mut listing.vrbo_url, &self.vrbo_url);
        set(&mut listing.other_booking_url, &self.other_booking_url);
        set(&mut listing.google_maps_url, &self.google_maps_url);
        set(&mut listing.image_url, &self.image_url);
        set(&mut listing.photo_1_url, &self.photo_1_url);
        set(&mut listing.photo_2_url, &self.photo_2_url);
        set(&mut listing.photo_3_url, &self.photo_3_url);

        if let Some(features) = &self.features {
            listing.features = features.clone();
        }
        if let Some(sleeps) = self.sleeps {
            listing.sleeps = Some(sleeps);
        }
        if let Some(v) = self.address_verified {
            listing.address_verified = v;
        }
        if let Some(v) = self.booking_links_found {
            listing.booking_links_found = v;
        }
        if let Some(v) = self.photos_extracted {
            listing.photos_extracted = v;
        }
        if let Some(v) = self.photos_stored_in_blob {
            listing.photos_stored_in_blob = v;
        }
        listing.updated_at = Utc::now();
    }
}
