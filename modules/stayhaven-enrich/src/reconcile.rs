//! Pure reconciliation of producer outputs into one update payload.
//!
//! Consumes the prior record state plus the optional Verifier and Enricher
//! results and returns a deterministic patch. No I/O. Precedence per field:
//!
//! | field            | rule                                              |
//! |------------------|---------------------------------------------------|
//! | sleeps           | Verifier, then Enricher, then existing            |
//! | booking links    | Verifier overwrites unconditionally when present  |
//! | address_verified | Verifier's is_public_property, false if not run   |
//! | location/postcode| Verifier wins if present, else retained           |
//! | narrative fields | Enricher output when non-empty                    |
//! | photo fields     | Verifier photos fill all slots; else untouched    |
//!
//! Empty values never enter the patch, so a pass can only add or upgrade
//! data (monotonic enrichment). `address_verified` is the one deliberate
//! exception: it is recomputed on every pass from the Verifier result.

use crate::enricher::EnrichedContent;
use crate::links::{booking_links_found, serialize_other_booking_urls};
use crate::verifier::VerifiedAddress;
use stayhaven_common::{Listing, ListingPatch};

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn reconcile(
    existing: &Listing,
    verified: Option<&VerifiedAddress>,
    enriched: Option<&EnrichedContent>,
) -> ListingPatch {
    let mut patch = ListingPatch::default();

    // Narrative content. The Enricher is the only producer of these fields;
    // non-empty output replaces existing copy.
    if let Some(content) = enriched {
        patch.description = non_empty(content.description.as_deref());
        patch.content = non_empty(content.content.as_deref());
        patch.meta_description = non_empty(content.meta_description.as_deref());
        if !content.features.is_empty() {
            patch.features = Some(content.features.clone());
        }
    }

    // sleeps: first non-null of Verifier, Enricher, existing (existing
    // means no patch entry).
    patch.sleeps = verified
        .and_then(|v| v.sleeps)
        .or_else(|| enriched.and_then(|e| e.sleeps));

    if let Some(v) = verified {
        // The Verifier is the authority on canonical booking links.
        patch.website_url = non_empty(v.website_url.as_deref());
        patch.airbnb_url = non_empty(v.airbnb_url.as_deref());
        patch.booking_com_url = non_empty(v.booking_com_url.as_deref());
        patch.vrbo_url = non_empty(v.vrbo_url.as_deref());
        patch.other_booking_url = serialize_other_booking_urls(&v.other_booking_urls);
        patch.google_maps_url = non_empty(v.google_maps_url.as_deref());

        patch.verified_address = non_empty(v.verified_address.as_deref());
        patch.location = non_empty(v.location.as_deref());
        patch.postcode = non_empty(v.postcode.as_deref());

        // Verifier photos restack all four slots in list order. These are
        // externally hosted until the Blob Migrator runs.
        let photos: Vec<&String> = v.photos.iter().filter(|p| !p.is_empty()).collect();
        if !photos.is_empty() {
            patch.image_url = photos.first().map(|p| (*p).clone());
            patch.photo_1_url = photos.get(1).map(|p| (*p).clone());
            patch.photo_2_url = photos.get(2).map(|p| (*p).clone());
            patch.photo_3_url = photos.get(3).map(|p| (*p).clone());
            patch.photos_extracted = Some(true);
            patch.photos_stored_in_blob = Some(false);
        }
    }

    // address_verified is recomputed every pass; only a successful Verifier
    // call that confirmed a public property may set it true.
    patch.address_verified = Some(verified.map(|v| v.is_public_property).unwrap_or(false));

    // booking_links_found derives from the final link set: patched values
    // where present, otherwise what the record already holds.
    let merged = |patched: &Option<String>, current: &Option<String>| -> Option<String> {
        patched.clone().or_else(|| current.clone())
    };
    patch.booking_links_found = Some(booking_links_found(
        merged(&patch.website_url, &existing.website_url).as_deref(),
        merged(&patch.airbnb_url, &existing.airbnb_url).as_deref(),
        merged(&patch.booking_com_url, &existing.booking_com_url).as_deref(),
        merged(&patch.vrbo_url, &existing.vrbo_url).as_deref(),
        merged(&patch.other_booking_url, &existing.other_booking_url).as_deref(),
    ));

    patch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> Listing {
        Listing {
            slug: "oak-cottage".into(),
            title: "Oak Cottage".into(),
            raw_address: Some("Oak Cottage, Nether Stowey".into()),
            ..Default::default()
        }
    }

    // --- precedence law for sleeps ---

    #[test]
    fn sleeps_verifier_beats_enricher() {
        let verified = VerifiedAddress {
            sleeps: Some(6),
            ..Default::default()
        };
        let enriched = EnrichedContent {
            sleeps: Some(4),
            ..Default::default()
        };
        let patch = reconcile(&existing(), Some(&verified), Some(&enriched));
        assert_eq!(patch.sleeps, Some(6));
    }

    #[test]
    fn sleeps_enricher_when_verifier_silent() {
        let verified = VerifiedAddress::default();
        let enriched = EnrichedContent {
            sleeps: Some(4),
            ..Default::default()
        };
        let patch = reconcile(&existing(), Some(&verified), Some(&enriched));
        assert_eq!(patch.sleeps, Some(4));
    }

    #[test]
    fn sleeps_existing_retained_when_both_silent() {
        let mut listing = existing();
        listing.sleeps = Some(2);
        let patch = reconcile(
            &listing,
            Some(&VerifiedAddress::default()),
            Some(&EnrichedContent::default()),
        );
        // No patch entry: the store leaves the existing value of 2 in place.
        assert_eq!(patch.sleeps, None);
    }

    // --- address verification ---

    #[test]
    fn address_verified_follows_verifier() {
        let verified = VerifiedAddress {
            is_public_property: true,
            ..Default::default()
        };
        let patch = reconcile(&existing(), Some(&verified), None);
        assert_eq!(patch.address_verified, Some(true));
    }

    #[test]
    fn address_verified_false_when_verification_skipped() {
        let patch = reconcile(&existing(), None, None);
        assert_eq!(patch.address_verified, Some(false));
    }

    // --- location / postcode retention ---

    #[test]
    fn location_never_cleared() {
        let mut listing = existing();
        listing.location = Some("Somerset".into());
        listing.postcode = Some("TA5 1LN".into());
        let patch = reconcile(&listing, Some(&VerifiedAddress::default()), None);
        assert_eq!(patch.location, None);
        assert_eq!(patch.postcode, None);
    }

    // --- booking links ---

    #[test]
    fn booking_links_found_from_merged_set() {
        // Verifier contributes nothing, but the record already has a link.
        let mut listing = existing();
        listing.airbnb_url = Some("https://airbnb.com/rooms/1".into());
        let patch = reconcile(&listing, Some(&VerifiedAddress::default()), None);
        assert_eq!(patch.booking_links_found, Some(true));

        // Nothing anywhere.
        let patch = reconcile(&existing(), Some(&VerifiedAddress::default()), None);
        assert_eq!(patch.booking_links_found, Some(false));
    }

    #[test]
    fn multiple_other_booking_urls_serialize_as_json() {
        let verified = VerifiedAddress {
            other_booking_urls: vec![
                "https://expedia.com/p/1".into(),
                "https://plumguide.com/p/2".into(),
            ],
            ..Default::default()
        };
        let patch = reconcile(&existing(), Some(&verified), None);
        let stored = patch.other_booking_url.unwrap();
        assert!(stored.starts_with('['));
        assert!(stored.contains("expedia"));
    }

    // --- photos ---

    #[test]
    fn verifier_photos_restack_all_slots() {
        let verified = VerifiedAddress {
            photos: vec![
                "https://cdn.example/a.jpg".into(),
                "https://cdn.example/b.jpg".into(),
            ],
            ..Default::default()
        };
        let mut listing = existing();
        listing.image_url = Some("https://old.example/old.jpg".into());
        let patch = reconcile(&listing, Some(&verified), None);
        assert_eq!(patch.image_url.as_deref(), Some("https://cdn.example/a.jpg"));
        assert_eq!(patch.photo_1_url.as_deref(), Some("https://cdn.example/b.jpg"));
        assert_eq!(patch.photo_2_url, None);
        assert_eq!(patch.photos_extracted, Some(true));
        assert_eq!(patch.photos_stored_in_blob, Some(false));
    }

    #[test]
    fn no_verifier_photos_leaves_photo_fields_untouched() {
        let mut listing = existing();
        listing.image_url = Some("https://old.example/old.jpg".into());
        let patch = reconcile(&listing, Some(&VerifiedAddress::default()), None);
        assert_eq!(patch.image_url, None);
        assert_eq!(patch.photos_extracted, None);
        assert_eq!(patch.photos_stored_in_blob, None);
    }

    // --- monotonicity ---

    #[test]
    fn empty_producer_strings_never_enter_the_patch() {
        let verified = VerifiedAddress {
            website_url: Some("".into()),
            postcode: Some("   ".into()),
            ..Default::default()
        };
        let enriched = EnrichedContent {
            description: Some("".into()),
            ..Default::default()
        };
        let patch = reconcile(&existing(), Some(&verified), Some(&enriched));
        assert_eq!(patch.website_url, None);
        assert_eq!(patch.postcode, None);
        assert_eq!(patch.description, None);
    }

    // --- the end-to-end merge from the admin scenario ---

    #[test]
    fn full_merge_scenario() {
        let listing = existing();
        let verified = VerifiedAddress {
            is_public_property: true,
            verified_address: Some("Oak Cottage, Nether Stowey, Somerset".into()),
            postcode: Some("TA5 1LN".into()),
            sleeps: Some(8),
            airbnb_url: Some("https://airbnb.com/rooms/123".into()),
            photos: vec![
                "https://cdn.example/a.jpg".into(),
                "https://cdn.example/b.jpg".into(),
            ],
            ..Default::default()
        };
        let enriched = EnrichedContent {
            description: Some("A charming retreat...".into()),
            features: vec!["Hot tub".into(), "Sleeps 8".into()],
            sleeps: Some(6),
            ..Default::default()
        };

        let patch = reconcile(&listing, Some(&verified), Some(&enriched));

        assert_eq!(patch.address_verified, Some(true));
        assert_eq!(
            patch.verified_address.as_deref(),
            Some("Oak Cottage, Nether Stowey, Somerset")
        );
        assert_eq!(patch.postcode.as_deref(), Some("TA5 1LN"));
        assert_eq!(patch.sleeps, Some(8), "Verifier wins over Enricher");
        assert_eq!(patch.airbnb_url.as_deref(), Some("https://airbnb.com/rooms/123"));
        assert_eq!(patch.booking_links_found, Some(true));
        assert_eq!(patch.image_url.as_deref(), Some("https://cdn.example/a.jpg"));
        assert_eq!(patch.photo_1_url.as_deref(), Some("https://cdn.example/b.jpg"));
        assert_eq!(patch.photos_extracted, Some(true));
        assert_eq!(patch.photos_stored_in_blob, Some(false));
        assert_eq!(patch.description.as_deref(), Some("A charming retreat..."));
        assert_eq!(
            patch.features.as_deref(),
            Some(&["Hot tub".to_string(), "Sleeps 8".to_string()][..])
        );
    }
}
