// Booking-link classification: URL pattern matching against known platforms.

use stayhaven_common::Listing;

/// Booking-platform category for a URL. Closed set; classification never
/// fails — anything unrecognized is a generic property website.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingPlatform {
    Airbnb,
    BookingCom,
    /// Vacation-rental aggregators (VRBO, HomeAway).
    Vrbo,
    /// A property's own website, or any unrecognized URL.
    Website,
    /// Empty or unusable input.
    Unclassified,
}

/// Domain substrings per platform. The single source of truth — every
/// caller classifies through this table, never its own matching.
const PLATFORM_DOMAINS: &[(BookingPlatform, &[&str])] = &[
    (BookingPlatform::Airbnb, &["airbnb.com", "airbnb.co.uk"]),
    (BookingPlatform::BookingCom, &["booking.com", "booking.co.uk"]),
    (
        BookingPlatform::Vrbo,
        &["vrbo.com", "vrbo.co.uk", "homeaway.com"],
    ),
];

/// Classify a URL by case-insensitive substring match against the platform
/// table. Total: empty input is `Unclassified`, an unrecognized URL is
/// assumed to be the property's own website.
pub fn classify(url: &str) -> BookingPlatform {
    if url.trim().is_empty() {
        return BookingPlatform::Unclassified;
    }

    let lower = url.to_lowercase();
    for (platform, domains) in PLATFORM_DOMAINS {
        if domains.iter().any(|d| lower.contains(d)) {
            return *platform;
        }
    }

    BookingPlatform::Website
}

/// Parse the `other_booking_url` field, which holds either a bare URL or a
/// JSON-serialized list of URLs. Consumers must handle both shapes.
pub fn parse_other_booking_urls(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if let Ok(urls) = serde_json::from_str::<Vec<String>>(trimmed) {
        return urls.into_iter().filter(|u| !u.is_empty()).collect();
    }

    vec![trimmed.to_string()]
}

/// Serialize a list of extra booking URLs back into the stored form:
/// a single URL stays bare, multiple URLs become a JSON array.
pub fn serialize_other_booking_urls(urls: &[String]) -> Option<String> {
    let urls: Vec<&String> = urls.iter().filter(|u| !u.trim().is_empty()).collect();
    match urls.as_slice() {
        [] => None,
        [single] => Some((*single).clone()),
        many => serde_json::to_string(many).ok(),
    }
}

/// Derive `booking_links_found`: true iff at least one booking-link field
/// is non-empty.
pub fn booking_links_found(
    website_url: Option<&str>,
    airbnb_url: Option<&str>,
    booking_com_url: Option<&str>,
    vrbo_url: Option<&str>,
    other_booking_url: Option<&str>,
) -> bool {
    [website_url, airbnb_url, booking_com_url, vrbo_url, other_booking_url]
        .iter()
        .any(|v| v.is_some_and(|s| !s.trim().is_empty()))
}

/// Booking page URLs for a listing, best first, for photo discovery.
pub fn booking_page_urls(listing: &Listing) -> Vec<String> {
    let mut urls = Vec::new();
    for candidate in [
        listing.airbnb_url.as_deref(),
        listing.booking_com_url.as_deref(),
        listing.vrbo_url.as_deref(),
        listing.website_url.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        if !candidate.trim().is_empty() {
            urls.push(candidate.to_string());
        }
    }
    if let Some(other) = listing.other_booking_url.as_deref() {
        urls.extend(parse_other_booking_urls(other));
    }
    urls
}
