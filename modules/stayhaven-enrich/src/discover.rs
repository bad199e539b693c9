// Photo discovery: heuristic scraping of booking-platform pages.
//
// Best-effort fallback for listings the Verifier found no photos for.
// Every failure mode yields an empty candidate list — discovery never
// propagates an error past its own boundary.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use crate::links::{classify, BookingPlatform};
use crate::traits::PhotoSource;

/// Some platforms reject unidentified clients, so requests carry a
/// browser-like User-Agent.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_CANDIDATES: usize = 10;
const MIN_DECLARED_WIDTH: u32 = 400;
const MIN_DECLARED_HEIGHT: u32 = 300;

static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\s[^>]*>").expect("valid regex"));
static IMG_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\s[^>]*>").expect("valid regex"));
static ANCHOR_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\s[^>]*>").expect("valid regex"));
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z-]+)\s*=\s*["']([^"']*)["']"#).expect("valid regex")
});
/// WordPress-style thumbnail suffix: image-150x150.jpg
static WP_THUMB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d+x\d+\.(jpg|jpeg|png|webp)$").expect("valid regex"));

/// Which extraction strategy produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// Social-preview meta tag — highest confidence.
    OgImage,
    /// Airbnb image-tag scan.
    AirbnbImg,
    /// Booking.com anchor linking directly to an image file.
    BookingAnchor,
    /// Generic image-tag scan.
    ImgTag,
}

#[derive(Debug, Clone)]
pub struct PhotoCandidate {
    pub url: String,
    pub alt: String,
    pub source: CandidateSource,
    /// Heuristic quality score in [0, 1].
    pub score: f32,
}

pub struct PhotoDiscoverer {
    http: reqwest::Client,
}

impl Default for PhotoDiscoverer {
    fn default() -> Self {
        Self::new()
    }
}

impl PhotoDiscoverer {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");
        Self { http }
    }

    /// Fetch a listing's page and return ranked photo candidates.
    /// Any fetch failure yields an empty list.
    pub async fn find_photos(&self, page_url: &str) -> Vec<PhotoCandidate> {
        if !page_url.starts_with("http") {
            return Vec::new();
        }

        info!(url = page_url, "Scanning page for photos");

        let response = match self
            .http
            .get(page_url)
            .header("Accept", "text/html,application/xhtml+xml")
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(url = page_url, error = %e, "Photo discovery fetch failed");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!(url = page_url, status = %response.status(), "Photo discovery got non-success status");
            return Vec::new();
        }

        let html = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = page_url, error = %e, "Failed to read page body");
                return Vec::new();
            }
        };

        let candidates = extract_candidates(&html, page_url);
        info!(url = page_url, count = candidates.len(), "Photo discovery complete");
        candidates
    }
}

#[async_trait]
impl PhotoSource for PhotoDiscoverer {
    async fn discover(&self, page_url: &str) -> Vec<PhotoCandidate> {
        self.find_photos(page_url).await
    }
}

/// Parsed attributes of a single HTML tag.
fn attrs(tag: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(tag)
        .map(|cap| (cap[1].to_lowercase(), cap[2].to_string()))
        .collect()
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// Resolve a possibly-relative image URL against the page URL.
fn resolve(raw: &str, base: Option<&url::Url>) -> Option<String> {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Some(raw.to_string());
    }
    base?.join(raw).ok().map(|u| u.to_string())
}

/// Extract, filter, dedupe, and rank photo candidates from raw HTML.
/// Pure — all network I/O lives in the fetcher.
pub fn extract_candidates(html: &str, page_url: &str) -> Vec<PhotoCandidate> {
    let base = url::Url::parse(page_url).ok();
    let mut candidates: Vec<PhotoCandidate> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    let mut push = |url: String, alt: String, source: CandidateSource, score: f32| {
        if seen.insert(url.clone()) {
            candidates.push(PhotoCandidate { url, alt, source, score });
        }
    };

    // Strategy 1: social-preview meta tags.
    let mut og_title = None;
    let mut og_image = None;
    for tag in META_TAG_RE.find_iter(html) {
        let a = attrs(tag.as_str());
        let key = attr(&a, "property").or_else(|| attr(&a, "name"));
        match key {
            Some("og:image") if og_image.is_none() => {
                og_image = attr(&a, "content").map(str::to_string);
            }
            Some("og:title") if og_title.is_none() => {
                og_title = attr(&a, "content").map(str::to_string);
            }
            _ => {}
        }
    }
    if let Some(raw) = og_image {
        if let Some(url) = resolve(&raw, base.as_ref()) {
            if is_high_quality(&url, 0, 0) {
                let alt = og_title.unwrap_or_else(|| "Main property image".to_string());
                push(url, alt, CandidateSource::OgImage, 0.95);
            }
        }
    }

    // Strategy 2: platform-specific rules.
    match classify(page_url) {
        BookingPlatform::Airbnb => {
            for tag in IMG_TAG_RE.find_iter(html) {
                let a = attrs(tag.as_str());
                let src = attr(&a, "src").or_else(|| attr(&a, "data-original-uri"));
                let Some(raw) = src else { continue };
                let Some(url) = resolve(raw, base.as_ref()) else { continue };
                if is_high_quality(&url, 0, 0) {
                    let alt = attr(&a, "alt").unwrap_or_default().to_string();
                    push(url, alt, CandidateSource::AirbnbImg, 0.6);
                }
            }
        }
        BookingPlatform::BookingCom => {
            for tag in ANCHOR_TAG_RE.find_iter(html) {
                let a = attrs(tag.as_str());
                let Some(href) = attr(&a, "href") else { continue };
                let lower = href.to_lowercase();
                if !(lower.contains(".jpg") || lower.contains(".jpeg")) {
                    continue;
                }
                if lower.contains("user_avatar") {
                    continue;
                }
                let Some(url) = resolve(href, base.as_ref()) else { continue };
                if is_high_quality(&url, 0, 0) {
                    push(url, "Booking.com photo".to_string(), CandidateSource::BookingAnchor, 0.8);
                }
            }
        }
        _ => {}
    }

    // Strategy 3: generic image-tag scan.
    for tag in IMG_TAG_RE.find_iter(html) {
        let a = attrs(tag.as_str());
        let Some(raw) = attr(&a, "src") else { continue };
        if !raw.starts_with("http") {
            continue;
        }
        let width = attr(&a, "width").and_then(|v| v.parse().ok()).unwrap_or(0);
        let height = attr(&a, "height").and_then(|v| v.parse().ok()).unwrap_or(0);
        if is_high_quality(raw, width, height) {
            let alt = attr(&a, "alt").unwrap_or_default().to_string();
            push(raw.to_string(), alt, CandidateSource::ImgTag, 0.5);
        }
    }

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(MAX_CANDIDATES);
    candidates
}

/// Quality filter shared by all strategies. Rejects obvious junk by
/// filename keyword, vector/animated formats, declared dimensions below the
/// threshold, and thumbnail-size markers.
fn is_high_quality(url: &str, width: u32, height: u32) -> bool {
    let lower = url.to_lowercase();

    for keyword in ["logo", "icon", "avatar", "profile"] {
        if lower.contains(keyword) {
            return false;
        }
    }

    if lower.ends_with(".svg") || lower.ends_with(".gif") {
        return false;
    }

    if width > 0 && width < MIN_DECLARED_WIDTH {
        return false;
    }
    if height > 0 && height < MIN_DECLARED_HEIGHT {
        return false;
    }

    if lower.contains("thumbnail") || lower.contains("small") || lower.contains("50x50") {
        return false;
    }
    if WP_THUMB_RE.is_match(&lower) {
        return false;
    }

    true
}
