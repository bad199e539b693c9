//! Accommodation enrichment pipeline: address verification, content
//! generation, photo discovery, and durable photo migration for bookable
//! listings.

pub mod discover;
pub mod enrich;
pub mod enricher;
pub mod error;
pub mod image;
pub mod links;
pub mod migrate;
pub mod photos;
pub mod reconcile;
pub mod store;
pub mod traits;
pub mod verifier;

pub use discover::{CandidateSource, PhotoCandidate, PhotoDiscoverer};
pub use enrich::{BatchSummary, EnrichmentPipeline, EnrichmentResult};
pub use enricher::{EnrichedContent, GeminiEnricher};
pub use error::{EnrichError, Result};
pub use image::{ImageProcessor, ObjectStore};
pub use links::BookingPlatform;
pub use migrate::{BlobMigrator, ListingMigration, MigrationSummary};
pub use photos::{PhotoEnricher, PhotoEnrichment};
pub use reconcile::reconcile;
pub use store::{ListingStore, MemoryListingStore, PgListingStore};
pub use traits::{AddressVerifier, ContentEnricher, PhotoSource};
pub use verifier::{GeminiVerifier, VerifiedAddress};
