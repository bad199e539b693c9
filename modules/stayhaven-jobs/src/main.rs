use std::sync::Arc;

use anyhow::{bail, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use stayhaven_common::Config;
use stayhaven_enrich::{
    links, BlobMigrator, EnrichmentPipeline, GeminiEnricher, GeminiVerifier, ListingStore,
    PgListingStore, PhotoDiscoverer, PhotoEnricher, PhotoSource,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("stayhaven=info".parse()?))
        .init();

    info!("Stayhaven jobs starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        print_usage();
        bail!("no command given");
    };

    let config = Config::from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = PgListingStore::new(pool);
    store.migrate().await?;
    let store: Arc<PgListingStore> = Arc::new(store);

    match command {
        "enrich" => {
            let Some(target) = args.get(1) else {
                bail!("enrich requires a listing id or slug");
            };
            let pipeline = build_pipeline(store.clone(), &config);
            let result = match Uuid::parse_str(target) {
                Ok(id) => pipeline.enrich_one(id).await?,
                Err(_) => pipeline.enrich_by_slug(target).await?,
            };
            println!("\n=== Enriched: {} ===", result.listing.title);
            println!(
                "Verified: {}  |  Sleeps: {}  |  Links found: {}",
                result.address_verified,
                result
                    .listing
                    .sleeps
                    .map_or_else(|| "?".into(), |n| n.to_string()),
                result.listing.booking_links_found
            );
        }
        "enrich-all" => {
            let pipeline = build_pipeline(store.clone(), &config);
            let summary = pipeline.enrich_all().await?;
            println!("\n=== Enrichment run ===");
            println!(
                "Total: {}  |  Succeeded: {}  |  Failed: {}  |  Skipped: {}",
                summary.total, summary.succeeded, summary.failed, summary.skipped
            );
            for item in summary.items.iter().filter(|i| !i.success) {
                println!(
                    "  FAILED {}: {}",
                    item.listing_id,
                    item.error.as_deref().unwrap_or("unknown")
                );
            }
        }
        "migrate-photos" => {
            let blobs = blobstore_client::BlobStoreClient::new(
                &config.blob_store_url,
                &config.blob_store_bucket,
                &config.blob_store_token,
            );
            let migrator = BlobMigrator::new(store.as_ref(), &blobs);
            let summary = if args.len() > 1 {
                let ids = args[1..]
                    .iter()
                    .map(|s| Uuid::parse_str(s))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                migrator.migrate_many(&ids).await
            } else {
                migrator.migrate_all().await?
            };
            println!("\n=== Photo migration ===");
            println!(
                "Listings: {}  |  Migrated: {}  |  Failed: {}  |  Skipped: {}",
                summary.total, summary.migrated, summary.failed, summary.skipped
            );
            for err in &summary.errors {
                println!("  FAILED {err}");
            }
        }
        "enrich-photos" => {
            let blobs = blobstore_client::BlobStoreClient::new(
                &config.blob_store_url,
                &config.blob_store_bucket,
                &config.blob_store_token,
            );
            let discoverer = PhotoDiscoverer::new();
            let enricher = PhotoEnricher::new(store.as_ref(), &discoverer, &blobs);
            match args.get(1) {
                Some(target) => {
                    let id = match Uuid::parse_str(target) {
                        Ok(id) => id,
                        Err(_) => store
                            .get_by_slug(target)
                            .await?
                            .ok_or_else(|| anyhow::anyhow!("no listing with slug {target}"))?
                            .id,
                    };
                    let outcome = enricher.enrich_listing(id).await?;
                    println!("\n=== Photo enrichment: {id} ===");
                    println!(
                        "Pages: {}  |  Candidates: {}  |  Stored: {}  |  Failed: {}",
                        outcome.pages_scanned,
                        outcome.candidates_found,
                        outcome.stored,
                        outcome.failed
                    );
                }
                None => {
                    let outcomes = enricher.enrich_missing().await?;
                    println!("\n=== Photo enrichment: {} listings ===", outcomes.len());
                    for o in &outcomes {
                        println!(
                            "  {}  stored {}  failed {}",
                            o.listing_id, o.stored, o.failed
                        );
                    }
                }
            }
        }
        "discover-photos" => {
            let Some(target) = args.get(1) else {
                bail!("discover-photos requires a page URL or listing slug");
            };
            // A bare slug scans every booking page the listing knows about.
            let pages = if target.starts_with("http") {
                vec![target.clone()]
            } else {
                let listing = store
                    .get_by_slug(target)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("no listing with slug {target}"))?;
                links::booking_page_urls(&listing)
            };
            let discoverer = PhotoDiscoverer::new();
            for page in &pages {
                let candidates = discoverer.discover(page).await;
                println!("\n=== {} photo candidates for {page} ===", candidates.len());
                for c in &candidates {
                    println!("  {:>5.2}  {:?}  {}", c.score, c.source, c.url);
                }
            }
        }
        other => {
            print_usage();
            bail!("unknown command: {other}");
        }
    }

    Ok(())
}

fn build_pipeline(store: Arc<PgListingStore>, config: &Config) -> EnrichmentPipeline {
    let search_agent = ai_client::Gemini::new(&config.gemini_api_key, &config.gemini_model)
        .with_fallback_model(&config.gemini_fallback_model);
    let content_agent = ai_client::Gemini::new(&config.gemini_api_key, &config.gemini_model)
        .with_fallback_model(&config.gemini_fallback_model);
    EnrichmentPipeline::new(
        store as Arc<dyn ListingStore>,
        Arc::new(GeminiVerifier::new(search_agent)),
        Arc::new(GeminiEnricher::new(content_agent)),
    )
}

fn print_usage() {
    println!("Usage: jobs <command>");
    println!("  enrich <id|slug>          run one enrichment pass over a listing");
    println!("  enrich-all                enrich every listing, paced");
    println!("  migrate-photos [ids...]   move external photos into blob storage");
    println!("  enrich-photos [id|slug]   scan booking pages and store the top photos");
    println!("                            (no argument: every listing without photos)");
    println!("  discover-photos <url|slug>  print scored photo candidates for a page");
}
