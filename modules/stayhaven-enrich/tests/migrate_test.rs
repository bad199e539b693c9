//! Blob-migration tests: idempotence, partial failure, and the durable
//! flag invariant.

mod common;

use uuid::Uuid;

use common::{dead_url, png_bytes, serve_png, MemoryObjectStore};
use stayhaven_common::Listing;
use stayhaven_enrich::{BlobMigrator, ListingStore, MemoryListingStore};

#[tokio::test]
async fn migrates_external_photos_then_does_nothing_on_rerun() {
    let base = serve_png(png_bytes(800, 600)).await;
    let store = MemoryListingStore::new();
    let objects = MemoryObjectStore::default();

    let listing = Listing {
        id: Uuid::new_v4(),
        slug: "oak-cottage".into(),
        title: "Oak Cottage".into(),
        image_url: Some(format!("{base}/hero.png")),
        photo_1_url: Some(format!("{base}/lounge.png")),
        photo_2_url: Some("memblob://stay-media/accommodations/oak-cottage/photo_2_url-bbbb.jpg".into()),
        ..Default::default()
    };
    let id = listing.id;
    store.insert(listing);

    let migrator = BlobMigrator::new(&store, &objects);

    let outcome = migrator.migrate_listing(id).await.unwrap();
    assert_eq!(outcome.migrated, 2);
    assert_eq!(outcome.failed, 0);
    assert_eq!(outcome.skipped, 1);

    let listing = store.get(id).await.unwrap().unwrap();
    let image_url = listing.image_url.as_deref().unwrap();
    assert!(image_url.starts_with("memblob://stay-media/accommodations/oak-cottage/image_url-"));
    assert!(image_url.ends_with(".jpg"));
    assert!(listing
        .photo_1_url
        .as_deref()
        .unwrap()
        .starts_with("memblob://"));
    // Every populated image field is durable, so the flag flips.
    assert!(listing.photos_stored_in_blob);
    assert_eq!(objects.put_count(), 2);

    // Second pass finds only durable URLs: no uploads, no write.
    let rerun = migrator.migrate_listing(id).await.unwrap();
    assert_eq!(rerun.migrated, 0);
    assert_eq!(rerun.skipped, 3);
    assert_eq!(objects.put_count(), 2);
    assert_eq!(store.recorded_updates().len(), 1);
}

#[tokio::test]
async fn failed_field_keeps_its_original_url() {
    let base = serve_png(png_bytes(640, 480)).await;
    let gone = dead_url().await;
    let store = MemoryListingStore::new();
    let objects = MemoryObjectStore::default();

    let listing = Listing {
        id: Uuid::new_v4(),
        slug: "mill-barn".into(),
        title: "Mill Barn".into(),
        image_url: Some(format!("{base}/hero.png")),
        photo_1_url: Some(gone.clone()),
        ..Default::default()
    };
    let id = listing.id;
    store.insert(listing);

    let migrator = BlobMigrator::new(&store, &objects);
    let outcome = migrator.migrate_listing(id).await.unwrap();
    assert_eq!(outcome.migrated, 1);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.errors.len(), 1);

    let listing = store.get(id).await.unwrap().unwrap();
    assert!(listing.image_url.as_deref().unwrap().starts_with("memblob://"));
    // The failed slot is untouched and the flag stays down.
    assert_eq!(listing.photo_1_url.as_deref(), Some(gone.as_str()));
    assert!(!listing.photos_stored_in_blob);
}

#[tokio::test]
async fn fully_durable_listing_is_left_untouched() {
    let store = MemoryListingStore::new();
    let objects = MemoryObjectStore::default();

    let listing = Listing {
        id: Uuid::new_v4(),
        slug: "kiln-house".into(),
        title: "Kiln House".into(),
        image_url: Some("memblob://stay-media/accommodations/kiln-house/image_url-aaaa.jpg".into()),
        photos_stored_in_blob: true,
        ..Default::default()
    };
    let id = listing.id;
    store.insert(listing);

    let migrator = BlobMigrator::new(&store, &objects);
    let outcome = migrator.migrate_listing(id).await.unwrap();
    assert_eq!(outcome.migrated, 0);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(objects.put_count(), 0);
    assert!(store.recorded_updates().is_empty());
}

#[tokio::test]
async fn batch_totals_accumulate_across_listings() {
    let base = serve_png(png_bytes(320, 240)).await;
    let store = MemoryListingStore::new();
    let objects = MemoryObjectStore::default();

    let a = Listing {
        id: Uuid::new_v4(),
        slug: "a".into(),
        title: "A".into(),
        image_url: Some(format!("{base}/a.png")),
        ..Default::default()
    };
    let b = Listing {
        id: Uuid::new_v4(),
        slug: "b".into(),
        title: "B".into(),
        photo_2_url: Some(format!("{base}/b.png")),
        ..Default::default()
    };
    let ids = vec![a.id, b.id, Uuid::new_v4()];
    store.insert(a);
    store.insert(b);

    let migrator = BlobMigrator::new(&store, &objects);
    let summary = migrator.migrate_many(&ids).await;
    assert_eq!(summary.total, 3);
    assert_eq!(summary.migrated, 2);
    // The unknown id is counted as a failure, not a panic.
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors.len(), 1);
}
