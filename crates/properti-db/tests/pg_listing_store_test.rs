//! PostgreSQL-backed tests for `PgListingStore`.
//!
//! Require a database with migrations applied; run with
//! `DATABASE_URL=... cargo test -p properti-db -- --ignored`.

use properti_db::test_fixtures::{sample_listings, test_database_url};
use properti_db::{
    create_pool, ListingField, ListingQuery, ListingRecord, ListingStore, OrderKey, Page,
    PatternCondition, PgListingStore, SearchStrategyKind, TextMatch,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn get_test_pool() -> PgPool {
    let _ = dotenvy::dotenv();
    create_pool(&test_database_url())
        .await
        .expect("Failed to connect to test database")
}

/// Insert the sample catalogue with a unique code prefix so parallel runs
/// never collide. Returns the prefix.
async fn seed(pool: &PgPool) -> (String, Vec<ListingRecord>) {
    let prefix = format!("T{}", &Uuid::new_v4().simple().to_string()[..6]);
    let mut seeded = Vec::new();
    for mut listing in sample_listings() {
        listing.kode_listing = format!("{prefix}-{}", listing.kode_listing);
        listing.judul_properti = format!("{} {prefix}", listing.judul_properti);
        sqlx::query(
            "INSERT INTO properties (id, kode_listing, judul_properti, deskripsi, jenis_properti,
                harga_properti, status, is_sold, kabupaten, provinsi, alamat_lengkap, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(listing.id)
        .bind(&listing.kode_listing)
        .bind(&listing.judul_properti)
        .bind(&listing.deskripsi)
        .bind(&listing.jenis_properti)
        .bind(listing.harga_properti)
        .bind(&listing.status)
        .bind(listing.is_sold)
        .bind(&listing.kabupaten)
        .bind(&listing.provinsi)
        .bind(&listing.alamat_lengkap)
        .bind(listing.created_at)
        .execute(pool)
        .await
        .expect("Failed to insert listing");
        seeded.push(listing);
    }
    (prefix, seeded)
}

async fn cleanup(pool: &PgPool, prefix: &str) {
    sqlx::query("DELETE FROM properties WHERE kode_listing LIKE $1")
        .bind(format!("{prefix}-%"))
        .execute(pool)
        .await
        .expect("Failed to clean up listings");
}

#[tokio::test]
#[ignore] // Requires database connection with migrations applied
async fn test_pattern_query_counts_and_pages() {
    let pool = get_test_pool().await;
    let (prefix, seeded) = seed(&pool).await;
    let store = PgListingStore::new(pool.clone());

    let query = ListingQuery::new(
        SearchStrategyKind::Fallback,
        TextMatch::AnyPattern(vec![PatternCondition::new(ListingField::Title, &prefix)]),
    )
    .order_by(OrderKey::desc(ListingField::CreatedAt))
    .order_by(OrderKey::asc(ListingField::Id))
    .page(Page::new(0, 4));

    let page = store.execute(&query).await.expect("query failed");
    assert_eq!(page.total_count, seeded.len() as i64);
    assert_eq!(page.records.len(), 4);
    assert!(page.records[0].created_at >= page.records[1].created_at);

    cleanup(&pool, &prefix).await;
}

#[tokio::test]
#[ignore] // Requires database connection with migrations applied
async fn test_exact_code_lookup_is_case_insensitive() {
    let pool = get_test_pool().await;
    let (prefix, _) = seed(&pool).await;
    let store = PgListingStore::new(pool.clone());

    let code = format!("{prefix}-r8.01").to_lowercase();
    let query = ListingQuery::new(SearchStrategyKind::Fts, TextMatch::ExactCode(code));
    let page = store.execute(&query).await.expect("query failed");
    assert_eq!(page.records.len(), 1);
    assert!(page.records[0].kode_listing.ends_with("R8.01"));

    cleanup(&pool, &prefix).await;
}

#[tokio::test]
#[ignore] // Requires database connection with migrations applied
async fn test_full_text_query_ranks_matches() {
    let pool = get_test_pool().await;
    let (prefix, _) = seed(&pool).await;
    let store = PgListingStore::new(pool.clone());

    let query = ListingQuery::new(
        SearchStrategyKind::Fts,
        TextMatch::FullText {
            term: format!("kost {prefix}"),
            config: properti_db::defaults::TEXT_SEARCH_CONFIG.to_string(),
        },
    )
    .order_by(OrderKey::rank());
    let page = store.execute(&query).await.expect("query failed");
    assert_eq!(page.records.len(), 1);
    assert!(page.records[0].search_score.is_some());

    cleanup(&pool, &prefix).await;
}
