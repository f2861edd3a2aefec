//! Integration Tests for Marketplace Search
//!
//! Every scenario runs against both stores: the in-memory store and a SQLite
//! `SqlStore` on a temp file. No external services are needed.
//!
//! # Running Tests
//! ```bash
//! cargo test --test integration
//!
//! # Only one backend
//! cargo test --test integration memory
//! cargo test --test integration sqlite
//! ```
//!
//! # Test Organization
//! - `happy_*` - Normal operation: matching, paging, filtering, ordering
//! - `edge_*` - Out-of-range pages, empty terms, absent fields

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use marketplace_search::{
    BusinessType, EntityStore, FilterSpec, InMemoryStore, Listing, Location, PageRequest,
    PageResult, SearchConfig, Searcher, SortField, SortSpec, SqlEntity, SqlStore, User,
};

// =============================================================================
// Fixtures
// =============================================================================

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, day, 9, 30, 0).unwrap()
}

fn users() -> Vec<User> {
    let mut users = vec![
        User::new(1, "Alice", "Smith").with_created(at(1)),
        User::new(2, "Alice", "Jones").with_middle_name("May").with_created(at(2)),
        User::new(3, "Bob", "Smith").with_nickname("bobby").with_created(at(3)),
        User::new(4, "Carol", "Brown").with_middle_name("Alicia").with_created(at(4)),
        User::new(5, "Dave", "Jones").with_nickname("Alice").with_created(at(5)),
    ];
    // Identical names: ordering among these comes from the id tie-break alone
    users.extend((6..=30).rev().map(|i| User::new(i, "Sam", "Taylor").with_created(at(6))));
    users
}

fn listings() -> Vec<Listing> {
    (1..=12)
        .map(|i| {
            let business_type = if i % 2 == 0 {
                BusinessType::RetailTrade
            } else {
                BusinessType::AccommodationAndFoodServices
            };
            let city = if i % 3 == 0 { "Christchurch" } else { "Wellington" };
            Listing::new(
                i,
                format!("Product {}", i),
                format!("Business {}", i % 4),
                business_type,
                Decimal::new(i * 100, 2),
                at(i as u32),
            )
            .with_created(at(1))
            .with_location(Location::new(None, Some(city), Some("Region"), Some("New Zealand")))
        })
        .collect()
}

fn temp_db_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("marketplace_search_it_{}_{}.db", name, std::process::id()))
}

/// Clean up SQLite database and its WAL files
fn cleanup_db(path: &PathBuf) {
    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(format!("{}-wal", path.display()));
    let _ = std::fs::remove_file(format!("{}-shm", path.display()));
}

/// SQLite store seeded with `entities`; the returned guard removes the file.
struct SqliteFixture<E> {
    store: Arc<SqlStore<E>>,
    path: PathBuf,
}

impl<E> Drop for SqliteFixture<E> {
    fn drop(&mut self) {
        cleanup_db(&self.path);
    }
}

async fn sqlite_store<E: SqlEntity>(name: &str, entities: &[E]) -> SqliteFixture<E> {
    let path = temp_db_path(name);
    cleanup_db(&path);
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let store = SqlStore::<E>::connect(&url).await.expect("sqlite store");
    store.upsert_batch(entities).await.expect("seed");
    SqliteFixture {
        store: Arc::new(store),
        path,
    }
}

fn memory_store<E: marketplace_search::Searchable>(entities: Vec<E>) -> Arc<InMemoryStore<E>> {
    Arc::new(InMemoryStore::from_entities(entities))
}

fn page(number: u64, size: u64) -> PageRequest {
    PageRequest::new(number, size, 48).unwrap()
}

fn ids<E: marketplace_search::Searchable>(result: &PageResult<E>) -> Vec<i64> {
    result.content.iter().map(|e| e.id()).collect()
}

async fn all_ids<E: marketplace_search::Searchable>(
    searcher: &Searcher<E>,
    terms: &[&str],
    filters: &FilterSpec,
    sort: &SortSpec,
    size: u64,
) -> (Vec<i64>, u64) {
    let first = searcher.search(terms, filters, sort, page(0, size)).await.unwrap();
    let mut collected = ids(&first);
    for n in 1..first.total_pages {
        let next = searcher.search(terms, filters, sort, page(n, size)).await.unwrap();
        assert_eq!(next.total_elements, first.total_elements);
        collected.extend(ids(&next));
    }
    (collected, first.total_elements)
}

// =============================================================================
// Scenarios (shared by both backends)
// =============================================================================

async fn scenario_exact_vs_fuzzy(store: Arc<dyn EntityStore<User>>) {
    let searcher = Searcher::users_by_name(store, SearchConfig::default());
    let filters = FilterSpec::new();
    let sort = SortSpec::unsorted();

    // Quoted "Alice" only equals a whole group: Dave's nickname
    let exact = searcher.search(&["\"Alice\""], &filters, &sort, page(0, 10)).await.unwrap();
    assert_eq!(ids(&exact), vec![5]);

    // Unquoted matches every group containing "alice", any case
    let fuzzy = searcher.search(&["alice"], &filters, &sort, page(0, 10)).await.unwrap();
    assert_eq!(ids(&fuzzy), vec![1, 2, 5]);

    // Exact full name, wrong case, matches nothing
    let wrong_case = searcher.search(&["\"alice smith\""], &filters, &sort, page(0, 10)).await.unwrap();
    assert_eq!(wrong_case.total_elements, 0);

    let full = searcher.search(&["\"Alice May Jones\""], &filters, &sort, page(0, 10)).await.unwrap();
    assert_eq!(ids(&full), vec![2]);
}

async fn scenario_multi_term_union(store: Arc<dyn EntityStore<User>>) {
    let searcher = Searcher::users_by_name(store, SearchConfig::default());
    let filters = FilterSpec::new();
    let sort = SortSpec::unsorted();

    let (alice, _) = all_ids(&searcher, &["alice"], &filters, &sort, 48).await;
    let (bob, _) = all_ids(&searcher, &["bob"], &filters, &sort, 48).await;
    let (both, total) = all_ids(&searcher, &["alice", "bob"], &filters, &sort, 48).await;

    let union: BTreeSet<i64> = alice.into_iter().chain(bob).collect();
    assert_eq!(both.iter().copied().collect::<BTreeSet<_>>(), union);
    assert_eq!(total as usize, union.len());
}

async fn scenario_pages_partition_result(store: Arc<dyn EntityStore<User>>) {
    let searcher = Searcher::users_by_name(store, SearchConfig::default());
    let sort = SortSpec::unsorted().then(SortField::asc("lastName"));

    for size in [1, 4, 7, 48] {
        let (collected, total) = all_ids(&searcher, &[], &FilterSpec::new(), &sort, size).await;
        assert_eq!(total, 30);
        assert_eq!(collected.len() as u64, total, "page size {}", size);
        let distinct: BTreeSet<i64> = collected.iter().copied().collect();
        assert_eq!(distinct.len(), collected.len(), "duplicate across pages at size {}", size);
    }
}

async fn scenario_tie_break_across_pages(store: Arc<dyn EntityStore<User>>) {
    let searcher = Searcher::users_by_name(store, SearchConfig::default());
    let sort = SortSpec::unsorted().then(SortField::desc("firstName"));

    let (collected, total) = all_ids(&searcher, &["taylor"], &FilterSpec::new(), &sort, 7).await;
    assert_eq!(total, 25);
    // Every row ties on firstName, so ids ascend across page boundaries
    assert_eq!(collected, (6..=30).collect::<Vec<_>>());

    let (again, _) = all_ids(&searcher, &["taylor"], &FilterSpec::new(), &sort, 7).await;
    assert_eq!(collected, again);
}

async fn scenario_out_of_range_page(store: Arc<dyn EntityStore<User>>) {
    let searcher = Searcher::users_by_name(store, SearchConfig::default());
    // alice, bob, carol and dave rows: 5 matches
    let result = searcher
        .search(&["alice", "bob", "brown"], &FilterSpec::new(), &SortSpec::unsorted(), page(1000, 10))
        .await
        .unwrap();
    assert!(result.content.is_empty());
    assert_eq!(result.total_elements, 5);
    assert_eq!(result.total_pages, 1);
}

async fn scenario_idempotent(store: Arc<dyn EntityStore<User>>) {
    let searcher = Searcher::users_by_name(store, SearchConfig::default());
    let sort = SortSpec::unsorted().then(SortField::asc("lastName").ignoring_case());
    let first = searcher.search(&["s"], &FilterSpec::new(), &sort, page(1, 5)).await.unwrap();
    let second = searcher.search(&["s"], &FilterSpec::new(), &sort, page(1, 5)).await.unwrap();
    assert_eq!(first, second);
}

async fn scenario_listing_filters(store: Arc<dyn EntityStore<Listing>>) {
    let config = SearchConfig::default();
    let by_location = Searcher::listings_by_location(store.clone(), config.clone());

    // Christchurch: 3, 6, 9, 12; price window [5.00, 10.00]: 5..=10
    let filters = FilterSpec::new().price_between(Some(Decimal::new(500, 2)), Some(Decimal::new(1000, 2)));
    let result = by_location
        .search(&["christchurch"], &filters, &SortSpec::unsorted(), page(0, 10))
        .await
        .unwrap();
    assert_eq!(ids(&result), vec![6, 9]);

    // Adding a business type narrows further
    let retail = filters.clone().business_type(BusinessType::RetailTrade);
    let result = by_location
        .search(&["christchurch"], &retail, &SortSpec::unsorted(), page(0, 10))
        .await
        .unwrap();
    assert_eq!(ids(&result), vec![6]);

    // Closing-date window is inclusive at both ends
    let dates = FilterSpec::new().dates_between(Some(at(4)), Some(at(7)));
    let by_product = Searcher::listings_by_product_name(store.clone(), config.clone());
    let sort = SortSpec::unsorted().then(SortField::desc("closes"));
    let result = by_product.search(&["product"], &dates, &sort, page(0, 10)).await.unwrap();
    assert_eq!(ids(&result), vec![7, 6, 5, 4]);

    // Business name: "Business 1" → 1, 5, 9; sorted by price descending
    let by_business = Searcher::listings_by_business_name(store, config);
    let sort = SortSpec::unsorted().then(SortField::desc("price"));
    let result = by_business
        .search(&["\"Business 1\""], &FilterSpec::new(), &sort, page(0, 10))
        .await
        .unwrap();
    assert_eq!(ids(&result), vec![9, 5, 1]);
}

// =============================================================================
// In-memory backend
// =============================================================================

#[tokio::test]
async fn happy_memory_exact_vs_fuzzy() {
    scenario_exact_vs_fuzzy(memory_store(users())).await;
}

#[tokio::test]
async fn happy_memory_multi_term_union() {
    scenario_multi_term_union(memory_store(users())).await;
}

#[tokio::test]
async fn happy_memory_pages_partition_result() {
    scenario_pages_partition_result(memory_store(users())).await;
}

#[tokio::test]
async fn happy_memory_tie_break_across_pages() {
    scenario_tie_break_across_pages(memory_store(users())).await;
}

#[tokio::test]
async fn edge_memory_out_of_range_page() {
    scenario_out_of_range_page(memory_store(users())).await;
}

#[tokio::test]
async fn happy_memory_idempotent() {
    scenario_idempotent(memory_store(users())).await;
}

#[tokio::test]
async fn happy_memory_listing_filters() {
    scenario_listing_filters(memory_store(listings())).await;
}

// =============================================================================
// SQLite backend
// =============================================================================

#[tokio::test]
async fn happy_sqlite_exact_vs_fuzzy() {
    let fixture = sqlite_store("exact_vs_fuzzy", &users()).await;
    scenario_exact_vs_fuzzy(fixture.store.clone()).await;
}

#[tokio::test]
async fn happy_sqlite_multi_term_union() {
    let fixture = sqlite_store("union", &users()).await;
    scenario_multi_term_union(fixture.store.clone()).await;
}

#[tokio::test]
async fn happy_sqlite_pages_partition_result() {
    let fixture = sqlite_store("partition", &users()).await;
    scenario_pages_partition_result(fixture.store.clone()).await;
}

#[tokio::test]
async fn happy_sqlite_tie_break_across_pages() {
    let fixture = sqlite_store("tie_break", &users()).await;
    scenario_tie_break_across_pages(fixture.store.clone()).await;
}

#[tokio::test]
async fn edge_sqlite_out_of_range_page() {
    let fixture = sqlite_store("out_of_range", &users()).await;
    scenario_out_of_range_page(fixture.store.clone()).await;
}

#[tokio::test]
async fn happy_sqlite_idempotent() {
    let fixture = sqlite_store("idempotent", &users()).await;
    scenario_idempotent(fixture.store.clone()).await;
}

#[tokio::test]
async fn happy_sqlite_listing_filters() {
    let fixture = sqlite_store("listing_filters", &listings()).await;
    scenario_listing_filters(fixture.store.clone()).await;
}

// =============================================================================
// Cross-backend agreement
// =============================================================================

#[tokio::test]
async fn happy_backends_agree_on_sorted_pages() {
    let fixture = sqlite_store("agree", &users()).await;
    let memory = Searcher::users_by_name(memory_store(users()), SearchConfig::default());
    let sqlite = Searcher::users_by_name(fixture.store.clone(), SearchConfig::default());

    let sorts = [
        SortSpec::unsorted(),
        SortSpec::unsorted().then(SortField::asc("nickname")),
        SortSpec::unsorted().then(SortField::desc("middleName")),
        SortSpec::unsorted()
            .then(SortField::asc("lastName").ignoring_case())
            .then(SortField::desc("created")),
    ];
    for sort in &sorts {
        let (from_memory, total_memory) = all_ids(&memory, &["a", "o"], &FilterSpec::new(), sort, 4).await;
        let (from_sqlite, total_sqlite) = all_ids(&sqlite, &["a", "o"], &FilterSpec::new(), sort, 4).await;
        assert_eq!(total_memory, total_sqlite);
        assert_eq!(from_memory, from_sqlite, "sort {:?}", sort);
    }
}

#[tokio::test]
async fn happy_backends_agree_on_non_ascii_text() {
    let items: Vec<Listing> = [
        (1, "Kūmara", "Ōtautahi"),
        (2, "éclair", "Wellington"),
        (3, "Café latte", "Dunedin"),
        (4, "Straße pretzel", "Nelson"),
        (5, "ÉCLAIR box", "Ōamaru"),
    ]
    .into_iter()
    .map(|(id, product, city)| {
        Listing::new(id, product, "Bakery", BusinessType::RetailTrade, Decimal::new(500, 2), at(10))
            .with_created(at(1))
            .with_location(Location::new(None, Some(city), None, Some("Aotearoa")))
    })
    .collect();

    let fixture = sqlite_store("non_ascii", &items).await;
    let config = SearchConfig::default();
    let memory: Arc<dyn EntityStore<Listing>> = memory_store(items);
    let sqlite: Arc<dyn EntityStore<Listing>> = fixture.store.clone();
    let sort = SortSpec::unsorted().then(SortField::asc("productName").ignoring_case());

    let product_searches: [(&str, Vec<i64>); 7] = [
        ("kūmara", vec![1]),
        ("KŪMARA", vec![1]),
        ("éclair", vec![2, 5]),
        ("ÉCLAIR", vec![2, 5]),
        ("café", vec![3]),
        ("STRASSE", vec![4]),
        ("straße", vec![4]),
    ];
    for (term, expected) in &product_searches {
        for store in [&memory, &sqlite] {
            let searcher = Searcher::listings_by_product_name(store.clone(), config.clone());
            let (found, total) = all_ids(&searcher, &[*term], &FilterSpec::new(), &sort, 2).await;
            assert_eq!(&found, expected, "product term {:?}", term);
            assert_eq!(total as usize, expected.len());
        }
    }

    for (term, expected) in [("ō", vec![1, 5]), ("ŌAMARU", vec![5])] {
        for store in [&memory, &sqlite] {
            let searcher = Searcher::listings_by_location(store.clone(), config.clone());
            let (found, _) = all_ids(&searcher, &[term], &FilterSpec::new(), &sort, 2).await;
            assert_eq!(found, expected, "location term {:?}", term);
        }
    }

    // Case-insensitive ordering over every product agrees too
    for store in [&memory, &sqlite] {
        let searcher = Searcher::listings_by_product_name(store.clone(), config.clone());
        let (ordered, _) = all_ids(&searcher, &[], &FilterSpec::new(), &sort, 2).await;
        assert_eq!(ordered, vec![3, 1, 4, 2, 5]);
    }
}

#[tokio::test]
async fn edge_empty_terms_match_everything() {
    let searcher = Searcher::users_by_name(memory_store(users()), SearchConfig::default());
    let result = searcher
        .search(&["", "   ", "\"\""], &FilterSpec::new(), &SortSpec::unsorted(), page(0, 48))
        .await
        .unwrap();
    assert_eq!(result.total_elements, 30);
}
