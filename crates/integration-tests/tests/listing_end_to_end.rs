//! Listing pages driven by real catalog fetches: local and remote
//! evaluation, ownership exclusion and the fetch lifecycle.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use deal_catalog::{
    Evaluation, ListParams, ListingPage, ListingStatus, PageRequest, ProductSort, SortDirection,
    UserSort,
};
use deal_core::{CategoryId, MainUser, Product, RoleTier, UserRole, Viewer};
use deal_integration_tests::{FakeCatalog, Injected, Seed};

fn titles(products: &[Product]) -> Vec<&str> {
    products.iter().map(|p| p.title.as_str()).collect()
}

#[tokio::test]
async fn test_local_evaluation_filters_and_sorts_the_snapshot() {
    let catalog = FakeCatalog::spawn(Seed::marketplace()).await;
    let client = catalog.client();

    let params = ListParams::<Product>::new()
        .with_search("phone")
        .with_sort(ProductSort::Price(SortDirection::Ascending));
    let products = client.list_products(&params, Evaluation::Local).await.unwrap();
    assert_eq!(titles(&products), ["Phone Case", "Phone X"]);

    let params = ListParams::<Product>::new()
        .with_criterion(CategoryId::new("c-phones"))
        .with_sort(ProductSort::Title(SortDirection::Descending));
    let products = client.list_products(&params, Evaluation::Local).await.unwrap();
    assert_eq!(titles(&products), ["Phone X", "Phone Case", "Earbuds"]);

    // Both listings came from one fetch, without query parameters.
    assert_eq!(catalog.hits("GET /api/products"), 1);
    assert_eq!(catalog.last_request().unwrap().query, None);
}

#[tokio::test]
async fn test_seller_never_sees_own_products() {
    let catalog = FakeCatalog::spawn(Seed::marketplace()).await;
    let client = catalog.client();

    let seller = ListParams::<Product>::new()
        .with_viewer(Viewer::new("u-seller-1", UserRole::User))
        .with_sort(ProductSort::Title(SortDirection::Ascending));
    let products = client.list_products(&seller, Evaluation::Local).await.unwrap();
    assert_eq!(titles(&products), ["blender", "Earbuds", "Phone Case"]);

    let admin =
        ListParams::<Product>::new().with_viewer(Viewer::new("u-seller-1", UserRole::Admin));
    let products = client.list_products(&admin, Evaluation::Local).await.unwrap();
    assert_eq!(products.len(), 5);
}

#[tokio::test]
async fn test_remote_evaluation_sends_parameters_and_keeps_server_order() {
    let catalog = FakeCatalog::spawn(Seed::marketplace()).await;
    let client = catalog.client();

    let params = ListParams::<Product>::new()
        .with_search("Phone")
        .with_criterion(CategoryId::new("c-phones"))
        .with_sort(ProductSort::Price(SortDirection::Descending))
        .with_viewer(Viewer::new("u-seller-2", UserRole::User));
    let products = client
        .list_products(
            &params,
            Evaluation::Remote {
                page: Some(PageRequest::new(0, 10)),
            },
        )
        .await
        .unwrap();

    let request = catalog.last_request().unwrap();
    assert_eq!(request.path, "/api/products");
    assert_eq!(
        request.query.as_deref(),
        Some("search=Phone&categoryId=c-phones&property=price&sort=DESC&page=0&size=10")
    );

    // The fake returns everything in stored order; only ownership is re-applied.
    assert_eq!(titles(&products), ["Phone X", "Kettle"]);

    // Remote results bypass the cache.
    client.list_products(&params, Evaluation::Remote { page: None }).await.unwrap();
    assert_eq!(catalog.hits("GET /api/products"), 2);
}

#[tokio::test]
async fn test_user_tiers_over_fetched_users() {
    let catalog = FakeCatalog::spawn(Seed::marketplace()).await;
    let client = catalog.client();
    let users = client.get_users().await.unwrap();

    let usernames = |tier: Option<RoleTier>, sort: UserSort| {
        let mut page = ListingPage::<MainUser>::new();
        page.set_criterion(tier);
        page.set_sort(Some(sort));
        let ticket = page.begin_fetch();
        page.finish_fetch(ticket, Ok::<_, deal_catalog::CatalogError>(users.clone()));
        page.visible()
            .unwrap()
            .iter()
            .map(|u| u.username.clone())
            .collect::<Vec<_>>()
    };

    let by_date = UserSort::CreatedAt(SortDirection::Ascending);
    assert_eq!(usernames(Some(RoleTier::Admin), by_date), ["root"]);
    assert_eq!(usernames(Some(RoleTier::Seller), by_date), ["alice", "marketbob"]);
    assert_eq!(
        usernames(Some(RoleTier::SellerBuyer), by_date),
        usernames(Some(RoleTier::Seller), by_date)
    );
    assert_eq!(
        usernames(Some(RoleTier::Buyer), UserSort::Name(SortDirection::Ascending)),
        ["alice", "carol", "marketbob"]
    );
    assert_eq!(usernames(None, by_date).len(), 4);
}

#[tokio::test]
async fn test_listing_page_survives_a_failed_refetch() {
    let catalog = FakeCatalog::spawn(Seed::marketplace()).await;
    let client = catalog.client();

    let mut page = ListingPage::<Product>::new();
    page.set_search("kettle");

    let ticket = page.begin_fetch();
    page.finish_fetch(ticket, client.get_products().await);
    assert_eq!(page.status(), ListingStatus::Ready);
    assert_eq!(page.visible().unwrap().len(), 1);

    client.invalidate(deal_catalog::CacheTag::Products).await;
    catalog.fail_next(Injected::Status {
        status: 500,
        errors: vec!["Database timeout".to_string()],
    });
    let ticket = page.begin_fetch();
    page.finish_fetch(ticket, client.get_products().await);

    let failure = page.visible().unwrap_err();
    assert_eq!(failure.details, vec!["Database timeout".to_string()]);
    assert!(failure.retryable);
    assert_eq!(page.params().search.as_str(), "kettle");

    let ticket = page.retry().unwrap();
    page.finish_fetch(ticket, client.get_products().await);
    assert_eq!(page.status(), ListingStatus::Ready);
    assert_eq!(page.visible().unwrap()[0].title, "Kettle");
}
